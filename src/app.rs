//! Core application runner (polling loop) for `presence-scanner`.
//!
//! This module is kept apart from process setup and exit codes so the loop
//! can be tested with an injected scanner and output stream.

use crate::mac_address::MacAddress;
use crate::names::{self, Alias};
use crate::output::OutputFormatter;
use crate::output::influxdb::InfluxDbFormatter;
use crate::scanner::DeviceScanner;
use crate::source::{Clock, SystemClock};
use crate::throttle::parse_duration;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::io;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Configuration for the polling loop and the scanner it drives.
#[derive(Parser, Debug, Clone)]
#[command(author, about, version)]
pub struct Options {
    /// The name of the measurement in InfluxDB line protocol.
    #[arg(long, default_value = "device_presence")]
    pub measurement: String,

    /// Specify human-readable alias for a device.
    /// Format: --alias DE:AD:BE:EF:00:00=Phone
    #[arg(long = "alias", value_parser = names::parse_alias, value_name = "ALIAS", global = true)]
    pub aliases: Vec<Alias>,

    /// Verbose output, log every refresh at debug level
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Minimum time between two queries of the source.
    /// Accepts duration with suffix: 3s, 1m, 500ms, 2h.
    #[arg(long, value_parser = parse_duration, default_value = "5s", global = true)]
    pub throttle: Duration,

    /// How often to poll for present devices.
    #[arg(long, value_parser = parse_duration, default_value = "12s", global = true)]
    pub interval: Duration,

    /// Poll once and exit
    #[arg(long, global = true)]
    pub once: bool,

    /// Where presence information comes from
    #[command(subcommand)]
    pub source: Source,
}

/// Presence sources compiled into this binary.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Source {
    /// Poll a DD-WRT router's status pages
    #[cfg(feature = "ddwrt")]
    Ddwrt {
        /// Router address, e.g. 192.168.1.1
        #[arg(long)]
        host: String,
        /// User with administrative privileges
        #[arg(long, default_value = "admin")]
        username: String,
        #[arg(long, env = "DDWRT_PASSWORD", hide_env_values = true)]
        password: String,
        /// Deadline for each request to the router
        #[arg(long, value_parser = parse_duration, default_value = "4s")]
        timeout: Duration,
    },
    /// Sweep the network with nmap
    #[cfg(feature = "nmap")]
    Nmap {
        /// Targets in network-prefix (192.168.1.0/24) or range (192.168.1.1-255) notation
        #[arg(required = true)]
        hosts: Vec<String>,
        /// Skip devices seen within this long in the next sweep; 0 disables
        #[arg(long, value_parser = parse_duration, default_value = "0s")]
        home_interval: Duration,
        /// Per-host timeout passed to nmap
        #[arg(long, value_parser = parse_duration, default_value = "5s")]
        host_timeout: Duration,
        /// Deadline for a whole sweep
        #[arg(long, value_parser = parse_duration, default_value = "60s")]
        probe_timeout: Duration,
    },
}

impl Source {
    fn name(&self) -> &'static str {
        match self {
            #[cfg(feature = "ddwrt")]
            Source::Ddwrt { .. } => "ddwrt",
            #[cfg(feature = "nmap")]
            Source::Nmap { .. } => "nmap",
        }
    }
}

/// Errors returned by the core run loop.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("{0} scanner failed to initialize")]
    InitFailed(&'static str),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Build the scanner selected in `options` using the real sources.
///
/// Fails if the scanner's initial connectivity check fails.
pub async fn build_scanner(options: &Options) -> Result<Box<dyn DeviceScanner>, RunError> {
    let aliases = names::to_map(&options.aliases);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let scanner: Box<dyn DeviceScanner> = match &options.source {
        #[cfg(feature = "ddwrt")]
        Source::Ddwrt {
            host,
            username,
            password,
            timeout,
        } => {
            use crate::scanner::{DdWrtConfig, DdWrtScanner};
            use crate::source::Credentials;
            use crate::source::http::HttpFetcher;

            let credentials = Credentials::new(username.clone(), password.clone());
            let mut config = DdWrtConfig::new(host.clone(), credentials);
            config.min_interval = options.throttle;
            config.request_timeout = *timeout;
            config.aliases = aliases;
            Box::new(DdWrtScanner::connect(config, Arc::new(HttpFetcher::new()), clock).await)
        }
        #[cfg(feature = "nmap")]
        Source::Nmap {
            hosts,
            home_interval,
            host_timeout,
            probe_timeout,
        } => {
            use crate::scanner::{NmapConfig, NmapScanner};
            use crate::source::arp::ArpResolver;
            use crate::source::nmap::NmapProber;

            let mut config = NmapConfig::new(hosts.clone());
            config.home_interval = *home_interval;
            config.min_interval = options.throttle;
            config.host_timeout = *host_timeout;
            config.probe_timeout = *probe_timeout;
            config.aliases = aliases;
            Box::new(
                NmapScanner::start(
                    config,
                    Arc::new(NmapProber::new()),
                    Arc::new(ArpResolver::default()),
                    clock,
                )
                .await,
            )
        }
    };

    if !scanner.init_succeeded() {
        return Err(RunError::InitFailed(options.source.name()));
    }
    Ok(scanner)
}

/// Poll `scanner` once and write a line per present device.
///
/// Devices without a known name are reported under their address.
/// Returns the number of devices written.
pub async fn poll_once(
    scanner: &dyn DeviceScanner,
    formatter: &dyn OutputFormatter,
    timestamp: DateTime<Utc>,
    out: &mut dyn Write,
) -> io::Result<usize> {
    let devices: Vec<MacAddress> = scanner.scan_devices().await;
    for id in &devices {
        let name = scanner
            .get_device_name(*id)
            .await
            .unwrap_or_else(|| id.to_string());
        writeln!(out, "{}", formatter.format(*id, &name, timestamp))?;
    }
    out.flush()?;
    Ok(devices.len())
}

/// Run the polling loop, writing formatted output to `out`.
///
/// Polls every `options.interval` until the process is stopped, or once when
/// `options.once` is set.
pub async fn run_with_io(
    options: &Options,
    scanner: &dyn DeviceScanner,
    clock: &dyn Clock,
    out: &mut dyn Write,
) -> Result<(), RunError> {
    let formatter = InfluxDbFormatter::new(options.measurement.clone());

    loop {
        let present = poll_once(scanner, &formatter, clock.now(), out).await?;
        debug!("{} devices present", present);

        if options.once {
            return Ok(());
        }
        tokio::time::sleep(options.interval).await;
    }
}
