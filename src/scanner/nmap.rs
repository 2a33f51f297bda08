//! Presence scanner that sweeps a network with an active probe.
//!
//! Phones in particular drop off the network while asleep and wake up when
//! probed, which costs battery. Devices confirmed present within the home
//! interval are therefore left out of the next sweep and carried over as they
//! were.

use super::{DeviceScanner, ScanError, ScanFuture, ThrottledScanner};
use crate::device::DeviceRecord;
use crate::mac_address::{self, MacAddress};
use crate::names::NameIndex;
use crate::source::{AddressResolver, Clock, ProbeHost, ProbeOptions, Prober};
use crate::throttle::MIN_TIME_BETWEEN_SCANS;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Default per-host timeout passed to the probe.
pub const HOST_TIMEOUT: Duration = Duration::from_secs(5);

/// Default deadline for a whole sweep.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings for an [`NmapScanner`].
#[derive(Debug, Clone)]
pub struct NmapConfig {
    /// Targets in nmap notation, e.g. `192.168.1.0/24` or `192.168.1.1-255`
    pub hosts: Vec<String>,
    /// How long a seen device is left out of sweeps; zero disables exclusion
    pub home_interval: Duration,
    pub min_interval: Duration,
    pub host_timeout: Duration,
    pub probe_timeout: Duration,
    /// Names that take precedence over probe hostnames
    pub aliases: NameIndex,
}

impl NmapConfig {
    pub fn new(hosts: Vec<String>) -> Self {
        Self {
            hosts,
            home_interval: Duration::ZERO,
            min_interval: MIN_TIME_BETWEEN_SCANS,
            host_timeout: HOST_TIMEOUT,
            probe_timeout: PROBE_TIMEOUT,
            aliases: NameIndex::new(),
        }
    }
}

/// Scans a network for devices with an active probe.
pub struct NmapScanner {
    config: NmapConfig,
    prober: Arc<dyn Prober>,
    resolver: Arc<dyn AddressResolver>,
    clock: Arc<dyn Clock>,
    devices: ThrottledScanner<Vec<DeviceRecord>>,
    init_succeeded: bool,
}

impl NmapScanner {
    /// Create a scanner and run the first sweep.
    ///
    /// The scanner is usable only if that sweep succeeds.
    pub async fn start(
        config: NmapConfig,
        prober: Arc<dyn Prober>,
        resolver: Arc<dyn AddressResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let devices =
            ThrottledScanner::new("nmap sweep", config.min_interval, clock.clone(), Vec::new());
        let mut scanner = Self {
            config,
            prober,
            resolver,
            clock,
            devices,
            init_succeeded: false,
        };
        scanner.init_succeeded = scanner.refresh().await;
        info!("nmap scanner initialized");
        scanner
    }

    /// Sweep the network if the throttle window has passed.
    pub async fn refresh(&self) -> bool {
        self.devices.refresh(|previous| self.sweep(previous)).await
    }

    /// Records seen recently enough to skip this cycle.
    fn retained(&self, previous: Vec<DeviceRecord>, now: DateTime<Utc>) -> Vec<DeviceRecord> {
        if self.config.home_interval.is_zero() {
            return Vec::new();
        }
        let Ok(home_interval) = chrono::Duration::from_std(self.config.home_interval) else {
            // Longer than chrono can represent: everything seen stays home.
            return previous;
        };
        let boundary = now - home_interval;
        previous
            .into_iter()
            .filter(|device| device.seen_since(boundary))
            .collect()
    }

    /// Turn one probed host into a record, resolving its address if the probe
    /// did not report one. Hosts without an address are dropped.
    async fn record(&self, host: ProbeHost, now: DateTime<Utc>) -> Option<DeviceRecord> {
        let id = match host.mac.as_deref().and_then(|m| mac_address::normalize(m).ok()) {
            Some(id) => id,
            None => self.resolver.resolve(&host.ip).await?,
        };
        let name = host
            .hostnames
            .into_iter()
            .find(|name| !name.trim().is_empty())
            .unwrap_or_else(|| host.ip.clone());

        Some(DeviceRecord {
            id,
            name,
            ip: Some(host.ip),
            last_seen: now,
        })
    }

    async fn sweep(&self, previous: Vec<DeviceRecord>) -> Result<Vec<DeviceRecord>, ScanError> {
        info!("Scanning");

        let mut devices = self.retained(previous, self.clock.now());
        let options = ProbeOptions {
            fast: true,
            host_timeout: self.config.host_timeout,
            exclude: devices.iter().filter_map(|d| d.ip.clone()).collect(),
        };
        if !options.exclude.is_empty() {
            debug!("Excluding {} recently seen devices", options.exclude.len());
        }

        let hosts = tokio::time::timeout(
            self.config.probe_timeout,
            self.prober
                .run_probe(&self.config.hosts, &options, self.config.probe_timeout),
        )
        .await
        .map_err(|_| ScanError::ToolExecution("nmap sweep timed out".into()))??;

        let now = self.clock.now();
        for host in hosts.into_iter().filter(|h| h.up) {
            if let Some(record) = self.record(host, now).await {
                devices.retain(|d| d.id != record.id);
                devices.push(record);
            }
        }

        info!("nmap scan successful");
        Ok(devices)
    }

    /// A copy of the current device records.
    pub async fn devices(&self) -> Vec<DeviceRecord> {
        self.devices.results().await
    }

    async fn lookup(&self, id: MacAddress) -> Option<String> {
        if let Some(name) = self.config.aliases.get(&id) {
            return Some(name.clone());
        }
        self.devices
            .with_results(|devices| devices.iter().find(|d| d.id == id).map(|d| d.name.clone()))
            .await
    }
}

impl DeviceScanner for NmapScanner {
    fn scan_devices(&self) -> ScanFuture<'_, Vec<MacAddress>> {
        Box::pin(async move {
            self.refresh().await;
            self.devices
                .with_results(|devices| devices.iter().map(|d| d.id).collect())
                .await
        })
    }

    fn get_device_name(&self, id: MacAddress) -> ScanFuture<'_, Option<String>> {
        Box::pin(self.lookup(id))
    }

    fn init_succeeded(&self) -> bool {
        self.init_succeeded
    }
}
