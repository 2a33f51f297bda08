//! Capabilities the scanners consume from their environment.
//!
//! Scanners never talk to the network, spawn processes or read the system
//! clock directly. They go through the traits in this module so hosts can
//! supply their own transports and tests can inject deterministic fakes.

#[cfg(feature = "ddwrt")]
pub mod http;

#[cfg(feature = "nmap")]
pub mod arp;

#[cfg(feature = "nmap")]
pub mod nmap;

use crate::mac_address::MacAddress;
use chrono::{DateTime, Utc};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Boxed future returned by capability traits.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Username and password for HTTP basic authentication.
#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Status code and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }
}

/// Errors from a [`Fetcher`]. Non-success HTTP statuses are not errors here;
/// they are returned in [`Response::status`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("request failed: {0}")]
    Transport(String),
}

/// HTTP-like retrieval.
pub trait Fetcher: Send + Sync {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
        credentials: &'a Credentials,
        timeout: Duration,
    ) -> SourceFuture<'a, Result<Response, FetchError>>;
}

/// Options passed to a [`Prober`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOptions {
    /// Probe only the most common ports
    pub fast: bool,
    /// Give up on a single host after this long
    pub host_timeout: Duration,
    /// Addresses to leave out of the sweep
    pub exclude: Vec<String>,
}

/// One host as reported by an active probe.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProbeHost {
    pub ip: String,
    pub up: bool,
    pub hostnames: Vec<String>,
    /// Hardware address, only reported when the probe ran with enough privileges
    pub mac: Option<String>,
}

/// Errors from a [`Prober`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProbeError {
    #[error("failed to run probe: {0}")]
    Spawn(String),
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
    #[error("probe exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("unreadable probe output: {0}")]
    Output(String),
}

/// Active network sweep.
pub trait Prober: Send + Sync {
    fn run_probe<'a>(
        &'a self,
        hosts: &'a [String],
        options: &'a ProbeOptions,
        timeout: Duration,
    ) -> SourceFuture<'a, Result<Vec<ProbeHost>, ProbeError>>;
}

/// Single-host fallback lookup of a hardware address.
pub trait AddressResolver: Send + Sync {
    fn resolve<'a>(&'a self, ip: &'a str) -> SourceFuture<'a, Option<MacAddress>>;
}

/// Resolver for hosts without an address lookup utility.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoResolver;

impl AddressResolver for NoResolver {
    fn resolve<'a>(&'a self, _ip: &'a str) -> SourceFuture<'a, Option<MacAddress>> {
        Box::pin(async { None })
    }
}
