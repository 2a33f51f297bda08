//! Presence scanners.
//!
//! A scanner answers two questions for its host: which devices are present
//! right now, and what a given device is called. Both answers come from
//! caches that are refreshed at most once per throttle window, and a failed
//! refresh never surfaces to the caller; it keeps the last good answer.

pub mod ddwrt;
pub mod nmap;
pub mod throttled;

use crate::mac_address::MacAddress;
use crate::source::{FetchError, ProbeError};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use tracing::{error, warn};

pub use ddwrt::{DdWrtConfig, DdWrtScanner};
pub use nmap::{NmapConfig, NmapScanner};
pub use throttled::ThrottledScanner;

/// Boxed future returned by [`DeviceScanner`] methods.
pub type ScanFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Why a single refresh failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScanError {
    /// Timeout, refused connection or an unexpected response status
    #[error("Transport error: {0}")]
    Transport(String),
    /// The source rejected the configured credentials
    #[error("Authentication failed")]
    Auth,
    /// The payload did not contain the data the scanner needs
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
    /// The probe tool could not be run or reported an error
    #[error("Tool execution failed: {0}")]
    ToolExecution(String),
}

impl From<FetchError> for ScanError {
    fn from(error: FetchError) -> Self {
        ScanError::Transport(error.to_string())
    }
}

impl From<ProbeError> for ScanError {
    fn from(error: ProbeError) -> Self {
        ScanError::ToolExecution(error.to_string())
    }
}

/// Log a refresh failure. Credential problems get their own message so they
/// are not mistaken for connectivity problems.
pub(crate) fn report(source: &str, err: &ScanError) {
    match err {
        ScanError::Auth => error!(
            "Failed to authenticate with {}, please check your username and password",
            source
        ),
        other => warn!("Refreshing {} failed: {}", source, other),
    }
}

/// The interface a host uses to poll a presence scanner.
pub trait DeviceScanner: Send + Sync {
    /// Refresh if the throttle window has passed, then return the ids of the
    /// devices currently present.
    fn scan_devices(&self) -> ScanFuture<'_, Vec<MacAddress>>;

    /// Return the display name of `id`, or `None` if it is unknown.
    fn get_device_name(&self, id: MacAddress) -> ScanFuture<'_, Option<String>>;

    /// Whether the initial connectivity check passed. A scanner that failed
    /// it must not be used.
    fn init_succeeded(&self) -> bool;
}
