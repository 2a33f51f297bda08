//! Output formatters for presence reports.
//!
//! The CLI writes one line per present device and poll. The format is
//! pluggable; InfluxDB line protocol is the default so the output can be fed
//! to Telegraf's `execd` input directly.

pub mod influxdb;

use crate::mac_address::MacAddress;
use chrono::{DateTime, Utc};

/// Trait for formatting a present device into an output line.
pub trait OutputFormatter: Send + Sync {
    /// Format one present device.
    ///
    /// # Arguments
    /// * `id` - The device's hardware address
    /// * `name` - Display name, already resolved by the caller
    /// * `timestamp` - When the poll that saw the device ran
    fn format(&self, id: MacAddress, name: &str, timestamp: DateTime<Utc>) -> String;
}
