//! Discovered device record.

use crate::mac_address::MacAddress;
use chrono::{DateTime, Utc};

/// A device seen by a presence scan.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceRecord {
    /// Normalized hardware address
    pub id: MacAddress,
    /// Display name (hostname, or the IP when no hostname is known)
    pub name: String,
    /// Last known IP address
    pub ip: Option<String>,
    /// When the device was last confirmed present
    pub last_seen: DateTime<Utc>,
}

impl DeviceRecord {
    /// Whether the device was confirmed present after `boundary`.
    pub fn seen_since(&self, boundary: DateTime<Utc>) -> bool {
        self.last_seen > boundary
    }
}
