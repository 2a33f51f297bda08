//! `presence-scanner` library.
//!
//! The binary (`src/main.rs`) is responsible for logging setup and process exit codes.
//! Presence sources live in [`crate::scanner`]; each one talks to the outside world
//! through the capability traits in [`crate::source`], so the scanners can be tested
//! deterministically with fake fetchers, probers and clocks.

#[cfg(any(feature = "ddwrt", feature = "nmap"))]
pub mod app;
pub mod device;
pub mod mac_address;
pub mod names;
pub mod output;
pub mod parser;
pub mod scanner;
pub mod source;
pub mod throttle;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types at the crate root
pub use device::DeviceRecord;
pub use mac_address::{MacAddress, ParseMacError};
pub use names::{Alias, NameIndex, parse_alias};
pub use output::OutputFormatter;
pub use output::influxdb::InfluxDbFormatter;
pub use parser::braces::{BraceParser, parse_braces};
pub use scanner::{
    DdWrtConfig, DdWrtScanner, DeviceScanner, NmapConfig, NmapScanner, ScanError, ThrottledScanner,
};
pub use throttle::{Throttle, parse_duration};
