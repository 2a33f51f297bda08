//! Parsers for source payloads.
//!
//! Each source format gets its own parser so scan orchestration never deals
//! with text grammars directly. Parsers are lenient: malformed input yields
//! fewer entries rather than an error, and the scanner decides whether what
//! is left is usable.

pub mod braces;
pub mod ddwrt;

#[cfg(feature = "nmap")]
pub mod nmap_xml;

use std::collections::HashMap;

/// Named fields extracted from a key/value payload.
pub type Fields = HashMap<String, String>;

/// Trait for turning a raw key/value payload into named fields.
///
/// Implementations must not fail on partial or malformed input.
pub trait PayloadParser: Send + Sync {
    /// Parse a raw payload.
    ///
    /// # Arguments
    /// * `raw` - The response body as received from the source
    ///
    /// # Returns
    /// The fields that could be recognized; possibly empty
    fn parse(&self, raw: &str) -> Fields;
}
