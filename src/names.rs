//! Hardware address to display name mapping.
//!
//! Two sources feed names: the index a scanner discovers from its source (a
//! router lease table, or probe hostnames) and static aliases supplied by the
//! operator. Aliases always win.

use crate::mac_address::MacAddress;
use std::collections::BTreeMap;

/// Mapping from device id to display name.
pub type NameIndex = BTreeMap<MacAddress, String>;

/// A parsed alias mapping a MAC address to a human-readable name.
#[derive(Debug, Clone, PartialEq)]
pub struct Alias {
    /// The normalized MAC address
    pub address: MacAddress,
    /// The human-readable name (e.g., "Phone")
    pub name: String,
}

/// Parse an alias from a string in the format "MAC=NAME".
///
/// The address part is normalized, so `aa:bb:cc:dd:ee:ff=Phone` and
/// `AA:BB:CC:DD:EE:FF=Phone` produce the same alias.
///
/// # Example
/// ```
/// use presence_scanner::names::parse_alias;
///
/// let alias = parse_alias("aa:bb:cc:dd:ee:ff=Laptop").unwrap();
/// assert_eq!(alias.address.to_string(), "AA:BB:CC:DD:EE:FF");
/// assert_eq!(alias.name, "Laptop");
/// ```
pub fn parse_alias(src: &str) -> Result<Alias, String> {
    let (address, name) = src
        .split_once('=')
        .ok_or_else(|| "invalid alias: expected format MAC=NAME".to_string())?;
    let address = address
        .parse::<MacAddress>()
        .map_err(|e| format!("invalid alias: {}", e))?;
    Ok(Alias {
        address,
        name: name.into(),
    })
}

/// Convert a slice of Alias values into a NameIndex.
///
/// Later aliases for the same address replace earlier ones.
pub fn to_map(aliases: &[Alias]) -> NameIndex {
    aliases
        .iter()
        .map(|a| (a.address, a.name.clone()))
        .collect()
}
