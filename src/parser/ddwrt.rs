//! Decoders for the list-valued fields of DD-WRT status pages.
//!
//! Inside a `{key::value}` token DD-WRT serializes tables as one flat, quoted,
//! comma-separated array. The wireless page lists one field per client in
//! single quotes; the LAN page lists DHCP leases in double quotes with five
//! fields per lease.

use crate::mac_address::{self, MacAddress};
use crate::names::NameIndex;

/// Field of `Status_Wireless.live.asp` holding the associated clients.
pub const ACTIVE_WIRELESS_FIELD: &str = "active_wireless";

/// Field of `Status_Lan.live.asp` holding the DHCP lease table.
pub const DHCP_LEASES_FIELD: &str = "dhcp_leases";

/// Number of array elements per DHCP lease: name, IP, MAC, expiry, lease id.
pub const LEASE_GROUP_SIZE: usize = 5;
const LEASE_NAME_OFFSET: usize = 0;
const LEASE_MAC_OFFSET: usize = 2;

/// Trim whitespace and one layer of `quote` around `raw`, then split on the
/// quoted separator (`','` or `","`).
fn split_quoted(raw: &str, quote: char) -> Vec<&str> {
    let trimmed = raw.trim();
    let unquoted = trimmed.strip_prefix(quote).unwrap_or(trimmed);
    let unquoted = unquoted.strip_suffix(quote).unwrap_or(unquoted);
    if unquoted.is_empty() {
        return Vec::new();
    }

    let separator = format!("{quote},{quote}");
    unquoted.split(separator.as_str()).collect()
}

/// Decode the `active_wireless` value into the addresses it contains.
///
/// The array also carries interface names, uptimes and signal levels; only
/// elements that are hardware addresses are kept.
///
/// # Example
/// ```
/// use presence_scanner::parser::ddwrt::active_clients;
///
/// let ids = active_clients("'aa:bb:cc:dd:ee:ff','not-a-mac','11:22:33:44:55:66'");
/// let ids: Vec<String> = ids.iter().map(|m| m.to_string()).collect();
/// assert_eq!(ids, ["AA:BB:CC:DD:EE:FF", "11:22:33:44:55:66"]);
/// ```
pub fn active_clients(value: &str) -> Vec<MacAddress> {
    split_quoted(value, '\'')
        .into_iter()
        .filter_map(|element| mac_address::normalize(element).ok())
        .collect()
}

/// Decode the `dhcp_leases` value into a fresh [`NameIndex`].
///
/// Elements are consumed in groups of [`LEASE_GROUP_SIZE`]. A trailing group
/// that is cut short is dropped, as is a group whose address does not parse.
pub fn lease_names(value: &str) -> NameIndex {
    split_quoted(value, '"')
        .chunks_exact(LEASE_GROUP_SIZE)
        .filter_map(|lease| {
            let mac = mac_address::normalize(lease[LEASE_MAC_OFFSET]).ok()?;
            Some((mac, lease[LEASE_NAME_OFFSET].to_string()))
        })
        .collect()
}
