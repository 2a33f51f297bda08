//! Hardware address type used as the device identifier.
//!
//! Routers and scan tools report addresses in mixed case, sometimes with
//! single-digit groups and surrounding quotes. Everything is parsed into a
//! compact 6-byte [`MacAddress`] so comparisons and map lookups never depend
//! on the textual form.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A hardware address stored as a compact 6-byte array.
///
/// Displays in canonical form: uppercase, colon-delimited, two digits per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MacAddress(pub [u8; 6]);

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

/// Errors returned when parsing a MAC address string.
#[derive(Error, Debug, PartialEq)]
pub enum ParseMacError {
    #[error("invalid MAC address: expected 6 parts, got {0}")]
    InvalidLength(usize),
    #[error("invalid MAC address: part {0} has wrong length")]
    InvalidPartLength(usize),
    #[error("invalid MAC address: '{0}' is not valid hex")]
    InvalidHex(String),
}

/// Remove surrounding whitespace and at most one matching pair of quotes.
fn unquote(raw: &str) -> &str {
    let trimmed = raw.trim();
    for quote in ['\'', '"'] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|s| s.strip_suffix(quote))
        {
            return inner.trim();
        }
    }
    trimmed
}

impl FromStr for MacAddress {
    type Err = ParseMacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = unquote(s).split(':').collect();
        if parts.len() != 6 {
            return Err(ParseMacError::InvalidLength(parts.len()));
        }

        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() || part.len() > 2 {
                return Err(ParseMacError::InvalidPartLength(i));
            }
            // from_str_radix accepts a leading '+', the address grammar does not
            if !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(ParseMacError::InvalidHex(part.to_string()));
            }
            bytes[i] = u8::from_str_radix(part, 16)
                .map_err(|_| ParseMacError::InvalidHex(part.to_string()))?;
        }

        Ok(MacAddress(bytes))
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }
}

/// Parse and canonicalize a hardware address.
///
/// Accepts any case, 1-2 hex digits per group, surrounding whitespace and one
/// layer of single or double quotes.
///
/// # Example
/// ```
/// use presence_scanner::mac_address::normalize;
///
/// let id = normalize(" 'aa:bb:cc:d:ee:ff' ").unwrap();
/// assert_eq!(id.to_string(), "AA:BB:CC:0D:EE:FF");
/// ```
pub fn normalize(raw: &str) -> Result<MacAddress, ParseMacError> {
    raw.parse()
}

/// Check whether `raw` matches the hardware address grammar.
pub fn is_valid(raw: &str) -> bool {
    normalize(raw).is_ok()
}

/// Find the first whitespace-separated token in `text` that is a valid address.
///
/// Used for the free-form output of address resolution tools such as `arp -n`.
pub fn find_in(text: &str) -> Option<MacAddress> {
    text.split_whitespace().find_map(|token| token.parse().ok())
}
