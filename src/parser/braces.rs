//! Parser for `{key::value}` token streams.
//!
//! DD-WRT's `*.live.asp` status pages are not JSON. They are a run of tokens
//! such as `{lan_ip::192.168.1.1}{active_wireless::'AA:BB:...','...'}`
//! which the web UI picks apart with a regular expression. This module
//! extracts the same tokens: an identifier of word characters, a double
//! colon, and a value that runs up to the first closing brace.

use super::{Fields, PayloadParser};

/// [`PayloadParser`] for brace-delimited key/value tokens.
#[derive(Debug, Default, Clone, Copy)]
pub struct BraceParser;

impl PayloadParser for BraceParser {
    fn parse(&self, raw: &str) -> Fields {
        parse_braces(raw)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Try to match one token starting right after an opening brace.
///
/// Returns the key, the value and the remainder after the closing brace.
fn match_token(rest: &str) -> Option<(&str, &str, &str)> {
    let key_len = rest
        .char_indices()
        .find(|(_, c)| !is_word_char(*c))
        .map_or(rest.len(), |(i, _)| i);
    if key_len == 0 {
        return None;
    }

    let (key, after_key) = rest.split_at(key_len);
    let body = after_key.strip_prefix("::")?;
    let end = body.find('}')?;
    Some((key, &body[..end], &body[end + 1..]))
}

/// Extract all `{key::value}` tokens from `raw`.
///
/// Matches are leftmost and non-overlapping. Text that is not part of a token
/// is skipped, and when a key repeats the last value wins.
///
/// # Example
/// ```
/// use presence_scanner::parser::braces::parse_braces;
///
/// let fields = parse_braces("{foo::bar}{baz::1,2,3}");
/// assert_eq!(fields["foo"], "bar");
/// assert_eq!(fields["baz"], "1,2,3");
/// assert!(parse_braces("{foo::bar").is_empty());
/// ```
pub fn parse_braces(raw: &str) -> Fields {
    let mut fields = Fields::new();
    let mut rest = raw;

    while let Some(open) = rest.find('{') {
        let candidate = &rest[open + 1..];
        match match_token(candidate) {
            Some((key, value, after)) => {
                fields.insert(key.to_string(), value.to_string());
                rest = after;
            }
            None => rest = candidate,
        }
    }

    fields
}
