//! Refresh throttling for presence scans.
//!
//! A scan against a router or a subnet is expensive compared to how often a
//! host may ask for results, so each scanner keeps a [`Throttle`] that admits
//! at most one refresh per interval. Time is passed in explicitly so the
//! decision can be driven by an injected clock.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Default minimum time between two refreshes of the same source.
pub const MIN_TIME_BETWEEN_SCANS: Duration = Duration::from_secs(5);

/// Admits at most one refresh per `interval`.
///
/// The first refresh is always allowed. The window starts when a refresh is
/// admitted, regardless of whether that refresh later succeeds.
#[derive(Debug, Clone)]
pub struct Throttle {
    /// Minimum time between admitted refreshes
    interval: Duration,
    /// When the last refresh was admitted
    last_refresh: Option<DateTime<Utc>>,
}

impl Throttle {
    /// Create a new throttle with the specified minimum interval between refreshes.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use presence_scanner::throttle::Throttle;
    ///
    /// let throttle = Throttle::new(Duration::from_secs(5));
    /// assert!(throttle.last_refresh().is_none());
    /// ```
    pub fn new(interval: Duration) -> Self {
        Throttle {
            interval,
            last_refresh: None,
        }
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.last_refresh
    }

    /// Check whether a refresh may start at `now`.
    ///
    /// Returns `true` if no refresh has been admitted yet or at least
    /// `interval` has passed since the last one; the window is then restarted
    /// at `now`. A clock that moved backwards counts as stale.
    pub fn should_refresh(&mut self, now: DateTime<Utc>) -> bool {
        let stale = match self.last_refresh {
            None => true,
            Some(last) => now
                .signed_duration_since(last)
                .to_std()
                .map_or(true, |elapsed| elapsed >= self.interval),
        };

        if stale {
            self.last_refresh = Some(now);
        }
        stale
    }
}

const DURATION_UNITS: [(&str, u64); 4] = [("ms", 1), ("h", 3_600_000), ("m", 60_000), ("s", 1_000)];

/// Parse a duration from a human-readable string.
///
/// Accepts `ms`, `s`, `m` and `h` suffixes; a bare number is seconds.
///
/// # Examples
/// ```
/// use presence_scanner::throttle::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
/// assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
/// assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
/// ```
pub fn parse_duration(src: &str) -> Result<Duration, String> {
    let src = src.trim();

    if src.is_empty() {
        return Err("empty duration string".to_string());
    }

    // "ms" is checked before "m" and "s"
    let (number, millis_per_unit) = DURATION_UNITS
        .iter()
        .find_map(|(suffix, factor)| src.strip_suffix(suffix).map(|n| (n, *factor)))
        .unwrap_or((src, 1_000));

    let value: u64 = number
        .trim()
        .parse()
        .map_err(|_| format!("invalid duration: {}", src))?;
    value
        .checked_mul(millis_per_unit)
        .map(Duration::from_millis)
        .ok_or_else(|| format!("duration out of range: {}", src))
}
