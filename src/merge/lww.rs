//! Last-write-wins tie-break between two diffs.

use crate::error::{Result, SyncError};
use crate::types::Diff;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::time::SystemTime;

/// A point in time accepted by [`resolve_with_lww`].
///
/// Every variant normalizes to milliseconds since the Unix epoch. Text is
/// parsed as RFC 3339 / ISO-8601; timestamps without an offset are taken as UTC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Timestamp {
    /// A chrono UTC datetime
    Utc(DateTime<Utc>),
    /// A system clock reading
    System(SystemTime),
    /// Milliseconds since the Unix epoch
    Millis(i64),
    /// An ISO-8601 string, parsed on use
    Text(String),
}

impl Timestamp {
    /// Milliseconds since the Unix epoch.
    ///
    /// # Errors
    ///
    /// [`SyncError::InvalidTimestamp`] when a text timestamp cannot be parsed.
    pub fn epoch_millis(&self) -> Result<i64> {
        match self {
            Timestamp::Utc(dt) => Ok(dt.timestamp_millis()),
            Timestamp::System(st) => Ok(DateTime::<Utc>::from(*st).timestamp_millis()),
            Timestamp::Millis(ms) => Ok(*ms),
            Timestamp::Text(text) => parse_iso8601(text).map(|dt| dt.timestamp_millis()),
        }
    }
}

fn parse_iso8601(text: &str) -> Result<DateTime<Utc>> {
    let trimmed = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| SyncError::InvalidTimestamp(text.to_string()))
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Timestamp::Utc(value)
    }
}

impl From<SystemTime> for Timestamp {
    fn from(value: SystemTime) -> Self {
        Timestamp::System(value)
    }
}

impl From<i64> for Timestamp {
    fn from(value: i64) -> Self {
        Timestamp::Millis(value)
    }
}

impl From<&str> for Timestamp {
    fn from(value: &str) -> Self {
        Timestamp::Text(value.to_string())
    }
}

impl From<String> for Timestamp {
    fn from(value: String) -> Self {
        Timestamp::Text(value)
    }
}

/// Keep the diff with the strictly later timestamp; ties keep `diff1`.
///
/// # Errors
///
/// [`SyncError::InvalidTimestamp`] if either timestamp is unparseable. A bad
/// timestamp never silently picks a winner.
///
/// # Examples
///
/// ```
/// use codesync::Diff;
/// use codesync::merge::resolve_with_lww;
///
/// let a = Diff::insertion(0, "a");
/// let b = Diff::insertion(0, "b");
/// let winner = resolve_with_lww(
///     a,
///     b.clone(),
///     "2024-01-01T10:00:00Z",
///     "2024-01-01T10:00:01Z",
/// ).unwrap();
/// assert_eq!(winner, b);
/// ```
pub fn resolve_with_lww(
    diff1: Diff,
    diff2: Diff,
    timestamp1: impl Into<Timestamp>,
    timestamp2: impl Into<Timestamp>,
) -> Result<Diff> {
    let time1 = timestamp1.into().epoch_millis()?;
    let time2 = timestamp2.into().epoch_millis()?;
    Ok(if time2 > time1 { diff2 } else { diff1 })
}
