//! Issue timestamp handling.

use chrono::{DateTime, Local, TimeZone};

use crate::error::{Error, Result};

/// Convert an RFC-3339 issue timestamp to epoch seconds.
///
/// Accepts optional fractional seconds (ignored) and either a `Z` marker or
/// a signed `hh:mm` offset. Anything else is a hard error: a corrupt
/// timestamp written into the cache index would poison every later
/// freshness decision, so this never coerces to zero.
pub fn to_epoch_seconds(value: &str) -> Result<i64> {
  DateTime::parse_from_rfc3339(value)
    .map(|dt| dt.timestamp())
    .map_err(|_| Error::MalformedTimestamp(value.to_string()))
}

/// Format a cache watermark for a JQL `updated >` clause.
///
/// Jira expects local time at minute granularity, no UTC offset.
pub fn format_watermark(epoch: i64) -> String {
  match Local.timestamp_opt(epoch, 0) {
    chrono::LocalResult::Single(dt) | chrono::LocalResult::Ambiguous(dt, _) => {
      dt.format("%Y-%m-%d %H:%M").to_string()
    }
    // Nonexistent local time can only come from a nonsensical epoch
    chrono::LocalResult::None => Local::now().format("%Y-%m-%d %H:%M").to_string(),
  }
}
