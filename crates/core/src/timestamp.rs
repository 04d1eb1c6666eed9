//! Pluggable line-timestamp extraction.
//!
//! Each log format pairs a line pattern with a chrono time format. The
//! parser is selected once, by name, when the monitor is constructed;
//! adding a format means adding a constructor arm here, not touching the
//! scanning code.

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;

use crate::error::LogpulseError;

/// Format names accepted by [`TimestampParser::for_format`].
pub const FORMATS: &[&str] = &["common", "rails"];

/// Extracts a UTC timestamp from a raw log line.
///
/// The capture pattern has the timestamp in group 1 and, optionally, a
/// numeric UTC offset in group 2. Lines without an explicit offset are
/// interpreted as UTC.
#[derive(Debug)]
pub struct TimestampParser {
    name: String,
    pattern: Regex,
    time_format: &'static str,
}

impl TimestampParser {
    /// Build the parser for a named format.
    ///
    /// - `common`: Common/Combined Log Format, `[DD/Mon/YYYY:HH:MM:SS ±zzzz]`
    /// - `rails`: request marker lines, `... at YYYY-MM-DD HH:MM:SS`
    pub fn for_format(name: &str) -> Result<Self, LogpulseError> {
        match name {
            "common" => Self::new(
                name,
                r"\[(\d{2}/[A-Za-z]{3}/\d{4}:\d{2}:\d{2}:\d{2})(?: ([+-]\d{4}))?\]",
                "%d/%b/%Y:%H:%M:%S",
            ),
            "rails" => Self::new(
                name,
                r" at (\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})",
                "%Y-%m-%d %H:%M:%S",
            ),
            other => Err(LogpulseError::UnknownFormat(other.to_string())),
        }
    }

    fn new(name: &str, pattern: &str, time_format: &'static str) -> Result<Self, LogpulseError> {
        let pattern = Regex::new(pattern)
            .map_err(|e| LogpulseError::Config(format!("bad pattern for format {name}: {e}")))?;
        Ok(Self {
            name: name.to_string(),
            pattern,
            time_format,
        })
    }

    pub fn format_name(&self) -> &str {
        &self.name
    }

    /// Extract the line's timestamp, or `None` when the line does not match.
    ///
    /// A non-matching line is never an error: unparsable lines are the
    /// caller's accounting concern.
    pub fn parse_line(&self, line: &str) -> Option<DateTime<Utc>> {
        let caps = self.pattern.captures(line)?;
        let stamp = caps.get(1)?.as_str();
        match caps.get(2) {
            Some(offset) => {
                let with_zone = format!("{} {}", stamp, offset.as_str());
                let zone_format = format!("{} %z", self.time_format);
                DateTime::parse_from_str(&with_zone, &zone_format)
                    .ok()
                    .map(|t| t.with_timezone(&Utc))
            }
            None => NaiveDateTime::parse_from_str(stamp, self.time_format)
                .ok()
                .map(|t| t.and_utc()),
        }
    }
}
