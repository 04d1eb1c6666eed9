//! Watermark-based request-rate accounting over the live log tail.
//!
//! Reads `last_request_time`, scans the log backward until it crosses
//! that watermark, and advances the watermark to the newest timestamp it
//! saw. For non-decreasing log timestamps, consecutive invocations
//! attribute disjoint, jointly exhaustive line sets: nothing is counted
//! twice, nothing is skipped.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use logpulse_core::{LogpulseError, StateStore, TimestampParser, LAST_REQUEST_TIME};
use logpulse_tail::ReverseLineReader;

/// Seed lookback for the very first run, when no watermark exists yet.
const FIRST_RUN_LOOKBACK_SECS: i64 = 60;

/// Floor for the rate interval. Sub-second gaps would produce absurd
/// per-minute rates.
const MIN_INTERVAL_SECS: i64 = 1;

/// Ephemeral result of one rate observation. Not persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSample {
    /// Lines newer than the watermark.
    pub request_count: u64,
    /// Every line visited during the scan, parsable or not.
    pub lines_scanned: u64,
    pub interval_minutes: f64,
    /// Requests per minute over the interval.
    pub rate: f64,
}

/// Counts requests appended since the previous invocation.
///
/// State contract: reads `last_request_time` once at the start of
/// `observe`, writes it once after a clean scan. A read failure leaves
/// the store untouched, so the next invocation retries the same span.
pub struct RateTracker<'p> {
    parser: &'p TimestampParser,
}

impl<'p> RateTracker<'p> {
    pub fn new(parser: &'p TimestampParser) -> Self {
        Self { parser }
    }

    pub fn observe<S: StateStore>(
        &self,
        log: &Path,
        store: &mut S,
        now: DateTime<Utc>,
    ) -> Result<RateSample, LogpulseError> {
        let watermark = store
            .get(LAST_REQUEST_TIME)
            .unwrap_or_else(|| now - Duration::seconds(FIRST_RUN_LOOKBACK_SECS));

        let mut request_count = 0u64;
        let mut lines_scanned = 0u64;
        let mut newest_seen: Option<DateTime<Utc>> = None;

        for line in ReverseLineReader::open(log)? {
            let line = line?;
            lines_scanned += 1;
            let Some(t) = self.parser.parse_line(&line) else {
                continue;
            };
            if newest_seen.is_none() {
                newest_seen = Some(t);
            }
            if t > watermark {
                request_count += 1;
            } else {
                // Reverse order: every earlier line is also at or below
                // the watermark.
                break;
            }
        }

        let elapsed = now - watermark;
        let interval = elapsed.max(Duration::seconds(MIN_INTERVAL_SECS));
        let interval_minutes = interval.num_milliseconds() as f64 / 60_000.0;
        let rate = request_count as f64 / interval_minutes;

        // Only after a clean scan: a read failure above must not advance
        // the watermark.
        store.set(LAST_REQUEST_TIME, newest_seen.unwrap_or(now))?;

        info!(request_count, lines_scanned, rate, "request rate sampled");

        Ok(RateSample {
            request_count,
            lines_scanned,
            interval_minutes,
            rate,
        })
    }
}
