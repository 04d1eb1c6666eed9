//! Debounced once-daily trigger for the full-window analysis pass.
//!
//! Not a precise scheduler: the external invoker calls in every few
//! minutes, and the gate decides whether this particular call crosses
//! the daily boundary. Crash-safety comes from advancing
//! `last_summary_time` before the analysis runs, so a failing analysis
//! is not retried until the next qualifying day.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use tracing::debug;

use logpulse_core::{LogpulseError, StateStore, LAST_SUMMARY_TIME};

/// Window size for a normal daily pass.
const FULL_WINDOW_HOURS: i64 = 24;

/// Firings closer together than this get a forced 24h window, so jittery
/// trigger times never shrink coverage below a full day.
const MIN_WINDOW_HOURS: i64 = 22;

/// Outcome of one gate evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateDecision {
    pub due: bool,
    /// Start of the analysis window when `due`; informational otherwise.
    pub window_start: DateTime<Utc>,
}

/// Once-daily gate keyed on a configured time-of-day.
///
/// State contract: reads `last_summary_time` once per evaluation; writes
/// it when seeding (first-ever run) and when firing. All calendar
/// arithmetic is UTC.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleGate {
    run_at: NaiveTime,
}

impl ScheduleGate {
    pub fn new(run_at: NaiveTime) -> Self {
        Self { run_at }
    }

    /// Parse an `HH:MM` trigger time.
    pub fn parse(spec: &str) -> Result<Self, LogpulseError> {
        NaiveTime::parse_from_str(spec.trim(), "%H:%M")
            .map(Self::new)
            .map_err(|e| LogpulseError::Config(format!("bad report time {spec:?}: {e}")))
    }

    /// Decide whether the daily window is due at `now`.
    ///
    /// First-ever call seeds `last_summary_time` to `now - 24h` and never
    /// fires. After that the gate fires on the first call at or past the
    /// trigger time whose stored day differs from today's, and on firing
    /// persists `now` immediately.
    pub fn evaluate<S: StateStore>(
        &self,
        store: &mut S,
        now: DateTime<Utc>,
    ) -> Result<GateDecision, LogpulseError> {
        let Some(last) = store.get(LAST_SUMMARY_TIME) else {
            let seed = now - Duration::hours(FULL_WINDOW_HOURS);
            store.set(LAST_SUMMARY_TIME, seed)?;
            debug!(seed = %seed, "summary schedule seeded");
            return Ok(GateDecision {
                due: false,
                window_start: seed,
            });
        };

        if now.time() < self.run_at || last.date_naive() == now.date_naive() {
            return Ok(GateDecision {
                due: false,
                window_start: last,
            });
        }

        // Advanced before the analysis runs: a failed pass must not turn
        // into a retry storm within the same day.
        store.set(LAST_SUMMARY_TIME, now)?;

        let window_start = if now - last < Duration::hours(MIN_WINDOW_HOURS) {
            now - Duration::hours(FULL_WINDOW_HOURS)
        } else {
            last
        };

        Ok(GateDecision {
            due: true,
            window_start,
        })
    }
}
