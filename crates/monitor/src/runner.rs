//! One invocation, start to finish.
//!
//! The rate check always runs and is fatal on failure; the daily
//! analysis phase is best-effort. By the time the analysis starts, the
//! rate tracker's watermark write and the gate's `last_summary_time`
//! advance have already been persisted, so an analysis failure is
//! logged, reported, and otherwise isolated.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use logpulse_core::{Config, LogpulseError, StateStore, TimestampParser};
use logpulse_tail::LogWindowSeeker;

use crate::analysis::{AnalysisEngine, AnalysisRequest};
use crate::gate::ScheduleGate;
use crate::rate::RateTracker;
use crate::report::{SummaryContext, SummaryRenderer};

/// Per-invocation metrics, serialized as one JSON line on stdout.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MetricsReport {
    /// Requests per minute, two fractional digits.
    pub request_rate: String,
    pub lines_scanned: u64,
}

/// Everything one invocation produced.
#[derive(Debug)]
pub struct InvocationReport {
    pub metrics: MetricsReport,
    /// Rendered daily summary, when the gate fired and analysis
    /// succeeded.
    pub summary: Option<String>,
    /// Analysis-phase failure, isolated from the metrics above.
    pub analysis_error: Option<String>,
}

/// The monitor: wiring between config, state, and the analysis engine.
pub struct Monitor<S: StateStore> {
    config: Config,
    parser: TimestampParser,
    gate: ScheduleGate,
    store: S,
    engine: Option<Box<dyn AnalysisEngine>>,
}

impl<S: StateStore + std::fmt::Debug> std::fmt::Debug for Monitor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("config", &self.config)
            .field("parser", &self.parser)
            .field("gate", &self.gate)
            .field("store", &self.store)
            .field("engine", &self.engine.as_ref().map(|_| "<engine>"))
            .finish()
    }
}

impl<S: StateStore> Monitor<S> {
    pub fn new(
        config: Config,
        store: S,
        engine: Option<Box<dyn AnalysisEngine>>,
    ) -> Result<Self, LogpulseError> {
        config.validate()?;
        let parser = TimestampParser::for_format(&config.format)?;
        let gate = ScheduleGate::parse(&config.report_time)?;
        Ok(Self {
            config,
            parser,
            gate,
            store,
            engine,
        })
    }

    /// Run one complete pass at wall-clock `now`.
    pub fn run_once(&mut self, now: DateTime<Utc>) -> Result<InvocationReport, LogpulseError> {
        let sample = RateTracker::new(&self.parser).observe(
            &self.config.log_path,
            &mut self.store,
            now,
        )?;
        let metrics = MetricsReport {
            request_rate: format!("{:.2}", sample.rate),
            lines_scanned: sample.lines_scanned,
        };

        let decision = self.gate.evaluate(&mut self.store, now)?;
        if !decision.due {
            return Ok(InvocationReport {
                metrics,
                summary: None,
                analysis_error: None,
            });
        }

        match self.run_summary(decision.window_start, now) {
            Ok(summary) => Ok(InvocationReport {
                metrics,
                summary,
                analysis_error: None,
            }),
            Err(e) => {
                // The schedule already advanced: no retry until the next
                // qualifying day, and the rate result above stands.
                error!(error = %e, "daily analysis failed");
                Ok(InvocationReport {
                    metrics,
                    summary: None,
                    analysis_error: Some(e.to_string()),
                })
            }
        }
    }

    fn run_summary(
        &self,
        window_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, LogpulseError> {
        let Some(engine) = self.engine.as_ref() else {
            warn!("daily window due but no analyzer configured, skipping");
            return Ok(None);
        };

        info!(window_start = %window_start, window_end = %now, "running daily analysis");

        let window =
            LogWindowSeeker::new(&self.parser).open_window(&self.config.log_path, window_start)?;
        let body = engine.analyze(AnalysisRequest {
            format: self.config.format.clone(),
            window_start,
            window_end: now,
            source: window.file,
        })?;

        let ctx = SummaryContext {
            log_path: self.config.log_path.display().to_string(),
            window_start: window_start.to_rfc3339(),
            window_end: now.to_rfc3339(),
            command: engine.describe(),
            body,
        };
        let doc = SummaryRenderer::new().render_default(&ctx)?;
        Ok(Some(doc))
    }

    /// State access for embedders and tests.
    pub fn store(&self) -> &S {
        &self.store
    }
}
