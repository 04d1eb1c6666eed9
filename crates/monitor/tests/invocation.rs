//! Integration tests driving a whole monitor invocation: rate check,
//! schedule gate, window seek, analysis, and summary rendering together.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tempfile::NamedTempFile;

use logpulse_core::{
    Config, LogpulseError, MemoryStateStore, StateStore, LAST_REQUEST_TIME, LAST_SUMMARY_TIME,
};
use logpulse_monitor::analysis::{AnalysisEngine, AnalysisRequest, CommandEngine};
use logpulse_monitor::runner::Monitor;

// ── Fixtures ────────────────────────────────────────────────────────

fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 7, d, h, m, 0).unwrap()
}

fn common_line(d: u32, h: u32, m: u32) -> String {
    format!("10.0.0.1 - - [{d:02}/Jul/2026:{h:02}:{m:02}:00 +0000] \"GET / HTTP/1.1\" 200 99")
}

fn log_with(lines: &[String]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file.flush().unwrap();
    file
}

fn config_for(log: &NamedTempFile) -> Config {
    Config {
        log_path: log.path().to_path_buf(),
        format: "common".to_string(),
        report_time: "23:45".to_string(),
        state_path: PathBuf::from("unused-in-tests.json"),
        analyzer: None,
        report_dir: None,
    }
}

/// Test engine that records how often it ran and reads the segment.
struct RecordingEngine {
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl AnalysisEngine for RecordingEngine {
    fn analyze(&self, request: AnalysisRequest) -> Result<String, LogpulseError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(LogpulseError::Analysis("engine exploded".to_string()));
        }
        let mut body = String::new();
        use std::io::Read;
        let mut source = request.source;
        source.read_to_string(&mut body).map_err(LogpulseError::Io)?;
        Ok(format!("segment of {} bytes:\n{body}", body.len()))
    }

    fn describe(&self) -> String {
        "recording-engine".to_string()
    }
}

// ── Rate path ───────────────────────────────────────────────────────

#[test]
fn first_invocation_never_counts_history() {
    // Ten requests 10:01 through 10:10, one per minute.
    let lines: Vec<String> = (1..=10).map(|m| common_line(1, 10, m)).collect();
    let log = log_with(&lines);

    let mut monitor =
        Monitor::new(config_for(&log), MemoryStateStore::new(), None).unwrap();
    let outcome = monitor.run_once(at(1, 10, 11)).unwrap();

    assert_eq!(outcome.metrics.request_rate, "0.00");
    assert_eq!(monitor.store().get(LAST_REQUEST_TIME), Some(at(1, 10, 10)));
}

#[test]
fn appended_line_is_counted_exactly_once() {
    let lines: Vec<String> = (1..=10).map(|m| common_line(1, 10, m)).collect();
    let mut log = log_with(&lines);

    let mut monitor =
        Monitor::new(config_for(&log), MemoryStateStore::new(), None).unwrap();
    monitor.run_once(at(1, 10, 11)).unwrap();

    writeln!(log, "{}", common_line(1, 10, 11)).unwrap();
    log.flush().unwrap();

    // One new request over the 2 minutes since the 10:10 watermark.
    let outcome = monitor.run_once(at(1, 10, 12)).unwrap();
    assert_eq!(outcome.metrics.request_rate, "0.50");

    // And it is not counted again.
    let outcome = monitor.run_once(at(1, 10, 13)).unwrap();
    assert_eq!(outcome.metrics.request_rate, "0.00");
}

#[test]
fn missing_log_is_fatal_and_leaves_state_alone() {
    let log = log_with(&[]);
    let mut config = config_for(&log);
    config.log_path = PathBuf::from("/nonexistent/access.log");

    let mut store = MemoryStateStore::new();
    store.set(LAST_REQUEST_TIME, at(1, 10, 0)).unwrap();

    let mut monitor = Monitor::new(config, store, None).unwrap();
    let err = monitor.run_once(at(1, 10, 5)).unwrap_err();

    assert!(matches!(err, LogpulseError::Io(_)));
    assert_eq!(monitor.store().get(LAST_REQUEST_TIME), Some(at(1, 10, 0)));
    assert_eq!(monitor.store().get(LAST_SUMMARY_TIME), None);
}

#[test]
fn empty_log_path_is_rejected_at_construction() {
    let log = log_with(&[]);
    let mut config = config_for(&log);
    config.log_path = PathBuf::new();

    let err = Monitor::new(config, MemoryStateStore::new(), None).unwrap_err();
    assert!(matches!(err, LogpulseError::Config(_)));
}

// ── Daily analysis path ─────────────────────────────────────────────

#[test]
fn due_gate_analyzes_only_the_window_segment() {
    let log = log_with(&[
        common_line(1, 10, 0),
        common_line(2, 9, 0),
        common_line(2, 23, 50),
    ]);

    let calls = Arc::new(AtomicUsize::new(0));
    let engine = RecordingEngine {
        calls: calls.clone(),
        fail: false,
    };

    let mut store = MemoryStateStore::new();
    store.set(LAST_SUMMARY_TIME, at(1, 23, 45)).unwrap();

    let mut monitor =
        Monitor::new(config_for(&log), store, Some(Box::new(engine))).unwrap();
    let outcome = monitor.run_once(at(2, 23, 55)).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let summary = outcome.summary.expect("summary rendered");
    assert!(outcome.analysis_error.is_none());

    // Header from the renderer, body from the engine, and only the two
    // lines inside the window (after day-1 23:45).
    assert!(summary.contains("Daily request summary"));
    assert!(summary.contains("recording-engine"));
    assert!(summary.contains("02/Jul/2026:09:00:00"));
    assert!(summary.contains("02/Jul/2026:23:50:00"));
    assert!(!summary.contains("01/Jul/2026:10:00:00"));
}

#[test]
fn analysis_failure_is_isolated_and_not_retried_same_day() {
    let log = log_with(&[common_line(2, 9, 0)]);

    let calls = Arc::new(AtomicUsize::new(0));
    let engine = RecordingEngine {
        calls: calls.clone(),
        fail: true,
    };

    let mut store = MemoryStateStore::new();
    store.set(LAST_SUMMARY_TIME, at(1, 23, 45)).unwrap();

    let mut monitor =
        Monitor::new(config_for(&log), store, Some(Box::new(engine))).unwrap();

    let now = at(2, 23, 50);
    let outcome = monitor.run_once(now).unwrap();

    // The rate result stands; the failure is reported, not raised.
    assert_eq!(outcome.metrics.lines_scanned, 1);
    assert!(outcome.summary.is_none());
    assert!(outcome
        .analysis_error
        .as_deref()
        .unwrap()
        .contains("engine exploded"));

    // The schedule advanced before the attempt: no retry this day.
    assert_eq!(monitor.store().get(LAST_SUMMARY_TIME), Some(now));
    let outcome = monitor.run_once(at(2, 23, 55)).unwrap();
    assert!(outcome.analysis_error.is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn due_gate_without_analyzer_still_advances_the_schedule() {
    let log = log_with(&[common_line(2, 9, 0)]);

    let mut store = MemoryStateStore::new();
    store.set(LAST_SUMMARY_TIME, at(1, 23, 45)).unwrap();

    let mut monitor = Monitor::new(config_for(&log), store, None).unwrap();
    let now = at(2, 23, 50);
    let outcome = monitor.run_once(now).unwrap();

    assert!(outcome.summary.is_none());
    assert!(outcome.analysis_error.is_none());
    assert_eq!(monitor.store().get(LAST_SUMMARY_TIME), Some(now));
}

#[test]
fn subprocess_engine_end_to_end() {
    let log = log_with(&[common_line(1, 10, 0), common_line(2, 9, 0)]);

    let mut store = MemoryStateStore::new();
    store.set(LAST_SUMMARY_TIME, at(1, 23, 45)).unwrap();

    let engine = CommandEngine::from_command_line("cat").unwrap();
    let mut monitor =
        Monitor::new(config_for(&log), store, Some(Box::new(engine))).unwrap();

    let outcome = monitor.run_once(at(2, 23, 50)).unwrap();
    let summary = outcome.summary.expect("summary rendered");

    assert!(summary.contains("Analyzer: cat"));
    assert!(summary.contains("02/Jul/2026:09:00:00"));
    assert!(!summary.contains("01/Jul/2026:10:00:00"));
}
