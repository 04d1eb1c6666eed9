//! monitor-worker — one batch check over an access log.
//!
//! Meant to be invoked every few minutes by an external scheduler (cron,
//! a systemd timer, a monitoring agent). Each run prints the recent
//! request rate as a JSON metrics line and, at most once per day, hands
//! the accumulated log window to the configured analyzer.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::info;

use logpulse_core::{config, Config, FileStateStore};
use logpulse_monitor::analysis::{AnalysisEngine, CommandEngine};
use logpulse_monitor::runner::Monitor;

// ── CLI ─────────────────────────────────────────────────────────────

/// Incremental access-log monitor: request-rate check plus once-daily
/// full-window analysis.
#[derive(Parser, Debug)]
#[command(name = "monitor-worker", version, about)]
struct Cli {
    /// Path to the access log to monitor.
    #[arg(long, env = "LOGPULSE_LOG")]
    log: Option<PathBuf>,

    /// Timestamp extraction format ("common", "rails").
    #[arg(long, env = "LOGPULSE_FORMAT", default_value = "common")]
    format: String,

    /// Daily analysis trigger time-of-day, HH:MM.
    #[arg(long, env = "LOGPULSE_REPORT_TIME", default_value = "23:45")]
    report_time: String,

    /// Persisted state file.
    #[arg(long, env = "LOGPULSE_STATE", default_value = "data/monitor-state.json")]
    state: PathBuf,

    /// External analyzer command; receives the window segment on stdin.
    #[arg(long, env = "LOGPULSE_ANALYZER")]
    analyzer: Option<String>,

    /// Directory for daily summary artifacts (stdout when unset).
    #[arg(long, env = "LOGPULSE_REPORT_DIR")]
    report_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    config::load_dotenv();
    let cli = Cli::parse();

    let config = Config {
        log_path: cli.log.unwrap_or_default(),
        format: cli.format,
        report_time: cli.report_time,
        state_path: cli.state,
        analyzer: cli.analyzer,
        report_dir: cli.report_dir,
    };
    config.validate()?;
    config.log_summary();

    let store = FileStateStore::open(&config.state_path)
        .with_context(|| format!("opening state store {}", config.state_path.display()))?;
    let engine: Option<Box<dyn AnalysisEngine>> = match &config.analyzer {
        Some(command) => Some(Box::new(CommandEngine::from_command_line(command)?)),
        None => None,
    };

    let now = Utc::now();
    let mut monitor = Monitor::new(config.clone(), store, engine)?;
    let outcome = monitor
        .run_once(now)
        .context("monitor invocation failed")?;

    println!("{}", serde_json::to_string(&outcome.metrics)?);

    if let Some(doc) = &outcome.summary {
        match &config.report_dir {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                let path = dir.join(format!("summary-{}.txt", now.format("%Y-%m-%d")));
                fs::write(&path, doc)?;
                info!(path = %path.display(), "daily summary written");
            }
            None => println!("{doc}"),
        }
    }

    Ok(())
}
