use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::LogpulseError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

// ── Monitor config ────────────────────────────────────────────

/// Resolved configuration for one monitor invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the access log being monitored.
    pub log_path: PathBuf,
    /// Timestamp extraction format name ("common", "rails").
    pub format: String,
    /// Daily trigger time-of-day, "HH:MM".
    pub report_time: String,
    /// Persisted state file (JSON key-value).
    pub state_path: PathBuf,
    /// External analyzer command; the daily pass is skipped when unset.
    pub analyzer: Option<String>,
    /// Directory for daily summary artifacts; stdout when unset.
    pub report_dir: Option<PathBuf>,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            log_path: PathBuf::from(env_or("LOGPULSE_LOG", "")),
            format: env_or("LOGPULSE_FORMAT", "common"),
            report_time: env_or("LOGPULSE_REPORT_TIME", "23:45"),
            state_path: PathBuf::from(env_or("LOGPULSE_STATE", "data/monitor-state.json")),
            analyzer: env_opt("LOGPULSE_ANALYZER"),
            report_dir: env_opt("LOGPULSE_REPORT_DIR").map(PathBuf::from),
        }
    }

    /// Reject configurations that cannot produce a scan at all.
    ///
    /// The log path is the only required option; everything else has a
    /// usable default.
    pub fn validate(&self) -> Result<(), LogpulseError> {
        if self.log_path.as_os_str().is_empty() {
            return Err(LogpulseError::Config(
                "log path is required (--log / LOGPULSE_LOG)".to_string(),
            ));
        }
        Ok(())
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  log:         {}", self.log_path.display());
        tracing::info!("  format:      {}", self.format);
        tracing::info!("  report_time: {}", self.report_time);
        tracing::info!("  state:       {}", self.state_path.display());
        tracing::info!(
            "  analyzer:    {}",
            self.analyzer.as_deref().unwrap_or("(none)")
        );
        tracing::info!(
            "  report_dir:  {}",
            self.report_dir
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(stdout)".to_string())
        );
    }
}
