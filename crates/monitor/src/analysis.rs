//! The delegated full-window analyzer seam.
//!
//! The monitor never parses the full log format itself; it hands a
//! forward-positioned window segment to an [`AnalysisEngine`] and treats
//! the returned body as opaque. The production engine shells out to a
//! configured command with the segment on stdin.

use std::fs::File;
use std::process::{Command, Stdio};

use chrono::{DateTime, Utc};

use logpulse_core::LogpulseError;

/// One analysis request: the window bounds plus a handle already
/// positioned at the window start (reads forward to end-of-file).
pub struct AnalysisRequest {
    pub format: String,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub source: File,
}

pub trait AnalysisEngine {
    /// Produce the report body for the given window segment.
    fn analyze(&self, request: AnalysisRequest) -> Result<String, LogpulseError>;

    /// Human-readable description of the engine invocation, used in the
    /// summary header.
    fn describe(&self) -> String;
}

// ── Subprocess engine ───────────────────────────────────────────────

/// Runs an external analyzer command with the window segment piped to
/// its stdin; stdout becomes the report body.
#[derive(Debug)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
}

impl CommandEngine {
    /// Split a command line on whitespace; the first token is the
    /// program. Quoting is not interpreted.
    pub fn from_command_line(command: &str) -> Result<Self, LogpulseError> {
        let mut parts = command.split_whitespace().map(String::from);
        let program = parts
            .next()
            .ok_or_else(|| LogpulseError::Config("empty analyzer command".to_string()))?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl AnalysisEngine for CommandEngine {
    fn analyze(&self, request: AnalysisRequest) -> Result<String, LogpulseError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::from(request.source))
            .output()
            .map_err(|e| {
                LogpulseError::Analysis(format!("failed to run {}: {e}", self.program))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LogpulseError::Analysis(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn describe(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}
