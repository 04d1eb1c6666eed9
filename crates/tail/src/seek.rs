//! Window-start location without a full-file scan.
//!
//! Walks the log backward from its end and stops as soon as it crosses
//! below the target timestamp, so the cost is bounded by the gap since
//! the last trigger rather than the whole history.

use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::debug;

use logpulse_core::{LogpulseError, TimestampParser};

use crate::reverse::ReverseLineReader;

/// A forward-readable handle positioned at the start of an analysis
/// window, plus the offset it was positioned at (for logging).
pub struct WindowStart {
    pub file: File,
    pub offset: u64,
}

/// Locates the byte offset where a target timestamp begins.
///
/// The parser is injected: the window format may key off a different
/// textual marker than the live-tail format (a "Processing ... at" line
/// rather than a raw request line).
pub struct LogWindowSeeker<'p> {
    parser: &'p TimestampParser,
}

impl<'p> LogWindowSeeker<'p> {
    pub fn new(parser: &'p TimestampParser) -> Self {
        Self { parser }
    }

    /// Open `path` positioned at the first line whose timestamp is at or
    /// after `target`.
    ///
    /// Reverse-scans from the end: every parsed timestamp `>= target`
    /// updates the best-known start offset; the first parsed timestamp
    /// `< target` ends the scan. When nothing qualifies (target predates
    /// all data, or no line parses) the offset is 0 and the handle reads
    /// the whole file.
    pub fn open_window(
        &self,
        path: &Path,
        target: DateTime<Utc>,
    ) -> Result<WindowStart, LogpulseError> {
        let mut reader = ReverseLineReader::open(path)?;
        let mut best: Option<u64> = None;

        while let Some(line) = reader.next() {
            let line = line?;
            let Some(t) = self.parser.parse_line(&line) else {
                continue;
            };
            if t >= target {
                best = Some(reader.offset());
            } else {
                break;
            }
        }

        let offset = best.unwrap_or(0);
        debug!(offset, target = %target, "window start located");

        let mut file = File::open(path)?;
        file.seek(SeekFrom::Start(offset))?;
        Ok(WindowStart { file, offset })
    }
}
