//! Durable key-value state surviving across invocations.
//!
//! The monitor's memory between runs is two timestamps. The store is an
//! explicit dependency injected into the rate tracker and the schedule
//! gate, never a process-wide singleton; each component documents which
//! keys it reads and writes.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::LogpulseError;

/// Watermark below which all log lines have been accounted for.
/// Read and written by the rate tracker, once per invocation.
pub const LAST_REQUEST_TIME: &str = "last_request_time";

/// Instant of the last daily summary trigger.
/// Read and written by the schedule gate, at most once per calendar day.
pub const LAST_SUMMARY_TIME: &str = "last_summary_time";

/// Key-value interface over the persisted timestamps.
pub trait StateStore {
    fn get(&self, key: &str) -> Option<DateTime<Utc>>;

    /// Persist a value durably before returning.
    fn set(&mut self, key: &str, value: DateTime<Utc>) -> Result<(), LogpulseError>;
}

// ── File-backed store ─────────────────────────────────────────

/// JSON file store: `{ "key": "RFC 3339 timestamp", ... }`.
///
/// The whole map is read once at open and rewritten atomically
/// (temp file + rename) on every `set`.
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    entries: BTreeMap<String, DateTime<Utc>>,
}

impl FileStateStore {
    /// Open the store, creating an empty one if the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LogpulseError> {
        let path = path.into();
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str(&raw).map_err(|e| {
                LogpulseError::State(format!("corrupt state file {}: {e}", path.display()))
            })?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), LogpulseError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| LogpulseError::State(format!("serialize state: {e}")))?;

        let mut tmp_path = self.path.clone().into_os_string();
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);

        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl StateStore for FileStateStore {
    fn get(&self, key: &str) -> Option<DateTime<Utc>> {
        self.entries.get(key).copied()
    }

    fn set(&mut self, key: &str, value: DateTime<Utc>) -> Result<(), LogpulseError> {
        self.entries.insert(key.to_string(), value);
        self.persist()
    }
}

// ── In-memory store ───────────────────────────────────────────

/// Volatile store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    entries: BTreeMap<String, DateTime<Utc>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    fn get(&self, key: &str) -> Option<DateTime<Utc>> {
        self.entries.get(key).copied()
    }

    fn set(&mut self, key: &str, value: DateTime<Utc>) -> Result<(), LogpulseError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}
