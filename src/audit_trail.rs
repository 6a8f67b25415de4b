//! Append-only JSONL audit trail of actor-initiated state changes.
//!
//! Trail entries are machine-parseable with:
//! - Monotonic sequence numbers for ordering
//! - ISO 8601 timestamps with microsecond precision
//! - Actor, action and target fields for correlation
//!
//! Recording is best-effort: a trail write failure must never fail the
//! state change it describes, so errors are logged and swallowed.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Append-only recorder writing one JSON object per line.
pub struct AuditTrailRecorder {
    seq: AtomicU64,
    trail_file: Mutex<File>,
    trail_path: PathBuf,
}

/// A single audit-trail entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailEntry {
    /// Monotonic sequence number, unique within the process.
    pub seq: u64,
    /// ISO 8601 timestamp with microseconds.
    pub ts: String,
    /// Who performed the action, if known.
    pub actor: Option<String>,
    /// What happened, e.g. "plan.submitted".
    pub action: String,
    /// The entity the action touched, e.g. a plan id.
    pub target: String,
    /// Structured action detail.
    pub payload: Value,
}

impl AuditTrailRecorder {
    /// Opens (or creates) the trail file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the
    /// file cannot be opened.
    pub fn new(trail_path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = trail_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(trail_path)?;

        Ok(Self {
            seq: AtomicU64::new(0),
            trail_file: Mutex::new(file),
            trail_path: trail_path.to_path_buf(),
        })
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Records a trail entry. Thread-safe and best-effort.
    pub fn record(
        &self,
        actor: Option<&str>,
        action: &str,
        target: &str,
        payload: impl Serialize,
    ) {
        let entry = TrailEntry {
            seq: self.next_seq(),
            ts: Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
            actor: actor.map(String::from),
            action: action.to_string(),
            target: target.to_string(),
            payload: serde_json::to_value(payload).unwrap_or(Value::Null),
        };

        match self.trail_file.lock() {
            Ok(mut file) => match serde_json::to_string(&entry) {
                Ok(line) => {
                    if let Err(e) = writeln!(file, "{}", line) {
                        tracing::warn!("audit trail write failed: {}", e);
                        return;
                    }
                    if let Err(e) = file.flush() {
                        tracing::warn!("audit trail flush failed: {}", e);
                    }
                }
                Err(e) => tracing::warn!("audit trail serialization failed: {}", e),
            },
            Err(e) => tracing::warn!("audit trail lock poisoned: {}", e),
        }
    }

    /// Returns the path to the trail file.
    pub fn path(&self) -> &PathBuf {
        &self.trail_path
    }
}

#[cfg(test)]
#[path = "tests/audit_trail_tests.rs"]
mod tests;
