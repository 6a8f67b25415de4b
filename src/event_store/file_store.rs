//! Per-plan event log on disk.
//!
//! Every plan owns one JSONL event log and one JSON snapshot, and a store
//! instance is bound to a single `PlanId` at construction, so a log never
//! mixes streams. Commits take an exclusive file lock and re-check the last
//! logged sequence before appending; snapshots are written atomically via
//! temp file + rename.

use crate::domain::errors::DomainError;
use crate::domain::plan::{PlanAggregate, PlanEvent};
use crate::domain::types::{PlanId, TimestampUtc};
use async_trait::async_trait;
use cqrs_es::{
    Aggregate, AggregateContext, AggregateError, DomainEvent, EventEnvelope, EventStore,
};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// One line of a plan's event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    pub plan_id: PlanId,
    pub sequence: u64,
    pub recorded_at: TimestampUtc,
    pub event_type: String,
    pub event_version: String,
    pub event: PlanEvent,
    pub metadata: HashMap<String, String>,
}

impl StoredEvent {
    /// Rejects lines whose recorded type or version disagrees with the
    /// deserialized event.
    fn verify(&self) -> Result<(), AggregateError<DomainError>> {
        if self.event_type != self.event.event_type()
            || self.event_version != self.event.event_version()
        {
            return Err(infra(std::io::Error::new(
                ErrorKind::InvalidData,
                format!("event type/version mismatch at sequence {}", self.sequence),
            )));
        }
        Ok(())
    }
}

/// Rehydrated plan state persisted at a log sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSnapshot {
    pub plan_id: PlanId,
    pub sequence: u64,
    pub snapshot_at: TimestampUtc,
    pub state: PlanAggregate,
}

/// Event store bound to one plan's log and snapshot files.
#[derive(Debug, Clone)]
pub struct FileEventStore {
    plan_id: PlanId,
    log_path: PathBuf,
    snapshot_path: PathBuf,
    snapshot_every: u64,
}

/// Plan state handed from `load_aggregate` to `commit`.
pub struct PlanStreamContext {
    pub plan_id: PlanId,
    pub aggregate: PlanAggregate,
    pub current_sequence: u64,
}

impl AggregateContext<PlanAggregate> for PlanStreamContext {
    fn aggregate(&self) -> &PlanAggregate {
        &self.aggregate
    }
}

impl FileEventStore {
    /// Creates a store for one plan's log and snapshot paths.
    pub fn new(
        plan_id: PlanId,
        log_path: PathBuf,
        snapshot_path: PathBuf,
        snapshot_every: u64,
    ) -> Self {
        Self {
            plan_id,
            log_path,
            snapshot_path,
            snapshot_every,
        }
    }

    /// Store with the standard per-plan layout: `events.jsonl` and
    /// `snapshot.json` inside the plan directory.
    pub fn in_dir(plan_id: PlanId, dir: &Path, snapshot_every: u64) -> Self {
        Self::new(
            plan_id,
            dir.join("events.jsonl"),
            dir.join("snapshot.json"),
            snapshot_every,
        )
    }

    /// The plan this store is bound to.
    pub fn plan_id(&self) -> &PlanId {
        &self.plan_id
    }

    fn ensure_stream(&self, aggregate_id: &str) -> Result<(), AggregateError<DomainError>> {
        if self.plan_id.to_string() != aggregate_id {
            return Err(infra(std::io::Error::new(
                ErrorKind::InvalidInput,
                format!(
                    "store is bound to plan {}, not {}",
                    self.plan_id, aggregate_id
                ),
            )));
        }
        Ok(())
    }

    /// Parses and verifies the whole log. The caller holds the file lock.
    fn read_log(&self, file: File) -> Result<Vec<StoredEvent>, AggregateError<DomainError>> {
        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for line in reader.lines() {
            let line = line.map_err(infra)?;
            let stored: StoredEvent = serde_json::from_str(&line).map_err(corrupt)?;
            stored.verify()?;
            if stored.plan_id != self.plan_id {
                return Err(infra(std::io::Error::new(
                    ErrorKind::InvalidData,
                    format!(
                        "log for plan {} contains an entry for plan {}",
                        self.plan_id, stored.plan_id
                    ),
                )));
            }
            records.push(stored);
        }

        Ok(records)
    }

    fn read_snapshot(&self) -> Result<Option<StoredSnapshot>, AggregateError<DomainError>> {
        let content = match std::fs::read_to_string(&self.snapshot_path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(infra(e)),
        };

        let snapshot: StoredSnapshot = serde_json::from_str(&content).map_err(corrupt)?;
        if snapshot.plan_id != self.plan_id {
            return Ok(None);
        }
        Ok(Some(snapshot))
    }

    /// Writes the snapshot via temp file + rename so readers never observe
    /// a partial file.
    fn write_snapshot(&self, snapshot: &StoredSnapshot) -> Result<(), AggregateError<DomainError>> {
        if let Some(parent) = self.snapshot_path.parent() {
            std::fs::create_dir_all(parent).map_err(infra)?;
        }

        let content = serde_json::to_string(snapshot).map_err(infra)?;
        let tmp_path = self.snapshot_path.with_extension("json.tmp");
        std::fs::write(&tmp_path, content).map_err(infra)?;
        std::fs::rename(&tmp_path, &self.snapshot_path).map_err(infra)?;
        Ok(())
    }
}

#[async_trait]
impl EventStore<PlanAggregate> for FileEventStore {
    type AC = PlanStreamContext;

    async fn load_events(
        &self,
        aggregate_id: &str,
    ) -> Result<Vec<EventEnvelope<PlanAggregate>>, AggregateError<DomainError>> {
        self.ensure_stream(aggregate_id)?;

        let file = match File::open(&self.log_path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(infra(e)),
        };
        file.lock_shared().map_err(infra)?;

        let envelopes: Vec<EventEnvelope<PlanAggregate>> = self
            .read_log(file)?
            .into_iter()
            .map(|stored| EventEnvelope {
                aggregate_id: stored.plan_id.to_string(),
                sequence: stored.sequence as usize,
                payload: stored.event,
                metadata: stored.metadata,
            })
            .collect();

        Ok(envelopes)
    }

    async fn load_aggregate(
        &self,
        aggregate_id: &str,
    ) -> Result<Self::AC, AggregateError<DomainError>> {
        self.ensure_stream(aggregate_id)?;

        let mut aggregate = PlanAggregate::default();
        let mut current_sequence = 0u64;

        // Snapshot first, then replay whatever the log holds beyond it.
        if let Some(snapshot) = self.read_snapshot()? {
            aggregate = snapshot.state;
            current_sequence = snapshot.sequence;
        }

        for event in self.load_events(aggregate_id).await? {
            let seq = event.sequence as u64;
            if seq > current_sequence {
                current_sequence = seq;
                aggregate.apply(event.payload);
            }
        }

        Ok(PlanStreamContext {
            plan_id: self.plan_id.clone(),
            aggregate,
            current_sequence,
        })
    }

    async fn commit(
        &self,
        events: Vec<PlanEvent>,
        context: Self::AC,
        metadata: HashMap<String, String>,
    ) -> Result<Vec<EventEnvelope<PlanAggregate>>, AggregateError<DomainError>> {
        if events.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(parent) = self.log_path.parent() {
            std::fs::create_dir_all(parent).map_err(infra)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.log_path)
            .map_err(infra)?;
        file.lock_exclusive().map_err(infra)?;

        let PlanStreamContext {
            plan_id,
            mut aggregate,
            current_sequence,
        } = context;

        // A concurrent writer moved the log past this context.
        if last_logged_sequence(&file)? != current_sequence {
            return Err(AggregateError::AggregateConflict);
        }

        let id_str = plan_id.to_string();
        let mut sequence = current_sequence;
        let mut envelopes: Vec<EventEnvelope<PlanAggregate>> = Vec::with_capacity(events.len());

        for event in events {
            sequence += 1;

            let record = StoredEvent {
                plan_id: plan_id.clone(),
                sequence,
                recorded_at: TimestampUtc::now(),
                event_type: event.event_type(),
                event_version: event.event_version(),
                event: event.clone(),
                metadata: metadata.clone(),
            };
            let line = serde_json::to_string(&record).map_err(infra)?;
            writeln!(file, "{}", line).map_err(infra)?;

            envelopes.push(EventEnvelope {
                aggregate_id: id_str.clone(),
                sequence: sequence as usize,
                payload: event,
                metadata: metadata.clone(),
            });
        }

        file.flush().map_err(infra)?;
        file.sync_all().map_err(infra)?;

        // Roll the aggregate forward for a potential snapshot.
        for envelope in &envelopes {
            aggregate.apply(envelope.payload.clone());
        }

        if should_snapshot(sequence, self.snapshot_every) {
            self.write_snapshot(&StoredSnapshot {
                plan_id,
                sequence,
                snapshot_at: TimestampUtc::now(),
                state: aggregate,
            })?;
        }

        Ok(envelopes)
    }
}

fn infra<E>(err: E) -> AggregateError<DomainError>
where
    E: std::error::Error + Send + Sync + 'static,
{
    AggregateError::UnexpectedError(Box::new(err))
}

fn corrupt(err: serde_json::Error) -> AggregateError<DomainError> {
    AggregateError::DeserializationError(Box::new(err))
}

/// Sequence of the last log line, read through a rewound clone of the
/// locked handle. The log is single-plan, so no per-stream filtering.
fn last_logged_sequence(file: &File) -> Result<u64, AggregateError<DomainError>> {
    #[derive(Deserialize)]
    struct SeqOnly {
        sequence: u64,
    }

    let mut reader = BufReader::new(file.try_clone().map_err(infra)?);
    reader.seek(SeekFrom::Start(0)).map_err(infra)?;

    let mut last = 0u64;
    for line in reader.lines() {
        let line = line.map_err(infra)?;
        let parsed: SeqOnly = serde_json::from_str(&line).map_err(corrupt)?;
        last = parsed.sequence;
    }
    Ok(last)
}

/// Determines if a snapshot should be taken based on sequence and threshold.
fn should_snapshot(sequence: u64, snapshot_every: u64) -> bool {
    if snapshot_every == 0 {
        return false;
    }
    sequence.is_multiple_of(snapshot_every)
}

#[cfg(test)]
#[path = "tests/file_store_tests.rs"]
mod tests;
