//! Plan actor for CQRS command handling.
//!
//! The PlanActor wraps the CQRS framework and provides a message-based
//! interface for executing commands and querying plan state. Successful
//! commands additionally record an audit-trail entry; trail recording is
//! best-effort and never fails the command.

use crate::audit_trail::AuditTrailRecorder;
use crate::domain::errors::DomainError;
use crate::domain::plan::view::{PlanEventEnvelope, PlanView};
use crate::domain::plan::{command_name, PlanAggregate, PlanCommand, PlanQuery};
use crate::domain::services::PlanServices;
use crate::domain::types::PlanId;
use crate::event_store::{FileEventStore, StoredEvent};
use crate::paths;
use anyhow::Context;
use async_trait::async_trait;
use cqrs_es::{AggregateError, CqrsFramework};
use ractor::{Actor, ActorProcessingErr, ActorRef};
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{broadcast, oneshot, watch, RwLock};

/// Messages that can be sent to the plan actor.
pub enum PlanMessage {
    /// Execute a command and return the updated view (or error).
    Command(
        Box<PlanCommand>,
        oneshot::Sender<Result<PlanView, DomainError>>,
    ),
    /// Get the current view.
    GetView(oneshot::Sender<PlanView>),
}

/// Arguments for spawning a plan actor.
#[derive(Clone)]
pub struct PlanActorArgs {
    /// The plan this actor manages.
    pub plan_id: PlanId,
    /// Path to the event log file.
    pub log_path: PathBuf,
    /// Path to the snapshot file.
    pub snapshot_path: PathBuf,
    /// Snapshot after every N events.
    pub snapshot_every: u64,
    /// Shared view for projection.
    pub view: Arc<RwLock<PlanView>>,
    /// Watch channel sender for view snapshots.
    pub snapshot_tx: watch::Sender<PlanView>,
    /// Broadcast channel sender for event streaming.
    pub event_tx: broadcast::Sender<PlanEventEnvelope>,
    /// Services for command handling.
    pub services: PlanServices,
    /// Optional audit trail for actor-initiated state changes.
    pub trail: Option<Arc<AuditTrailRecorder>>,
}

/// State maintained by the plan actor.
pub struct PlanActorState {
    /// The CQRS framework instance.
    pub cqrs: CqrsFramework<PlanAggregate, FileEventStore>,
    /// The aggregate ID.
    pub aggregate_id: String,
    /// Shared view for reading.
    pub view: Arc<RwLock<PlanView>>,
    /// Optional audit trail.
    pub trail: Option<Arc<AuditTrailRecorder>>,
}

/// The plan actor.
pub struct PlanActor;

impl PlanActor {
    /// Builds the CQRS framework from actor arguments.
    pub fn build_cqrs(args: &PlanActorArgs) -> CqrsFramework<PlanAggregate, FileEventStore> {
        let store = FileEventStore::new(
            args.plan_id.clone(),
            args.log_path.clone(),
            args.snapshot_path.clone(),
            args.snapshot_every,
        );

        let query = PlanQuery::new(
            args.view.clone(),
            args.snapshot_tx.clone(),
            args.event_tx.clone(),
        );

        CqrsFramework::new(store, vec![Box::new(query)], args.services.clone())
    }

    /// Records an audit-trail entry for a successfully applied command.
    fn record_trail(
        trail: &AuditTrailRecorder,
        aggregate_id: &str,
        command: &PlanCommand,
        view: &PlanView,
    ) {
        let actor = command_actor(command);
        let action = format!("plan.{}", command_name(command));

        // The wizard submission gets a dedicated trail entry carrying the
        // plan identity alongside the transition.
        let payload = match command {
            PlanCommand::Submit { .. } => serde_json::json!({
                "plan_id": aggregate_id,
                "fiscal_year": view.fiscal_year().map(|y| y.0),
                "status": view.status().map(|s| s.as_str()),
            }),
            _ => serde_json::json!({
                "status": view.status().map(|s| s.as_str()),
            }),
        };

        trail.record(actor.as_deref(), &action, aggregate_id, payload);
    }
}

/// Extracts the initiating actor from a command, if it carries one.
fn command_actor(command: &PlanCommand) -> Option<String> {
    match command {
        PlanCommand::CreatePlan { draft } => Some(draft.created_by.to_string()),
        PlanCommand::SubmitForReview { actor, .. }
        | PlanCommand::Approve { actor, .. }
        | PlanCommand::Reject { actor, .. }
        | PlanCommand::Baseline { actor, .. } => actor.as_ref().map(|a| a.to_string()),
        PlanCommand::Submit { actor, .. } => actor.as_ref().map(|a| a.to_string()),
        PlanCommand::DeletePlan { actor } => actor.as_ref().map(|a| a.to_string()),
        _ => None,
    }
}

#[async_trait]
impl Actor for PlanActor {
    type Msg = PlanMessage;
    type State = PlanActorState;
    type Arguments = PlanActorArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let cqrs = PlanActor::build_cqrs(&args);

        Ok(PlanActorState {
            cqrs,
            aggregate_id: args.plan_id.to_string(),
            view: args.view,
            trail: args.trail,
        })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            PlanMessage::Command(boxed_cmd, reply) => {
                let cmd = *boxed_cmd;
                let result = state.cqrs.execute(&state.aggregate_id, cmd.clone()).await;
                let view = state.view.read().await.clone();

                let mapped = match result {
                    Ok(()) => {
                        if let Some(trail) = &state.trail {
                            PlanActor::record_trail(trail, &state.aggregate_id, &cmd, &view);
                        }
                        Ok(view)
                    }
                    // A transition against a never-created plan surfaces as
                    // a missing plan, with the addressed id attached.
                    Err(AggregateError::UserError(DomainError::NotInitialized)) => {
                        Err(DomainError::not_found("plan", &state.aggregate_id))
                    }
                    Err(AggregateError::UserError(err)) => Err(err),
                    Err(AggregateError::AggregateConflict) => {
                        Err(DomainError::ConcurrencyConflict {
                            message: "plan was modified concurrently".to_string(),
                        })
                    }
                    Err(err) => Err(DomainError::Storage {
                        message: err.to_string(),
                    }),
                };

                if reply.send(mapped).is_err() {
                    tracing::debug!("Command reply channel closed");
                }
            }
            PlanMessage::GetView(reply) => {
                let view = state.view.read().await.clone();
                if reply.send(view).is_err() {
                    tracing::debug!("Command reply channel closed");
                }
            }
        }

        Ok(())
    }
}

/// Bootstraps a PlanView by replaying events from a plan's event log.
///
/// Applies every logged event for the plan to a fresh PlanView. Used when
/// reopening a plan to restore the view state from persisted events.
///
/// Returns `PlanView::default()` if the log file doesn't exist.
pub fn bootstrap_view_from_events(log_path: &Path, plan_id: &PlanId) -> PlanView {
    let mut view = PlanView::default();

    let file = match File::open(log_path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return view,
        Err(_) => return view, // Return default on any error
    };

    let reader = BufReader::new(file);
    let id_str = plan_id.to_string();
    let mut skipped_lines = 0;

    for line in reader.lines().map_while(Result::ok) {
        if let Ok(stored) = serde_json::from_str::<StoredEvent>(&line) {
            if stored.plan_id == *plan_id {
                view.apply_event(&id_str, &stored.event, stored.sequence);
            }
        } else {
            skipped_lines += 1;
        }
    }

    if skipped_lines > 0 {
        tracing::warn!("Skipped {} unparseable lines in event log", skipped_lines);
    }

    view
}

/// Helper to create actor arguments with default configuration.
///
/// Takes a plan_id and uses the paths helpers to compute the event log and
/// snapshot paths.
///
/// For an existing plan, this function bootstraps the initial PlanView by
/// replaying events from the event log. For a new plan, the view starts
/// empty and is populated when the first CreatePlan command is sent.
pub fn create_actor_args(
    plan_id: &str,
    snapshot_every: u64,
    trail: Option<Arc<AuditTrailRecorder>>,
) -> anyhow::Result<(
    PlanActorArgs,
    watch::Receiver<PlanView>,
    broadcast::Receiver<PlanEventEnvelope>,
)> {
    let parsed = PlanId::from_string(plan_id)
        .with_context(|| format!("invalid plan id '{}'", plan_id))?;
    let log_path = paths::plan_events_path(plan_id)?;
    let snapshot_path = paths::plan_snapshot_path(plan_id)?;

    // Bootstrap the view from existing events (if any)
    let initial_view = bootstrap_view_from_events(&log_path, &parsed);
    let view = Arc::new(RwLock::new(initial_view.clone()));
    let (snapshot_tx, snapshot_rx) = watch::channel(initial_view);
    let (event_tx, event_rx) = broadcast::channel(64);

    let args = PlanActorArgs {
        plan_id: parsed,
        log_path,
        snapshot_path,
        snapshot_every,
        view,
        snapshot_tx,
        event_tx,
        services: PlanServices::default(),
        trail,
    };

    Ok((args, snapshot_rx, event_rx))
}

#[cfg(test)]
#[path = "tests/actor_tests.rs"]
mod tests;
