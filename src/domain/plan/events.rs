//! Plan events for the CQRS aggregate.
//!
//! Events represent facts that have happened. They are the single source of
//! truth for plan state: the status transition and its approval record are
//! one event, so the two can never diverge.

use crate::domain::types::{ActorId, CapacityProfile, TaskId, TimestampUtc};
use crate::domain::validation::{PlanDraft, PlanPatch, TaskDraft, TaskPatch};
use cqrs_es::DomainEvent;
use serde::{Deserialize, Serialize};

/// Events emitted by the plan aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanEvent {
    /// Plan was created in `draft`. No approval record on creation.
    PlanCreated {
        draft: PlanDraft,
        created_at: TimestampUtc,
    },

    /// Plan fields were partially updated.
    PlanUpdated {
        patch: PlanPatch,
        updated_at: TimestampUtc,
    },

    /// An audit task was added.
    TaskAdded {
        task: TaskDraft,
        added_at: TimestampUtc,
    },

    /// An owned task was partially updated.
    TaskUpdated {
        task_id: TaskId,
        patch: TaskPatch,
        updated_at: TimestampUtc,
    },

    /// An owned task was removed.
    TaskRemoved {
        task_id: TaskId,
        removed_at: TimestampUtc,
    },

    /// Plan moved to `under_review`; approval record with action `submit`.
    ReviewRequested {
        actor: Option<ActorId>,
        role: String,
        comment: String,
        requested_at: TimestampUtc,
    },

    /// Plan moved to `approved`; approval record with action `approve`.
    PlanApproved {
        actor: Option<ActorId>,
        role: String,
        comment: String,
        approved_at: TimestampUtc,
    },

    /// Plan sent back to `draft`; approval record with action `reject`.
    PlanRejected {
        actor: Option<ActorId>,
        role: String,
        comment: String,
        rejected_at: TimestampUtc,
    },

    /// Wizard submission: plan moved to `submitted`.
    PlanSubmitted {
        actor: Option<ActorId>,
        role: String,
        submitted_at: TimestampUtc,
    },

    /// Plan locked. Terminal state.
    PlanBaselined {
        actor: Option<ActorId>,
        role: String,
        comment: String,
        baselined_at: TimestampUtc,
    },

    /// A per-plan capacity profile was persisted.
    CapacityRecorded {
        capacity: CapacityProfile,
        recorded_at: TimestampUtc,
    },

    /// Plan was hard-deleted.
    PlanDeleted {
        actor: Option<ActorId>,
        deleted_at: TimestampUtc,
    },
}

impl DomainEvent for PlanEvent {
    fn event_type(&self) -> String {
        match self {
            Self::PlanCreated { .. } => "PlanCreated".to_string(),
            Self::PlanUpdated { .. } => "PlanUpdated".to_string(),
            Self::TaskAdded { .. } => "TaskAdded".to_string(),
            Self::TaskUpdated { .. } => "TaskUpdated".to_string(),
            Self::TaskRemoved { .. } => "TaskRemoved".to_string(),
            Self::ReviewRequested { .. } => "ReviewRequested".to_string(),
            Self::PlanApproved { .. } => "PlanApproved".to_string(),
            Self::PlanRejected { .. } => "PlanRejected".to_string(),
            Self::PlanSubmitted { .. } => "PlanSubmitted".to_string(),
            Self::PlanBaselined { .. } => "PlanBaselined".to_string(),
            Self::CapacityRecorded { .. } => "CapacityRecorded".to_string(),
            Self::PlanDeleted { .. } => "PlanDeleted".to_string(),
        }
    }

    fn event_version(&self) -> String {
        "1".to_string()
    }
}
