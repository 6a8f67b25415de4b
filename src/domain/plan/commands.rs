//! Plan commands for the CQRS aggregate.
//!
//! Commands represent intent to change state. The aggregate validates
//! commands against the plan invariants and produces events that are
//! persisted to the event log.

use crate::domain::types::{ActorId, CapacityProfile, TaskId};
use crate::domain::validation::{PlanDraft, PlanPatch, TaskDraft, TaskPatch};
use serde::{Deserialize, Serialize};

/// Commands that can be executed against the plan aggregate.
///
/// Transition commands carry the acting identity and role label so the
/// resulting approval record is complete; the core treats both as opaque
/// strings supplied by the identity collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanCommand {
    /// Initialize aggregate state for a new annual plan.
    /// Rejected with `AllocationExceedsTotal` when the category-hour sum
    /// exceeds the total available hours.
    CreatePlan { draft: PlanDraft },

    /// Partially update plan fields. The allocation ceiling is re-validated
    /// against the merged result.
    UpdatePlan { patch: PlanPatch },

    /// Add an audit task. Task codes are unique per plan.
    AddTask { task: TaskDraft },

    /// Partially update an owned task. Absent fields are untouched.
    UpdateTask { task_id: TaskId, patch: TaskPatch },

    /// Remove an owned task.
    RemoveTask { task_id: TaskId },

    /// Move the plan to `under_review` and append an approval record with
    /// action `submit`. Requires at least one owned task.
    SubmitForReview {
        actor: Option<ActorId>,
        role: String,
        comment: Option<String>,
    },

    /// Move the plan to `approved` and append an approval record.
    Approve {
        actor: Option<ActorId>,
        role: String,
        comment: Option<String>,
    },

    /// Send the plan back to `draft` and append an approval record with
    /// action `reject`.
    Reject {
        actor: Option<ActorId>,
        role: String,
        comment: Option<String>,
    },

    /// Wizard submission path: move the plan to `submitted`. Requires at
    /// least one owned task.
    Submit { actor: Option<ActorId>, role: String },

    /// Lock the plan. Baselined is terminal; every later mutating command
    /// fails with `PlanImmutable`.
    Baseline {
        actor: Option<ActorId>,
        role: String,
        comment: Option<String>,
    },

    /// Persist a per-plan capacity profile used by the capacity read path.
    SetCapacity { capacity: CapacityProfile },

    /// Hard-delete the plan. Permitted in any non-baselined state.
    DeletePlan { actor: Option<ActorId> },
}

/// Extracts a human-readable name from a command for error messages and
/// trail entries.
pub fn command_name(cmd: &PlanCommand) -> &'static str {
    match cmd {
        PlanCommand::CreatePlan { .. } => "CreatePlan",
        PlanCommand::UpdatePlan { .. } => "UpdatePlan",
        PlanCommand::AddTask { .. } => "AddTask",
        PlanCommand::UpdateTask { .. } => "UpdateTask",
        PlanCommand::RemoveTask { .. } => "RemoveTask",
        PlanCommand::SubmitForReview { .. } => "SubmitForReview",
        PlanCommand::Approve { .. } => "Approve",
        PlanCommand::Reject { .. } => "Reject",
        PlanCommand::Submit { .. } => "Submit",
        PlanCommand::Baseline { .. } => "Baseline",
        PlanCommand::SetCapacity { .. } => "SetCapacity",
        PlanCommand::DeletePlan { .. } => "DeletePlan",
    }
}
