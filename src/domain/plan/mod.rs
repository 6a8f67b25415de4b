//! The annual-plan aggregate: command validation and event application.
//!
//! The aggregate owns the cross-entity invariants of the plan workflow:
//! the hour-allocation ceiling, task-code uniqueness, the baselined lock,
//! and the approval history appended by every workflow transition. Because
//! a transition and its approval record are carried by a single event, the
//! two are committed atomically by construction.

pub mod commands;
pub mod events;
pub mod query;
pub mod view;

pub use commands::{command_name, PlanCommand};
pub use events::PlanEvent;
pub use query::PlanQuery;
pub use view::{PlanEventEnvelope, PlanView};

use crate::domain::errors::DomainError;
use crate::domain::services::PlanServices;
use crate::domain::types::{
    ActorId, ApprovalAction, ApprovalRecord, CapacityProfile, FiscalYear, HourAllocation,
    PlanId, PlanStatus, TaskRecord, TimestampUtc,
};
use crate::domain::validation::{PlanDraft, PlanPatch, TaskDraft, TaskPatch};
use async_trait::async_trait;
use cqrs_es::Aggregate;
use serde::{Deserialize, Serialize};

/// Default comment recorded when a transition is submitted without one.
pub const DEFAULT_SUBMIT_COMMENT: &str = "Submitted for review";
pub const DEFAULT_APPROVE_COMMENT: &str = "Approved";
pub const DEFAULT_REJECT_COMMENT: &str = "Rejected";
pub const DEFAULT_BASELINE_COMMENT: &str = "Baselined";

/// Active plan data when the aggregate is initialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanData {
    id: PlanId,
    title: String,
    fiscal_year: FiscalYear,
    version: String,
    status: PlanStatus,
    introduction: Option<String>,
    total_available_hours: Option<f64>,
    allocation: HourAllocation,
    estimated_budget: Option<f64>,
    created_by: ActorId,
    created_at: TimestampUtc,
    updated_at: TimestampUtc,
    tasks: Vec<TaskRecord>,
    approvals: Vec<ApprovalRecord>,
    capacity: Option<CapacityProfile>,
}

impl PlanData {
    fn from_draft(draft: PlanDraft, created_at: TimestampUtc) -> Self {
        Self {
            id: draft.id,
            title: draft.title,
            fiscal_year: draft.fiscal_year,
            version: draft.version,
            status: PlanStatus::Draft,
            introduction: draft.introduction,
            total_available_hours: draft.total_available_hours,
            allocation: draft.allocation,
            estimated_budget: draft.estimated_budget,
            created_by: draft.created_by,
            created_at,
            updated_at: created_at,
            tasks: Vec::new(),
            approvals: Vec::new(),
            capacity: None,
        }
    }

    pub fn id(&self) -> &PlanId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn fiscal_year(&self) -> FiscalYear {
        self.fiscal_year
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn status(&self) -> PlanStatus {
        self.status
    }

    pub fn introduction(&self) -> Option<&str> {
        self.introduction.as_deref()
    }

    pub fn total_available_hours(&self) -> Option<f64> {
        self.total_available_hours
    }

    pub fn allocation(&self) -> &HourAllocation {
        &self.allocation
    }

    pub fn estimated_budget(&self) -> Option<f64> {
        self.estimated_budget
    }

    pub fn created_by(&self) -> &ActorId {
        &self.created_by
    }

    pub fn created_at(&self) -> &TimestampUtc {
        &self.created_at
    }

    pub fn updated_at(&self) -> &TimestampUtc {
        &self.updated_at
    }

    pub fn tasks(&self) -> &[TaskRecord] {
        &self.tasks
    }

    pub fn task(&self, task_id: &crate::domain::types::TaskId) -> Option<&TaskRecord> {
        self.tasks.iter().find(|t| &t.id == task_id)
    }

    /// Approval history, append order (oldest first).
    pub fn approvals(&self) -> &[ApprovalRecord] {
        &self.approvals
    }

    pub fn capacity(&self) -> Option<&CapacityProfile> {
        self.capacity.as_ref()
    }

    pub(crate) fn apply_patch(&mut self, patch: &PlanPatch, at: TimestampUtc) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(version) = &patch.version {
            self.version = version.clone();
        }
        if let Some(introduction) = &patch.introduction {
            self.introduction = Some(introduction.clone());
        }
        if let Some(total) = patch.total_available_hours {
            self.total_available_hours = Some(total);
        }
        self.allocation = self.allocation.merged(&patch.allocation);
        if let Some(budget) = patch.estimated_budget {
            self.estimated_budget = Some(budget);
        }
        self.updated_at = at;
    }

    pub(crate) fn push_task(&mut self, task: TaskRecord, at: TimestampUtc) {
        self.tasks.push(task);
        self.updated_at = at;
    }

    pub(crate) fn patch_task(
        &mut self,
        task_id: &crate::domain::types::TaskId,
        patch: &TaskPatch,
        at: TimestampUtc,
    ) {
        if let Some(task) = self.tasks.iter_mut().find(|t| &t.id == task_id) {
            apply_task_patch(task, patch);
            self.updated_at = at;
        }
    }

    pub(crate) fn remove_task(&mut self, task_id: &crate::domain::types::TaskId, at: TimestampUtc) {
        self.tasks.retain(|t| &t.id != task_id);
        self.updated_at = at;
    }

    pub(crate) fn transition(
        &mut self,
        status: PlanStatus,
        record: Option<ApprovalRecord>,
        at: TimestampUtc,
    ) {
        self.status = status;
        if let Some(record) = record {
            self.approvals.push(record);
        }
        self.updated_at = at;
    }

    pub(crate) fn set_capacity(&mut self, capacity: CapacityProfile, at: TimestampUtc) {
        self.capacity = Some(capacity);
        self.updated_at = at;
    }
}

/// Builds a task record from a validated draft.
pub(crate) fn task_from_draft(draft: TaskDraft) -> TaskRecord {
    TaskRecord {
        id: draft.id,
        code: draft.code,
        title: draft.title,
        department: draft.department,
        risk_level: draft.risk_level,
        audit_type: draft.audit_type,
        objective: draft.objective,
        planned_quarter: draft.planned_quarter,
        estimated_hours: draft.estimated_hours,
        lead_auditor: draft.lead_auditor,
        attachments: draft.attachments,
        status: draft.status,
    }
}

/// Applies a task patch in place. Absent fields are untouched.
pub(crate) fn apply_task_patch(task: &mut TaskRecord, patch: &TaskPatch) {
    if let Some(title) = &patch.title {
        task.title = title.clone();
    }
    if let Some(department) = &patch.department {
        task.department = Some(department.clone());
    }
    if let Some(risk) = patch.risk_level {
        task.risk_level = Some(risk);
    }
    if let Some(audit_type) = &patch.audit_type {
        task.audit_type = Some(audit_type.clone());
    }
    if let Some(objective) = &patch.objective {
        task.objective = Some(objective.clone());
    }
    if let Some(quarter) = &patch.planned_quarter {
        task.planned_quarter = Some(quarter.clone());
    }
    if let Some(hours) = patch.estimated_hours {
        task.estimated_hours = hours;
    }
    if let Some(lead) = &patch.lead_auditor {
        task.lead_auditor = Some(lead.clone());
    }
    if let Some(attachments) = &patch.attachments {
        task.attachments = attachments.clone();
    }
    if let Some(status) = patch.status {
        task.status = status;
    }
}

/// Plan aggregate state.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub enum PlanState {
    /// Aggregate has not been initialized.
    #[default]
    Uninitialized,
    /// Aggregate is active with plan data (boxed for memory efficiency).
    Active(Box<PlanData>),
    /// Plan was hard-deleted; only the id remains for error reporting.
    Deleted(PlanId),
}

/// The plan aggregate.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlanAggregate {
    pub state: PlanState,
}

impl PlanAggregate {
    fn allocation_guard(
        allocation: &HourAllocation,
        total: Option<f64>,
    ) -> Result<(), DomainError> {
        if let Some(total) = total {
            let allocated = allocation.sum();
            if allocated > total {
                return Err(DomainError::AllocationExceedsTotal {
                    allocated,
                    available: total,
                });
            }
        }
        Ok(())
    }

    fn require_tasks(data: &PlanData) -> Result<(), DomainError> {
        if data.tasks.is_empty() {
            return Err(DomainError::validation(
                "tasks",
                "plan must have at least one task before submission",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Aggregate for PlanAggregate {
    type Command = PlanCommand;
    type Event = PlanEvent;
    type Error = DomainError;
    type Services = PlanServices;

    fn aggregate_type() -> String {
        "annual_plan".to_string()
    }

    async fn handle(
        &self,
        command: Self::Command,
        services: &Self::Services,
    ) -> Result<Vec<Self::Event>, Self::Error> {
        let now = services.clock.now();

        match (&self.state, command) {
            // CreatePlan - only valid on an uninitialized aggregate
            (PlanState::Uninitialized, PlanCommand::CreatePlan { draft }) => {
                Self::allocation_guard(&draft.allocation, draft.total_available_hours)?;
                Ok(vec![PlanEvent::PlanCreated {
                    draft,
                    created_at: now,
                }])
            }
            (PlanState::Active(_), PlanCommand::CreatePlan { .. }) => Err(DomainError::Conflict {
                message: "plan already exists".to_string(),
            }),

            // Baselined lock: every command against a baselined plan fails.
            (PlanState::Active(data), _) if data.status.is_baselined() => {
                Err(DomainError::PlanImmutable)
            }

            (PlanState::Active(data), PlanCommand::UpdatePlan { patch }) => {
                let merged = data.allocation.merged(&patch.allocation);
                let total = patch.total_available_hours.or(data.total_available_hours);
                Self::allocation_guard(&merged, total)?;
                Ok(vec![PlanEvent::PlanUpdated {
                    patch,
                    updated_at: now,
                }])
            }

            (PlanState::Active(data), PlanCommand::AddTask { task }) => {
                if data.tasks.iter().any(|t| t.code == task.code) {
                    return Err(DomainError::Conflict {
                        message: format!("task code '{}' already exists", task.code.as_str()),
                    });
                }
                Ok(vec![PlanEvent::TaskAdded {
                    task,
                    added_at: now,
                }])
            }

            (PlanState::Active(data), PlanCommand::UpdateTask { task_id, patch }) => {
                if data.task(&task_id).is_none() {
                    return Err(DomainError::not_found("task", &task_id));
                }
                Ok(vec![PlanEvent::TaskUpdated {
                    task_id,
                    patch,
                    updated_at: now,
                }])
            }

            (PlanState::Active(data), PlanCommand::RemoveTask { task_id }) => {
                if data.task(&task_id).is_none() {
                    return Err(DomainError::not_found("task", &task_id));
                }
                Ok(vec![PlanEvent::TaskRemoved {
                    task_id,
                    removed_at: now,
                }])
            }

            (
                PlanState::Active(data),
                PlanCommand::SubmitForReview {
                    actor,
                    role,
                    comment,
                },
            ) => {
                Self::require_tasks(data)?;
                Ok(vec![PlanEvent::ReviewRequested {
                    actor,
                    role,
                    comment: comment.unwrap_or_else(|| DEFAULT_SUBMIT_COMMENT.to_string()),
                    requested_at: now,
                }])
            }

            (
                PlanState::Active(_),
                PlanCommand::Approve {
                    actor,
                    role,
                    comment,
                },
            ) => Ok(vec![PlanEvent::PlanApproved {
                actor,
                role,
                comment: comment.unwrap_or_else(|| DEFAULT_APPROVE_COMMENT.to_string()),
                approved_at: now,
            }]),

            (
                PlanState::Active(_),
                PlanCommand::Reject {
                    actor,
                    role,
                    comment,
                },
            ) => Ok(vec![PlanEvent::PlanRejected {
                actor,
                role,
                comment: comment.unwrap_or_else(|| DEFAULT_REJECT_COMMENT.to_string()),
                rejected_at: now,
            }]),

            (PlanState::Active(data), PlanCommand::Submit { actor, role }) => {
                Self::require_tasks(data)?;
                Ok(vec![PlanEvent::PlanSubmitted {
                    actor,
                    role,
                    submitted_at: now,
                }])
            }

            (
                PlanState::Active(_),
                PlanCommand::Baseline {
                    actor,
                    role,
                    comment,
                },
            ) => Ok(vec![PlanEvent::PlanBaselined {
                actor,
                role,
                comment: comment.unwrap_or_else(|| DEFAULT_BASELINE_COMMENT.to_string()),
                baselined_at: now,
            }]),

            (PlanState::Active(_), PlanCommand::SetCapacity { capacity }) => {
                Ok(vec![PlanEvent::CapacityRecorded {
                    capacity,
                    recorded_at: now,
                }])
            }

            (PlanState::Active(_), PlanCommand::DeletePlan { actor }) => {
                Ok(vec![PlanEvent::PlanDeleted {
                    actor,
                    deleted_at: now,
                }])
            }

            // Commands on an uninitialized aggregate (CreatePlan handled above)
            (PlanState::Uninitialized, _) => Err(DomainError::NotInitialized),

            // Commands on a deleted plan
            (PlanState::Deleted(id), _) => Err(DomainError::not_found("plan", id)),
        }
    }

    fn apply(&mut self, event: Self::Event) {
        match (&mut self.state, event) {
            (PlanState::Uninitialized, PlanEvent::PlanCreated { draft, created_at }) => {
                self.state = PlanState::Active(Box::new(PlanData::from_draft(draft, created_at)));
            }

            (PlanState::Active(data), PlanEvent::PlanUpdated { patch, updated_at }) => {
                data.apply_patch(&patch, updated_at);
            }

            (PlanState::Active(data), PlanEvent::TaskAdded { task, added_at }) => {
                data.push_task(task_from_draft(task), added_at);
            }

            (
                PlanState::Active(data),
                PlanEvent::TaskUpdated {
                    task_id,
                    patch,
                    updated_at,
                },
            ) => {
                data.patch_task(&task_id, &patch, updated_at);
            }

            (
                PlanState::Active(data),
                PlanEvent::TaskRemoved {
                    task_id,
                    removed_at,
                },
            ) => {
                data.remove_task(&task_id, removed_at);
            }

            (
                PlanState::Active(data),
                PlanEvent::ReviewRequested {
                    actor,
                    role,
                    comment,
                    requested_at,
                },
            ) => {
                data.transition(
                    PlanStatus::UnderReview,
                    Some(ApprovalRecord {
                        actor,
                        role,
                        action: ApprovalAction::Submit,
                        comment,
                        timestamp: requested_at,
                    }),
                    requested_at,
                );
            }

            (
                PlanState::Active(data),
                PlanEvent::PlanApproved {
                    actor,
                    role,
                    comment,
                    approved_at,
                },
            ) => {
                data.transition(
                    PlanStatus::Approved,
                    Some(ApprovalRecord {
                        actor,
                        role,
                        action: ApprovalAction::Approve,
                        comment,
                        timestamp: approved_at,
                    }),
                    approved_at,
                );
            }

            (
                PlanState::Active(data),
                PlanEvent::PlanRejected {
                    actor,
                    role,
                    comment,
                    rejected_at,
                },
            ) => {
                data.transition(
                    PlanStatus::Draft,
                    Some(ApprovalRecord {
                        actor,
                        role,
                        action: ApprovalAction::Reject,
                        comment,
                        timestamp: rejected_at,
                    }),
                    rejected_at,
                );
            }

            (PlanState::Active(data), PlanEvent::PlanSubmitted { submitted_at, .. }) => {
                // Wizard path records no approval entry; the actor layer
                // writes the audit-trail entry for this transition.
                data.transition(PlanStatus::Submitted, None, submitted_at);
            }

            (
                PlanState::Active(data),
                PlanEvent::PlanBaselined {
                    actor,
                    role,
                    comment,
                    baselined_at,
                },
            ) => {
                data.transition(
                    PlanStatus::Baselined,
                    Some(ApprovalRecord {
                        actor,
                        role,
                        action: ApprovalAction::Baseline,
                        comment,
                        timestamp: baselined_at,
                    }),
                    baselined_at,
                );
            }

            (
                PlanState::Active(data),
                PlanEvent::CapacityRecorded {
                    capacity,
                    recorded_at,
                },
            ) => {
                data.set_capacity(capacity, recorded_at);
            }

            (PlanState::Active(data), PlanEvent::PlanDeleted { .. }) => {
                let id = data.id.clone();
                self.state = PlanState::Deleted(id);
            }

            // Ignore events on wrong state (shouldn't happen with correct
            // event sourcing)
            _ => {}
        }
    }
}

#[cfg(test)]
#[path = "../tests/aggregate_tests.rs"]
mod tests;
