//! Plan view projection: the query/read layer over the plan aggregate.
//!
//! The PlanView is derived from PlanEvent only (no direct mutation) and
//! serves list/filter and KPI reads. KPIs and capacity are computed on read
//! rather than stored.

use crate::domain::plan::{apply_task_patch, task_from_draft, PlanAggregate, PlanEvent};
use crate::domain::services::CapacityDefaults;
use crate::domain::types::{
    ActorId, ApprovalAction, ApprovalRecord, CapacityProfile, FiscalYear, HourAllocation,
    PlanId, PlanKpis, PlanStatus, RiskLevel, TaskRecord, TaskStatus, TimestampUtc,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Explicit filter for task list reads. All fields optional; present
/// fields are combined with AND.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskFilter {
    /// Exact status match.
    pub status: Option<TaskStatus>,
    /// Exact risk-level match.
    pub risk_level: Option<RiskLevel>,
    /// Case-insensitive substring match on title or department.
    pub text: Option<String>,
}

impl TaskFilter {
    fn matches(&self, task: &TaskRecord) -> bool {
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        if let Some(risk) = self.risk_level {
            if task.risk_level != Some(risk) {
                return false;
            }
        }
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            let title_hit = task.title.to_lowercase().contains(&needle);
            let dept_hit = task
                .department
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !title_hit && !dept_hit {
                return false;
            }
        }
        true
    }
}

/// Read-only view of plan state derived from events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanView {
    plan_id: Option<PlanId>,
    title: Option<String>,
    fiscal_year: Option<FiscalYear>,
    version: Option<String>,
    status: Option<PlanStatus>,
    introduction: Option<String>,
    total_available_hours: Option<f64>,
    allocation: HourAllocation,
    estimated_budget: Option<f64>,
    created_by: Option<ActorId>,
    created_at: Option<TimestampUtc>,
    updated_at: Option<TimestampUtc>,
    tasks: Vec<TaskRecord>,
    /// Approval history in append order; read newest-first via `approvals()`.
    approval_log: Vec<ApprovalRecord>,
    capacity: Option<CapacityProfile>,
    deleted: bool,
    last_event_sequence: u64,
}

impl PlanView {
    /// Apply an event to update the view.
    pub fn apply_event(&mut self, aggregate_id: &str, event: &PlanEvent, sequence: u64) {
        // Parse aggregate_id as UUID - log warning on invalid format
        match Uuid::parse_str(aggregate_id) {
            Ok(uuid) => self.plan_id = Some(PlanId(uuid)),
            Err(e) => tracing::warn!("Invalid aggregate ID '{}': {}", aggregate_id, e),
        }
        self.last_event_sequence = sequence;

        match event {
            PlanEvent::PlanCreated { draft, created_at } => {
                self.title = Some(draft.title.clone());
                self.fiscal_year = Some(draft.fiscal_year);
                self.version = Some(draft.version.clone());
                self.status = Some(PlanStatus::Draft);
                self.introduction = draft.introduction.clone();
                self.total_available_hours = draft.total_available_hours;
                self.allocation = draft.allocation;
                self.estimated_budget = draft.estimated_budget;
                self.created_by = Some(draft.created_by.clone());
                self.created_at = Some(*created_at);
                self.updated_at = Some(*created_at);
                self.tasks.clear();
                self.approval_log.clear();
                self.capacity = None;
                self.deleted = false;
            }

            PlanEvent::PlanUpdated { patch, updated_at } => {
                if let Some(title) = &patch.title {
                    self.title = Some(title.clone());
                }
                if let Some(version) = &patch.version {
                    self.version = Some(version.clone());
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
                self.updated_at = Some(*updated_at);
            }

            PlanEvent::TaskAdded { task, added_at } => {
                self.tasks.push(task_from_draft(task.clone()));
                self.updated_at = Some(*added_at);
            }

            PlanEvent::TaskUpdated {
                task_id,
                patch,
                updated_at,
            } => {
                if let Some(task) = self.tasks.iter_mut().find(|t| &t.id == task_id) {
                    apply_task_patch(task, patch);
                }
                self.updated_at = Some(*updated_at);
            }

            PlanEvent::TaskRemoved {
                task_id,
                removed_at,
            } => {
                self.tasks.retain(|t| &t.id != task_id);
                self.updated_at = Some(*removed_at);
            }

            PlanEvent::ReviewRequested {
                actor,
                role,
                comment,
                requested_at,
            } => {
                self.status = Some(PlanStatus::UnderReview);
                self.approval_log.push(ApprovalRecord {
                    actor: actor.clone(),
                    role: role.clone(),
                    action: ApprovalAction::Submit,
                    comment: comment.clone(),
                    timestamp: *requested_at,
                });
                self.updated_at = Some(*requested_at);
            }

            PlanEvent::PlanApproved {
                actor,
                role,
                comment,
                approved_at,
            } => {
                self.status = Some(PlanStatus::Approved);
                self.approval_log.push(ApprovalRecord {
                    actor: actor.clone(),
                    role: role.clone(),
                    action: ApprovalAction::Approve,
                    comment: comment.clone(),
                    timestamp: *approved_at,
                });
                self.updated_at = Some(*approved_at);
            }

            PlanEvent::PlanRejected {
                actor,
                role,
                comment,
                rejected_at,
            } => {
                self.status = Some(PlanStatus::Draft);
                self.approval_log.push(ApprovalRecord {
                    actor: actor.clone(),
                    role: role.clone(),
                    action: ApprovalAction::Reject,
                    comment: comment.clone(),
                    timestamp: *rejected_at,
                });
                self.updated_at = Some(*rejected_at);
            }

            PlanEvent::PlanSubmitted { submitted_at, .. } => {
                self.status = Some(PlanStatus::Submitted);
                self.updated_at = Some(*submitted_at);
            }

            PlanEvent::PlanBaselined {
                actor,
                role,
                comment,
                baselined_at,
            } => {
                self.status = Some(PlanStatus::Baselined);
                self.approval_log.push(ApprovalRecord {
                    actor: actor.clone(),
                    role: role.clone(),
                    action: ApprovalAction::Baseline,
                    comment: comment.clone(),
                    timestamp: *baselined_at,
                });
                self.updated_at = Some(*baselined_at);
            }

            PlanEvent::CapacityRecorded {
                capacity,
                recorded_at,
            } => {
                self.capacity = Some(*capacity);
                self.updated_at = Some(*recorded_at);
            }

            PlanEvent::PlanDeleted { deleted_at, .. } => {
                self.deleted = true;
                self.updated_at = Some(*deleted_at);
            }
        }
    }

    /// Returns the plan ID.
    pub fn plan_id(&self) -> Option<&PlanId> {
        self.plan_id.as_ref()
    }

    /// Returns the plan title.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Returns the fiscal year.
    pub fn fiscal_year(&self) -> Option<FiscalYear> {
        self.fiscal_year
    }

    /// Returns the plan version.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Returns the current plan status.
    pub fn status(&self) -> Option<PlanStatus> {
        self.status
    }

    /// Returns the total available hours, if set.
    pub fn total_available_hours(&self) -> Option<f64> {
        self.total_available_hours
    }

    /// Returns the category-hour allocation.
    pub fn allocation(&self) -> &HourAllocation {
        &self.allocation
    }

    /// Returns the owned tasks in insertion order.
    pub fn tasks(&self) -> &[TaskRecord] {
        &self.tasks
    }

    /// Returns true when the plan has been hard-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Returns the last applied event sequence number.
    pub fn last_event_sequence(&self) -> u64 {
        self.last_event_sequence
    }

    /// Returns tasks matching the filter, in insertion order.
    pub fn find_tasks(&self, filter: &TaskFilter) -> Vec<&TaskRecord> {
        self.tasks.iter().filter(|t| filter.matches(t)).collect()
    }

    /// Approval history ordered newest-first for display.
    pub fn approvals(&self) -> Vec<&ApprovalRecord> {
        let mut records: Vec<&ApprovalRecord> = self.approval_log.iter().collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records
    }

    /// Returns the persisted capacity profile if present, else the injected
    /// fallback defaults.
    pub fn capacity(&self, defaults: &CapacityDefaults) -> CapacityProfile {
        self.capacity.unwrap_or_else(|| defaults.profile())
    }

    /// Derives the plan KPIs from current task state.
    pub fn kpis(&self) -> PlanKpis {
        let task_count = self.tasks.len();
        let completed = self
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .count();
        let completion_pct = if task_count == 0 {
            0.0
        } else {
            completed as f64 / task_count as f64 * 100.0
        };
        PlanKpis {
            completion_pct,
            total_estimated_hours: self.tasks.iter().map(|t| t.estimated_hours).sum(),
            task_count,
            overall_status: self.status.unwrap_or_default(),
        }
    }
}

/// Serializable wrapper for event envelopes used in broadcasting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEventEnvelope {
    pub aggregate_id: String,
    pub sequence: u64,
    pub event: PlanEvent,
}

impl From<&cqrs_es::EventEnvelope<PlanAggregate>> for PlanEventEnvelope {
    fn from(source: &cqrs_es::EventEnvelope<PlanAggregate>) -> Self {
        Self {
            aggregate_id: source.aggregate_id.clone(),
            sequence: source.sequence as u64,
            event: source.payload.clone(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/view_tests.rs"]
mod tests;
