//! Strongly typed domain primitives for the audit-plan and evidence aggregates.
//!
//! These newtypes provide type safety and semantic clarity for entity
//! identifiers, status enums, and the hour-allocation value objects used
//! throughout the domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an annual plan.
/// Used as the aggregate_id in the event store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanId(pub Uuid);

impl PlanId {
    /// Creates a new random plan ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a plan ID from a string.
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for PlanId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for an audit task owned by a plan.
    TaskId
);
uuid_id!(
    /// Unique identifier for an evidence record.
    EvidenceId
);
uuid_id!(
    /// Unique identifier for an audit engagement.
    EngagementId
);
uuid_id!(
    /// Unique identifier for a PBC (provided-by-client) request.
    PbcId
);
uuid_id!(
    /// Unique identifier for an audit test definition.
    TestId
);
uuid_id!(
    /// Unique identifier for a single execution of an audit test.
    RunId
);

/// Opaque identifier for an authenticated actor, supplied by the
/// identity collaborator. The core never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActorId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ActorId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task code, unique within its parent plan (e.g. "T-01").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskCode(pub String);

impl TaskCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TaskCode {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// UTC timestamp for events and trail entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimestampUtc(pub DateTime<Utc>);

impl TimestampUtc {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Returns the timestamp as an RFC3339 string.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }
}

impl Default for TimestampUtc {
    fn default() -> Self {
        Self::now()
    }
}

/// Fiscal year a plan covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FiscalYear(pub i32);

impl std::fmt::Display for FiscalYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Annual plan lifecycle status. `Baselined` is the only absorbing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    #[default]
    Draft,
    Submitted,
    UnderReview,
    Approved,
    Baselined,
}

impl PlanStatus {
    /// Returns true once the plan is locked against any further mutation.
    pub fn is_baselined(&self) -> bool {
        matches!(self, PlanStatus::Baselined)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Draft => "draft",
            PlanStatus::Submitted => "submitted",
            PlanStatus::UnderReview => "under_review",
            PlanStatus::Approved => "approved",
            PlanStatus::Baselined => "baselined",
        }
    }
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Audit task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Blocked,
}

/// Risk level of an audit task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Workflow action captured by an approval record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalAction {
    Submit,
    Approve,
    Reject,
    Baseline,
}

impl ApprovalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalAction::Submit => "submit",
            ApprovalAction::Approve => "approve",
            ApprovalAction::Reject => "reject",
            ApprovalAction::Baseline => "baseline",
        }
    }
}

/// Virus-scan sub-state of an evidence record. Starts `Pending` and is
/// advanced only by the scanning collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VirusScanStatus {
    #[default]
    Pending,
    Clean,
    Suspected,
    Blocked,
}

/// Where the bytes behind an evidence record live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    #[default]
    Local,
    Remote,
}

impl StorageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::Local => "local",
            StorageKind::Remote => "remote",
        }
    }
}

/// The six nullable category-hour allocations of an annual plan.
///
/// The sum of the present categories must never exceed the plan's
/// `total_available_hours`; the aggregate enforces this on creation and on
/// every subsequent plan update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct HourAllocation {
    pub planned_task: Option<f64>,
    pub advisory: Option<f64>,
    pub emergency: Option<f64>,
    pub follow_up: Option<f64>,
    pub training: Option<f64>,
    pub administrative: Option<f64>,
}

impl HourAllocation {
    /// Sum of the present category allocations.
    pub fn sum(&self) -> f64 {
        [
            self.planned_task,
            self.advisory,
            self.emergency,
            self.follow_up,
            self.training,
            self.administrative,
        ]
        .iter()
        .flatten()
        .sum()
    }

    /// Returns a copy with the patch's present fields applied.
    pub fn merged(&self, patch: &HourAllocationPatch) -> Self {
        Self {
            planned_task: patch.planned_task.or(self.planned_task),
            advisory: patch.advisory.or(self.advisory),
            emergency: patch.emergency.or(self.emergency),
            follow_up: patch.follow_up.or(self.follow_up),
            training: patch.training.or(self.training),
            administrative: patch.administrative.or(self.administrative),
        }
    }
}

/// Partial update of the category-hour allocations. Absent fields are
/// left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct HourAllocationPatch {
    pub planned_task: Option<f64>,
    pub advisory: Option<f64>,
    pub emergency: Option<f64>,
    pub follow_up: Option<f64>,
    pub training: Option<f64>,
    pub administrative: Option<f64>,
}

impl HourAllocationPatch {
    pub fn is_empty(&self) -> bool {
        self.planned_task.is_none()
            && self.advisory.is_none()
            && self.emergency.is_none()
            && self.follow_up.is_none()
            && self.training.is_none()
            && self.administrative.is_none()
    }
}

/// Per-plan capacity profile, persisted via the `SetCapacity` command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapacityProfile {
    pub total: f64,
    pub audit: f64,
    pub advisory: f64,
    pub training: f64,
    pub admin: f64,
}

/// An audit task owned by a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub code: TaskCode,
    pub title: String,
    pub department: Option<String>,
    pub risk_level: Option<RiskLevel>,
    pub audit_type: Option<String>,
    pub objective: Option<String>,
    pub planned_quarter: Option<String>,
    pub estimated_hours: f64,
    pub lead_auditor: Option<String>,
    /// Ordered list of opaque attachment references.
    pub attachments: Vec<String>,
    pub status: TaskStatus,
}

/// One immutable workflow transition captured on a plan.
/// Append-only; displayed newest-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRecord {
    pub actor: Option<ActorId>,
    pub role: String,
    pub action: ApprovalAction,
    pub comment: String,
    pub timestamp: TimestampUtc,
}

/// Read-time KPI aggregation over a plan's owned tasks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanKpis {
    /// Completed tasks / total tasks * 100, or 0 when no tasks exist.
    pub completion_pct: f64,
    pub total_estimated_hours: f64,
    pub task_count: usize,
    pub overall_status: PlanStatus,
}
