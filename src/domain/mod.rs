//! Domain model for the audit-desk plan and evidence workflow.
//!
//! The annual plan is an event-sourced CQRS aggregate: commands are
//! validated against the plan invariants and produce events that are
//! persisted to the event log. A workflow transition and the approval
//! record it appends travel in one event, so the two are committed
//! atomically by construction.
//!
//! # Architecture
//!
//! - **Validation** (`validation.rs`): raw payloads in, typed drafts out
//! - **Commands** (`plan/commands.rs`): intent to change plan state
//! - **Events** (`plan/events.rs`): facts that have happened
//! - **Aggregate** (`plan/mod.rs`): command validation and event application
//! - **View** (`plan/view.rs`): read-only projection for lists and KPIs
//! - **Catalog** (`catalog.rs`): engagements, PBC requests, tests and runs
//! - **Evidence** (`evidence.rs`): uploaded file metadata and scan lifecycle

pub mod actor;
pub mod catalog;
pub mod errors;
pub mod evidence;
pub mod plan;
pub mod services;
pub mod types;
pub mod validation;

// Re-export commonly used types for convenience
pub use actor::{create_actor_args, PlanActor, PlanActorArgs, PlanMessage};
pub use catalog::{
    AuditTest, Catalog, Engagement, EngagementStatus, PbcRequest, PbcStatus, TestResult,
    TestRun, TestStatus,
};
pub use errors::DomainError;
pub use evidence::{
    EvidenceFilter, EvidenceRecord, EvidenceService, ProcessingStats, EVIDENCE_PAGE_SIZE,
};
pub use plan::{
    command_name, PlanAggregate, PlanCommand, PlanEvent, PlanEventEnvelope, PlanQuery, PlanView,
};
pub use plan::view::TaskFilter;
pub use services::{CapacityDefaults, PlanClock, PlanServices};
pub use types::{
    ActorId, ApprovalAction, ApprovalRecord, CapacityProfile, EngagementId, EvidenceId,
    FiscalYear, HourAllocation, HourAllocationPatch, PbcId, PlanId, PlanKpis, PlanStatus,
    RiskLevel, RunId, StorageKind, TaskCode, TaskId, TaskRecord, TaskStatus, TestId,
    TimestampUtc, VirusScanStatus,
};
pub use validation::{
    engagement_draft, evidence_draft, pbc_draft, plan_draft, plan_patch, task_draft, task_patch,
    test_draft, test_run_draft, EngagementDraft, EvidenceDraft, PbcDraft, PlanDraft, PlanPatch,
    RawEngagementInput, RawEvidenceInput, RawPbcInput, RawPlanInput, RawPlanPatch, RawTaskInput,
    RawTestInput, RawTestRunInput, TaskDraft, TaskPatch, TestDraft, TestRunDraft,
};
