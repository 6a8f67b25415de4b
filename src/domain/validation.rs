//! Validation layer: raw input records in, normalized typed drafts out.
//!
//! Every inbound payload passes through one of these validators before it
//! reaches an aggregate or the catalog. Validators never mutate their input
//! and never perform I/O; they fail with `DomainError::Validation` carrying
//! the first violated field.

use crate::domain::catalog::{EngagementStatus, PbcStatus, TestResult, TestStatus};
use crate::domain::errors::DomainError;
use crate::domain::types::{
    ActorId, EngagementId, FiscalYear, HourAllocation, HourAllocationPatch, PlanId, RiskLevel,
    StorageKind, TaskCode, TaskId, TaskStatus, TestId,
};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

const MIN_TASK_CODE_LEN: usize = 2;
const FISCAL_YEAR_MIN: i32 = 2000;
const FISCAL_YEAR_MAX: i32 = 2100;
const QUARTERS: [&str; 4] = ["Q1", "Q2", "Q3", "Q4"];

// ---------------------------------------------------------------------------
// Annual plan
// ---------------------------------------------------------------------------

/// Untyped plan creation payload as received from a caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPlanInput {
    pub title: Option<String>,
    pub fiscal_year: Option<i32>,
    pub version: Option<String>,
    pub introduction: Option<String>,
    pub total_available_hours: Option<f64>,
    pub planned_task_hours: Option<f64>,
    pub advisory_hours: Option<f64>,
    pub emergency_hours: Option<f64>,
    pub follow_up_hours: Option<f64>,
    pub training_hours: Option<f64>,
    pub administrative_hours: Option<f64>,
    pub estimated_budget: Option<f64>,
    pub created_by: Option<String>,
}

/// Normalized, fully typed plan creation input. A fresh `PlanId` is
/// assigned here and doubles as the aggregate id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDraft {
    pub id: PlanId,
    pub title: String,
    pub fiscal_year: FiscalYear,
    pub version: String,
    pub introduction: Option<String>,
    pub total_available_hours: Option<f64>,
    pub allocation: HourAllocation,
    pub estimated_budget: Option<f64>,
    pub created_by: ActorId,
}

/// Validates a raw plan payload into a `PlanDraft`.
///
/// The cross-field allocation-ceiling invariant is *not* checked here; it
/// belongs to the aggregate, which also re-checks it on updates.
pub fn plan_draft(raw: &RawPlanInput) -> Result<PlanDraft, DomainError> {
    let title = required_text("title", raw.title.as_deref())?;
    let year = raw
        .fiscal_year
        .ok_or_else(|| DomainError::validation("fiscal_year", "is required"))?;
    if !(FISCAL_YEAR_MIN..=FISCAL_YEAR_MAX).contains(&year) {
        return Err(DomainError::validation(
            "fiscal_year",
            format!("must be between {} and {}", FISCAL_YEAR_MIN, FISCAL_YEAR_MAX),
        ));
    }
    let version = match raw.version.as_deref() {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        Some(_) => return Err(DomainError::validation("version", "must not be blank")),
        None => "1.0".to_string(),
    };
    let total_available_hours =
        non_negative_opt("total_available_hours", raw.total_available_hours)?;
    let allocation = HourAllocation {
        planned_task: non_negative_opt("planned_task_hours", raw.planned_task_hours)?,
        advisory: non_negative_opt("advisory_hours", raw.advisory_hours)?,
        emergency: non_negative_opt("emergency_hours", raw.emergency_hours)?,
        follow_up: non_negative_opt("follow_up_hours", raw.follow_up_hours)?,
        training: non_negative_opt("training_hours", raw.training_hours)?,
        administrative: non_negative_opt("administrative_hours", raw.administrative_hours)?,
    };
    let estimated_budget = non_negative_opt("estimated_budget", raw.estimated_budget)?;
    let created_by = required_text("created_by", raw.created_by.as_deref())?;

    Ok(PlanDraft {
        id: PlanId::new(),
        title,
        fiscal_year: FiscalYear(year),
        version,
        introduction: raw.introduction.as_deref().map(str::trim).map(String::from),
        total_available_hours,
        allocation,
        estimated_budget,
        created_by: ActorId(created_by),
    })
}

/// Untyped partial plan update payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPlanPatch {
    pub title: Option<String>,
    pub version: Option<String>,
    pub introduction: Option<String>,
    pub total_available_hours: Option<f64>,
    pub planned_task_hours: Option<f64>,
    pub advisory_hours: Option<f64>,
    pub emergency_hours: Option<f64>,
    pub follow_up_hours: Option<f64>,
    pub training_hours: Option<f64>,
    pub administrative_hours: Option<f64>,
    pub estimated_budget: Option<f64>,
}

/// Normalized partial plan update. Absent fields are left untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlanPatch {
    pub title: Option<String>,
    pub version: Option<String>,
    pub introduction: Option<String>,
    pub total_available_hours: Option<f64>,
    pub allocation: HourAllocationPatch,
    pub estimated_budget: Option<f64>,
}

/// Validates a raw partial plan update into a `PlanPatch`.
pub fn plan_patch(raw: &RawPlanPatch) -> Result<PlanPatch, DomainError> {
    let title = match raw.title.as_deref() {
        Some(t) if t.trim().is_empty() => {
            return Err(DomainError::validation("title", "must not be blank"))
        }
        Some(t) => Some(t.trim().to_string()),
        None => None,
    };
    Ok(PlanPatch {
        title,
        version: raw.version.as_deref().map(str::trim).map(String::from),
        introduction: raw.introduction.as_deref().map(str::trim).map(String::from),
        total_available_hours: non_negative_opt(
            "total_available_hours",
            raw.total_available_hours,
        )?,
        allocation: HourAllocationPatch {
            planned_task: non_negative_opt("planned_task_hours", raw.planned_task_hours)?,
            advisory: non_negative_opt("advisory_hours", raw.advisory_hours)?,
            emergency: non_negative_opt("emergency_hours", raw.emergency_hours)?,
            follow_up: non_negative_opt("follow_up_hours", raw.follow_up_hours)?,
            training: non_negative_opt("training_hours", raw.training_hours)?,
            administrative: non_negative_opt("administrative_hours", raw.administrative_hours)?,
        },
        estimated_budget: non_negative_opt("estimated_budget", raw.estimated_budget)?,
    })
}

// ---------------------------------------------------------------------------
// Audit tasks
// ---------------------------------------------------------------------------

/// Untyped task creation payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTaskInput {
    pub code: Option<String>,
    pub title: Option<String>,
    pub department: Option<String>,
    pub risk_level: Option<String>,
    pub audit_type: Option<String>,
    pub objective: Option<String>,
    pub planned_quarter: Option<String>,
    pub estimated_hours: Option<f64>,
    pub lead_auditor: Option<String>,
    pub attachments: Option<Vec<String>>,
    pub status: Option<String>,
}

/// Normalized task creation input. A fresh `TaskId` is assigned here so the
/// aggregate's event stream stays deterministic to replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
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
    pub attachments: Vec<String>,
    pub status: TaskStatus,
}

/// Validates a raw task payload into a `TaskDraft`.
pub fn task_draft(raw: &RawTaskInput) -> Result<TaskDraft, DomainError> {
    let code = required_text("code", raw.code.as_deref())?;
    if code.len() < MIN_TASK_CODE_LEN {
        return Err(DomainError::validation(
            "code",
            format!("must be at least {} characters", MIN_TASK_CODE_LEN),
        ));
    }
    let title = required_text("title", raw.title.as_deref())?;
    let estimated_hours = raw
        .estimated_hours
        .ok_or_else(|| DomainError::validation("estimated_hours", "is required"))?;
    if !estimated_hours.is_finite() || estimated_hours < 0.0 {
        return Err(DomainError::validation(
            "estimated_hours",
            "must be a non-negative number",
        ));
    }

    Ok(TaskDraft {
        id: TaskId::new(),
        code: TaskCode(code),
        title,
        department: raw.department.as_deref().map(str::trim).map(String::from),
        risk_level: raw
            .risk_level
            .as_deref()
            .map(parse_risk_level)
            .transpose()?,
        audit_type: raw.audit_type.as_deref().map(str::trim).map(String::from),
        objective: raw.objective.as_deref().map(str::trim).map(String::from),
        planned_quarter: raw
            .planned_quarter
            .as_deref()
            .map(parse_quarter)
            .transpose()?,
        estimated_hours,
        lead_auditor: raw.lead_auditor.as_deref().map(str::trim).map(String::from),
        attachments: raw.attachments.clone().unwrap_or_default(),
        status: raw.status.as_deref().map(parse_task_status).transpose()?.unwrap_or_default(),
    })
}

/// Normalized partial task update. Absent fields are left untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub department: Option<String>,
    pub risk_level: Option<RiskLevel>,
    pub audit_type: Option<String>,
    pub objective: Option<String>,
    pub planned_quarter: Option<String>,
    pub estimated_hours: Option<f64>,
    pub lead_auditor: Option<String>,
    pub attachments: Option<Vec<String>>,
    pub status: Option<TaskStatus>,
}

/// Validates a raw task payload into a `TaskPatch` (all fields optional;
/// task code is not patchable).
pub fn task_patch(raw: &RawTaskInput) -> Result<TaskPatch, DomainError> {
    let title = match raw.title.as_deref() {
        Some(t) if t.trim().is_empty() => {
            return Err(DomainError::validation("title", "must not be blank"))
        }
        Some(t) => Some(t.trim().to_string()),
        None => None,
    };
    let estimated_hours = match raw.estimated_hours {
        Some(h) if !h.is_finite() || h < 0.0 => {
            return Err(DomainError::validation(
                "estimated_hours",
                "must be a non-negative number",
            ))
        }
        other => other,
    };
    Ok(TaskPatch {
        title,
        department: raw.department.as_deref().map(str::trim).map(String::from),
        risk_level: raw
            .risk_level
            .as_deref()
            .map(parse_risk_level)
            .transpose()?,
        audit_type: raw.audit_type.as_deref().map(str::trim).map(String::from),
        objective: raw.objective.as_deref().map(str::trim).map(String::from),
        planned_quarter: raw
            .planned_quarter
            .as_deref()
            .map(parse_quarter)
            .transpose()?,
        estimated_hours,
        lead_auditor: raw.lead_auditor.as_deref().map(str::trim).map(String::from),
        attachments: raw.attachments.clone(),
        status: raw.status.as_deref().map(parse_task_status).transpose()?,
    })
}

// ---------------------------------------------------------------------------
// Engagements and peripheral entities
// ---------------------------------------------------------------------------

/// Untyped engagement payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEngagementInput {
    pub title: Option<String>,
    pub department: Option<String>,
    pub lead_auditor_email: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<String>,
}

/// Normalized engagement input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementDraft {
    pub title: String,
    pub department: Option<String>,
    pub lead_auditor_email: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: EngagementStatus,
}

pub fn engagement_draft(raw: &RawEngagementInput) -> Result<EngagementDraft, DomainError> {
    let title = required_text("title", raw.title.as_deref())?;
    let lead_auditor_email = match raw.lead_auditor_email.as_deref() {
        Some(e) => {
            let e = e.trim();
            if !EMAIL_RE.is_match(e) {
                return Err(DomainError::validation(
                    "lead_auditor_email",
                    "must be a valid email address",
                ));
            }
            Some(e.to_string())
        }
        None => None,
    };
    let start_date = raw
        .start_date
        .as_deref()
        .map(|d| parse_iso_date("start_date", d))
        .transpose()?;
    let end_date = raw
        .end_date
        .as_deref()
        .map(|d| parse_iso_date("end_date", d))
        .transpose()?;
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if end < start {
            return Err(DomainError::validation(
                "end_date",
                "must not be before start_date",
            ));
        }
    }
    let status = match raw.status.as_deref() {
        Some("planned") | None => EngagementStatus::Planned,
        Some("fieldwork") => EngagementStatus::Fieldwork,
        Some("reporting") => EngagementStatus::Reporting,
        Some("closed") => EngagementStatus::Closed,
        Some(other) => {
            return Err(DomainError::validation(
                "status",
                format!("unknown engagement status '{}'", other),
            ))
        }
    };
    Ok(EngagementDraft {
        title,
        department: raw.department.as_deref().map(str::trim).map(String::from),
        lead_auditor_email,
        start_date,
        end_date,
        status,
    })
}

/// Untyped PBC request payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPbcInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub status: Option<String>,
}

/// Normalized PBC request input. Status defaults to `open`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PbcDraft {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub status: PbcStatus,
}

pub fn pbc_draft(raw: &RawPbcInput) -> Result<PbcDraft, DomainError> {
    let title = required_text("title", raw.title.as_deref())?;
    let due_date = raw
        .due_date
        .as_deref()
        .map(|d| parse_iso_date("due_date", d))
        .transpose()?;
    let status = match raw.status.as_deref() {
        Some("open") | None => PbcStatus::Open,
        Some("received") => PbcStatus::Received,
        Some("overdue") => PbcStatus::Overdue,
        Some("closed") => PbcStatus::Closed,
        Some(other) => {
            return Err(DomainError::validation(
                "status",
                format!("unknown PBC status '{}'", other),
            ))
        }
    };
    Ok(PbcDraft {
        title,
        description: raw.description.as_deref().map(str::trim).map(String::from),
        due_date,
        status,
    })
}

/// Untyped audit-test payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTestInput {
    pub name: Option<String>,
    pub objective: Option<String>,
    pub steps: Option<Vec<String>>,
    pub status: Option<String>,
}

/// Normalized audit-test input. Steps are a non-empty list of non-empty
/// strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestDraft {
    pub name: String,
    pub objective: Option<String>,
    pub steps: Vec<String>,
    pub status: TestStatus,
}

pub fn test_draft(raw: &RawTestInput) -> Result<TestDraft, DomainError> {
    let name = required_text("name", raw.name.as_deref())?;
    let steps = raw
        .steps
        .as_deref()
        .ok_or_else(|| DomainError::validation("steps", "is required"))?;
    if steps.is_empty() {
        return Err(DomainError::validation("steps", "must not be empty"));
    }
    let mut normalized = Vec::with_capacity(steps.len());
    for step in steps {
        let step = step.trim();
        if step.is_empty() {
            return Err(DomainError::validation(
                "steps",
                "must not contain empty entries",
            ));
        }
        normalized.push(step.to_string());
    }
    let status = match raw.status.as_deref() {
        Some("draft") | None => TestStatus::Draft,
        Some("active") => TestStatus::Active,
        Some("retired") => TestStatus::Retired,
        Some(other) => {
            return Err(DomainError::validation(
                "status",
                format!("unknown test status '{}'", other),
            ))
        }
    };
    Ok(TestDraft {
        name,
        objective: raw.objective.as_deref().map(str::trim).map(String::from),
        steps: normalized,
        status,
    })
}

/// Untyped test-run payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTestRunInput {
    pub test_id: Option<String>,
    pub executed_by: Option<String>,
    pub result: Option<String>,
    pub notes: Option<String>,
}

/// Normalized test-run input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRunDraft {
    pub test_id: TestId,
    pub executed_by: ActorId,
    pub result: TestResult,
    pub notes: Option<String>,
}

pub fn test_run_draft(raw: &RawTestRunInput) -> Result<TestRunDraft, DomainError> {
    let test_id = required_text("test_id", raw.test_id.as_deref())?;
    let test_id = uuid::Uuid::parse_str(&test_id)
        .map(TestId)
        .map_err(|_| DomainError::validation("test_id", "must be a valid UUID"))?;
    let executed_by = required_text("executed_by", raw.executed_by.as_deref())?;
    let result = match raw.result.as_deref() {
        Some("pass") => TestResult::Pass,
        Some("fail") => TestResult::Fail,
        Some("blocked") => TestResult::Blocked,
        Some(other) => {
            return Err(DomainError::validation(
                "result",
                format!("unknown test result '{}'", other),
            ))
        }
        None => return Err(DomainError::validation("result", "is required")),
    };
    Ok(TestRunDraft {
        test_id,
        executed_by: ActorId(executed_by),
        result,
        notes: raw.notes.as_deref().map(str::trim).map(String::from),
    })
}

// ---------------------------------------------------------------------------
// Evidence metadata
// ---------------------------------------------------------------------------

/// Untyped evidence metadata payload accompanying an upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEvidenceInput {
    pub engagement_id: Option<String>,
    pub category: Option<String>,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub file_size: Option<u64>,
    pub storage: Option<String>,
}

/// Normalized evidence metadata. Storage mode defaults to `local`; the
/// virus-scan status always starts `pending` and is not caller-settable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceDraft {
    pub engagement_id: EngagementId,
    pub category: String,
    pub file_name: String,
    pub mime_type: String,
    pub file_size: u64,
    pub storage: StorageKind,
}

pub fn evidence_draft(raw: &RawEvidenceInput) -> Result<EvidenceDraft, DomainError> {
    let engagement_id = required_text("engagement_id", raw.engagement_id.as_deref())?;
    let engagement_id = uuid::Uuid::parse_str(&engagement_id)
        .map(EngagementId)
        .map_err(|_| DomainError::validation("engagement_id", "must be a valid UUID"))?;
    let file_name = required_text("file_name", raw.file_name.as_deref())?;
    let mime_type = required_text("mime_type", raw.mime_type.as_deref())?;
    let file_size = raw
        .file_size
        .ok_or_else(|| DomainError::validation("file_size", "is required"))?;
    if file_size == 0 {
        return Err(DomainError::validation("file_size", "must be greater than zero"));
    }
    let storage = match raw.storage.as_deref() {
        Some("local") | None => StorageKind::Local,
        Some("remote") => StorageKind::Remote,
        Some(other) => {
            return Err(DomainError::validation(
                "storage",
                format!("unknown storage kind '{}'", other),
            ))
        }
    };
    Ok(EvidenceDraft {
        engagement_id,
        category: raw
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or("general")
            .to_string(),
        file_name,
        mime_type,
        file_size,
        storage,
    })
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn required_text(field: &str, value: Option<&str>) -> Result<String, DomainError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(DomainError::validation(field, "is required")),
    }
}

fn non_negative_opt(field: &str, value: Option<f64>) -> Result<Option<f64>, DomainError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(DomainError::validation(
            field,
            "must be a non-negative number",
        )),
        other => Ok(other),
    }
}

fn parse_iso_date(field: &str, value: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| DomainError::validation(field, "must be an ISO date (YYYY-MM-DD)"))
}

fn parse_risk_level(value: &str) -> Result<RiskLevel, DomainError> {
    match value.trim() {
        "low" => Ok(RiskLevel::Low),
        "medium" => Ok(RiskLevel::Medium),
        "high" => Ok(RiskLevel::High),
        other => Err(DomainError::validation(
            "risk_level",
            format!("unknown risk level '{}'", other),
        )),
    }
}

fn parse_quarter(value: &str) -> Result<String, DomainError> {
    let value = value.trim();
    if QUARTERS.contains(&value) {
        Ok(value.to_string())
    } else {
        Err(DomainError::validation(
            "planned_quarter",
            "must be one of Q1, Q2, Q3, Q4",
        ))
    }
}

fn parse_task_status(value: &str) -> Result<TaskStatus, DomainError> {
    match value.trim() {
        "not_started" => Ok(TaskStatus::NotStarted),
        "in_progress" => Ok(TaskStatus::InProgress),
        "completed" => Ok(TaskStatus::Completed),
        "blocked" => Ok(TaskStatus::Blocked),
        other => Err(DomainError::validation(
            "status",
            format!("unknown task status '{}'", other),
        )),
    }
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
