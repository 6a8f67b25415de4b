//! Unit tests for the validation layer.

use crate::domain::catalog::{EngagementStatus, PbcStatus, TestResult, TestStatus};
use crate::domain::errors::DomainError;
use crate::domain::types::{RiskLevel, StorageKind, TaskStatus};
use crate::domain::validation::{
    engagement_draft, evidence_draft, pbc_draft, plan_draft, plan_patch, task_draft, task_patch,
    test_draft, test_run_draft, RawEngagementInput, RawEvidenceInput, RawPbcInput, RawPlanInput,
    RawPlanPatch, RawTaskInput, RawTestInput, RawTestRunInput,
};

fn valid_plan_input() -> RawPlanInput {
    RawPlanInput {
        title: Some("FY25 Annual Plan".to_string()),
        fiscal_year: Some(2025),
        created_by: Some("lead.auditor".to_string()),
        ..Default::default()
    }
}

fn assert_validation_on(result: Result<impl std::fmt::Debug, DomainError>, expected_field: &str) {
    match result {
        Err(DomainError::Validation { field, .. }) => assert_eq!(field, expected_field),
        other => panic!("expected validation error on '{}', got {:?}", expected_field, other),
    }
}

// ============================================================================
// Plan Input
// ============================================================================

#[test]
fn plan_draft_accepts_minimal_input() {
    let draft = plan_draft(&valid_plan_input()).unwrap();
    assert_eq!(draft.title, "FY25 Annual Plan");
    assert_eq!(draft.fiscal_year.0, 2025);
    assert_eq!(draft.version, "1.0");
}

#[test]
fn plan_draft_rejects_blank_title() {
    let mut raw = valid_plan_input();
    raw.title = Some("   ".to_string());
    assert_validation_on(plan_draft(&raw), "title");
}

#[test]
fn plan_draft_rejects_out_of_range_fiscal_year() {
    let mut raw = valid_plan_input();
    raw.fiscal_year = Some(1999);
    assert_validation_on(plan_draft(&raw), "fiscal_year");

    raw.fiscal_year = Some(2101);
    assert_validation_on(plan_draft(&raw), "fiscal_year");
}

#[test]
fn plan_draft_rejects_negative_hours() {
    let mut raw = valid_plan_input();
    raw.advisory_hours = Some(-5.0);
    assert_validation_on(plan_draft(&raw), "advisory_hours");
}

#[test]
fn plan_draft_assigns_fresh_ids() {
    let a = plan_draft(&valid_plan_input()).unwrap();
    let b = plan_draft(&valid_plan_input()).unwrap();
    assert_ne!(a.id, b.id);
}

#[test]
fn plan_patch_allows_absent_fields() {
    let patch = plan_patch(&RawPlanPatch::default()).unwrap();
    assert!(patch.title.is_none());
    assert!(patch.allocation.is_empty());
}

#[test]
fn plan_patch_rejects_blank_title() {
    let raw = RawPlanPatch {
        title: Some("".to_string()),
        ..Default::default()
    };
    assert_validation_on(plan_patch(&raw), "title");
}

// ============================================================================
// Task Input
// ============================================================================

fn valid_task_input() -> RawTaskInput {
    RawTaskInput {
        code: Some("T-01".to_string()),
        title: Some("Payroll review".to_string()),
        estimated_hours: Some(120.0),
        ..Default::default()
    }
}

#[test]
fn task_draft_accepts_minimal_input() {
    let draft = task_draft(&valid_task_input()).unwrap();
    assert_eq!(draft.code.as_str(), "T-01");
    assert_eq!(draft.status, TaskStatus::NotStarted);
}

#[test]
fn task_draft_rejects_short_code() {
    let mut raw = valid_task_input();
    raw.code = Some("T".to_string());
    assert_validation_on(task_draft(&raw), "code");
}

#[test]
fn task_draft_rejects_unknown_risk_level() {
    let mut raw = valid_task_input();
    raw.risk_level = Some("severe".to_string());
    assert_validation_on(task_draft(&raw), "risk_level");
}

#[test]
fn task_draft_parses_risk_and_quarter() {
    let mut raw = valid_task_input();
    raw.risk_level = Some("high".to_string());
    raw.planned_quarter = Some("Q3".to_string());
    let draft = task_draft(&raw).unwrap();
    assert_eq!(draft.risk_level, Some(RiskLevel::High));
    assert_eq!(draft.planned_quarter.as_deref(), Some("Q3"));
}

#[test]
fn task_draft_rejects_invalid_quarter() {
    let mut raw = valid_task_input();
    raw.planned_quarter = Some("Q5".to_string());
    assert_validation_on(task_draft(&raw), "planned_quarter");
}

#[test]
fn task_patch_ignores_code_field() {
    let patch = task_patch(&RawTaskInput {
        code: Some("NEW-CODE".to_string()),
        status: Some("completed".to_string()),
        ..Default::default()
    })
    .unwrap();
    // Code is not patchable; only the recognized fields come through.
    assert_eq!(patch.status, Some(TaskStatus::Completed));
    assert!(patch.title.is_none());
}

#[test]
fn task_patch_rejects_negative_hours() {
    let raw = RawTaskInput {
        estimated_hours: Some(-1.0),
        ..Default::default()
    };
    assert_validation_on(task_patch(&raw), "estimated_hours");
}

// ============================================================================
// Engagement Input
// ============================================================================

#[test]
fn engagement_draft_validates_email() {
    let raw = RawEngagementInput {
        title: Some("Payroll audit".to_string()),
        lead_auditor_email: Some("not-an-email".to_string()),
        ..Default::default()
    };
    assert_validation_on(engagement_draft(&raw), "lead_auditor_email");
}

#[test]
fn engagement_draft_accepts_valid_email_and_dates() {
    let raw = RawEngagementInput {
        title: Some("Payroll audit".to_string()),
        lead_auditor_email: Some("jane@example.com".to_string()),
        start_date: Some("2025-01-15".to_string()),
        end_date: Some("2025-03-31".to_string()),
        status: Some("fieldwork".to_string()),
        ..Default::default()
    };
    let draft = engagement_draft(&raw).unwrap();
    assert_eq!(draft.status, EngagementStatus::Fieldwork);
    assert!(draft.start_date.unwrap() < draft.end_date.unwrap());
}

#[test]
fn engagement_draft_rejects_end_before_start() {
    let raw = RawEngagementInput {
        title: Some("Payroll audit".to_string()),
        start_date: Some("2025-03-31".to_string()),
        end_date: Some("2025-01-15".to_string()),
        ..Default::default()
    };
    assert_validation_on(engagement_draft(&raw), "end_date");
}

#[test]
fn engagement_draft_rejects_malformed_date() {
    let raw = RawEngagementInput {
        title: Some("Payroll audit".to_string()),
        start_date: Some("15/01/2025".to_string()),
        ..Default::default()
    };
    assert_validation_on(engagement_draft(&raw), "start_date");
}

// ============================================================================
// PBC / Test / Run Input
// ============================================================================

#[test]
fn pbc_draft_defaults_status_to_open() {
    let draft = pbc_draft(&RawPbcInput {
        title: Some("Trial balance".to_string()),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(draft.status, PbcStatus::Open);
}

#[test]
fn test_draft_requires_non_empty_steps() {
    let raw = RawTestInput {
        name: Some("Three-way match".to_string()),
        steps: Some(vec![]),
        ..Default::default()
    };
    assert_validation_on(test_draft(&raw), "steps");

    let raw = RawTestInput {
        name: Some("Three-way match".to_string()),
        steps: Some(vec!["Select sample".to_string(), "  ".to_string()]),
        ..Default::default()
    };
    assert_validation_on(test_draft(&raw), "steps");
}

#[test]
fn test_draft_defaults_status_to_draft() {
    let draft = test_draft(&RawTestInput {
        name: Some("Three-way match".to_string()),
        steps: Some(vec!["Select sample".to_string()]),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(draft.status, TestStatus::Draft);
}

#[test]
fn test_run_draft_requires_known_result() {
    let raw = RawTestRunInput {
        test_id: Some(uuid::Uuid::new_v4().to_string()),
        executed_by: Some("jane".to_string()),
        result: Some("maybe".to_string()),
        ..Default::default()
    };
    assert_validation_on(test_run_draft(&raw), "result");
}

#[test]
fn test_run_draft_parses_result() {
    let draft = test_run_draft(&RawTestRunInput {
        test_id: Some(uuid::Uuid::new_v4().to_string()),
        executed_by: Some("jane".to_string()),
        result: Some("fail".to_string()),
        notes: Some("two exceptions".to_string()),
    })
    .unwrap();
    assert_eq!(draft.result, TestResult::Fail);
}

// ============================================================================
// Evidence Input
// ============================================================================

fn valid_evidence_input() -> RawEvidenceInput {
    RawEvidenceInput {
        engagement_id: Some(uuid::Uuid::new_v4().to_string()),
        file_name: Some("invoice.pdf".to_string()),
        mime_type: Some("application/pdf".to_string()),
        file_size: Some(1024),
        ..Default::default()
    }
}

#[test]
fn evidence_draft_defaults_category_and_storage() {
    let draft = evidence_draft(&valid_evidence_input()).unwrap();
    assert_eq!(draft.category, "general");
    assert_eq!(draft.storage, StorageKind::Local);
}

#[test]
fn evidence_draft_rejects_zero_size() {
    let mut raw = valid_evidence_input();
    raw.file_size = Some(0);
    assert_validation_on(evidence_draft(&raw), "file_size");
}

#[test]
fn evidence_draft_rejects_bad_engagement_id() {
    let mut raw = valid_evidence_input();
    raw.engagement_id = Some("not-a-uuid".to_string());
    assert_validation_on(evidence_draft(&raw), "engagement_id");
}

#[test]
fn evidence_draft_rejects_unknown_storage() {
    let mut raw = valid_evidence_input();
    raw.storage = Some("tape".to_string());
    assert_validation_on(evidence_draft(&raw), "storage");
}
