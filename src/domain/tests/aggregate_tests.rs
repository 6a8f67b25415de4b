//! Unit tests for PlanAggregate command handling and event application.

use crate::domain::errors::DomainError;
use crate::domain::plan::{PlanAggregate, PlanCommand, PlanEvent, PlanState};
use crate::domain::services::PlanServices;
use crate::domain::types::{
    ActorId, ApprovalAction, FiscalYear, HourAllocation, HourAllocationPatch, PlanId,
    PlanStatus, TaskCode, TaskId, TaskStatus, TimestampUtc,
};
use crate::domain::validation::{PlanDraft, PlanPatch, TaskDraft, TaskPatch};
use cqrs_es::Aggregate;

/// Create default services for testing.
fn test_services() -> PlanServices {
    PlanServices::default()
}

/// A plan draft with a given hour ceiling and planned-task allocation.
fn plan_draft(total: Option<f64>, planned_task: Option<f64>) -> PlanDraft {
    PlanDraft {
        id: PlanId::new(),
        title: "FY25 Annual Plan".to_string(),
        fiscal_year: FiscalYear(2025),
        version: "1.0".to_string(),
        introduction: None,
        total_available_hours: total,
        allocation: HourAllocation {
            planned_task,
            ..Default::default()
        },
        estimated_budget: None,
        created_by: ActorId::from("lead.auditor"),
    }
}

fn task_draft(code: &str, hours: f64) -> TaskDraft {
    TaskDraft {
        id: TaskId::new(),
        code: TaskCode::from(code),
        title: format!("Task {}", code),
        department: Some("Finance".to_string()),
        risk_level: None,
        audit_type: None,
        objective: None,
        planned_quarter: Some("Q1".to_string()),
        estimated_hours: hours,
        lead_auditor: None,
        attachments: Vec::new(),
        status: TaskStatus::NotStarted,
    }
}

/// Apply PlanCreated to get an initialized aggregate in Draft status.
fn active_aggregate(total: Option<f64>, planned_task: Option<f64>) -> PlanAggregate {
    let mut agg = PlanAggregate::default();
    agg.apply(PlanEvent::PlanCreated {
        draft: plan_draft(total, planned_task),
        created_at: TimestampUtc::now(),
    });
    agg
}

/// An active aggregate that already owns one task.
fn aggregate_with_task() -> PlanAggregate {
    let mut agg = active_aggregate(Some(2000.0), Some(1900.0));
    agg.apply(PlanEvent::TaskAdded {
        task: task_draft("T-01", 120.0),
        added_at: TimestampUtc::now(),
    });
    agg
}

fn existing_task_id(agg: &PlanAggregate) -> TaskId {
    match &agg.state {
        PlanState::Active(data) => data.tasks()[0].id.clone(),
        _ => panic!("Expected Active state"),
    }
}

// ============================================================================
// CreatePlan Tests
// ============================================================================

#[tokio::test]
async fn create_plan_within_ceiling_succeeds() {
    let agg = PlanAggregate::default();

    let events = agg
        .handle(
            PlanCommand::CreatePlan {
                draft: plan_draft(Some(2000.0), Some(1900.0)),
            },
            &test_services(),
        )
        .await
        .unwrap();

    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], PlanEvent::PlanCreated { .. }));
}

#[tokio::test]
async fn create_plan_over_ceiling_fails() {
    let agg = PlanAggregate::default();

    let result = agg
        .handle(
            PlanCommand::CreatePlan {
                draft: plan_draft(Some(2000.0), Some(2100.0)),
            },
            &test_services(),
        )
        .await;

    assert!(matches!(
        result,
        Err(DomainError::AllocationExceedsTotal { .. })
    ));
}

#[tokio::test]
async fn create_plan_without_total_skips_ceiling() {
    let agg = PlanAggregate::default();

    let events = agg
        .handle(
            PlanCommand::CreatePlan {
                draft: plan_draft(None, Some(5000.0)),
            },
            &test_services(),
        )
        .await
        .unwrap();

    assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn create_plan_on_active_fails() {
    let agg = active_aggregate(None, None);

    let result = agg
        .handle(
            PlanCommand::CreatePlan {
                draft: plan_draft(None, None),
            },
            &test_services(),
        )
        .await;

    assert!(matches!(result, Err(DomainError::Conflict { .. })));
}

#[tokio::test]
async fn apply_plan_created_initializes_state() {
    let agg = active_aggregate(Some(2000.0), Some(1900.0));

    match &agg.state {
        PlanState::Active(data) => {
            assert_eq!(data.title(), "FY25 Annual Plan");
            assert_eq!(data.fiscal_year(), FiscalYear(2025));
            assert_eq!(data.status(), PlanStatus::Draft);
            assert!(data.tasks().is_empty());
            assert!(data.approvals().is_empty());
        }
        _ => panic!("Expected Active state"),
    }
}

// ============================================================================
// UpdatePlan Tests
// ============================================================================

#[tokio::test]
async fn update_plan_revalidates_merged_allocation() {
    let agg = active_aggregate(Some(2000.0), Some(1900.0));

    // Raising a second category pushes the merged sum over the ceiling.
    let result = agg
        .handle(
            PlanCommand::UpdatePlan {
                patch: PlanPatch {
                    allocation: HourAllocationPatch {
                        advisory: Some(200.0),
                        ..Default::default()
                    },
                    ..Default::default()
                },
            },
            &test_services(),
        )
        .await;

    assert!(matches!(
        result,
        Err(DomainError::AllocationExceedsTotal { .. })
    ));
}

#[tokio::test]
async fn update_plan_can_raise_total_and_allocation_together() {
    let agg = active_aggregate(Some(2000.0), Some(1900.0));

    let events = agg
        .handle(
            PlanCommand::UpdatePlan {
                patch: PlanPatch {
                    total_available_hours: Some(2500.0),
                    allocation: HourAllocationPatch {
                        advisory: Some(400.0),
                        ..Default::default()
                    },
                    ..Default::default()
                },
            },
            &test_services(),
        )
        .await
        .unwrap();

    assert_eq!(events.len(), 1);
}

// ============================================================================
// Task Tests
// ============================================================================

#[tokio::test]
async fn add_task_with_duplicate_code_fails() {
    let agg = aggregate_with_task();

    let result = agg
        .handle(
            PlanCommand::AddTask {
                task: task_draft("T-01", 80.0),
            },
            &test_services(),
        )
        .await;

    assert!(matches!(result, Err(DomainError::Conflict { .. })));
}

#[tokio::test]
async fn add_task_with_fresh_code_succeeds() {
    let agg = aggregate_with_task();

    let events = agg
        .handle(
            PlanCommand::AddTask {
                task: task_draft("T-02", 80.0),
            },
            &test_services(),
        )
        .await
        .unwrap();

    assert!(matches!(events[0], PlanEvent::TaskAdded { .. }));
}

#[tokio::test]
async fn update_missing_task_fails() {
    let agg = aggregate_with_task();

    let result = agg
        .handle(
            PlanCommand::UpdateTask {
                task_id: TaskId::new(),
                patch: TaskPatch::default(),
            },
            &test_services(),
        )
        .await;

    assert!(matches!(result, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn remove_missing_task_fails() {
    let agg = aggregate_with_task();

    let result = agg
        .handle(
            PlanCommand::RemoveTask {
                task_id: TaskId::new(),
            },
            &test_services(),
        )
        .await;

    assert!(matches!(result, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn apply_task_update_patches_in_place() {
    let mut agg = aggregate_with_task();
    let task_id = existing_task_id(&agg);

    agg.apply(PlanEvent::TaskUpdated {
        task_id: task_id.clone(),
        patch: TaskPatch {
            status: Some(TaskStatus::Completed),
            estimated_hours: Some(42.0),
            ..Default::default()
        },
        updated_at: TimestampUtc::now(),
    });

    match &agg.state {
        PlanState::Active(data) => {
            let task = data.task(&task_id).unwrap();
            assert_eq!(task.status, TaskStatus::Completed);
            assert_eq!(task.estimated_hours, 42.0);
            // Untouched fields survive the patch.
            assert_eq!(task.code, TaskCode::from("T-01"));
        }
        _ => panic!("Expected Active state"),
    }
}

// ============================================================================
// Workflow Transition Tests
// ============================================================================

#[tokio::test]
async fn submit_for_review_without_tasks_fails() {
    let agg = active_aggregate(None, None);

    let result = agg
        .handle(
            PlanCommand::SubmitForReview {
                actor: None,
                role: "auditor".to_string(),
                comment: None,
            },
            &test_services(),
        )
        .await;

    assert!(matches!(result, Err(DomainError::Validation { .. })));
}

#[tokio::test]
async fn wizard_submit_without_tasks_fails() {
    let agg = active_aggregate(None, None);

    let result = agg
        .handle(
            PlanCommand::Submit {
                actor: None,
                role: "auditor".to_string(),
            },
            &test_services(),
        )
        .await;

    assert!(matches!(result, Err(DomainError::Validation { .. })));
}

#[tokio::test]
async fn submit_for_review_appends_approval_record() {
    let mut agg = aggregate_with_task();

    let events = agg
        .handle(
            PlanCommand::SubmitForReview {
                actor: Some(ActorId::from("jane")),
                role: "auditor".to_string(),
                comment: None,
            },
            &test_services(),
        )
        .await
        .unwrap();
    for event in events {
        agg.apply(event);
    }

    match &agg.state {
        PlanState::Active(data) => {
            assert_eq!(data.status(), PlanStatus::UnderReview);
            assert_eq!(data.approvals().len(), 1);
            let record = &data.approvals()[0];
            assert_eq!(record.action, ApprovalAction::Submit);
            assert_eq!(record.comment, "Submitted for review");
            assert_eq!(record.actor, Some(ActorId::from("jane")));
        }
        _ => panic!("Expected Active state"),
    }
}

#[tokio::test]
async fn reject_returns_plan_to_draft() {
    let mut agg = aggregate_with_task();
    agg.apply(PlanEvent::ReviewRequested {
        actor: None,
        role: "auditor".to_string(),
        comment: "ready".to_string(),
        requested_at: TimestampUtc::now(),
    });

    let events = agg
        .handle(
            PlanCommand::Reject {
                actor: Some(ActorId::from("boss")),
                role: "audit_manager".to_string(),
                comment: Some("needs rework".to_string()),
            },
            &test_services(),
        )
        .await
        .unwrap();
    for event in events {
        agg.apply(event);
    }

    match &agg.state {
        PlanState::Active(data) => {
            assert_eq!(data.status(), PlanStatus::Draft);
            assert_eq!(data.approvals().len(), 2);
            assert_eq!(data.approvals()[1].action, ApprovalAction::Reject);
            assert_eq!(data.approvals()[1].comment, "needs rework");
        }
        _ => panic!("Expected Active state"),
    }
}

#[tokio::test]
async fn wizard_submit_records_no_approval_entry() {
    let mut agg = aggregate_with_task();

    let events = agg
        .handle(
            PlanCommand::Submit {
                actor: Some(ActorId::from("jane")),
                role: "auditor".to_string(),
            },
            &test_services(),
        )
        .await
        .unwrap();
    for event in events {
        agg.apply(event);
    }

    match &agg.state {
        PlanState::Active(data) => {
            assert_eq!(data.status(), PlanStatus::Submitted);
            assert!(data.approvals().is_empty());
        }
        _ => panic!("Expected Active state"),
    }
}

#[tokio::test]
async fn submitted_plan_still_accepts_tasks() {
    let mut agg = aggregate_with_task();
    agg.apply(PlanEvent::PlanSubmitted {
        actor: None,
        role: "auditor".to_string(),
        submitted_at: TimestampUtc::now(),
    });

    // Only baselined locks the plan; submitted stays editable.
    let events = agg
        .handle(
            PlanCommand::AddTask {
                task: task_draft("T-02", 60.0),
            },
            &test_services(),
        )
        .await
        .unwrap();

    assert!(matches!(events[0], PlanEvent::TaskAdded { .. }));
}

// ============================================================================
// Baseline Lock Tests
// ============================================================================

fn baselined_aggregate() -> PlanAggregate {
    let mut agg = aggregate_with_task();
    agg.apply(PlanEvent::PlanBaselined {
        actor: None,
        role: "audit_manager".to_string(),
        comment: "Baselined".to_string(),
        baselined_at: TimestampUtc::now(),
    });
    agg
}

#[tokio::test]
async fn baselined_plan_rejects_every_mutation() {
    let agg = baselined_aggregate();
    let services = test_services();

    let commands = vec![
        PlanCommand::UpdatePlan {
            patch: PlanPatch::default(),
        },
        PlanCommand::AddTask {
            task: task_draft("T-99", 10.0),
        },
        PlanCommand::RemoveTask {
            task_id: existing_task_id(&agg),
        },
        PlanCommand::SubmitForReview {
            actor: None,
            role: "auditor".to_string(),
            comment: None,
        },
        PlanCommand::Approve {
            actor: None,
            role: "audit_manager".to_string(),
            comment: None,
        },
        PlanCommand::Baseline {
            actor: None,
            role: "audit_manager".to_string(),
            comment: None,
        },
        PlanCommand::DeletePlan { actor: None },
    ];

    for cmd in commands {
        let result = agg.handle(cmd, &services).await;
        assert!(matches!(result, Err(DomainError::PlanImmutable)));
    }
}

#[tokio::test]
async fn baseline_appends_approval_record() {
    let agg = baselined_aggregate();

    match &agg.state {
        PlanState::Active(data) => {
            assert_eq!(data.status(), PlanStatus::Baselined);
            assert_eq!(data.approvals().len(), 1);
            assert_eq!(data.approvals()[0].action, ApprovalAction::Baseline);
        }
        _ => panic!("Expected Active state"),
    }
}

// ============================================================================
// Uninitialized / Deleted Tests
// ============================================================================

#[tokio::test]
async fn commands_on_uninitialized_fail() {
    let agg = PlanAggregate::default();

    let result = agg
        .handle(
            PlanCommand::UpdatePlan {
                patch: PlanPatch::default(),
            },
            &test_services(),
        )
        .await;

    assert!(matches!(result, Err(DomainError::NotInitialized)));
}

#[tokio::test]
async fn commands_on_deleted_plan_fail() {
    let mut agg = active_aggregate(None, None);
    agg.apply(PlanEvent::PlanDeleted {
        actor: None,
        deleted_at: TimestampUtc::now(),
    });
    assert!(matches!(agg.state, PlanState::Deleted(_)));

    let result = agg
        .handle(
            PlanCommand::UpdatePlan {
                patch: PlanPatch::default(),
            },
            &test_services(),
        )
        .await;

    assert!(matches!(result, Err(DomainError::NotFound { .. })));
}

// ============================================================================
// Allocation Ceiling Property
// ============================================================================

mod allocation_props {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Any allocation whose sum stays at or under the ceiling is
        /// accepted; anything above is rejected.
        #[test]
        fn ceiling_is_enforced_exactly(
            total in 100.0f64..10_000.0,
            factor in 0.0f64..2.0,
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            let allocated = total * factor;
            let agg = PlanAggregate::default();
            let result = rt.block_on(agg.handle(
                PlanCommand::CreatePlan {
                    draft: plan_draft(Some(total), Some(allocated)),
                },
                &test_services(),
            ));

            if allocated > total {
                let rejected =
                    matches!(result, Err(DomainError::AllocationExceedsTotal { .. }));
                prop_assert!(rejected);
            } else {
                prop_assert!(result.is_ok());
            }
        }
    }
}
