//! Unit tests for the engagement catalog and its referential checks.

use crate::domain::catalog::{Catalog, EngagementStatus, PbcStatus, TestResult};
use crate::domain::errors::DomainError;
use crate::domain::types::{ActorId, EngagementId, TestId};
use crate::domain::validation::{EngagementDraft, PbcDraft, TestDraft, TestRunDraft};

fn engagement(title: &str) -> EngagementDraft {
    EngagementDraft {
        title: title.to_string(),
        department: Some("Finance".to_string()),
        lead_auditor_email: Some("jane@example.com".to_string()),
        start_date: None,
        end_date: None,
        status: EngagementStatus::Planned,
    }
}

fn pbc(title: &str) -> PbcDraft {
    PbcDraft {
        title: title.to_string(),
        description: None,
        due_date: None,
        status: PbcStatus::Open,
    }
}

#[tokio::test]
async fn create_and_fetch_engagement() {
    let catalog = Catalog::new();

    let created = catalog.create_engagement(engagement("Payroll audit")).await;
    let fetched = catalog.engagement(&created.id).await.unwrap();

    assert_eq!(fetched.title, "Payroll audit");
    assert_eq!(fetched.status, EngagementStatus::Planned);
}

#[tokio::test]
async fn missing_engagement_is_not_found() {
    let catalog = Catalog::new();

    let result = catalog.engagement(&EngagementId::new()).await;
    assert!(matches!(
        result,
        Err(DomainError::NotFound { entity: "engagement", .. })
    ));
}

#[tokio::test]
async fn update_engagement_replaces_fields() {
    let catalog = Catalog::new();
    let created = catalog.create_engagement(engagement("Payroll audit")).await;

    let mut draft = engagement("Payroll audit FY25");
    draft.status = EngagementStatus::Fieldwork;
    let updated = catalog.update_engagement(&created.id, draft).await.unwrap();

    assert_eq!(updated.title, "Payroll audit FY25");
    assert_eq!(updated.status, EngagementStatus::Fieldwork);
    assert_eq!(updated.created_at, created.created_at);
}

#[tokio::test]
async fn pbc_requires_existing_engagement() {
    let catalog = Catalog::new();

    let result = catalog.create_pbc(&EngagementId::new(), pbc("Trial balance")).await;
    assert!(matches!(result, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn pbc_lifecycle_under_engagement() {
    let catalog = Catalog::new();
    let eng = catalog.create_engagement(engagement("Payroll audit")).await;

    let request = catalog.create_pbc(&eng.id, pbc("Trial balance")).await.unwrap();
    assert_eq!(request.status, PbcStatus::Open);

    let advanced = catalog
        .set_pbc_status(&request.id, PbcStatus::Received)
        .await
        .unwrap();
    assert_eq!(advanced.status, PbcStatus::Received);

    let listed = catalog.pbc_for_engagement(&eng.id).await;
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn test_run_requires_existing_test() {
    let catalog = Catalog::new();

    let result = catalog
        .record_run(TestRunDraft {
            test_id: TestId::new(),
            executed_by: ActorId::from("jane"),
            result: TestResult::Pass,
            notes: None,
        })
        .await;

    assert!(matches!(
        result,
        Err(DomainError::NotFound { entity: "audit_test", .. })
    ));
}

#[tokio::test]
async fn test_runs_list_newest_first() {
    let catalog = Catalog::new();
    let test = catalog
        .create_test(TestDraft {
            name: "Three-way match".to_string(),
            objective: None,
            steps: vec!["Select sample".to_string()],
            status: Default::default(),
        })
        .await;

    for result in [TestResult::Pass, TestResult::Fail] {
        catalog
            .record_run(TestRunDraft {
                test_id: test.id.clone(),
                executed_by: ActorId::from("jane"),
                result,
                notes: None,
            })
            .await
            .unwrap();
    }

    let runs = catalog.runs_for_test(&test.id).await;
    assert_eq!(runs.len(), 2);
    assert!(runs[0].executed_at >= runs[1].executed_at);
}
