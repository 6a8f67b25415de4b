//! Engagement catalog: engagements, PBC requests, audit tests and runs.
//!
//! These entities are plain CRUD records rather than event-sourced
//! aggregates. The catalog holds them in memory behind async locks and
//! enforces the referential checks the rest of the domain relies on
//! (evidence registration and PBC requests both point at an engagement,
//! test runs point at a test definition).

use crate::domain::errors::DomainError;
use crate::domain::types::{
    ActorId, EngagementId, PbcId, RunId, TestId, TimestampUtc,
};
use crate::domain::validation::{EngagementDraft, PbcDraft, TestDraft, TestRunDraft};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Engagement lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EngagementStatus {
    #[default]
    Planned,
    Fieldwork,
    Reporting,
    Closed,
}

/// PBC (provided-by-client) request status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PbcStatus {
    #[default]
    Open,
    Received,
    Overdue,
    Closed,
}

/// Audit-test definition status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    #[default]
    Draft,
    Active,
    Retired,
}

/// Outcome of a single test execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestResult {
    Pass,
    Fail,
    Blocked,
}

/// An audit engagement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Engagement {
    pub id: EngagementId,
    pub title: String,
    pub department: Option<String>,
    pub lead_auditor_email: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: EngagementStatus,
    pub created_at: TimestampUtc,
    pub updated_at: TimestampUtc,
}

/// A request for material provided by the auditee, tied to an engagement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PbcRequest {
    pub id: PbcId,
    pub engagement_id: EngagementId,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub status: PbcStatus,
    pub created_at: TimestampUtc,
    pub updated_at: TimestampUtc,
}

/// A reusable audit-test definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditTest {
    pub id: TestId,
    pub name: String,
    pub objective: Option<String>,
    pub steps: Vec<String>,
    pub status: TestStatus,
    pub created_at: TimestampUtc,
    pub updated_at: TimestampUtc,
}

/// One execution of an audit test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRun {
    pub id: RunId,
    pub test_id: TestId,
    pub executed_by: ActorId,
    pub result: TestResult,
    pub notes: Option<String>,
    pub executed_at: TimestampUtc,
}

/// In-memory catalog of engagements and their satellite records.
#[derive(Debug, Default)]
pub struct Catalog {
    engagements: RwLock<HashMap<EngagementId, Engagement>>,
    pbc_requests: RwLock<HashMap<PbcId, PbcRequest>>,
    tests: RwLock<HashMap<TestId, AuditTest>>,
    runs: RwLock<HashMap<RunId, TestRun>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    // -- engagements --------------------------------------------------------

    /// Registers a new engagement and returns it.
    pub async fn create_engagement(&self, draft: EngagementDraft) -> Engagement {
        let now = TimestampUtc::now();
        let engagement = Engagement {
            id: EngagementId::new(),
            title: draft.title,
            department: draft.department,
            lead_auditor_email: draft.lead_auditor_email,
            start_date: draft.start_date,
            end_date: draft.end_date,
            status: draft.status,
            created_at: now,
            updated_at: now,
        };
        self.engagements
            .write()
            .await
            .insert(engagement.id.clone(), engagement.clone());
        engagement
    }

    /// Looks up an engagement by id.
    pub async fn engagement(&self, id: &EngagementId) -> Result<Engagement, DomainError> {
        self.engagements
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("engagement", id.to_string()))
    }

    /// Lists all engagements, most recently created first.
    pub async fn engagements(&self) -> Vec<Engagement> {
        let mut all: Vec<Engagement> = self.engagements.read().await.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    /// Replaces an engagement's mutable fields from a fresh draft.
    pub async fn update_engagement(
        &self,
        id: &EngagementId,
        draft: EngagementDraft,
    ) -> Result<Engagement, DomainError> {
        let mut map = self.engagements.write().await;
        let engagement = map
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found("engagement", id.to_string()))?;
        engagement.title = draft.title;
        engagement.department = draft.department;
        engagement.lead_auditor_email = draft.lead_auditor_email;
        engagement.start_date = draft.start_date;
        engagement.end_date = draft.end_date;
        engagement.status = draft.status;
        engagement.updated_at = TimestampUtc::now();
        Ok(engagement.clone())
    }

    /// Verifies an engagement exists. Used as the referential check before
    /// attaching evidence or PBC requests.
    pub async fn require_engagement(&self, id: &EngagementId) -> Result<(), DomainError> {
        if self.engagements.read().await.contains_key(id) {
            Ok(())
        } else {
            Err(DomainError::not_found("engagement", id.to_string()))
        }
    }

    // -- PBC requests -------------------------------------------------------

    /// Creates a PBC request under an existing engagement.
    pub async fn create_pbc(
        &self,
        engagement_id: &EngagementId,
        draft: PbcDraft,
    ) -> Result<PbcRequest, DomainError> {
        self.require_engagement(engagement_id).await?;
        let now = TimestampUtc::now();
        let request = PbcRequest {
            id: PbcId::new(),
            engagement_id: engagement_id.clone(),
            title: draft.title,
            description: draft.description,
            due_date: draft.due_date,
            status: draft.status,
            created_at: now,
            updated_at: now,
        };
        self.pbc_requests
            .write()
            .await
            .insert(request.id.clone(), request.clone());
        Ok(request)
    }

    /// Looks up a PBC request by id.
    pub async fn pbc(&self, id: &PbcId) -> Result<PbcRequest, DomainError> {
        self.pbc_requests
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("pbc_request", id.to_string()))
    }

    /// Lists the PBC requests of one engagement, most recent first.
    pub async fn pbc_for_engagement(&self, engagement_id: &EngagementId) -> Vec<PbcRequest> {
        let mut requests: Vec<PbcRequest> = self
            .pbc_requests
            .read()
            .await
            .values()
            .filter(|r| &r.engagement_id == engagement_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        requests
    }

    /// Advances a PBC request's status.
    pub async fn set_pbc_status(
        &self,
        id: &PbcId,
        status: PbcStatus,
    ) -> Result<PbcRequest, DomainError> {
        let mut map = self.pbc_requests.write().await;
        let request = map
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found("pbc_request", id.to_string()))?;
        request.status = status;
        request.updated_at = TimestampUtc::now();
        Ok(request.clone())
    }

    // -- audit tests and runs -----------------------------------------------

    /// Registers a new audit-test definition.
    pub async fn create_test(&self, draft: TestDraft) -> AuditTest {
        let now = TimestampUtc::now();
        let test = AuditTest {
            id: TestId::new(),
            name: draft.name,
            objective: draft.objective,
            steps: draft.steps,
            status: draft.status,
            created_at: now,
            updated_at: now,
        };
        self.tests
            .write()
            .await
            .insert(test.id.clone(), test.clone());
        test
    }

    /// Looks up a test definition by id.
    pub async fn test(&self, id: &TestId) -> Result<AuditTest, DomainError> {
        self.tests
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("audit_test", id.to_string()))
    }

    /// Lists all test definitions, most recently created first.
    pub async fn tests(&self) -> Vec<AuditTest> {
        let mut all: Vec<AuditTest> = self.tests.read().await.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    /// Records an execution of an existing test. Fails with `NotFound` when
    /// the referenced test does not exist.
    pub async fn record_run(&self, draft: TestRunDraft) -> Result<TestRun, DomainError> {
        if !self.tests.read().await.contains_key(&draft.test_id) {
            return Err(DomainError::not_found(
                "audit_test",
                draft.test_id.to_string(),
            ));
        }
        let run = TestRun {
            id: RunId::new(),
            test_id: draft.test_id,
            executed_by: draft.executed_by,
            result: draft.result,
            notes: draft.notes,
            executed_at: TimestampUtc::now(),
        };
        self.runs.write().await.insert(run.id.clone(), run.clone());
        Ok(run)
    }

    /// Lists the runs of one test, most recent first.
    pub async fn runs_for_test(&self, test_id: &TestId) -> Vec<TestRun> {
        let mut runs: Vec<TestRun> = self
            .runs
            .read()
            .await
            .values()
            .filter(|r| &r.test_id == test_id)
            .cloned()
            .collect();
        runs.sort_by(|a, b| b.executed_at.cmp(&a.executed_at));
        runs
    }
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
