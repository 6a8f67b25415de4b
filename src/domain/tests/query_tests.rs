//! Tests for the read-side plan event dispatch.

use super::*;
use crate::domain::plan::PlanEvent;
use crate::domain::types::{
    ActorId, FiscalYear, HourAllocation, PlanId, PlanStatus, TimestampUtc,
};
use crate::domain::validation::PlanDraft;
use std::collections::HashMap;

fn created_envelope(plan_id: &PlanId, sequence: usize) -> cqrs_es::EventEnvelope<PlanAggregate> {
    cqrs_es::EventEnvelope {
        aggregate_id: plan_id.to_string(),
        sequence,
        payload: PlanEvent::PlanCreated {
            draft: PlanDraft {
                id: plan_id.clone(),
                title: "FY25 Annual Plan".to_string(),
                fiscal_year: FiscalYear(2025),
                version: "1.0".to_string(),
                introduction: None,
                total_available_hours: None,
                allocation: HourAllocation::default(),
                estimated_budget: None,
                created_by: ActorId::from("lead.auditor"),
            },
            created_at: TimestampUtc::now(),
        },
        metadata: HashMap::new(),
    }
}

#[tokio::test]
async fn dispatch_applies_events_and_fans_out() {
    let view = Arc::new(RwLock::new(PlanView::default()));
    let (snapshot_tx, mut snapshot_rx) = watch::channel(PlanView::default());
    let (event_tx, mut event_rx) = broadcast::channel(16);
    let query = PlanQuery::new(view.clone(), snapshot_tx, event_tx);

    let plan_id = PlanId::new();
    query
        .dispatch(&plan_id.to_string(), &[created_envelope(&plan_id, 1)])
        .await;

    let updated = view.read().await;
    assert_eq!(updated.title(), Some("FY25 Annual Plan"));
    assert_eq!(updated.status(), Some(PlanStatus::Draft));
    drop(updated);

    snapshot_rx.changed().await.unwrap();
    assert_eq!(snapshot_rx.borrow().last_event_sequence(), 1);

    let received = event_rx.try_recv().unwrap();
    assert_eq!(received.aggregate_id, plan_id.to_string());
    assert_eq!(received.sequence, 1);
}

#[tokio::test]
async fn empty_dispatch_publishes_nothing() {
    let view = Arc::new(RwLock::new(PlanView::default()));
    let (snapshot_tx, snapshot_rx) = watch::channel(PlanView::default());
    let (event_tx, mut event_rx) = broadcast::channel(16);
    let query = PlanQuery::new(view, snapshot_tx, event_tx);

    query.dispatch(&PlanId::new().to_string(), &[]).await;

    assert!(!snapshot_rx.has_changed().unwrap());
    assert!(event_rx.try_recv().is_err());
}

#[tokio::test]
async fn dispatch_survives_dropped_subscribers() {
    let view = Arc::new(RwLock::new(PlanView::default()));
    let (snapshot_tx, _snapshot_rx) = watch::channel(PlanView::default());
    let (event_tx, event_rx) = broadcast::channel(16);
    drop(event_rx);
    let query = PlanQuery::new(view.clone(), snapshot_tx, event_tx);

    let plan_id = PlanId::new();
    query
        .dispatch(&plan_id.to_string(), &[created_envelope(&plan_id, 1)])
        .await;

    assert_eq!(view.read().await.last_event_sequence(), 1);
}
