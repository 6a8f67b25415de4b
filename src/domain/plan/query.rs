//! Read-side dispatch: applies committed plan events to the shared view.
//!
//! Committed events flow through here once per commit. Each one updates the
//! in-memory projection and is forwarded to broadcast subscribers, then the
//! refreshed view is published on the watch channel. Workflow status
//! transitions are traced so the plan's lifecycle shows up in the logs.

use crate::domain::plan::view::{PlanEventEnvelope, PlanView};
use crate::domain::plan::PlanAggregate;
use async_trait::async_trait;
use cqrs_es::Query;
use std::sync::Arc;
use tokio::sync::{broadcast, watch, RwLock};

/// Applies committed events to the shared `PlanView` and fans them out.
pub struct PlanQuery {
    projection: Arc<RwLock<PlanView>>,
    snapshot_tx: watch::Sender<PlanView>,
    event_tx: broadcast::Sender<PlanEventEnvelope>,
}

impl PlanQuery {
    pub fn new(
        projection: Arc<RwLock<PlanView>>,
        snapshot_tx: watch::Sender<PlanView>,
        event_tx: broadcast::Sender<PlanEventEnvelope>,
    ) -> Self {
        Self {
            projection,
            snapshot_tx,
            event_tx,
        }
    }
}

#[async_trait]
impl Query<PlanAggregate> for PlanQuery {
    async fn dispatch(
        &self,
        aggregate_id: &str,
        events: &[cqrs_es::EventEnvelope<PlanAggregate>],
    ) {
        if events.is_empty() {
            return;
        }

        let mut view = self.projection.write().await;

        for event in events {
            let status_before = view.status();
            view.apply_event(aggregate_id, &event.payload, event.sequence as u64);

            let status_after = view.status();
            if status_after != status_before {
                tracing::info!(
                    plan = %aggregate_id,
                    from = ?status_before,
                    to = ?status_after,
                    "plan status transition"
                );
            }

            if self.event_tx.send(PlanEventEnvelope::from(event)).is_err() {
                tracing::debug!("no live event subscribers");
            }
        }

        let _ = self.snapshot_tx.send(view.clone());
    }
}

#[cfg(test)]
#[path = "../tests/query_tests.rs"]
mod tests;
