//! Applies a computed [`ReconcilePlan`] against a store, one row at a time.
//!
//! Each mutation commits independently, so an interrupted run leaves the
//! store partially updated; the next run's diff converges it. Delivery is
//! at-least-once, never transactional across rows.

use tracing::{debug, info};

use reccy_core::reconcile::ReconcilePlan;

use crate::store::{RecommendationStore, StoreError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub upserted: usize,
    pub deleted: usize,
    pub unchanged: usize,
}

/// Applies upserts then deletes, stopping at the first store error. Rows
/// already applied stay applied.
pub async fn apply_plan(
    store: &dyn RecommendationStore,
    plan: &ReconcilePlan,
    remote_size: usize,
) -> Result<ReconcileOutcome, StoreError> {
    for (sku, payload) in &plan.upserts {
        store.upsert(sku, payload).await?;
        debug!(event_name = "reconcile.row_upserted", sku = %sku, "row upserted");
    }

    for sku in &plan.deletes {
        store.delete(sku).await?;
        debug!(event_name = "reconcile.row_deleted", sku = %sku, "row deleted");
    }

    let outcome = ReconcileOutcome {
        upserted: plan.upserts.len(),
        deleted: plan.deletes.len(),
        unchanged: remote_size.saturating_sub(plan.upserts.len() + plan.deletes.len()),
    };
    info!(
        event_name = "reconcile.completed",
        upserted = outcome.upserted,
        deleted = outcome.deleted,
        unchanged = outcome.unchanged,
        "store reconciliation applied"
    );

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use async_trait::async_trait;

    use reccy_core::reconcile::diff;

    use super::{apply_plan, ReconcileOutcome};
    use crate::store::{InMemoryRecommendationStore, RecommendationStore, StoreError};

    fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
    }

    #[tokio::test]
    async fn plan_application_converges_the_store_to_the_fresh_state() {
        let store = InMemoryRecommendationStore::with_state(map(&[
            ("A-1-1", "B-1-2"),
            ("B-1-2", "A-1-1"),
        ]));
        let fresh = map(&[("A-1-1", "B-1-2"), ("C-2-1", "A-1-1")]);

        let remote = store.load_all().await.expect("load");
        let plan = diff(&remote, &fresh);
        let outcome = apply_plan(&store, &plan, remote.len()).await.expect("apply");

        assert_eq!(outcome, ReconcileOutcome { upserted: 1, deleted: 1, unchanged: 1 });
        assert_eq!(store.snapshot().await, fresh);
    }

    #[tokio::test]
    async fn a_second_identical_run_applies_zero_mutations() {
        let store = InMemoryRecommendationStore::default();
        let fresh = map(&[("A-1-1", "B-1-2$$C-2-1"), ("B-1-2", "A-1-1")]);

        let remote = store.load_all().await.expect("load");
        let plan = diff(&remote, &fresh);
        apply_plan(&store, &plan, remote.len()).await.expect("first run");

        let remote = store.load_all().await.expect("load");
        let plan = diff(&remote, &fresh);
        assert!(plan.is_empty());

        let outcome = apply_plan(&store, &plan, remote.len()).await.expect("second run");
        assert_eq!(outcome.upserted, 0);
        assert_eq!(outcome.deleted, 0);
        assert_eq!(outcome.unchanged, 2);
    }

    /// Fails every mutation after the first `budget` calls succeed.
    struct FlakyStore {
        inner: InMemoryRecommendationStore,
        budget: tokio::sync::Mutex<usize>,
    }

    impl FlakyStore {
        fn new(budget: usize) -> Self {
            Self { inner: InMemoryRecommendationStore::default(), budget: tokio::sync::Mutex::new(budget) }
        }

        async fn spend(&self) -> Result<(), StoreError> {
            let mut budget = self.budget.lock().await;
            if *budget == 0 {
                return Err(StoreError::Query(sqlx::Error::PoolClosed));
            }
            *budget -= 1;
            Ok(())
        }
    }

    #[async_trait]
    impl RecommendationStore for FlakyStore {
        async fn ensure_schema(&self) -> Result<(), StoreError> {
            self.inner.ensure_schema().await
        }

        async fn load_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
            self.inner.load_all().await
        }

        async fn upsert(&self, sku: &str, payload: &str) -> Result<(), StoreError> {
            self.spend().await?;
            self.inner.upsert(sku, payload).await
        }

        async fn delete(&self, sku: &str) -> Result<(), StoreError> {
            self.spend().await?;
            self.inner.delete(sku).await
        }
    }

    #[tokio::test]
    async fn a_mid_plan_failure_keeps_already_applied_rows() {
        let store = FlakyStore::new(1);
        let fresh = map(&[("A-1-1", "x"), ("B-1-2", "y")]);

        let plan = diff(&BTreeMap::new(), &fresh);
        let result = apply_plan(&store, &plan, 0).await;

        assert!(result.is_err());
        // The first upsert landed; the retry run only has the rest to do.
        let remaining = store.inner.snapshot().await;
        assert_eq!(remaining.len(), 1);
        let plan = diff(&remaining, &fresh);
        assert_eq!(plan.upserts.len(), 1);
    }
}
