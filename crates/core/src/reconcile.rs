//! Reconciliation diff: the minimal set of store mutations that makes
//! persisted state match a freshly computed recommendation set. Applying the
//! plan is the store crate's job; computing it is pure.

use std::collections::BTreeMap;

/// Mutations to apply, in deterministic (lexicographic SKU) order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// SKUs that are new remotely or whose serialized payload changed.
    pub upserts: Vec<(String, String)>,
    /// SKUs present remotely but absent from the fresh set.
    pub deletes: Vec<String>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.deletes.is_empty()
    }
}

/// Diffs the fresh serialized mapping against the remote one.
pub fn diff(
    remote: &BTreeMap<String, String>,
    fresh: &BTreeMap<String, String>,
) -> ReconcilePlan {
    let upserts = fresh
        .iter()
        .filter(|(sku, payload)| remote.get(*sku) != Some(payload))
        .map(|(sku, payload)| (sku.clone(), payload.clone()))
        .collect();

    let deletes =
        remote.keys().filter(|sku| !fresh.contains_key(*sku)).cloned().collect();

    ReconcilePlan { upserts, deletes }
}
