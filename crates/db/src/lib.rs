//! Store-side persistence: the recommendation table, its access trait, and
//! the reconciliation driver that applies a computed plan row by row.

pub mod connection;
pub mod reconcile;
pub mod store;

pub use connection::{connect, connect_with_settings, DbPool};
pub use reconcile::{apply_plan, ReconcileOutcome};
pub use store::{
    InMemoryRecommendationStore, RecommendationStore, SqlRecommendationStore, StoreError,
};
