//! Core engine for content-based product recommendations.
//!
//! This crate is pure computation: it turns a [`domain::snapshot::CatalogSnapshot`]
//! into a [`domain::recommendation::RecommendationSet`] and diffs that set
//! against previously persisted state. Fetching the snapshot and applying the
//! diff live in the catalog and store crates.

pub mod config;
pub mod domain;
pub mod errors;
pub mod pipeline;
pub mod reconcile;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::product::{ProductKind, ProductRecord, ProductStatus, Quantity};
pub use domain::recommendation::{RecommendationSet, RECOMMENDATION_DELIMITER};
pub use domain::snapshot::{
    AttributeCatalog, AttributeInputKind, CatalogItem, CatalogSnapshot, CustomAttribute,
    InventoryLevel,
};
pub use errors::PipelineError;
pub use pipeline::Pipeline;
pub use reconcile::{diff, ReconcilePlan};
