//! Catalog source client: fetches products, stock levels, attribute metadata
//! and the category tree over the source system's REST API and assembles them
//! into a [`reccy_core::CatalogSnapshot`].
//!
//! The client owns transport and decoding only. All interpretation of the
//! fetched data (label resolution, grouping, filtering) happens in the core
//! pipeline.

pub mod client;
pub mod fetch;
pub mod types;

pub use client::{CatalogClient, CatalogError};
pub use fetch::fetch_snapshot;
