//! The recommendation pipeline: one sequential pass over a catalog snapshot.
//!
//! Each stage fully materializes its output and hands ownership to the next;
//! there is no shared mutable state and no incremental mode. A run either
//! produces a complete [`RecommendationSet`] or fails on the first invalid
//! record.

pub mod features;
pub mod grouping;
pub mod normalize;
pub mod pricing;
pub mod ranking;
pub mod similarity;
pub mod visibility;

use tracing::info;

use crate::domain::recommendation::RecommendationSet;
use crate::domain::snapshot::CatalogSnapshot;
use crate::errors::PipelineError;

use features::FeatureSchema;
use grouping::{GroupKeyExtractor, HyphenTokenExtractor};
use ranking::{ProductIndex, DEFAULT_TOP_N};

pub struct Pipeline {
    key_extractor: Box<dyn GroupKeyExtractor>,
    schema: FeatureSchema,
    top_n: usize,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            key_extractor: Box::new(HyphenTokenExtractor::default()),
            schema: FeatureSchema::default(),
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl Pipeline {
    pub fn new(
        key_extractor: Box<dyn GroupKeyExtractor>,
        schema: FeatureSchema,
        top_n: usize,
    ) -> Self {
        Self { key_extractor, schema, top_n }
    }

    /// Runs every stage left to right and returns the full recommendation
    /// mapping for the surviving products.
    pub fn run(&self, snapshot: &CatalogSnapshot) -> Result<RecommendationSet, PipelineError> {
        let records = normalize::normalize(snapshot)?;
        info!(
            event_name = "pipeline.normalized",
            products = records.len(),
            "catalog snapshot normalized"
        );

        let grouped = grouping::group_variants(records, self.key_extractor.as_ref())?;
        let banded = pricing::assign_bands(grouped)?;
        let visible = visibility::filter_visible(banded);
        info!(
            event_name = "pipeline.filtered",
            surviving = visible.len(),
            "variant grouping and visibility filtering applied"
        );

        let index = ProductIndex::from_records(&visible);
        let documents = features::compose_documents(&visible, &self.schema);
        let matrix = similarity::similarity_matrix(&documents);
        let recommendations = ranking::rank_recommendations(&index, &matrix, self.top_n);
        info!(
            event_name = "pipeline.ranked",
            products = recommendations.len(),
            top_n = self.top_n,
            "recommendation lists computed"
        );

        Ok(recommendations)
    }
}
