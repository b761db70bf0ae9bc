//! Recommendation ranker: turns one matrix row into a ranked, deduplicated,
//! truncated SKU list.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::domain::recommendation::RecommendationSet;
use crate::pipeline::pricing::BandedRecord;
use crate::pipeline::similarity::SimilarityMatrix;

/// Default recommendation list length.
pub const DEFAULT_TOP_N: usize = 20;

/// Explicit bidirectional index ↔ SKU table, built once after the visibility
/// filter. Matrix rows and document positions both key off this; nothing
/// downstream relies on array position alone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductIndex {
    skus: Vec<String>,
    positions: HashMap<String, usize>,
}

impl ProductIndex {
    pub fn from_records(records: &[BandedRecord]) -> Self {
        let skus: Vec<String> =
            records.iter().map(|banded| banded.grouped.record.sku.clone()).collect();
        let positions =
            skus.iter().enumerate().map(|(index, sku)| (sku.clone(), index)).collect();
        Self { skus, positions }
    }

    pub fn len(&self) -> usize {
        self.skus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skus.is_empty()
    }

    pub fn sku(&self, index: usize) -> &str {
        &self.skus[index]
    }

    pub fn position(&self, sku: &str) -> Option<usize> {
        self.positions.get(sku).copied()
    }
}

/// Ranks every other product by descending similarity for each source
/// product, excludes the source itself, deduplicates by SKU value, and
/// truncates to `top_n`.
///
/// The sort is stable, so equal scores keep their index order. Products with
/// nothing to recommend (catalog of one) still get an entry with an empty
/// list.
pub fn rank_recommendations(
    index: &ProductIndex,
    matrix: &SimilarityMatrix,
    top_n: usize,
) -> RecommendationSet {
    let mut by_sku = BTreeMap::new();

    for source in 0..index.len() {
        let source_sku = index.sku(source);

        let mut scored: Vec<(usize, f64)> = (0..index.len())
            .filter(|candidate| *candidate != source)
            .map(|candidate| (candidate, matrix.get(source, candidate)))
            .collect();
        scored.sort_by(|left, right| {
            right.1.partial_cmp(&left.1).unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut recommendations = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for (candidate, _) in scored {
            if recommendations.len() >= top_n {
                break;
            }
            let candidate_sku = index.sku(candidate);
            // SKU uniqueness should make this a no-op, but a duplicate SKU
            // must never surface twice in one list.
            if candidate_sku == source_sku || !seen.insert(candidate_sku) {
                continue;
            }
            recommendations.push(candidate_sku.to_owned());
        }

        by_sku.insert(source_sku.to_owned(), recommendations);
    }

    RecommendationSet { by_sku }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rust_decimal::Decimal;

    use crate::domain::product::{ProductKind, ProductRecord, ProductStatus, Quantity};
    use crate::pipeline::grouping::GroupedRecord;
    use crate::pipeline::pricing::{BandedRecord, PriceBand};
    use crate::pipeline::similarity::similarity_matrix;

    use super::{rank_recommendations, ProductIndex};

    fn banded(sku: &str) -> BandedRecord {
        BandedRecord {
            grouped: GroupedRecord {
                record: ProductRecord {
                    id: 0,
                    sku: sku.to_owned(),
                    name: String::new(),
                    price: Decimal::from(10),
                    status: ProductStatus::Enabled,
                    kind: ProductKind::Simple,
                    quantity: Quantity::Known(1),
                    attributes: BTreeMap::new(),
                },
                group_key: "g".to_owned(),
                group_quantity: Quantity::Known(1),
            },
            band: PriceBand::Band1,
        }
    }

    fn fixture(skus: &[&str], documents: &[&str]) -> (ProductIndex, Vec<String>) {
        let records: Vec<BandedRecord> = skus.iter().map(|sku| banded(sku)).collect();
        let index = ProductIndex::from_records(&records);
        let documents: Vec<String> = documents.iter().map(|d| (*d).to_owned()).collect();
        (index, documents)
    }

    #[test]
    fn index_maps_both_directions() {
        let (index, _) = fixture(&["A-1-1", "B-1-2"], &["", ""]);
        assert_eq!(index.sku(1), "B-1-2");
        assert_eq!(index.position("A-1-1"), Some(0));
        assert_eq!(index.position("missing"), None);
    }

    #[test]
    fn own_sku_never_appears_in_own_list() {
        let (index, documents) = fixture(
            &["A-1-1", "B-1-2", "C-2-1"],
            &["red chair", "red chair", "blue desk"],
        );
        let matrix = similarity_matrix(&documents);
        let set = rank_recommendations(&index, &matrix, 20);

        for (sku, recommendations) in &set.by_sku {
            assert!(!recommendations.contains(sku));
        }
    }

    #[test]
    fn lists_are_bounded_by_top_n_and_catalog_size() {
        let (index, documents) = fixture(
            &["A-1-1", "B-1-2", "C-2-1", "D-3-1"],
            &["a b", "a b", "a c", "a d"],
        );
        let matrix = similarity_matrix(&documents);

        let capped = rank_recommendations(&index, &matrix, 2);
        assert!(capped.by_sku.values().all(|list| list.len() <= 2));

        let open = rank_recommendations(&index, &matrix, 20);
        assert!(open.by_sku.values().all(|list| list.len() == index.len() - 1));
    }

    #[test]
    fn entries_are_ordered_by_descending_similarity() {
        let (index, documents) = fixture(
            &["A-1-1", "B-1-2", "C-2-1"],
            &["red mesh chair", "red mesh chair deluxe", "green lamp"],
        );
        let matrix = similarity_matrix(&documents);
        let set = rank_recommendations(&index, &matrix, 20);

        // B is much closer to A than C is.
        assert_eq!(set.by_sku["A-1-1"], vec!["B-1-2".to_owned(), "C-2-1".to_owned()]);
    }

    #[test]
    fn duplicate_skus_are_defensively_deduplicated() {
        let (index, documents) = fixture(
            &["A-1-1", "A-1-1", "B-1-2"],
            &["same doc", "same doc", "other"],
        );
        let matrix = similarity_matrix(&documents);
        let set = rank_recommendations(&index, &matrix, 20);

        assert_eq!(set.by_sku["B-1-2"], vec!["A-1-1".to_owned()]);
    }

    #[test]
    fn single_product_catalog_gets_an_empty_list() {
        let (index, documents) = fixture(&["A-1-1"], &["alone"]);
        let matrix = similarity_matrix(&documents);
        let set = rank_recommendations(&index, &matrix, 20);

        assert_eq!(set.by_sku["A-1-1"], Vec::<String>::new());
    }
}
