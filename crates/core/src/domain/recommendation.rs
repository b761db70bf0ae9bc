use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Joins a recommendation list into the store payload. The delimiter is not
/// expected to appear inside SKUs.
pub const RECOMMENDATION_DELIMITER: &str = "$$";

/// The full result of one pipeline run: every surviving product mapped to its
/// ranked recommendation list (possibly empty).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub by_sku: BTreeMap<String, Vec<String>>,
}

impl RecommendationSet {
    pub fn len(&self) -> usize {
        self.by_sku.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_sku.is_empty()
    }

    /// Serializes every list into its store payload form.
    pub fn serialized(&self) -> BTreeMap<String, String> {
        self.by_sku
            .iter()
            .map(|(sku, recommendations)| {
                (sku.clone(), recommendations.join(RECOMMENDATION_DELIMITER))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::RecommendationSet;

    #[test]
    fn serialization_joins_with_the_store_delimiter() {
        let mut set = RecommendationSet::default();
        set.by_sku.insert("A-1-1".to_owned(), vec!["B-1-2".to_owned(), "C-2-1".to_owned()]);
        set.by_sku.insert("B-1-2".to_owned(), Vec::new());

        let serialized = set.serialized();
        assert_eq!(serialized["A-1-1"], "B-1-2$$C-2-1");
        assert_eq!(serialized["B-1-2"], "");
    }
}
