//! Variant grouper: partitions products into configurable groups derived from
//! the SKU, aggregates quantity across each group, and suppresses simple
//! variants that have a purchasable parent in the same group.

use std::collections::HashMap;

use crate::domain::product::{ProductKind, ProductRecord, Quantity};
use crate::errors::PipelineError;

/// Seam for catalogs with different SKU conventions: grouping logic only
/// depends on this, never on the token layout itself.
pub trait GroupKeyExtractor: Send + Sync {
    fn group_key(&self, sku: &str) -> Result<String, PipelineError>;
}

/// Default convention: split on `-` and take the token at a fixed position.
#[derive(Clone, Copy, Debug)]
pub struct HyphenTokenExtractor {
    token_index: usize,
}

impl HyphenTokenExtractor {
    pub fn new(token_index: usize) -> Self {
        Self { token_index }
    }
}

impl Default for HyphenTokenExtractor {
    fn default() -> Self {
        Self::new(2)
    }
}

impl GroupKeyExtractor for HyphenTokenExtractor {
    fn group_key(&self, sku: &str) -> Result<String, PipelineError> {
        sku.split('-').nth(self.token_index).map(str::to_owned).ok_or_else(|| {
            PipelineError::MalformedSku { sku: sku.to_owned(), token_index: self.token_index }
        })
    }
}

/// A record annotated with its variant group key and the group's summed
/// quantity.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupedRecord {
    pub record: ProductRecord,
    pub group_key: String,
    pub group_quantity: Quantity,
}

/// Groups records by key and applies the suppression policy: when a group
/// contains a configurable or bundle member, its simple members are dropped.
/// Input order is preserved for the survivors.
pub fn group_variants(
    records: Vec<ProductRecord>,
    extractor: &dyn GroupKeyExtractor,
) -> Result<Vec<GroupedRecord>, PipelineError> {
    let keys = records
        .iter()
        .map(|record| extractor.group_key(&record.sku))
        .collect::<Result<Vec<_>, _>>()?;

    let mut group_quantity: HashMap<String, Quantity> = HashMap::new();
    let mut group_has_parent: HashMap<String, bool> = HashMap::new();
    for (record, key) in records.iter().zip(&keys) {
        let quantity = group_quantity.entry(key.clone()).or_insert(Quantity::Known(0));
        *quantity = quantity.add(record.quantity);
        let has_parent = group_has_parent.entry(key.clone()).or_insert(false);
        *has_parent |= record.kind.is_purchasable_parent();
    }

    let grouped = records
        .into_iter()
        .zip(keys)
        .filter(|(record, key)| {
            !(group_has_parent[key.as_str()] && record.kind == ProductKind::Simple)
        })
        .map(|(record, key)| {
            let quantity = group_quantity[key.as_str()];
            GroupedRecord { record, group_key: key, group_quantity: quantity }
        })
        .collect();

    Ok(grouped)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rust_decimal::Decimal;

    use crate::domain::product::{ProductKind, ProductRecord, ProductStatus, Quantity};
    use crate::errors::PipelineError;

    use super::{group_variants, GroupKeyExtractor, GroupedRecord, HyphenTokenExtractor};

    fn record(sku: &str, kind: ProductKind, quantity: Quantity) -> ProductRecord {
        ProductRecord {
            id: 0,
            sku: sku.to_owned(),
            name: String::new(),
            price: Decimal::ZERO,
            status: ProductStatus::Enabled,
            kind,
            quantity,
            attributes: BTreeMap::new(),
        }
    }

    #[test]
    fn extracts_the_third_hyphen_token_by_default() {
        let extractor = HyphenTokenExtractor::default();
        assert_eq!(extractor.group_key("ACM-CH-100-RED").expect("key"), "100");
    }

    #[test]
    fn short_skus_are_malformed() {
        let extractor = HyphenTokenExtractor::default();
        assert_eq!(
            extractor.group_key("ACM-100").expect_err("must fail"),
            PipelineError::MalformedSku { sku: "ACM-100".to_owned(), token_index: 2 }
        );
    }

    #[test]
    fn simple_members_are_dropped_when_the_group_has_a_purchasable_parent() {
        let records = vec![
            record("A-B-1-S", ProductKind::Simple, Quantity::Known(3)),
            record("A-B-1-C", ProductKind::Configurable, Quantity::Known(0)),
            record("A-B-2-S", ProductKind::Simple, Quantity::Known(5)),
        ];

        let grouped = group_variants(records, &HyphenTokenExtractor::default()).expect("group");
        let skus: Vec<&str> = grouped.iter().map(|g| g.record.sku.as_str()).collect();
        assert_eq!(skus, vec!["A-B-1-C", "A-B-2-S"]);
    }

    #[test]
    fn simple_only_groups_are_fully_retained() {
        let records = vec![
            record("A-B-1-X", ProductKind::Simple, Quantity::Known(1)),
            record("A-B-1-Y", ProductKind::Simple, Quantity::Known(2)),
        ];

        let grouped = group_variants(records, &HyphenTokenExtractor::default()).expect("group");
        assert_eq!(grouped.len(), 2);
    }

    #[test]
    fn group_quantity_is_the_sum_over_all_members_including_suppressed_ones() {
        let records = vec![
            record("A-B-1-S", ProductKind::Simple, Quantity::Known(3)),
            record("A-B-1-C", ProductKind::Configurable, Quantity::Known(4)),
        ];

        let grouped = group_variants(records, &HyphenTokenExtractor::default()).expect("group");
        assert_eq!(
            grouped,
            vec![GroupedRecord {
                record: record("A-B-1-C", ProductKind::Configurable, Quantity::Known(4)),
                group_key: "1".to_owned(),
                group_quantity: Quantity::Known(7),
            }]
        );
    }

    #[test]
    fn unbounded_member_makes_the_group_quantity_unbounded() {
        let records = vec![
            record("A-B-1-X", ProductKind::Simple, Quantity::Known(0)),
            record("A-B-1-Y", ProductKind::Simple, Quantity::Unbounded),
        ];

        let grouped = group_variants(records, &HyphenTokenExtractor::default()).expect("group");
        assert!(grouped.iter().all(|g| g.group_quantity == Quantity::Unbounded));
    }

    #[test]
    fn bundle_parent_also_suppresses_simple_members() {
        let records = vec![
            record("A-B-9-S", ProductKind::Simple, Quantity::Known(1)),
            record("A-B-9-B", ProductKind::Bundle, Quantity::Known(1)),
        ];

        let grouped = group_variants(records, &HyphenTokenExtractor::default()).expect("group");
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].record.kind, ProductKind::Bundle);
    }
}
