//! Feature composer: folds each surviving product into one synthetic document
//! string, the sole similarity signal for the run.

use crate::domain::product::CATEGORY_NAMES_FIELD;
use crate::pipeline::pricing::BandedRecord;

/// Attribute codes feeding the document, in composition order. Multi-value
/// fields name the separator their source content uses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureSchema {
    pub description: String,
    pub manufacturer: String,
    pub product_group: String,
    pub colors: String,
    pub product_line: String,
    pub keywords: String,
    pub keyword_separator: char,
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self {
            description: "short_description".to_owned(),
            manufacturer: "manufacturer".to_owned(),
            product_group: "product_group".to_owned(),
            colors: "colors".to_owned(),
            product_line: "product_line".to_owned(),
            keywords: "name_keywords".to_owned(),
            keyword_separator: '|',
        }
    }
}

/// Builds one document per record, index-aligned with the input order.
///
/// Multi-value fields are pre-wrapped per token (`<Office Chairs>`) so the
/// vectorizer's whitespace tokenizer cannot merge adjacent values. Missing
/// fields contribute an empty string, never a hole in the join.
pub fn compose_documents(records: &[BandedRecord], schema: &FeatureSchema) -> Vec<String> {
    records.iter().map(|banded| compose_document(banded, schema)).collect()
}

fn compose_document(banded: &BandedRecord, schema: &FeatureSchema) -> String {
    let record = &banded.grouped.record;

    let parts = [
        record.attribute(&schema.description).replace(',', ""),
        record.attribute(&schema.manufacturer).to_owned(),
        wrap_tokens(record.attribute(CATEGORY_NAMES_FIELD), ','),
        wrap_tokens(record.attribute(&schema.product_group), ','),
        wrap_tokens(record.attribute(&schema.colors), ','),
        record.attribute(&schema.product_line).to_owned(),
        wrap_tokens(record.attribute(&schema.keywords), schema.keyword_separator),
        banded.band.label().to_owned(),
    ];

    parts.join(" ")
}

/// Wraps every value of a separated list in delimiter markers and joins the
/// wrapped tokens with single spaces. `"Red,Navy Blue"` → `"<Red> <Navy Blue>"`.
fn wrap_tokens(raw: &str, separator: char) -> String {
    raw.split(separator)
        .filter(|token| !token.is_empty())
        .map(|token| format!("<{token}>"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rust_decimal::Decimal;

    use crate::domain::product::{
        ProductKind, ProductRecord, ProductStatus, Quantity, CATEGORY_NAMES_FIELD,
    };
    use crate::pipeline::grouping::GroupedRecord;
    use crate::pipeline::pricing::{BandedRecord, PriceBand};

    use super::{compose_documents, wrap_tokens, FeatureSchema};

    fn banded_with_attributes(attributes: BTreeMap<String, String>) -> BandedRecord {
        BandedRecord {
            grouped: GroupedRecord {
                record: ProductRecord {
                    id: 1,
                    sku: "A-B-1".to_owned(),
                    name: "Chair".to_owned(),
                    price: Decimal::from(100),
                    status: ProductStatus::Enabled,
                    kind: ProductKind::Simple,
                    quantity: Quantity::Known(1),
                    attributes,
                },
                group_key: "1".to_owned(),
                group_quantity: Quantity::Known(1),
            },
            band: PriceBand::Band1,
        }
    }

    #[test]
    fn wraps_multi_value_tokens_in_markers() {
        assert_eq!(wrap_tokens("Red,Navy Blue", ','), "<Red> <Navy Blue>");
        assert_eq!(wrap_tokens("solo", ','), "<solo>");
        assert_eq!(wrap_tokens("", ','), "");
    }

    #[test]
    fn composes_fields_in_fixed_order_with_band_label_last() {
        let attributes = BTreeMap::from([
            ("short_description".to_owned(), "mesh back, steel frame".to_owned()),
            ("manufacturer".to_owned(), "Acme".to_owned()),
            (CATEGORY_NAMES_FIELD.to_owned(), "Chairs,Office".to_owned()),
            ("product_group".to_owned(), "Seating".to_owned()),
            ("colors".to_owned(), "Red,Blue".to_owned()),
            ("product_line".to_owned(), "Ergo".to_owned()),
            ("name_keywords".to_owned(), "chair|mesh chair".to_owned()),
        ]);

        let documents = compose_documents(&[banded_with_attributes(attributes)], &FeatureSchema::default());
        assert_eq!(
            documents,
            vec![
                "mesh back steel frame Acme <Chairs> <Office> <Seating> <Red> <Blue> Ergo \
                 <chair> <mesh chair> price_range_1"
                    .to_owned()
            ]
        );
    }

    #[test]
    fn missing_fields_become_empty_strings_not_holes() {
        let documents =
            compose_documents(&[banded_with_attributes(BTreeMap::new())], &FeatureSchema::default());
        // Seven empty fields and the band label, still joined by single spaces.
        assert_eq!(documents[0].trim(), "price_range_1");
        assert_eq!(documents[0].matches(' ').count(), 7);
    }

    #[test]
    fn documents_are_index_aligned_with_the_input() {
        let first = banded_with_attributes(BTreeMap::from([(
            "manufacturer".to_owned(),
            "Acme".to_owned(),
        )]));
        let second = banded_with_attributes(BTreeMap::from([(
            "manufacturer".to_owned(),
            "Globex".to_owned(),
        )]));

        let documents = compose_documents(&[first, second], &FeatureSchema::default());
        assert!(documents[0].contains("Acme"));
        assert!(documents[1].contains("Globex"));
    }
}
