//! Wire-format types for the catalog REST API and their conversion into the
//! run snapshot. Decoding is tolerant of absent optional fields; the strict
//! validation happens later in the pipeline.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use reccy_core::domain::snapshot::{
    AttributeCatalog, AttributeInputKind, CatalogItem, CatalogSnapshot, CustomAttribute,
    InventoryLevel,
};

#[derive(Debug, Deserialize)]
pub struct ProductPage {
    #[serde(default)]
    pub items: Vec<WireProduct>,
    #[serde(default)]
    pub total_count: u64,
}

#[derive(Debug, Deserialize)]
pub struct WireProduct {
    pub id: i64,
    pub sku: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default = "default_status")]
    pub status: i64,
    #[serde(default = "default_type_id")]
    pub type_id: String,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub custom_attributes: Vec<WireAttribute>,
}

/// Attribute values arrive either as plain strings or as arrays of
/// identifiers (multi-value attributes such as category assignments).
#[derive(Debug, Deserialize)]
pub struct WireAttribute {
    pub attribute_code: String,
    pub value: Value,
}

#[derive(Debug, Deserialize)]
pub struct StockPage {
    #[serde(default)]
    pub items: Vec<WireStockItem>,
}

#[derive(Debug, Deserialize)]
pub struct WireStockItem {
    pub product_id: i64,
    #[serde(default)]
    pub qty: f64,
}

#[derive(Debug, Deserialize)]
pub struct AttributePage {
    #[serde(default)]
    pub items: Vec<WireAttributeDef>,
    #[serde(default)]
    pub total_count: u64,
}

#[derive(Debug, Deserialize)]
pub struct WireAttributeDef {
    pub attribute_code: String,
    #[serde(default)]
    pub frontend_input: String,
    #[serde(default)]
    pub options: Vec<WireOption>,
}

#[derive(Debug, Deserialize)]
pub struct WireOption {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub value: String,
}

/// One node of the category tree; the API returns the root with nested
/// `children_data`.
#[derive(Debug, Deserialize)]
pub struct WireCategory {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub children_data: Vec<WireCategory>,
}

fn default_status() -> i64 {
    1
}

fn default_type_id() -> String {
    "simple".to_owned()
}

/// Assembles the run snapshot from the four fetched parts.
pub fn snapshot_from_parts(
    products: Vec<WireProduct>,
    stock: Vec<WireStockItem>,
    attribute_defs: Vec<WireAttributeDef>,
    category_root: WireCategory,
) -> CatalogSnapshot {
    let items = products.into_iter().map(catalog_item).collect();
    let inventory = stock.into_iter().map(inventory_level).collect();
    let attributes = attribute_catalog(attribute_defs, category_root);

    CatalogSnapshot { items, inventory, attributes }
}

fn catalog_item(product: WireProduct) -> CatalogItem {
    CatalogItem {
        id: product.id,
        sku: product.sku,
        name: product.name,
        price: decimal_from_f64(product.price.unwrap_or(0.0)),
        status_code: product.status,
        type_id: product.type_id,
        weight: product.weight.map(decimal_from_f64),
        custom_attributes: product
            .custom_attributes
            .into_iter()
            .map(|attribute| CustomAttribute {
                code: attribute.attribute_code,
                value: attribute_value_text(&attribute.value),
            })
            .collect(),
    }
}

fn inventory_level(item: WireStockItem) -> InventoryLevel {
    // Fractional and negative stock levels exist in practice; clamp to a
    // whole non-negative count.
    InventoryLevel { product_id: item.product_id, quantity: item.qty.max(0.0) as u64 }
}

fn attribute_value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(entries) => {
            let parts: Vec<String> = entries.iter().map(attribute_value_text).collect();
            parts.join(",")
        }
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Null | Value::Object(_) => String::new(),
    }
}

fn attribute_catalog(
    attribute_defs: Vec<WireAttributeDef>,
    category_root: WireCategory,
) -> AttributeCatalog {
    let mut input_kinds = BTreeMap::new();
    let mut option_labels: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();

    for definition in attribute_defs {
        let kind = AttributeInputKind::from_frontend_input(&definition.frontend_input);
        input_kinds.insert(definition.attribute_code.clone(), kind);

        if kind.needs_resolution() {
            let labels = definition
                .options
                .into_iter()
                // Placeholder options carry a blank label and no usable value.
                .filter(|option| !option.label.trim().is_empty())
                .map(|option| (option.value, option.label))
                .collect();
            option_labels.insert(definition.attribute_code, labels);
        }
    }

    let mut category_names = BTreeMap::new();
    for child in &category_root.children_data {
        collect_category_names(child, &mut category_names);
    }

    AttributeCatalog { input_kinds, option_labels, category_names }
}

fn collect_category_names(node: &WireCategory, names: &mut BTreeMap<String, String>) {
    names.insert(node.id.to_string(), node.name.clone());
    for child in &node.children_data {
        collect_category_names(child, names);
    }
}

fn decimal_from_f64(value: f64) -> Decimal {
    Decimal::from_f64_retain(value).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use reccy_core::domain::snapshot::AttributeInputKind;

    use super::{snapshot_from_parts, ProductPage, StockPage, WireCategory};

    #[test]
    fn product_page_decodes_with_sparse_fields() {
        let page: ProductPage = serde_json::from_str(
            r#"{
                "items": [
                    {
                        "id": 7,
                        "sku": "AB-12-3-4",
                        "name": "Mesh Chair",
                        "price": 129.5,
                        "status": 1,
                        "type_id": "simple",
                        "custom_attributes": [
                            {"attribute_code": "manufacturer", "value": "42"},
                            {"attribute_code": "category_ids", "value": ["3", "15"]}
                        ]
                    },
                    {"id": 8, "sku": "CD-1-2-3"}
                ],
                "total_count": 2
            }"#,
        )
        .expect("decode");

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].custom_attributes[1].attribute_code, "category_ids");
        // Absent fields fall back to enabled simple products with no price.
        assert_eq!(page.items[1].status, 1);
        assert_eq!(page.items[1].type_id, "simple");
        assert_eq!(page.items[1].price, None);
    }

    #[test]
    fn array_attribute_values_join_with_commas() {
        let page: ProductPage = serde_json::from_str(
            r#"{"items": [{
                "id": 1, "sku": "S",
                "custom_attributes": [{"attribute_code": "category_ids", "value": ["3", "15"]}]
            }]}"#,
        )
        .expect("decode");

        let snapshot = snapshot_from_parts(
            page.items,
            Vec::new(),
            Vec::new(),
            WireCategory { id: 1, name: "Root".to_owned(), children_data: Vec::new() },
        );

        assert_eq!(snapshot.items[0].custom_attributes[0].value, "3,15");
    }

    #[test]
    fn stock_quantities_are_clamped_to_whole_counts() {
        let page: StockPage = serde_json::from_str(
            r#"{"items": [
                {"product_id": 1, "qty": 12.0},
                {"product_id": 2, "qty": 2.7},
                {"product_id": 3, "qty": -4.0}
            ]}"#,
        )
        .expect("decode");

        let snapshot = snapshot_from_parts(
            Vec::new(),
            page.items,
            Vec::new(),
            WireCategory { id: 1, name: "Root".to_owned(), children_data: Vec::new() },
        );

        let quantities: Vec<u64> =
            snapshot.inventory.iter().map(|level| level.quantity).collect();
        assert_eq!(quantities, vec![12, 2, 0]);
    }

    #[test]
    fn option_tables_are_kept_only_for_resolvable_attributes() {
        let defs: super::AttributePage = serde_json::from_str(
            r#"{"items": [
                {
                    "attribute_code": "manufacturer",
                    "frontend_input": "select",
                    "options": [
                        {"label": "Acme", "value": "42"},
                        {"label": " ", "value": ""}
                    ]
                },
                {"attribute_code": "short_description", "frontend_input": "textarea"}
            ]}"#,
        )
        .expect("decode");

        let snapshot = snapshot_from_parts(
            Vec::new(),
            Vec::new(),
            defs.items,
            WireCategory { id: 1, name: "Root".to_owned(), children_data: Vec::new() },
        );

        let attributes = &snapshot.attributes;
        assert_eq!(attributes.input_kind("manufacturer"), AttributeInputKind::Select);
        assert_eq!(attributes.input_kind("short_description"), AttributeInputKind::Text);
        assert_eq!(attributes.option_label("manufacturer", "42"), Some("Acme"));
        // The blank placeholder option is dropped.
        assert_eq!(attributes.option_labels["manufacturer"].len(), 1);
    }

    #[test]
    fn category_tree_flattens_recursively_excluding_the_root() {
        let root: WireCategory = serde_json::from_str(
            r#"{
                "id": 1, "name": "Root",
                "children_data": [
                    {"id": 3, "name": "Chairs", "children_data": [
                        {"id": 15, "name": "Mesh Chairs", "children_data": []}
                    ]},
                    {"id": 4, "name": "Desks", "children_data": []}
                ]
            }"#,
        )
        .expect("decode");

        let snapshot = snapshot_from_parts(Vec::new(), Vec::new(), Vec::new(), root);

        let names = &snapshot.attributes.category_names;
        assert_eq!(names.len(), 3);
        assert_eq!(names["15"], "Mesh Chairs");
        assert!(!names.contains_key("1"));
    }

    #[test]
    fn prices_convert_to_exact_decimals() {
        let page: ProductPage =
            serde_json::from_str(r#"{"items": [{"id": 1, "sku": "S", "price": 199.99}]}"#)
                .expect("decode");

        let snapshot = snapshot_from_parts(
            page.items,
            Vec::new(),
            Vec::new(),
            WireCategory { id: 1, name: "Root".to_owned(), children_data: Vec::new() },
        );

        assert!(snapshot.items[0].price > Decimal::from(199));
        assert!(snapshot.items[0].price < Decimal::from(200));
    }
}
