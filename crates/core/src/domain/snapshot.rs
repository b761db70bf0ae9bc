//! Raw catalog snapshot: the exact data a run consumes, already detached from
//! the source system's wire format. The catalog crate fills these in; the
//! pipeline never talks to the network.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub price: Decimal,
    pub status_code: i64,
    pub type_id: String,
    pub weight: Option<Decimal>,
    pub custom_attributes: Vec<CustomAttribute>,
}

/// A named attribute entry as delivered by the catalog. Multi-value content
/// arrives as a comma-joined identifier list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomAttribute {
    pub code: String,
    pub value: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLevel {
    pub product_id: i64,
    pub quantity: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeInputKind {
    Select,
    Multiselect,
    Text,
}

impl AttributeInputKind {
    pub fn from_frontend_input(frontend_input: &str) -> Self {
        match frontend_input {
            "select" => Self::Select,
            "multiselect" => Self::Multiselect,
            _ => Self::Text,
        }
    }

    /// Select and multiselect values are identifier lists that must be
    /// resolved to labels before they can feed the feature space.
    pub fn needs_resolution(&self) -> bool {
        matches!(self, Self::Select | Self::Multiselect)
    }
}

/// Attribute metadata for one run: declared input kinds, the value-id → label
/// table for select/multiselect attributes, and the flattened category tree.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeCatalog {
    pub input_kinds: BTreeMap<String, AttributeInputKind>,
    pub option_labels: BTreeMap<String, BTreeMap<String, String>>,
    pub category_names: BTreeMap<String, String>,
}

impl AttributeCatalog {
    pub fn input_kind(&self, code: &str) -> AttributeInputKind {
        self.input_kinds.get(code).copied().unwrap_or(AttributeInputKind::Text)
    }

    pub fn option_label(&self, code: &str, value_id: &str) -> Option<&str> {
        self.option_labels.get(code).and_then(|labels| labels.get(value_id)).map(String::as_str)
    }

    pub fn category_name(&self, category_id: &str) -> Option<&str> {
        self.category_names.get(category_id).map(String::as_str)
    }
}

/// Everything the pipeline needs for one full recompute.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub items: Vec<CatalogItem>,
    pub inventory: Vec<InventoryLevel>,
    pub attributes: AttributeCatalog,
}

impl Default for CatalogItem {
    fn default() -> Self {
        Self {
            id: 0,
            sku: String::new(),
            name: String::new(),
            price: Decimal::ZERO,
            status_code: 1,
            type_id: "simple".to_owned(),
            weight: None,
            custom_attributes: Vec::new(),
        }
    }
}
