use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Field name under which resolved category labels are stored. The raw
/// category ids keep their own attribute code.
pub const CATEGORY_NAMES_FIELD: &str = "category_names";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductStatus {
    Enabled,
    Disabled,
}

impl ProductStatus {
    /// Catalog wire codes: 1 = enabled, 2 = disabled.
    pub fn from_code(code: i64) -> Self {
        if code == 2 {
            Self::Disabled
        } else {
            Self::Enabled
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductKind {
    Simple,
    Configurable,
    Bundle,
    Other(String),
}

impl ProductKind {
    pub fn from_type_id(type_id: &str) -> Self {
        match type_id {
            "simple" => Self::Simple,
            "configurable" => Self::Configurable,
            "bundle" => Self::Bundle,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Purchasable parents hide their simple variants inside a group.
    pub fn is_purchasable_parent(&self) -> bool {
        matches!(self, Self::Configurable | Self::Bundle)
    }
}

/// Stock on hand. Products missing from the inventory feed are treated as
/// effectively unlimited, never as zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quantity {
    Known(u64),
    Unbounded,
}

impl Quantity {
    pub fn is_zero(&self) -> bool {
        matches!(self, Self::Known(0))
    }

    pub fn add(self, other: Self) -> Self {
        match (self, other) {
            (Self::Known(left), Self::Known(right)) => Self::Known(left.saturating_add(right)),
            _ => Self::Unbounded,
        }
    }
}

/// One normalized catalog product: resolved attribute labels, merged
/// inventory, canonical status and type. Immutable for the duration of a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub price: Decimal,
    pub status: ProductStatus,
    pub kind: ProductKind,
    pub quantity: Quantity,
    pub attributes: BTreeMap<String, String>,
}

impl ProductRecord {
    /// Returns the attribute content for `code`, or an empty string when the
    /// product does not carry it. Missing fields must never poison the
    /// feature join downstream.
    pub fn attribute(&self, code: &str) -> &str {
        self.attributes.get(code).map(String::as_str).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::{ProductKind, ProductStatus, Quantity};

    #[test]
    fn status_codes_map_to_enabled_and_disabled() {
        assert_eq!(ProductStatus::from_code(1), ProductStatus::Enabled);
        assert_eq!(ProductStatus::from_code(2), ProductStatus::Disabled);
    }

    #[test]
    fn unknown_type_ids_are_preserved() {
        assert_eq!(
            ProductKind::from_type_id("grouped"),
            ProductKind::Other("grouped".to_owned())
        );
        assert!(ProductKind::from_type_id("bundle").is_purchasable_parent());
        assert!(!ProductKind::from_type_id("simple").is_purchasable_parent());
    }

    #[test]
    fn unbounded_quantity_absorbs_known_quantities() {
        assert_eq!(Quantity::Known(2).add(Quantity::Known(3)), Quantity::Known(5));
        assert_eq!(Quantity::Known(2).add(Quantity::Unbounded), Quantity::Unbounded);
        assert!(Quantity::Known(0).is_zero());
        assert!(!Quantity::Unbounded.is_zero());
    }
}
