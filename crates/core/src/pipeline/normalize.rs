//! Catalog normalizer: raw snapshot items become flat [`ProductRecord`]s with
//! resolved attribute labels and merged inventory quantities.

use std::collections::{BTreeMap, HashMap};

use crate::domain::product::{
    ProductKind, ProductRecord, ProductStatus, Quantity, CATEGORY_NAMES_FIELD,
};
use crate::domain::snapshot::{AttributeCatalog, CatalogItem, CatalogSnapshot};
use crate::errors::PipelineError;

/// Attribute code whose value is a category-identifier list. Resolved labels
/// land under [`CATEGORY_NAMES_FIELD`]; the raw ids stay under this code.
pub const CATEGORY_IDS_CODE: &str = "category_ids";

const MULTI_VALUE_SEPARATOR: char = ',';

/// Normalizes every item in the snapshot. Inventory is left-joined by product
/// id; items absent from the feed get [`Quantity::Unbounded`].
pub fn normalize(snapshot: &CatalogSnapshot) -> Result<Vec<ProductRecord>, PipelineError> {
    let inventory: HashMap<i64, u64> = snapshot
        .inventory
        .iter()
        .map(|level| (level.product_id, level.quantity))
        .collect();

    snapshot
        .items
        .iter()
        .map(|item| normalize_item(item, &snapshot.attributes, &inventory))
        .collect()
}

fn normalize_item(
    item: &CatalogItem,
    attributes: &AttributeCatalog,
    inventory: &HashMap<i64, u64>,
) -> Result<ProductRecord, PipelineError> {
    let mut resolved = BTreeMap::new();

    for attribute in &item.custom_attributes {
        if attribute.code == CATEGORY_IDS_CODE {
            let names = resolve_categories(&item.sku, &attribute.value, attributes)?;
            resolved.insert(CATEGORY_NAMES_FIELD.to_owned(), names);
            resolved.insert(attribute.code.clone(), attribute.value.clone());
        } else if attributes.input_kind(&attribute.code).needs_resolution() {
            let labels = resolve_options(&item.sku, &attribute.code, &attribute.value, attributes)?;
            resolved.insert(attribute.code.clone(), labels);
        } else {
            resolved.insert(attribute.code.clone(), attribute.value.clone());
        }
    }

    let quantity = inventory
        .get(&item.id)
        .copied()
        .map_or(Quantity::Unbounded, Quantity::Known);

    Ok(ProductRecord {
        id: item.id,
        sku: item.sku.clone(),
        name: item.name.clone(),
        price: item.price,
        status: ProductStatus::from_code(item.status_code),
        kind: ProductKind::from_type_id(&item.type_id),
        quantity,
        attributes: resolved,
    })
}

/// Resolves a comma-joined value-id list to its labels, rejoined with commas.
/// An empty value stays empty.
fn resolve_options(
    sku: &str,
    code: &str,
    raw: &str,
    attributes: &AttributeCatalog,
) -> Result<String, PipelineError> {
    if raw.is_empty() {
        return Ok(String::new());
    }

    let labels = raw
        .split(MULTI_VALUE_SEPARATOR)
        .map(|value_id| {
            attributes.option_label(code, value_id).map(str::to_owned).ok_or_else(|| {
                PipelineError::MissingAttributeMapping {
                    sku: sku.to_owned(),
                    attribute_code: code.to_owned(),
                    value_id: value_id.to_owned(),
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(labels.join(","))
}

fn resolve_categories(
    sku: &str,
    raw: &str,
    attributes: &AttributeCatalog,
) -> Result<String, PipelineError> {
    if raw.is_empty() {
        return Ok(String::new());
    }

    let names = raw
        .split(MULTI_VALUE_SEPARATOR)
        .map(|category_id| {
            attributes.category_name(category_id).map(str::to_owned).ok_or_else(|| {
                PipelineError::MissingAttributeMapping {
                    sku: sku.to_owned(),
                    attribute_code: CATEGORY_IDS_CODE.to_owned(),
                    value_id: category_id.to_owned(),
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(names.join(","))
}
