//! Endpoint-level fetch routines: pagination over the product and attribute
//! listings, the low-stock inventory report, and the category tree, composed
//! into one snapshot fetch.

use tracing::info;

use reccy_core::domain::snapshot::CatalogSnapshot;

use crate::client::{CatalogClient, CatalogError};
use crate::types::{
    snapshot_from_parts, AttributePage, ProductPage, StockPage, WireAttributeDef, WireCategory,
    WireProduct, WireStockItem,
};

const PRODUCTS_PATH: &str = "/rest/all/V1/products";
const ATTRIBUTES_PATH: &str = "/rest/all/V1/products/attributes";
const CATEGORIES_PATH: &str = "/rest/all/V1/categories";
const LOW_STOCK_PATH: &str = "/rest/all/V1/stockItems/lowStock";

/// The low-stock report takes a quantity threshold and returns products below
/// it. Passing an absurdly large threshold turns it into a full inventory
/// listing.
const UNBOUNDED_STOCK_THRESHOLD: u64 = 999_999_999_999_999;

/// Fetches everything one run needs. Any transport or decode failure aborts
/// the whole fetch; a partial snapshot is never returned.
pub async fn fetch_snapshot(client: &CatalogClient) -> Result<CatalogSnapshot, CatalogError> {
    let products = fetch_products(client).await?;
    let stock = fetch_stock_levels(client).await?;
    let attributes = fetch_attribute_definitions(client).await?;
    let categories = fetch_category_tree(client).await?;

    info!(
        event_name = "catalog.snapshot_fetched",
        products = products.len(),
        stock_levels = stock.len(),
        attribute_definitions = attributes.len(),
        "catalog snapshot fetched"
    );

    Ok(snapshot_from_parts(products, stock, attributes, categories))
}

pub async fn fetch_products(client: &CatalogClient) -> Result<Vec<WireProduct>, CatalogError> {
    let mut products = Vec::new();
    let mut page = 1u32;

    loop {
        let response: ProductPage = client
            .get_json(PRODUCTS_PATH, &search_criteria(page, client.page_size()))
            .await?;

        let fetched = response.items.len();
        products.extend(response.items);

        if fetched < client.page_size() as usize || products.len() as u64 >= response.total_count {
            break;
        }
        page += 1;
    }

    Ok(products)
}

pub async fn fetch_stock_levels(
    client: &CatalogClient,
) -> Result<Vec<WireStockItem>, CatalogError> {
    let query = [
        ("pageSize", UNBOUNDED_STOCK_THRESHOLD.to_string()),
        ("qty", UNBOUNDED_STOCK_THRESHOLD.to_string()),
        ("scopeId", "0".to_owned()),
    ];
    let response: StockPage = client.get_json(LOW_STOCK_PATH, &query).await?;
    Ok(response.items)
}

pub async fn fetch_attribute_definitions(
    client: &CatalogClient,
) -> Result<Vec<WireAttributeDef>, CatalogError> {
    let mut definitions = Vec::new();
    let mut page = 1u32;

    loop {
        let response: AttributePage = client
            .get_json(ATTRIBUTES_PATH, &search_criteria(page, client.page_size()))
            .await?;

        let fetched = response.items.len();
        definitions.extend(response.items);

        if fetched < client.page_size() as usize
            || definitions.len() as u64 >= response.total_count
        {
            break;
        }
        page += 1;
    }

    Ok(definitions)
}

pub async fn fetch_category_tree(client: &CatalogClient) -> Result<WireCategory, CatalogError> {
    client.get_json(CATEGORIES_PATH, &[]).await
}

fn search_criteria(page: u32, page_size: u32) -> [(&'static str, String); 2] {
    [
        ("searchCriteria[currentPage]", page.to_string()),
        ("searchCriteria[pageSize]", page_size.to_string()),
    ]
}
