use rust_decimal::Decimal;
use thiserror::Error;

/// Per-record validation failures. Any one of these aborts the whole run: a
/// bad record means the catalog and the normalizer configuration disagree,
/// which needs operator attention rather than a silent per-row skip.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("no label mapping for attribute `{attribute_code}` value id `{value_id}` on sku `{sku}`")]
    MissingAttributeMapping { sku: String, attribute_code: String, value_id: String },
    #[error("sku `{sku}` does not carry a group token at hyphen position {token_index}")]
    MalformedSku { sku: String, token_index: usize },
    #[error("price {price} on sku `{sku}` falls outside every price band")]
    PriceOutOfRange { sku: String, price: Decimal },
}
