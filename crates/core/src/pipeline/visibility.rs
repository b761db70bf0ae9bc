//! Visibility filter: recommendations must only surface products a shopper
//! can actually see and buy.

use crate::domain::product::ProductStatus;
use crate::pipeline::pricing::BandedRecord;

/// Drops records that are disabled or whose variant group has zero aggregated
/// quantity. Order preserving; an empty result is valid and simply yields an
/// empty recommendation set downstream.
pub fn filter_visible(records: Vec<BandedRecord>) -> Vec<BandedRecord> {
    records
        .into_iter()
        .filter(|banded| {
            banded.grouped.record.status == ProductStatus::Enabled
                && !banded.grouped.group_quantity.is_zero()
        })
        .collect()
}
