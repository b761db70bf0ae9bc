//! Price bucketizer: assigns each product to one of six fixed, disjoint
//! half-open price bands used as a categorical similarity feature.

use rust_decimal::Decimal;

use crate::errors::PipelineError;
use crate::pipeline::grouping::GroupedRecord;

/// Upper bound of the top band. Prices at or above it (or below zero) are a
/// configuration mismatch, not an open-ended band.
pub const PRICE_CEILING: i64 = 9_999_999;

const BAND_BOUNDS: [(i64, i64); 6] = [
    (0, 200),
    (200, 500),
    (500, 1_500),
    (1_500, 3_000),
    (3_000, 5_000),
    (5_000, PRICE_CEILING),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PriceBand {
    Band1,
    Band2,
    Band3,
    Band4,
    Band5,
    Band6,
}

impl PriceBand {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Band1 => "price_range_1",
            Self::Band2 => "price_range_2",
            Self::Band3 => "price_range_3",
            Self::Band4 => "price_range_4",
            Self::Band5 => "price_range_5",
            Self::Band6 => "price_range_6",
        }
    }

    fn from_position(position: usize) -> Option<Self> {
        match position {
            0 => Some(Self::Band1),
            1 => Some(Self::Band2),
            2 => Some(Self::Band3),
            3 => Some(Self::Band4),
            4 => Some(Self::Band5),
            5 => Some(Self::Band6),
            _ => None,
        }
    }
}

/// Scans the bands in order and returns the first whose half-open interval
/// contains `price` (lower bound inclusive, upper exclusive).
pub fn assign_band(sku: &str, price: Decimal) -> Result<PriceBand, PipelineError> {
    BAND_BOUNDS
        .iter()
        .position(|(lower, upper)| {
            price >= Decimal::from(*lower) && price < Decimal::from(*upper)
        })
        .and_then(PriceBand::from_position)
        .ok_or_else(|| PipelineError::PriceOutOfRange { sku: sku.to_owned(), price })
}

/// A grouped record with its assigned band label.
#[derive(Clone, Debug, PartialEq)]
pub struct BandedRecord {
    pub grouped: GroupedRecord,
    pub band: PriceBand,
}

pub fn assign_bands(records: Vec<GroupedRecord>) -> Result<Vec<BandedRecord>, PipelineError> {
    records
        .into_iter()
        .map(|grouped| {
            let band = assign_band(&grouped.record.sku, grouped.record.price)?;
            Ok(BandedRecord { grouped, band })
        })
        .collect()
}
