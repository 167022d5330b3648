use tracing::{info, instrument};

use super::stats::round_to;
use super::StageStats;
use crate::constants::COL_PRICE_PER_SQFT;
use crate::metrics::PipelineMetrics;
use crate::types::{Dataset, Listing};

pub const STAGE: &str = "derived_metrics";

/// Computes `price_per_sqft` for every listing with a price and a positive
/// area. Other listings get no value rather than an infinite or NaN one.
///
/// The column is only added when the dataset carries `area_sqft` at all.
#[instrument(skip_all, fields(records = dataset.len()))]
pub fn calculate_derived_metrics(mut dataset: Dataset) -> (Dataset, StageStats) {
    let n = dataset.len();
    if !dataset.columns.area_sqft {
        return (dataset, StageStats::new(STAGE, n, n));
    }

    let mut derived = 0;
    for record in dataset.records.iter_mut() {
        record.price_per_sqft = price_per_sqft(record);
        if record.price_per_sqft.is_some() {
            derived += 1;
        }
    }
    dataset.columns.price_per_sqft = true;

    info!("Derived price_per_sqft for {} of {} records", derived, n);
    PipelineMetrics::record_derived(COL_PRICE_PER_SQFT, derived);
    (dataset, StageStats::new(STAGE, n, n).with_filled(COL_PRICE_PER_SQFT, derived))
}

/// `price / area_sqft` rounded to two decimals, when the area is positive.
pub fn price_per_sqft(listing: &Listing) -> Option<f64> {
    match (listing.price, listing.area_sqft) {
        (Some(price), Some(area)) if area > 0.0 => Some(round_to(price as f64 / area, 2)),
        _ => None,
    }
}
