use tracing::{debug, info, instrument};

use super::stats::IqrBounds;
use super::StageStats;
use crate::config::CleaningConfig;
use crate::metrics::PipelineMetrics;
use crate::types::Dataset;

pub const STAGE: &str = "price_outliers";

/// Removes listings whose price falls outside
/// `[Q1 - factor * IQR, Q3 + factor * IQR]` of the incoming price column.
///
/// Datasets smaller than `min_records_for_outliers` pass through unchanged.
/// Listings with no price at all do not fall inside any bounds and are
/// removed.
#[instrument(skip_all, fields(records = dataset.len()))]
pub fn remove_price_outliers(mut dataset: Dataset, config: &CleaningConfig) -> (Dataset, StageStats) {
    let before = dataset.len();

    if before < config.min_records_for_outliers {
        debug!(
            "Only {} records; need {} for quartile estimation, skipping outlier filter",
            before, config.min_records_for_outliers
        );
        return (dataset, StageStats::new(STAGE, before, before));
    }

    let prices: Vec<f64> = dataset.iter().filter_map(|r| r.price).map(|p| p as f64).collect();
    let Some(bounds) = IqrBounds::compute(&prices, config.outlier_iqr_factor) else {
        return (dataset, StageStats::new(STAGE, before, before));
    };
    debug!(
        q1 = bounds.q1,
        q3 = bounds.q3,
        lower = bounds.lower,
        upper = bounds.upper,
        "Price bounds"
    );

    dataset
        .records
        .retain(|r| r.price.is_some_and(|p| bounds.contains(p as f64)));

    let stats = StageStats::new(STAGE, before, dataset.len());
    info!("Removed {} price outliers", stats.removed());
    PipelineMetrics::record_removed(STAGE, stats.removed());
    (dataset, stats)
}
