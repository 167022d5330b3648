use std::collections::HashSet;
use tracing::{info, instrument};

use super::normalize::{collapse_whitespace, normalize_location};
use super::StageStats;
use crate::metrics::PipelineMetrics;
use crate::types::{Dataset, Listing};

pub const STAGE: &str = "deduplicate";

/// Drops every listing whose (title, location) pair was already seen,
/// keeping the first occurrence in input order. Pairs are compared in the
/// form the text normalizer will give them, so rows that only differ in
/// spacing or location casing count as the same listing.
#[instrument(skip_all, fields(records = dataset.len()))]
pub fn remove_duplicates(mut dataset: Dataset) -> (Dataset, StageStats) {
    let before = dataset.len();

    let mut seen: HashSet<(Option<String>, Option<String>)> = HashSet::with_capacity(before);
    dataset
        .records
        .retain(|r| seen.insert(dedup_key(r)));

    let stats = StageStats::new(STAGE, before, dataset.len());
    info!("Removed {} duplicates", stats.removed());
    PipelineMetrics::record_removed(STAGE, stats.removed());
    (dataset, stats)
}

fn dedup_key(listing: &Listing) -> (Option<String>, Option<String>) {
    (
        listing.title.as_deref().map(collapse_whitespace),
        listing.location.as_deref().map(normalize_location),
    )
}
