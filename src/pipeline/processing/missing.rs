use tracing::{debug, info, instrument};

use super::stats;
use super::StageStats;
use crate::constants::{COL_AREA_SQFT, COL_BHK};
use crate::metrics::PipelineMetrics;
use crate::types::Dataset;

pub const STAGE: &str = "missing_values";

/// Drops listings without a title, price or location, then fills gaps in
/// `bhk` with the column mode and in `area_sqft` with the column median.
///
/// Both statistics are taken from the listings that survive the drop. A
/// column that is absent, or has no values at all, is left untouched.
#[instrument(skip_all, fields(records = dataset.len()))]
pub fn handle_missing_values(mut dataset: Dataset) -> (Dataset, StageStats) {
    let before = dataset.len();
    dataset.records.retain(|r| r.has_critical_fields());

    let bhk_filled = if dataset.columns.bhk {
        impute_bhk(&mut dataset)
    } else {
        0
    };
    let area_filled = if dataset.columns.area_sqft {
        impute_area(&mut dataset)
    } else {
        0
    };

    let stats = StageStats::new(STAGE, before, dataset.len())
        .with_filled(COL_BHK, bhk_filled)
        .with_filled(COL_AREA_SQFT, area_filled);

    info!(
        dropped = stats.removed(),
        bhk_imputed = bhk_filled,
        area_imputed = area_filled,
        "Handled missing values. Remaining records: {}",
        dataset.len()
    );
    PipelineMetrics::record_removed(STAGE, stats.removed());
    PipelineMetrics::record_imputed(COL_BHK, bhk_filled);
    PipelineMetrics::record_imputed(COL_AREA_SQFT, area_filled);
    (dataset, stats)
}

fn impute_bhk(dataset: &mut Dataset) -> usize {
    let present: Vec<u32> = dataset.iter().filter_map(|r| r.bhk).collect();
    let Some(fill) = stats::mode(&present) else {
        debug!("bhk has no values; skipping imputation");
        return 0;
    };

    let mut filled = 0;
    for record in dataset.records.iter_mut().filter(|r| r.bhk.is_none()) {
        record.bhk = Some(fill);
        filled += 1;
    }
    filled
}

fn impute_area(dataset: &mut Dataset) -> usize {
    let present: Vec<f64> = dataset.iter().filter_map(|r| r.area_sqft).collect();
    let Some(fill) = stats::median(&present) else {
        debug!("area_sqft has no values; skipping imputation");
        return 0;
    };

    let mut filled = 0;
    for record in dataset.records.iter_mut().filter(|r| r.area_sqft.is_none()) {
        record.area_sqft = Some(fill);
        filled += 1;
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::test_support::dataset;
    use crate::types::{Columns, Listing};

    #[test]
    fn test_drops_records_missing_critical_fields() {
        let mut no_title = Listing::new("t", "Rohini", 20000);
        no_title.title = None;
        let mut no_price = Listing::new("t2", "Rohini", 20000);
        no_price.price = None;
        let mut no_location = Listing::new("t3", "Rohini", 20000);
        no_location.location = None;

        let input = dataset(vec![
            no_title,
            Listing::new("kept", "Saket", 30000),
            no_price,
            no_location,
        ]);
        let (out, stats) = handle_missing_values(input);

        assert_eq!(stats.removed(), 3);
        assert_eq!(out.len(), 1);
        assert!(out.iter().all(|r| r.has_critical_fields()));
    }

    #[test]
    fn test_imputes_mode_and_median() {
        let input = dataset(vec![
            Listing::new("a", "X", 10000).with_bhk(2).with_area(600.0),
            Listing::new("b", "X", 10000).with_bhk(3).with_area(1000.0),
            Listing::new("c", "X", 10000).with_bhk(3),
            Listing::new("d", "X", 10000).with_area(1200.0),
            Listing::new("e", "X", 10000).with_bhk(2).with_area(2000.0),
        ]);

        let (out, stats) = handle_missing_values(input);

        assert_eq!(stats.filled(COL_BHK), 1);
        assert_eq!(stats.filled(COL_AREA_SQFT), 1);
        // 2 and 3 tie; lowest wins
        assert_eq!(out.records[3].bhk, Some(2));
        // median of 600, 1000, 1200, 2000
        assert_eq!(out.records[2].area_sqft, Some(1100.0));
    }

    #[test]
    fn test_statistics_ignore_dropped_records() {
        let mut dropped = Listing::new("gone", "X", 0).with_bhk(5).with_area(9000.0);
        dropped.price = None;
        let input = dataset(vec![
            dropped.clone(),
            dropped,
            Listing::new("a", "X", 10000).with_bhk(1).with_area(500.0),
            Listing::new("b", "X", 10000),
        ]);

        let (out, _) = handle_missing_values(input);

        assert_eq!(out.len(), 2);
        assert_eq!(out.records[1].bhk, Some(1));
        assert_eq!(out.records[1].area_sqft, Some(500.0));
    }

    #[test]
    fn test_entirely_missing_columns_are_skipped() {
        let absent = Dataset::new(Columns::default(), vec![Listing::new("a", "X", 1)]);
        let (out, stats) = handle_missing_values(absent);
        assert!(!out.columns.bhk);
        assert!(out.records[0].bhk.is_none());
        assert_eq!(stats.filled(COL_BHK), 0);

        let all_empty = dataset(vec![Listing::new("a", "X", 1), Listing::new("b", "X", 2)]);
        let (out, stats) = handle_missing_values(all_empty);
        assert!(out.iter().all(|r| r.bhk.is_none() && r.area_sqft.is_none()));
        assert_eq!(stats.filled(COL_AREA_SQFT), 0);
    }

    #[test]
    fn test_empty_dataset() {
        let (out, stats) = handle_missing_values(dataset(Vec::new()));
        assert!(out.is_empty());
        assert_eq!(stats.removed(), 0);
    }
}
