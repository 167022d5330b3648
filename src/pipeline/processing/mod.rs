//! Cleaning stages. Each stage takes ownership of the dataset and hands back
//! the transformed dataset together with the statistics it gathered.

pub mod backfill;
pub mod dedup;
pub mod enrich;
pub mod missing;
pub mod normalize;
pub mod outliers;
pub mod quality_gate;
pub mod stats;

use serde::Serialize;
use std::collections::BTreeMap;

pub use backfill::backfill_furnishing;
pub use dedup::remove_duplicates;
pub use enrich::calculate_derived_metrics;
pub use missing::handle_missing_values;
pub use normalize::clean_text_fields;
pub use outliers::remove_price_outliers;
pub use quality_gate::{validate, ValidationReport, ValidationWarning};

/// Informational counts produced by one stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageStats {
    pub stage: &'static str,
    pub records_in: usize,
    pub records_out: usize,
    /// Values written per field (imputed, derived or synthesized)
    pub values_filled: BTreeMap<&'static str, usize>,
}

impl StageStats {
    pub fn new(stage: &'static str, records_in: usize, records_out: usize) -> Self {
        Self {
            stage,
            records_in,
            records_out,
            values_filled: BTreeMap::new(),
        }
    }

    pub fn with_filled(mut self, field: &'static str, count: usize) -> Self {
        self.values_filled.insert(field, count);
        self
    }

    pub fn removed(&self) -> usize {
        self.records_in.saturating_sub(self.records_out)
    }

    pub fn filled(&self, field: &str) -> usize {
        self.values_filled.get(field).copied().unwrap_or(0)
    }
}
