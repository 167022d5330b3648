//! Stage counters for the cleaning pipeline.
//!
//! Counters go through the `metrics` facade; they are no-ops until the
//! embedding application installs a recorder.

pub const RECORDS_LOADED: &str = "rentmap_records_loaded_total";
pub const RECORDS_REMOVED: &str = "rentmap_records_removed_total";
pub const VALUES_IMPUTED: &str = "rentmap_values_imputed_total";
pub const VALUES_DERIVED: &str = "rentmap_values_derived_total";
pub const VALIDATION_WARNINGS: &str = "rentmap_validation_warnings_total";
pub const RECORDS_PERSISTED: &str = "rentmap_records_persisted_total";

/// Metrics collection for the cleaning stages
pub struct PipelineMetrics;

impl PipelineMetrics {
    pub fn record_loaded(count: usize) {
        ::metrics::counter!(RECORDS_LOADED).increment(count as u64);
    }

    pub fn record_removed(stage: &'static str, count: usize) {
        ::metrics::counter!(RECORDS_REMOVED, "stage" => stage).increment(count as u64);
    }

    pub fn record_imputed(field: &'static str, count: usize) {
        ::metrics::counter!(VALUES_IMPUTED, "field" => field).increment(count as u64);
    }

    pub fn record_derived(field: &'static str, count: usize) {
        ::metrics::counter!(VALUES_DERIVED, "field" => field).increment(count as u64);
    }

    pub fn record_validation_warnings(count: usize) {
        ::metrics::counter!(VALIDATION_WARNINGS).increment(count as u64);
    }

    pub fn record_persisted(count: usize) {
        ::metrics::counter!(RECORDS_PERSISTED).increment(count as u64);
    }
}
