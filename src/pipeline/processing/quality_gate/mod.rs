use serde::Serialize;
use std::fmt;
use tracing::{info, instrument, warn};

use crate::config::ValidationConfig;
use crate::metrics::PipelineMetrics;
use crate::types::Dataset;

/// Non-fatal problems found in a cleaned dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValidationWarning {
    NegativePrice,
    NegativeArea,
    SuspiciouslyLowPrice,
    SuspiciouslyHighPrice,
}

impl ValidationWarning {
    pub fn message(&self) -> &'static str {
        match self {
            ValidationWarning::NegativePrice => "Negative prices found",
            ValidationWarning::NegativeArea => "Negative area values found",
            ValidationWarning::SuspiciouslyLowPrice => "Suspiciously low prices found",
            ValidationWarning::SuspiciouslyHighPrice => "Suspiciously high prices found",
        }
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// One warning together with how many listings triggered it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub warning: ValidationWarning,
    pub description: String,
    pub offending_records: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn has(&self, warning: ValidationWarning) -> bool {
        self.issues.iter().any(|i| i.warning == warning)
    }

    pub fn warnings(&self) -> Vec<ValidationWarning> {
        self.issues.iter().map(|i| i.warning).collect()
    }
}

/// Runs every check over the dataset and collects all that apply. The
/// dataset is only read.
#[instrument(skip_all, fields(records = dataset.len()))]
pub fn validate(dataset: &Dataset, config: &ValidationConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    let prices: Vec<i64> = dataset.iter().filter_map(|r| r.price).collect();

    check(
        &mut report,
        ValidationWarning::NegativePrice,
        prices.iter().filter(|p| **p < 0).count(),
    );

    if dataset.columns.area_sqft {
        check(
            &mut report,
            ValidationWarning::NegativeArea,
            dataset
                .iter()
                .filter_map(|r| r.area_sqft)
                .filter(|a| *a < 0.0)
                .count(),
        );
    }

    check(
        &mut report,
        ValidationWarning::SuspiciouslyLowPrice,
        prices
            .iter()
            .filter(|p| **p < config.low_price_threshold)
            .count(),
    );
    check(
        &mut report,
        ValidationWarning::SuspiciouslyHighPrice,
        prices
            .iter()
            .filter(|p| **p > config.high_price_threshold)
            .count(),
    );

    if report.passed() {
        info!("Data validation passed");
    } else {
        for issue in &report.issues {
            warn!(records = issue.offending_records, "{}", issue.description);
        }
    }
    PipelineMetrics::record_validation_warnings(report.issues.len());
    report
}

fn check(report: &mut ValidationReport, warning: ValidationWarning, offending: usize) {
    if offending > 0 {
        report.issues.push(ValidationIssue {
            warning,
            description: warning.message().to_string(),
            offending_records: offending,
        });
    }
}
