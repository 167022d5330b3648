use tracing::{debug, instrument};

use super::StageStats;
use crate::types::Dataset;

pub const STAGE: &str = "normalize_text";

/// Trims and collapses whitespace in titles and locations, and title-cases
/// locations so the same neighbourhood groups together downstream.
#[instrument(skip_all, fields(records = dataset.len()))]
pub fn clean_text_fields(mut dataset: Dataset) -> (Dataset, StageStats) {
    let mut changed = 0;

    for record in dataset.records.iter_mut() {
        if let Some(title) = record.title.as_mut() {
            let cleaned = collapse_whitespace(title);
            if cleaned != *title {
                *title = cleaned;
                changed += 1;
            }
        }
        if let Some(location) = record.location.as_mut() {
            let cleaned = normalize_location(location);
            if cleaned != *location {
                *location = cleaned;
                changed += 1;
            }
        }
    }

    debug!("Normalized {} text values", changed);
    let n = dataset.len();
    (dataset, StageStats::new(STAGE, n, n))
}

/// Strips leading and trailing whitespace and folds interior runs to one space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn normalize_location(text: &str) -> String {
    title_case(&collapse_whitespace(text))
}

/// Uppercases a letter that follows a non-letter and lowercases every other
/// letter, so `"greater KAILASH-ii"` becomes `"Greater Kailash-Ii"`. A letter
/// whose uppercase form is several characters keeps only the first one
/// uppercased (`"ß"` becomes `"Ss"`). Word boundaries are read from the
/// output already written, which makes a second pass a no-op.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        let after_letter = out.chars().next_back().is_some_and(char::is_alphabetic);
        if !c.is_alphabetic() {
            out.push(c);
        } else if after_letter {
            out.extend(c.to_lowercase());
        } else {
            let mut upper = c.to_uppercase();
            out.extend(upper.next());
            out.extend(upper.flat_map(char::to_lowercase));
        }
    }
    out
}
