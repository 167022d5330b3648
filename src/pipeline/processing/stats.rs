//! Column statistics shared by the cleaning stages.

use std::collections::BTreeMap;

/// Quantile `q` (0.0..=1.0) with linear interpolation between the two
/// nearest ranks. `None` for an empty column.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Some(quantile_sorted(&sorted, q))
}

fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Median; the mean of the two middle values for even counts.
pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Most frequent value. Ties resolve to the lowest tied value so repeated
/// runs over the same input agree.
pub fn mode<T: Ord + Copy>(values: &[T]) -> Option<T> {
    let mut counts: BTreeMap<T, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(*v).or_insert(0) += 1;
    }
    // BTreeMap iterates ascending, so the first maximum is the lowest value
    let mut best: Option<(T, usize)> = None;
    for (value, count) in counts {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((value, count)),
        }
    }
    best.map(|(value, _)| value)
}

/// Interquartile range bounds widened by `factor`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct IqrBounds {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrBounds {
    pub fn compute(values: &[f64], factor: f64) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let q1 = quantile_sorted(&sorted, 0.25);
        let q3 = quantile_sorted(&sorted, 0.75);
        let iqr = q3 - q1;
        Some(Self {
            q1,
            q3,
            lower: q1 - factor * iqr,
            upper: q3 + factor * iqr,
        })
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Round to `places` decimals, sending exact halves to the even neighbour
/// (`28.125` becomes `28.12`, `28.135` stays `28.14`).
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round_ties_even() / scale
}
