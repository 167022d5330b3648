//! Lenient cell parsing for listing files.
//!
//! Raw files come either from clean exports (`35000`, `2.0`) or straight from
//! scraped listing cards (`₹35,000/month`, `2 BHK Apartment`, `1,200 sq.ft`).
//! Each parser tries the plain numeric form first and then falls back to
//! pulling the value out of the surrounding text.

use once_cell::sync::Lazy;
use regex::Regex;

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid digits regex"));
static BHK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d+)\s*BHK").expect("valid bhk regex"));
static AREA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([\d,]+(?:\.\d+)?)\s*(?:sq\.?\s*ft|sqft)").expect("valid area regex")
});

/// Returns `None` for empty cells, the trimmed text otherwise.
pub fn non_empty(cell: &str) -> Option<&str> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn plain_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// First run of digits once thousands separators are removed.
pub fn extract_price(text: &str) -> Option<i64> {
    let cleaned = text.replace(',', "");
    DIGITS
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<i64>().ok())
}

/// Integer immediately preceding "BHK".
pub fn extract_bhk(text: &str) -> Option<u32> {
    BHK.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
}

/// Number immediately preceding a square-feet unit.
pub fn extract_area(text: &str) -> Option<f64> {
    AREA.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().replace(',', "").parse::<f64>().ok())
}

/// Monthly rent in whole currency units; fractional values are rounded.
pub fn parse_price(cell: &str) -> Option<i64> {
    let cell = non_empty(cell)?;
    match plain_number(cell) {
        Some(v) => Some(v.round() as i64),
        None => extract_price(cell),
    }
}

pub fn parse_bhk(cell: &str) -> Option<u32> {
    let cell = non_empty(cell)?;
    match plain_number(cell) {
        // Float exports write whole counts as "2.0"
        Some(v) if v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 => Some(v as u32),
        Some(_) => None,
        None => extract_bhk(cell),
    }
}

pub fn parse_area(cell: &str) -> Option<f64> {
    let cell = non_empty(cell)?;
    plain_number(cell).or_else(|| extract_area(cell))
}

pub fn parse_float(cell: &str) -> Option<f64> {
    non_empty(cell).and_then(plain_number)
}
