//! Built-in raw listings so a fresh checkout has something to process.

use crate::types::{Columns, Dataset, Listing};

const SAMPLE_LISTINGS: [(&str, i64, &str, u32, f64); 8] = [
    ("2 BHK Apartment in Vasant Kunj", 35000, "Vasant Kunj", 2, 1200.0),
    ("3 BHK Villa in Defence Colony", 75000, "Defence Colony", 3, 2500.0),
    ("1 BHK Flat in Karol Bagh", 18000, "Karol Bagh", 1, 600.0),
    ("2 BHK Apartment in Dwarka", 28000, "Dwarka", 2, 1100.0),
    ("3 BHK Penthouse in Greater Kailash", 95000, "Greater Kailash", 3, 2800.0),
    ("1 BHK Studio in Lajpat Nagar", 15000, "Lajpat Nagar", 1, 500.0),
    ("2 BHK Apartment in Rohini", 25000, "Rohini", 2, 1000.0),
    ("4 BHK Villa in Chanakyapuri", 150000, "Chanakyapuri", 4, 3500.0),
];

/// Raw sample dataset: title, price, location, bhk and area, no furnishing.
pub fn sample_dataset() -> Dataset {
    let records = SAMPLE_LISTINGS
        .iter()
        .map(|(title, price, location, bhk, area)| {
            Listing::new(title, location, *price)
                .with_bhk(*bhk)
                .with_area(*area)
        })
        .collect();

    Dataset::new(
        Columns {
            bhk: true,
            area_sqft: true,
            ..Default::default()
        },
        records,
    )
}
