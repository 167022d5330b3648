use crate::constants;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Furnishing status of a rental unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Furnishing {
    #[serde(rename = "Unfurnished")]
    Unfurnished,
    #[serde(rename = "Semi-Furnished")]
    SemiFurnished,
    #[serde(rename = "Fully Furnished")]
    FullyFurnished,
}

impl Furnishing {
    pub const ALL: [Furnishing; 3] = [
        Furnishing::Unfurnished,
        Furnishing::SemiFurnished,
        Furnishing::FullyFurnished,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Furnishing::Unfurnished => constants::UNFURNISHED,
            Furnishing::SemiFurnished => constants::SEMI_FURNISHED,
            Furnishing::FullyFurnished => constants::FULLY_FURNISHED,
        }
    }
}

impl fmt::Display for Furnishing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFurnishing(pub String);

impl fmt::Display for UnknownFurnishing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown furnishing label '{}'", self.0)
    }
}

impl std::error::Error for UnknownFurnishing {}

impl FromStr for Furnishing {
    type Err = UnknownFurnishing;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_lowercase().replace(['-', '_'], " ");
        match label.as_str() {
            "unfurnished" => Ok(Furnishing::Unfurnished),
            "semi furnished" | "semifurnished" => Ok(Furnishing::SemiFurnished),
            // Listings often just say "Furnished"
            "fully furnished" | "furnished" => Ok(Furnishing::FullyFurnished),
            _ => Err(UnknownFurnishing(s.to_string())),
        }
    }
}

/// One rental listing. Every field is optional because raw files are dirty;
/// the pipeline establishes which ones are guaranteed afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub title: Option<String>,
    pub location: Option<String>,
    /// Monthly rent in whole currency units
    pub price: Option<i64>,
    pub bhk: Option<u32>,
    pub area_sqft: Option<f64>,
    pub furnishing: Option<Furnishing>,
    pub price_per_sqft: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Listing {
    pub fn new(title: &str, location: &str, price: i64) -> Self {
        Self {
            title: Some(title.to_string()),
            location: Some(location.to_string()),
            price: Some(price),
            ..Default::default()
        }
    }

    pub fn with_area(mut self, area_sqft: f64) -> Self {
        self.area_sqft = Some(area_sqft);
        self
    }

    pub fn with_bhk(mut self, bhk: u32) -> Self {
        self.bhk = Some(bhk);
        self
    }

    pub fn with_furnishing(mut self, furnishing: Furnishing) -> Self {
        self.furnishing = Some(furnishing);
        self
    }

    /// True when title, location and price are all present.
    pub fn has_critical_fields(&self) -> bool {
        self.title.is_some() && self.location.is_some() && self.price.is_some()
    }
}

/// Which optional columns exist in the dataset schema. A column can exist
/// while individual records still lack a value for it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Columns {
    pub bhk: bool,
    pub area_sqft: bool,
    pub furnishing: bool,
    pub price_per_sqft: bool,
    pub coordinates: bool,
}

impl Columns {
    /// Header names in output order, restricted to the columns present.
    pub fn header(&self) -> Vec<&'static str> {
        constants::OUTPUT_COLUMNS
            .iter()
            .copied()
            .filter(|name| self.contains(name))
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        match name {
            constants::COL_TITLE | constants::COL_LOCATION | constants::COL_PRICE => true,
            constants::COL_BHK => self.bhk,
            constants::COL_AREA_SQFT => self.area_sqft,
            constants::COL_FURNISHING => self.furnishing,
            constants::COL_PRICE_PER_SQFT => self.price_per_sqft,
            constants::COL_LATITUDE | constants::COL_LONGITUDE => self.coordinates,
            _ => false,
        }
    }
}

/// An ordered collection of listings sharing one schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub columns: Columns,
    pub records: Vec<Listing>,
}

impl Dataset {
    pub fn new(columns: Columns, records: Vec<Listing>) -> Self {
        Self { columns, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Listing> {
        self.records.iter()
    }
}
