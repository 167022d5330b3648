// Pipeline ingestion: reading raw listing files into a dataset

pub mod sample;

use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::constants;
use crate::error::LoadError;
use crate::metrics::PipelineMetrics;
use crate::parser;
use crate::types::{Columns, Dataset, Furnishing, Listing};

/// Header positions of the columns we understand
#[derive(Debug, Default)]
struct HeaderIndex {
    title: Option<usize>,
    location: Option<usize>,
    price: Option<usize>,
    bhk: Option<usize>,
    area_sqft: Option<usize>,
    furnishing: Option<usize>,
    price_per_sqft: Option<usize>,
    latitude: Option<usize>,
    longitude: Option<usize>,
}

impl HeaderIndex {
    fn from_headers(headers: &StringRecord) -> Self {
        let mut index = Self::default();
        for (i, name) in headers.iter().enumerate() {
            let slot = match name.trim().to_lowercase().as_str() {
                constants::COL_TITLE => &mut index.title,
                constants::COL_LOCATION => &mut index.location,
                constants::COL_PRICE => &mut index.price,
                constants::COL_BHK => &mut index.bhk,
                constants::COL_AREA_SQFT => &mut index.area_sqft,
                constants::COL_FURNISHING => &mut index.furnishing,
                constants::COL_PRICE_PER_SQFT => &mut index.price_per_sqft,
                constants::COL_LATITUDE => &mut index.latitude,
                constants::COL_LONGITUDE => &mut index.longitude,
                _ => continue,
            };
            // First occurrence wins for repeated headers
            slot.get_or_insert(i);
        }
        index
    }

    fn position(&self, column: &str) -> Option<usize> {
        match column {
            constants::COL_TITLE => self.title,
            constants::COL_LOCATION => self.location,
            constants::COL_PRICE => self.price,
            _ => None,
        }
    }

    fn missing_required(&self) -> Vec<String> {
        constants::REQUIRED_COLUMNS
            .iter()
            .filter(|col| self.position(col).is_none())
            .map(|col| col.to_string())
            .collect()
    }

    fn columns(&self) -> Columns {
        Columns {
            bhk: self.bhk.is_some(),
            area_sqft: self.area_sqft.is_some(),
            furnishing: self.furnishing.is_some(),
            price_per_sqft: self.price_per_sqft.is_some(),
            coordinates: self.latitude.is_some() && self.longitude.is_some(),
        }
    }

    fn listing(&self, row: &StringRecord, unparsed: &mut usize) -> Listing {
        let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i)).and_then(parser::non_empty);

        let listing = Listing {
            title: cell(self.title).map(str::to_string),
            location: cell(self.location).map(str::to_string),
            price: cell(self.price).and_then(parser::parse_price),
            bhk: cell(self.bhk).and_then(parser::parse_bhk),
            area_sqft: cell(self.area_sqft).and_then(parser::parse_area),
            furnishing: cell(self.furnishing).and_then(|t| t.parse::<Furnishing>().ok()),
            price_per_sqft: cell(self.price_per_sqft).and_then(parser::parse_float),
            latitude: cell(self.latitude).and_then(parser::parse_float),
            longitude: cell(self.longitude).and_then(parser::parse_float),
        };

        // Cells that had text but yielded nothing usable
        *unparsed += [
            cell(self.price).is_some() && listing.price.is_none(),
            cell(self.bhk).is_some() && listing.bhk.is_none(),
            cell(self.area_sqft).is_some() && listing.area_sqft.is_none(),
            cell(self.furnishing).is_some() && listing.furnishing.is_none(),
        ]
        .iter()
        .filter(|lost| **lost)
        .count();

        listing
    }
}

/// Reads a delimited listing file with a header row.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_listings(path: &Path) -> Result<Dataset, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset = load_from_reader(file, path)?;
    info!("Loaded {} records from {}", dataset.len(), path.display());
    Ok(dataset)
}

/// Reads listings from any reader. `source` only labels errors.
pub fn load_from_reader<R: Read>(reader: R, source: &Path) -> Result<Dataset, LoadError> {
    let malformed = |e: csv::Error| LoadError::Malformed {
        path: source.to_path_buf(),
        source: e,
    };

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::None)
        .from_reader(reader);

    let headers = rdr.headers().map_err(malformed)?.clone();
    let index = HeaderIndex::from_headers(&headers);

    let missing = index.missing_required();
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns {
            path: source.to_path_buf(),
            columns: missing,
        });
    }

    let mut records = Vec::new();
    let mut unparsed = 0;
    for row in rdr.records() {
        let row = row.map_err(malformed)?;
        records.push(index.listing(&row, &mut unparsed));
    }

    if unparsed > 0 {
        debug!("{} non-empty cells could not be parsed and were treated as missing", unparsed);
    }
    PipelineMetrics::record_loaded(records.len());
    Ok(Dataset::new(index.columns(), records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn load(text: &str) -> Result<Dataset, LoadError> {
        load_from_reader(text.as_bytes(), &PathBuf::from("inline.csv"))
    }

    #[test]
    fn test_loads_optional_columns() {
        let ds = load(
            "title,price,location,bhk,area_sqft,furnishing\n\
             2 BHK Apartment,35000,Vasant Kunj,2,1200,Semi-Furnished\n\
             Flat,\"₹18,000\",Karol Bagh,,600 sqft,\n",
        )
        .unwrap();

        assert_eq!(ds.len(), 2);
        assert!(ds.columns.bhk && ds.columns.area_sqft && ds.columns.furnishing);
        assert!(!ds.columns.coordinates);
        assert_eq!(ds.records[0].furnishing, Some(Furnishing::SemiFurnished));
        assert_eq!(ds.records[1].price, Some(18000));
        assert_eq!(ds.records[1].bhk, None);
        assert_eq!(ds.records[1].area_sqft, Some(600.0));
        assert_eq!(ds.records[1].furnishing, None);
    }

    #[test]
    fn test_reads_processed_columns_back() {
        let ds = load(
            "title,location,price,price_per_sqft,latitude,longitude\n\
             A,Saket,30000,25.5,28.5244,77.2066\n",
        )
        .unwrap();
        assert!(ds.columns.price_per_sqft && ds.columns.coordinates);
        assert_eq!(ds.records[0].price_per_sqft, Some(25.5));
        assert_eq!(ds.records[0].longitude, Some(77.2066));
    }

    #[test]
    fn test_empty_cells_are_missing() {
        let ds = load("title,price,location\n,35000,Dwarka\nA,,Dwarka\n").unwrap();
        assert!(ds.records[0].title.is_none());
        assert!(ds.records[1].price.is_none());
        assert!(!ds.columns.bhk);
    }

    #[test]
    fn test_missing_required_columns() {
        let err = load("title,bhk\nA,2\n").unwrap_err();
        match err {
            LoadError::MissingColumns { columns, .. } => {
                assert_eq!(columns, vec!["price".to_string(), "location".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_header_names_case_insensitive() {
        let ds = load("Title, Price ,LOCATION\nA,100,X\n").unwrap();
        assert_eq!(ds.records[0].price, Some(100));
    }

    #[test]
    fn test_header_only_file_is_empty_dataset() {
        let ds = load("title,price,location\n").unwrap();
        assert!(ds.is_empty());
    }

    #[test]
    fn test_invalid_utf8_row_is_malformed() {
        let bytes: &[u8] = b"title,price,location\nA,100,Saket\nB,200,\xff\xfe\n";
        let err = load_from_reader(bytes, Path::new("broken.csv")).unwrap_err();
        match err {
            LoadError::Malformed { path, .. } => assert_eq!(path, PathBuf::from("broken.csv")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unreadable_path() {
        let err = load_listings(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Unreadable { .. }));
    }
}
