// Pipeline storage: durable output of cleaned datasets

pub mod in_memory;

pub use in_memory::InMemoryStorage;

use csv::Writer;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tracing::{info, instrument};

use crate::constants;
use crate::error::{RentmapError, Result};
use crate::metrics::PipelineMetrics;
use crate::types::{Dataset, Listing};

/// Destination for a cleaned dataset. A write either lands completely or
/// leaves the destination as it was.
pub trait Storage {
    /// Persists the dataset and returns the number of records written.
    fn persist(&self, dataset: &Dataset) -> Result<usize>;

    /// Human-readable location for run summaries
    fn describe(&self) -> String;
}

/// Writes a delimited file with a header row.
pub struct CsvFileStorage {
    path: PathBuf,
}

impl CsvFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Storage for CsvFileStorage {
    #[instrument(skip_all, fields(path = %self.path.display(), records = dataset.len()))]
    fn persist(&self, dataset: &Dataset) -> Result<usize> {
        let persist_err = |source: std::io::Error| RentmapError::Persist {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(persist_err)?;

        // Stage into a sibling temp file, then rename over the destination
        let mut staged = NamedTempFile::new_in(&dir).map_err(persist_err)?;
        write_csv(dataset, staged.as_file_mut())?;
        staged.as_file_mut().sync_all().map_err(persist_err)?;
        staged
            .persist(&self.path)
            .map_err(|e| persist_err(e.error))?;

        info!("Processed data saved to {}", self.path.display());
        PipelineMetrics::record_persisted(dataset.len());
        Ok(dataset.len())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Serializes the dataset's present columns as CSV into `out`.
pub fn write_csv<W: Write>(dataset: &Dataset, out: W) -> Result<()> {
    let header = dataset.columns.header();
    let mut wtr = Writer::from_writer(out);
    wtr.write_record(&header)?;
    for listing in dataset.iter() {
        let row: Vec<String> = header.iter().map(|col| cell(listing, col)).collect();
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn cell(listing: &Listing, column: &str) -> String {
    fn opt<T: ToString>(v: &Option<T>) -> String {
        v.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    match column {
        constants::COL_TITLE => opt(&listing.title),
        constants::COL_LOCATION => opt(&listing.location),
        constants::COL_PRICE => opt(&listing.price),
        constants::COL_BHK => opt(&listing.bhk),
        constants::COL_AREA_SQFT => opt(&listing.area_sqft),
        constants::COL_FURNISHING => opt(&listing.furnishing),
        constants::COL_PRICE_PER_SQFT => opt(&listing.price_per_sqft),
        constants::COL_LATITUDE => opt(&listing.latitude),
        constants::COL_LONGITUDE => opt(&listing.longitude),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Columns, Furnishing};

    #[test]
    fn test_csv_writes_present_columns_only() {
        let ds = Dataset::new(
            Columns {
                area_sqft: true,
                furnishing: true,
                price_per_sqft: true,
                ..Default::default()
            },
            vec![
                Listing {
                    price_per_sqft: Some(29.17),
                    ..Listing::new("2 BHK, corner", "Vasant Kunj", 35000)
                        .with_area(1200.0)
                        .with_furnishing(Furnishing::SemiFurnished)
                },
                Listing::new("Studio", "Saket", 9000).with_area(0.0),
            ],
        );

        let mut buf = Vec::new();
        write_csv(&ds, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert_eq!(
            text,
            "title,location,price,area_sqft,furnishing,price_per_sqft\n\
             \"2 BHK, corner\",Vasant Kunj,35000,1200,Semi-Furnished,29.17\n\
             Studio,Saket,9000,0,,\n"
        );
    }

    #[test]
    fn test_persist_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("processed").join("out.csv");
        let storage = CsvFileStorage::new(&path);

        let written = storage
            .persist(&Dataset::new(Columns::default(), vec![Listing::new("a", "B", 1)]))
            .unwrap();

        assert_eq!(written, 1);
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "title,location,price\na,B,1\n");
        // Only the final file remains
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn test_failed_persist_leaves_destination_untouched() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in the way makes the final rename fail
        let path = dir.path().join("out.csv");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep.txt"), "existing").unwrap();

        let err = CsvFileStorage::new(&path)
            .persist(&Dataset::new(Columns::default(), vec![Listing::new("a", "B", 1)]))
            .unwrap_err();

        assert!(matches!(err, RentmapError::Persist { .. }));
        assert_eq!(fs::read_to_string(path.join("keep.txt")).unwrap(), "existing");
        // The staged temp file is cleaned up
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
