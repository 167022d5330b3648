pub mod config;
pub mod constants;
pub mod error;
pub mod geocoder;
pub mod logging;
pub mod metrics;
pub mod parser;
pub mod pipeline;
pub mod types;

pub use config::Config;
pub use error::{LoadError, RentmapError, Result};
pub use pipeline::{clean, run, CleanOutcome, PipelineResult};
pub use types::{Columns, Dataset, Furnishing, Listing};
