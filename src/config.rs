use crate::constants;
use crate::error::{RentmapError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub cleaning: CleaningConfig,
    pub validation: ValidationConfig,
    pub geocoding: GeocodingConfig,
    /// Seed for the furnishing backfill; random when unset
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub geocode_cache: PathBuf,
    pub log_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(constants::DEFAULT_INPUT_PATH),
            output: PathBuf::from(constants::DEFAULT_OUTPUT_PATH),
            geocode_cache: PathBuf::from(constants::DEFAULT_GEOCODE_CACHE_PATH),
            log_dir: PathBuf::from(constants::DEFAULT_LOG_DIR),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Multiplier applied to the IQR when computing outlier bounds
    pub outlier_iqr_factor: f64,
    /// Below this many records the outlier filter leaves the dataset alone
    pub min_records_for_outliers: usize,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            outlier_iqr_factor: 3.0,
            min_records_for_outliers: 4,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub low_price_threshold: i64,
    pub high_price_threshold: i64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            low_price_threshold: 1_000,
            high_price_threshold: 10_000_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    pub city: String,
    pub country: String,
    /// Search endpoint for online lookups (Nominatim API)
    pub service_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Attempts per location before falling back to default coordinates
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    /// Pause after every answered request
    pub rate_limit_ms: u64,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            city: constants::DEFAULT_CITY.to_string(),
            country: constants::DEFAULT_COUNTRY.to_string(),
            service_url: constants::DEFAULT_GEOCODER_URL.to_string(),
            user_agent: constants::DEFAULT_GEOCODER_USER_AGENT.to_string(),
            timeout_secs: 10,
            max_retries: 3,
            retry_delay_ms: 2_000,
            rate_limit_ms: 1_000,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            RentmapError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Like `load`, but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Applies `RENTMAP_SEED` when it is set.
    pub fn apply_env(mut self) -> Result<Self> {
        if let Ok(raw) = std::env::var(constants::ENV_SEED) {
            let seed = raw.trim().parse::<u64>().map_err(|e| {
                RentmapError::Config(format!("{} must be an integer: {}", constants::ENV_SEED, e))
            })?;
            self.seed = Some(seed);
        }
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        let factor = self.cleaning.outlier_iqr_factor;
        if factor.is_nan() || factor < 0.0 {
            return Err(RentmapError::Config(
                "cleaning.outlier_iqr_factor must be non-negative".to_string(),
            ));
        }
        if self.validation.low_price_threshold > self.validation.high_price_threshold {
            return Err(RentmapError::Config(
                "validation.low_price_threshold exceeds high_price_threshold".to_string(),
            ));
        }
        if self.geocoding.max_retries == 0 || self.geocoding.timeout_secs == 0 {
            return Err(RentmapError::Config(
                "geocoding.max_retries and geocoding.timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
