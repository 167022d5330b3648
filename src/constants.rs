/// Column names used in raw and cleaned listing files.
/// The order of `OUTPUT_COLUMNS` is the order columns are written in.
pub const COL_TITLE: &str = "title";
pub const COL_LOCATION: &str = "location";
pub const COL_PRICE: &str = "price";
pub const COL_BHK: &str = "bhk";
pub const COL_AREA_SQFT: &str = "area_sqft";
pub const COL_FURNISHING: &str = "furnishing";
pub const COL_PRICE_PER_SQFT: &str = "price_per_sqft";
pub const COL_LATITUDE: &str = "latitude";
pub const COL_LONGITUDE: &str = "longitude";

/// Columns a raw file must carry for the pipeline to run at all
pub const REQUIRED_COLUMNS: [&str; 3] = [COL_TITLE, COL_PRICE, COL_LOCATION];

pub const OUTPUT_COLUMNS: [&str; 9] = [
    COL_TITLE,
    COL_LOCATION,
    COL_PRICE,
    COL_BHK,
    COL_AREA_SQFT,
    COL_FURNISHING,
    COL_PRICE_PER_SQFT,
    COL_LATITUDE,
    COL_LONGITUDE,
];

// Furnishing labels as they appear in files
pub const UNFURNISHED: &str = "Unfurnished";
pub const SEMI_FURNISHED: &str = "Semi-Furnished";
pub const FULLY_FURNISHED: &str = "Fully Furnished";

// Default locations relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "rentmap.toml";
pub const DEFAULT_INPUT_PATH: &str = "data/raw/raw_rentals.csv";
pub const DEFAULT_OUTPUT_PATH: &str = "data/processed/rentals_processed.csv";
pub const DEFAULT_GEOCODE_CACHE_PATH: &str = "data/geocode_cache.json";
pub const DEFAULT_LOG_DIR: &str = "logs";

// Geocoding defaults
pub const DEFAULT_CITY: &str = "Delhi";
pub const DEFAULT_COUNTRY: &str = "India";
pub const FALLBACK_LATITUDE: f64 = 28.6139;
pub const FALLBACK_LONGITUDE: f64 = 77.2090;
pub const FALLBACK_OFFSET_STEP: f64 = 0.01;
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_GEOCODER_USER_AGENT: &str = "rentmap_geocoder";

// Environment overrides
pub const ENV_CONFIG_PATH: &str = "RENTMAP_CONFIG";
pub const ENV_SEED: &str = "RENTMAP_SEED";
