//! Geocoding collaborator: turning a location name into coordinates.
//!
//! The pipeline itself never geocodes. This module provides the seam
//! (`Geocoder`), a persistent cache in front of any implementation, an
//! online Nominatim client, an offline gazetteer of common Delhi
//! neighbourhoods, and the pass that writes coordinates onto a cleaned
//! dataset.

use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::config::GeocodingConfig;
use crate::constants::{FALLBACK_LATITUDE, FALLBACK_LONGITUDE, FALLBACK_OFFSET_STEP};
use crate::error::{RentmapError, Result};
use crate::types::Dataset;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
}

/// Resolves a place name within a city and country. `Ok(None)` means the
/// place is unknown, not that the lookup failed.
pub trait Geocoder {
    fn lookup(&mut self, location: &str, city: &str, country: &str) -> Result<Option<GeoPoint>>;
}

pub fn cache_key(location: &str, city: &str, country: &str) -> String {
    format!("{}, {}, {}", location, city, country)
}

/// Puts a JSON file cache in front of another geocoder. Hits never reach
/// the inner geocoder; every new hit is written through to disk.
pub struct CachedGeocoder<G> {
    inner: G,
    cache_path: PathBuf,
    cache: BTreeMap<String, GeoPoint>,
}

impl<G: Geocoder> CachedGeocoder<G> {
    /// Opens the cache at `cache_path`, starting empty if it does not exist.
    pub fn open(inner: G, cache_path: impl Into<PathBuf>) -> Result<Self> {
        let cache_path = cache_path.into();
        let cache = if cache_path.exists() {
            let text = fs::read_to_string(&cache_path)?;
            serde_json::from_str(&text)?
        } else {
            BTreeMap::new()
        };
        debug!("Loaded {} cached geocodes from {}", cache.len(), cache_path.display());
        Ok(Self {
            inner,
            cache_path,
            cache,
        })
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    fn save(&self) -> Result<()> {
        if let Some(dir) = self.cache_path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let text = serde_json::to_string_pretty(&self.cache)?;
        fs::write(&self.cache_path, text)?;
        Ok(())
    }
}

impl<G: Geocoder> Geocoder for CachedGeocoder<G> {
    fn lookup(&mut self, location: &str, city: &str, country: &str) -> Result<Option<GeoPoint>> {
        let key = cache_key(location, city, country);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(Some(hit.clone()));
        }

        let found = self.inner.lookup(location, city, country)?;
        if let Some(point) = &found {
            self.cache.insert(key, point.clone());
            self.save()?;
        }
        Ok(found)
    }
}

static DELHI_GAZETTEER: Lazy<HashMap<&'static str, (f64, f64)>> = Lazy::new(|| {
    HashMap::from([
        ("Vasant Kunj", (28.5217, 77.1587)),
        ("Defence Colony", (28.5675, 77.2376)),
        ("Karol Bagh", (28.6517, 77.1905)),
        ("Dwarka", (28.5921, 77.0460)),
        ("Greater Kailash", (28.5494, 77.2466)),
        ("Lajpat Nagar", (28.5678, 77.2434)),
        ("Rohini", (28.7489, 77.1177)),
        ("Chanakyapuri", (28.5983, 77.1892)),
        ("Janakpuri", (28.6219, 77.0919)),
        ("Saket", (28.5244, 77.2066)),
        ("Connaught Place", (28.6304, 77.2177)),
        ("Nehru Place", (28.5494, 77.2501)),
        ("Pitampura", (28.7000, 77.1311)),
        ("Mayur Vihar", (28.6078, 77.2952)),
        ("Noida", (28.5355, 77.3910)),
    ])
});

/// Offline lookups against a fixed table of Delhi neighbourhoods.
#[derive(Debug, Default, Clone, Copy)]
pub struct SampleGeocoder;

impl Geocoder for SampleGeocoder {
    fn lookup(&mut self, location: &str, city: &str, country: &str) -> Result<Option<GeoPoint>> {
        Ok(DELHI_GAZETTEER
            .get(location)
            .map(|&(latitude, longitude)| GeoPoint {
                latitude,
                longitude,
                display_name: cache_key(location, city, country),
            }))
    }
}

/// One entry of a Nominatim `format=json` search response
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
}

impl NominatimPlace {
    fn into_point(self) -> Result<GeoPoint> {
        let coord = |raw: &str| {
            raw.trim()
                .parse::<f64>()
                .map_err(|e| RentmapError::Geocode(format!("bad coordinate '{}': {}", raw, e)))
        };
        Ok(GeoPoint {
            latitude: coord(&self.lat)?,
            longitude: coord(&self.lon)?,
            display_name: self.display_name,
        })
    }
}

/// Online lookups against a Nominatim search endpoint. Failed requests are
/// retried; a location that still fails is reported as unknown so the
/// caller falls back to default coordinates.
pub struct NominatimGeocoder {
    client: Client,
    service_url: String,
    max_retries: u32,
    retry_delay: Duration,
    rate_limit: Duration,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocodingConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            service_url: config.service_url.clone(),
            max_retries: config.max_retries.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            rate_limit: Duration::from_millis(config.rate_limit_ms),
        })
    }

    fn search(&self, query: &str) -> Result<Option<GeoPoint>> {
        let places: Vec<NominatimPlace> = self
            .client
            .get(&self.service_url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()?
            .error_for_status()?
            .json()?;
        places.into_iter().next().map(NominatimPlace::into_point).transpose()
    }
}

impl Geocoder for NominatimGeocoder {
    fn lookup(&mut self, location: &str, city: &str, country: &str) -> Result<Option<GeoPoint>> {
        let query = cache_key(location, city, country);
        for attempt in 1..=self.max_retries {
            match self.search(&query) {
                Ok(found) => {
                    if found.is_none() {
                        debug!("No geocoding match for {}", query);
                    }
                    // The public service allows one request per second
                    thread::sleep(self.rate_limit);
                    return Ok(found);
                }
                Err(e) => {
                    warn!(
                        "Geocoding error (attempt {}/{}) for {}: {}",
                        attempt, self.max_retries, query, e
                    );
                    if attempt < self.max_retries {
                        thread::sleep(self.retry_delay);
                    }
                }
            }
        }
        Ok(None)
    }
}

/// Counts from one geocoding pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeocodeSummary {
    pub unique_locations: usize,
    pub resolved: usize,
    pub fallbacks: usize,
}

/// Sets latitude and longitude on every listing, looking each distinct
/// location up once in order of first appearance. Unknown locations get the
/// city-centre fallback nudged by `0.01 * i` for the i-th distinct location,
/// so they do not stack on one map marker.
#[instrument(skip_all, fields(records = dataset.len()))]
pub fn geocode_dataset<G: Geocoder + ?Sized>(
    mut dataset: Dataset,
    geocoder: &mut G,
    city: &str,
    country: &str,
) -> Result<(Dataset, GeocodeSummary)> {
    let mut unique: Vec<String> = Vec::new();
    for location in dataset.iter().filter_map(|r| r.location.as_ref()) {
        if !unique.contains(location) {
            unique.push(location.clone());
        }
    }
    info!("Found {} unique locations", unique.len());

    let mut summary = GeocodeSummary {
        unique_locations: unique.len(),
        ..Default::default()
    };
    let mut coords: HashMap<String, (f64, f64)> = HashMap::with_capacity(unique.len());
    for (idx, location) in unique.into_iter().enumerate() {
        let point = match geocoder.lookup(&location, city, country)? {
            Some(p) => {
                summary.resolved += 1;
                (p.latitude, p.longitude)
            }
            None => {
                warn!("Location not found, using default coordinates: {}", location);
                summary.fallbacks += 1;
                let offset = (idx + 1) as f64 * FALLBACK_OFFSET_STEP;
                (FALLBACK_LATITUDE + offset, FALLBACK_LONGITUDE + offset)
            }
        };
        coords.insert(location, point);
    }

    for record in dataset.records.iter_mut() {
        let point = record.location.as_ref().and_then(|l| coords.get(l));
        record.latitude = point.map(|p| p.0);
        record.longitude = point.map(|p| p.1);
    }
    dataset.columns.coordinates = true;

    info!(
        "Geocoding complete. {} locations processed, {} fallbacks",
        summary.unique_locations, summary.fallbacks
    );
    Ok((dataset, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Columns, Listing};

    /// Counts how often the inner geocoder is actually consulted
    struct CountingGeocoder {
        calls: usize,
    }

    impl Geocoder for CountingGeocoder {
        fn lookup(&mut self, location: &str, city: &str, country: &str) -> Result<Option<GeoPoint>> {
            self.calls += 1;
            SampleGeocoder.lookup(location, city, country)
        }
    }

    #[test]
    fn test_cache_key_format() {
        assert_eq!(cache_key("Saket", "Delhi", "India"), "Saket, Delhi, India");
    }

    #[test]
    fn test_cache_hits_skip_inner_and_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.json");

        let mut geocoder = CachedGeocoder::open(CountingGeocoder { calls: 0 }, &path).unwrap();
        let first = geocoder.lookup("Saket", "Delhi", "India").unwrap().unwrap();
        let second = geocoder.lookup("Saket", "Delhi", "India").unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(geocoder.inner.calls, 1);
        assert!(path.exists());

        // A fresh instance reads the saved entry instead of asking again
        let mut reopened = CachedGeocoder::open(CountingGeocoder { calls: 0 }, &path).unwrap();
        assert_eq!(reopened.cached_len(), 1);
        reopened.lookup("Saket", "Delhi", "India").unwrap();
        assert_eq!(reopened.inner.calls, 0);
    }

    #[test]
    fn test_misses_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let mut geocoder = CachedGeocoder::open(CountingGeocoder { calls: 0 }, &path).unwrap();

        assert!(geocoder.lookup("Atlantis", "Delhi", "India").unwrap().is_none());
        assert!(geocoder.lookup("Atlantis", "Delhi", "India").unwrap().is_none());
        assert_eq!(geocoder.inner.calls, 2);
        assert!(!path.exists());
    }

    #[test]
    fn test_geocode_dataset_with_fallbacks() {
        let ds = Dataset::new(
            Columns::default(),
            vec![
                Listing::new("a", "Dwarka", 1),
                Listing::new("b", "Nowhere", 1),
                Listing::new("c", "Dwarka", 1),
            ],
        );

        let (out, summary) = geocode_dataset(ds, &mut SampleGeocoder, "Delhi", "India").unwrap();

        assert!(out.columns.coordinates);
        assert_eq!(
            summary,
            GeocodeSummary {
                unique_locations: 2,
                resolved: 1,
                fallbacks: 1
            }
        );
        assert_eq!(out.records[0].latitude, Some(28.5921));
        assert_eq!(out.records[2].longitude, Some(77.0460));
        // second distinct location: offset 2 * 0.01
        assert_eq!(out.records[1].latitude, Some(FALLBACK_LATITUDE + 0.02));
        assert_eq!(out.records[1].longitude, Some(FALLBACK_LONGITUDE + 0.02));
    }

    fn quick_config(service_url: String) -> GeocodingConfig {
        GeocodingConfig {
            service_url,
            timeout_secs: 2,
            retry_delay_ms: 0,
            rate_limit_ms: 0,
            ..Default::default()
        }
    }

    /// Answers `responses.len()` requests on a local port with the given
    /// status and body, returning the raw requests it received.
    fn serve(
        responses: Vec<(&'static str, &'static str)>,
    ) -> (String, thread::JoinHandle<Vec<String>>) {
        use std::io::{Read, Write};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/search", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let mut requests = Vec::new();
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut raw = Vec::new();
                let mut buf = [0u8; 1024];
                while !raw.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = stream.read(&mut buf).unwrap();
                    if n == 0 {
                        break;
                    }
                    raw.extend_from_slice(&buf[..n]);
                }
                requests.push(String::from_utf8_lossy(&raw).to_string());
                let reply = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                stream.write_all(reply.as_bytes()).unwrap();
            }
            requests
        });
        (url, handle)
    }

    #[test]
    fn test_nominatim_parses_first_match() {
        let (url, server) = serve(vec![(
            "200 OK",
            r#"[{"lat":"28.5244","lon":"77.2066","display_name":"Saket, South Delhi, Delhi, India"}]"#,
        )]);
        let mut geocoder = NominatimGeocoder::new(&quick_config(url)).unwrap();

        let point = geocoder.lookup("Saket", "Delhi", "India").unwrap().unwrap();

        assert_eq!(point.latitude, 28.5244);
        assert_eq!(point.longitude, 77.2066);
        assert_eq!(point.display_name, "Saket, South Delhi, Delhi, India");
        let request = server.join().unwrap().remove(0).to_lowercase();
        assert!(request.starts_with("get /search?q=saket"));
        assert!(request.contains("format=json"));
        assert!(request.contains("user-agent: rentmap_geocoder"));
    }

    #[test]
    fn test_nominatim_empty_result_is_unknown() {
        let (url, server) = serve(vec![("200 OK", "[]")]);
        let mut geocoder = NominatimGeocoder::new(&quick_config(url)).unwrap();

        assert!(geocoder.lookup("Atlantis", "Delhi", "India").unwrap().is_none());
        assert_eq!(server.join().unwrap().len(), 1);
    }

    #[test]
    fn test_nominatim_retries_server_errors() {
        let (url, server) = serve(vec![
            ("503 Service Unavailable", "{}"),
            ("200 OK", r#"[{"lat":"28.5921","lon":"77.0460","display_name":"Dwarka"}]"#),
        ]);
        let mut geocoder = NominatimGeocoder::new(&quick_config(url)).unwrap();

        let point = geocoder.lookup("Dwarka", "Delhi", "India").unwrap().unwrap();

        assert_eq!(point.latitude, 28.5921);
        assert_eq!(server.join().unwrap().len(), 2);
    }

    #[test]
    fn test_nominatim_gives_up_after_max_retries() {
        let (url, server) = serve(vec![
            ("500 Internal Server Error", "{}"),
            ("500 Internal Server Error", "{}"),
            ("500 Internal Server Error", "{}"),
        ]);
        let mut geocoder = NominatimGeocoder::new(&quick_config(url)).unwrap();

        assert!(geocoder.lookup("Rohini", "Delhi", "India").unwrap().is_none());
        assert_eq!(server.join().unwrap().len(), 3);
    }
}
