use super::Storage;
use crate::error::Result;
use crate::types::Dataset;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// In-memory storage implementation for development/testing
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    snapshots: Arc<Mutex<Vec<Dataset>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently persisted dataset, if any.
    pub fn latest(&self) -> Option<Dataset> {
        self.snapshots.lock().ok()?.last().cloned()
    }

    pub fn persisted_count(&self) -> usize {
        self.snapshots.lock().map(|s| s.len()).unwrap_or(0)
    }
}

impl Storage for InMemoryStorage {
    fn persist(&self, dataset: &Dataset) -> Result<usize> {
        let mut snapshots = self
            .snapshots
            .lock()
            .map_err(|e| crate::error::RentmapError::Io(std::io::Error::other(e.to_string())))?;
        snapshots.push(dataset.clone());
        debug!("Stored dataset snapshot #{} with {} records", snapshots.len(), dataset.len());
        Ok(dataset.len())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
