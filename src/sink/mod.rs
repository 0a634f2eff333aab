//! Persistence of harvested datasets
//!
//! A sink receives each dataset as soon as its stage finishes. The JSON file
//! sink is what the CLI uses; the in-memory sink backs tests and embedding.

pub mod json;

pub use json::{read_dataset, JsonFileSink};

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

use crate::dataset::Dataset;
use crate::error::SinkError;

#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Persist one named dataset, replacing any previous version
    async fn store(&self, name: &str, dataset: &Dataset) -> Result<(), SinkError>;
}

/// Keeps stored datasets in memory, keyed by name
#[derive(Default)]
pub struct MemorySink {
    stored: Mutex<BTreeMap<String, Dataset>>,
    order: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, name: &str) -> Option<Dataset> {
        self.stored.lock().await.get(name).cloned()
    }

    /// Names in the order they were stored
    pub async fn stored_names(&self) -> Vec<String> {
        self.order.lock().await.clone()
    }
}

#[async_trait]
impl PersistenceSink for MemorySink {
    async fn store(&self, name: &str, dataset: &Dataset) -> Result<(), SinkError> {
        self.stored
            .lock()
            .await
            .insert(name.to_string(), dataset.clone());
        self.order.lock().await.push(name.to_string());
        Ok(())
    }
}
