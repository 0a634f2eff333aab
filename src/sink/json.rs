//! JSON file sink
//!
//! Writes `<dir>/<name>.json` as pretty-printed UTF-8 (non-ASCII kept as is),
//! and reads the files back for the graph loader.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::info;

use super::PersistenceSink;
use crate::dataset::Dataset;
use crate::error::SinkError;

pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    /// Create the sink, creating the output directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| SinkError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        dataset_path(&self.dir, name)
    }
}

fn dataset_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.json", name))
}

#[async_trait]
impl PersistenceSink for JsonFileSink {
    async fn store(&self, name: &str, dataset: &Dataset) -> Result<(), SinkError> {
        let bytes = serde_json::to_vec_pretty(dataset).map_err(|source| {
            SinkError::Serialization {
                name: name.to_string(),
                source,
            }
        })?;

        let path = self.path_for(name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| SinkError::Io {
                path: path.display().to_string(),
                source,
            })?;

        info!(records = dataset.len(), path = %path.display(), "Saved dataset");
        Ok(())
    }
}

/// Read `<dir>/<name>.json` back as a record list; `None` when the file is absent
pub async fn read_dataset<T: DeserializeOwned>(
    dir: &Path,
    name: &str,
) -> Result<Option<Vec<T>>, SinkError> {
    let path = dataset_path(dir, name);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(SinkError::Io {
                path: path.display().to_string(),
                source,
            })
        }
    };

    let records = serde_json::from_slice(&bytes).map_err(|source| SinkError::Serialization {
        name: name.to_string(),
        source,
    })?;
    Ok(Some(records))
}
