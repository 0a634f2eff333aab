//! camara-collector - Chamber of Deputies open-data harvester
//!
//! Collects parties, deputies, parliamentary fronts, proposals, votings and
//! bodies from the Brazilian Chamber of Deputies open-data API, flattens
//! their one-to-many sub-resources into join records, persists every dataset
//! as JSON and loads the result into a property graph.
//!
//! ## Call chain
//! Harvester -> EntityCollector -> CamaraClient (paginate / execute) ->
//! RateLimiter + HttpTransport
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use camara_collector::{CamaraClient, CollectorConfig, EntityCollector, Harvester, JsonFileSink, RunOptions};
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = CollectorConfig::default();
//! let client = Arc::new(CamaraClient::new(&config)?);
//! let collector = EntityCollector::new(client, config.date_range()?);
//! let sink = Arc::new(JsonFileSink::new(&config.output_dir)?);
//!
//! let harvest = Harvester::new(collector, sink).run(&RunOptions::quick()).await;
//! println!("{} datasets", harvest.result.len());
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Configuration
pub mod config;

// Open-data API client, collectors and flattener
pub mod camara;

// Named datasets of a run
pub mod dataset;

// Persistence of datasets
pub mod sink;

// Full-run orchestration
pub mod harvest;

// Graph loading and analyses
pub mod graph;

pub use camara::{CamaraClient, Detail, EntityCollector, EntityId, EntityRecord, FetchOutcome};
pub use config::CollectorConfig;
pub use dataset::{Dataset, DatasetKind, RunResult};
pub use error::{ConfigError, FetchFailure, GraphError, SinkError};
pub use graph::{GraphLoader, GraphStore, LoadInput, MemoryGraph};
pub use harvest::{Harvest, Harvester, RunMode, RunOptions, RunReport};
pub use sink::{JsonFileSink, MemorySink, PersistenceSink};
