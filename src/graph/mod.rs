//! Property graph loading and analysis
//!
//! - [`GraphStore`]: merge-by-key upserts implemented by an in-memory store
//!   and, with the `neo4j` feature, a Neo4j store
//! - [`GraphLoader`]: turns harvested datasets into nodes and edges
//! - [`analysis`]: the canned reports run over a loaded graph

pub mod analysis;
pub mod loader;
pub mod memory;
pub mod model;
pub mod states;

#[cfg(feature = "neo4j")]
pub mod neo4j;

pub use analysis::{analyze, AnalysisReport};
pub use loader::{GraphLoader, LoadInput, LoadReport};
pub use memory::MemoryGraph;
pub use model::*;

#[cfg(feature = "neo4j")]
pub use neo4j::Neo4jGraph;

use async_trait::async_trait;

use crate::error::GraphError;

/// Upsert-only graph backend
///
/// Nodes are identified by label plus key property; merging an existing node
/// overwrites the given properties and leaves the rest alone. Edges are
/// unique per (type, source, target).
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Uniqueness constraints on every node key
    async fn ensure_constraints(&self) -> Result<(), GraphError>;

    /// Delete every node and edge
    async fn clear(&self) -> Result<(), GraphError>;

    async fn merge_node(&self, upsert: &NodeUpsert) -> Result<(), GraphError>;

    /// Returns false (and writes nothing) when either endpoint is missing
    async fn merge_edge(&self, upsert: &EdgeUpsert) -> Result<bool, GraphError>;

    /// Ensure edges for every property match; returns the number of matches
    async fn link_on_property(&self, link: &DerivedLink) -> Result<u64, GraphError>;

    async fn snapshot(&self) -> Result<GraphSnapshot, GraphError>;
}
