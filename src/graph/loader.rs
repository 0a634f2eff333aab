//! Graph loading
//!
//! Upserts harvested parties, deputies, fronts and front memberships into a
//! [`GraphStore`]. Every write is a merge on the node key, so loading the same
//! input twice leaves the graph unchanged.

use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use super::model::{DerivedLink, EdgeType, EdgeUpsert, NodeLabel, NodeRef, NodeUpsert, Properties, PropertyValue};
use super::states::FEDERATIVE_UNITS;
use super::GraphStore;
use crate::camara::types::{EntityRecord, FrontMembership};
use crate::dataset::{DatasetKind, RunResult};
use crate::error::{GraphError, SinkError};
use crate::sink::read_dataset;

const DEFAULT_ROLE: &str = "Membro";

/// Datasets the graph is built from
#[derive(Debug, Clone, Default)]
pub struct LoadInput {
    pub parties: Vec<EntityRecord>,
    pub deputies: Vec<EntityRecord>,
    pub fronts: Vec<EntityRecord>,
    pub front_members: Vec<FrontMembership>,
}

impl LoadInput {
    pub fn from_run(result: &RunResult) -> Self {
        Self {
            parties: result.entities(DatasetKind::Parties).to_vec(),
            deputies: result.entities(DatasetKind::Deputies).to_vec(),
            fronts: result.entities(DatasetKind::Fronts).to_vec(),
            front_members: result.front_members().to_vec(),
        }
    }

    /// Read the JSON files written by a run; missing files load as empty
    pub async fn from_dir(dir: &Path) -> Result<Self, SinkError> {
        Ok(Self {
            parties: read_or_empty(dir, DatasetKind::Parties).await?,
            deputies: read_or_empty(dir, DatasetKind::Deputies).await?,
            fronts: read_or_empty(dir, DatasetKind::Fronts).await?,
            front_members: read_or_empty(dir, DatasetKind::FrontMembers).await?,
        })
    }
}

async fn read_or_empty<T: serde::de::DeserializeOwned>(
    dir: &Path,
    kind: DatasetKind,
) -> Result<Vec<T>, SinkError> {
    match read_dataset(dir, kind.name()).await? {
        Some(records) => Ok(records),
        None => {
            warn!(dataset = %kind, dir = %dir.display(), "Dataset file not found, loading nothing");
            Ok(Vec::new())
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub states: usize,
    pub parties: usize,
    pub deputies: usize,
    pub affiliations: u64,
    pub representations: u64,
    pub fronts: usize,
    pub memberships: usize,
    /// Membership rows whose deputy or front is not in the graph
    pub memberships_skipped: usize,
}

pub struct GraphLoader {
    store: Arc<dyn GraphStore>,
}

impl GraphLoader {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    /// Remove every node and edge
    pub async fn clear(&self) -> Result<(), GraphError> {
        warn!("Clearing graph store");
        self.store.clear().await
    }

    pub async fn load(&self, input: &LoadInput) -> Result<LoadReport, GraphError> {
        let mut report = LoadReport::default();

        self.store.ensure_constraints().await?;

        for uf in FEDERATIVE_UNITS.iter() {
            let mut properties = Properties::new();
            properties.insert("nome".to_string(), uf.nome.into());
            properties.insert("regiao".to_string(), uf.regiao.into());
            self.store
                .merge_node(&NodeUpsert {
                    node: NodeRef::new(NodeLabel::Uf, uf.sigla),
                    properties,
                })
                .await?;
            report.states += 1;
        }
        info!(states = report.states, "Loaded federative units");

        report.parties = self.merge_entities(NodeLabel::Partido, &input.parties).await?;
        info!(parties = report.parties, "Loaded parties");

        report.deputies = self.merge_entities(NodeLabel::Deputado, &input.deputies).await?;
        report.affiliations = self
            .store
            .link_on_property(&DerivedLink::PARTY_AFFILIATION)
            .await?;
        report.representations = self
            .store
            .link_on_property(&DerivedLink::STATE_REPRESENTATION)
            .await?;
        info!(
            deputies = report.deputies,
            affiliations = report.affiliations,
            representations = report.representations,
            "Loaded deputies"
        );

        report.fronts = self.merge_entities(NodeLabel::Frente, &input.fronts).await?;
        info!(fronts = report.fronts, "Loaded fronts");

        for membership in &input.front_members {
            let Some(deputy_id) = membership.deputy_id.clone() else {
                report.memberships_skipped += 1;
                continue;
            };
            let mut properties = Properties::new();
            properties.insert(
                "titulo".to_string(),
                PropertyValue::from(if membership.role.is_empty() {
                    DEFAULT_ROLE
                } else {
                    membership.role.as_str()
                }),
            );
            let merged = self
                .store
                .merge_edge(&EdgeUpsert {
                    edge: EdgeType::MembroDe,
                    from: NodeRef::new(NodeLabel::Deputado, deputy_id),
                    to: NodeRef::new(NodeLabel::Frente, membership.front_id.clone()),
                    properties,
                })
                .await?;
            if merged {
                report.memberships += 1;
            } else {
                report.memberships_skipped += 1;
            }
        }
        info!(
            memberships = report.memberships,
            skipped = report.memberships_skipped,
            "Loaded front memberships"
        );

        Ok(report)
    }

    async fn merge_entities(
        &self,
        label: NodeLabel,
        records: &[EntityRecord],
    ) -> Result<usize, GraphError> {
        for record in records {
            self.store.merge_node(&node_upsert(label, record)).await?;
        }
        Ok(records.len())
    }
}

/// Node for an entity record; absent fields load as empty strings (or 0 for
/// `idLegislatura`)
pub fn node_upsert(label: NodeLabel, record: &EntityRecord) -> NodeUpsert {
    let properties = label
        .properties()
        .iter()
        .map(|name| {
            let value = match record.get(name) {
                Some(Value::String(s)) => PropertyValue::Text(s.clone()),
                Some(Value::Number(n)) if n.is_i64() => {
                    PropertyValue::Integer(n.as_i64().unwrap_or_default())
                }
                _ if *name == "idLegislatura" => PropertyValue::Integer(0),
                _ => PropertyValue::Text(String::new()),
            };
            (name.to_string(), value)
        })
        .collect();

    NodeUpsert {
        node: NodeRef::new(label, record.id.clone()),
        properties,
    }
}
