//! Canned analyses over a loaded graph
//!
//! Every report is computed from a [`GraphSnapshot`], so any store that can
//! produce one answers the same questions the same way.

use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tracing::info;

use super::model::{EdgeType, GraphSnapshot, NodeLabel, NodeRef};
use super::GraphStore;
use crate::error::GraphError;

const TOP_PARTIES: usize = 20;
const TOP_FRONTS: usize = 30;
const MIN_REGIONAL_DEPUTIES: usize = 5;
const THEMATIC_KEYWORDS: [&str; 2] = ["Defesa", "Apoio"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub nodes: BTreeMap<String, usize>,
    pub edges: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartyCount {
    pub sigla: String,
    pub nome: String,
    pub deputies: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateCount {
    pub sigla: String,
    pub nome: String,
    pub regiao: String,
    pub deputies: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionCount {
    pub regiao: String,
    pub deputies: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionalParty {
    pub regiao: String,
    pub partido: String,
    pub deputies: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThematicFront {
    pub titulo: String,
    pub legislatura: Option<i64>,
}

/// All analyses, in presentation order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub stats: GraphStats,
    pub deputies_per_party: Vec<PartyCount>,
    pub deputies_per_state: Vec<StateCount>,
    pub deputies_per_region: Vec<RegionCount>,
    pub parties_per_region: Vec<RegionalParty>,
    pub thematic_fronts: Vec<ThematicFront>,
}

impl AnalysisReport {
    pub fn from_snapshot(snapshot: &GraphSnapshot) -> Self {
        Self {
            stats: graph_stats(snapshot),
            deputies_per_party: deputies_per_party(snapshot),
            deputies_per_state: deputies_per_state(snapshot),
            deputies_per_region: deputies_per_region(snapshot),
            parties_per_region: parties_per_region(snapshot),
            thematic_fronts: thematic_fronts(snapshot),
        }
    }
}

/// Snapshot the store and run every analysis
pub async fn analyze(store: &dyn GraphStore) -> Result<AnalysisReport, GraphError> {
    let snapshot = store.snapshot().await?;
    let report = AnalysisReport::from_snapshot(&snapshot);
    info!(
        nodes = snapshot.nodes.len(),
        edges = snapshot.edges.len(),
        "Graph analyses complete"
    );
    Ok(report)
}

pub fn graph_stats(snapshot: &GraphSnapshot) -> GraphStats {
    GraphStats {
        nodes: NodeLabel::ALL
            .iter()
            .map(|label| (label.to_string(), snapshot.count_nodes(*label)))
            .collect(),
        edges: EdgeType::ALL
            .iter()
            .map(|edge| (edge.to_string(), snapshot.count_edges(*edge)))
            .collect(),
    }
}

/// Edge counts per target node, for edges of one type
fn count_by_target(snapshot: &GraphSnapshot, edge: EdgeType) -> BTreeMap<&NodeRef, usize> {
    let mut counts = BTreeMap::new();
    for e in snapshot.edges_of(edge) {
        *counts.entry(&e.to).or_insert(0) += 1;
    }
    counts
}

fn text_of(snapshot: &GraphSnapshot, node: &NodeRef, property: &str) -> String {
    snapshot
        .node(node)
        .and_then(|n| n.text(property))
        .unwrap_or_default()
}

/// Parties ranked by affiliated deputies, top 20
pub fn deputies_per_party(snapshot: &GraphSnapshot) -> Vec<PartyCount> {
    let mut rows: Vec<PartyCount> = count_by_target(snapshot, EdgeType::FiliadoA)
        .into_iter()
        .map(|(party, deputies)| PartyCount {
            sigla: text_of(snapshot, party, "sigla"),
            nome: text_of(snapshot, party, "nome"),
            deputies,
        })
        .collect();
    rows.sort_by(|a, b| b.deputies.cmp(&a.deputies).then_with(|| a.sigla.cmp(&b.sigla)));
    rows.truncate(TOP_PARTIES);
    rows
}

pub fn deputies_per_state(snapshot: &GraphSnapshot) -> Vec<StateCount> {
    let mut rows: Vec<StateCount> = count_by_target(snapshot, EdgeType::Representa)
        .into_iter()
        .map(|(state, deputies)| StateCount {
            sigla: state.key.to_string(),
            nome: text_of(snapshot, state, "nome"),
            regiao: text_of(snapshot, state, "regiao"),
            deputies,
        })
        .collect();
    rows.sort_by(|a, b| b.deputies.cmp(&a.deputies).then_with(|| a.sigla.cmp(&b.sigla)));
    rows
}

pub fn deputies_per_region(snapshot: &GraphSnapshot) -> Vec<RegionCount> {
    let mut by_region: BTreeMap<String, usize> = BTreeMap::new();
    for state in deputies_per_state(snapshot) {
        *by_region.entry(state.regiao).or_insert(0) += state.deputies;
    }

    let mut rows: Vec<RegionCount> = by_region
        .into_iter()
        .map(|(regiao, deputies)| RegionCount { regiao, deputies })
        .collect();
    rows.sort_by_key(|r| Reverse(r.deputies));
    rows
}

/// Parties with more than five deputies in a region, by region then count
pub fn parties_per_region(snapshot: &GraphSnapshot) -> Vec<RegionalParty> {
    let state_of: BTreeMap<&NodeRef, &NodeRef> = snapshot
        .edges_of(EdgeType::Representa)
        .map(|e| (&e.from, &e.to))
        .collect();

    let mut counts: BTreeMap<(String, String), usize> = BTreeMap::new();
    for affiliation in snapshot.edges_of(EdgeType::FiliadoA) {
        let Some(state) = state_of.get(&affiliation.from) else {
            continue;
        };
        let regiao = text_of(snapshot, state, "regiao");
        let partido = text_of(snapshot, &affiliation.to, "sigla");
        *counts.entry((regiao, partido)).or_insert(0) += 1;
    }

    let mut rows: Vec<RegionalParty> = counts
        .into_iter()
        .filter(|(_, deputies)| *deputies > MIN_REGIONAL_DEPUTIES)
        .map(|((regiao, partido), deputies)| RegionalParty {
            regiao,
            partido,
            deputies,
        })
        .collect();
    rows.sort_by(|a, b| {
        a.regiao
            .cmp(&b.regiao)
            .then_with(|| b.deputies.cmp(&a.deputies))
    });
    rows
}

/// Fronts whose title mentions "Defesa" or "Apoio", by title, top 30
pub fn thematic_fronts(snapshot: &GraphSnapshot) -> Vec<ThematicFront> {
    let mut rows: Vec<ThematicFront> = snapshot
        .nodes_with(NodeLabel::Frente)
        .filter_map(|front| {
            let titulo = front.text("titulo")?;
            THEMATIC_KEYWORDS
                .iter()
                .any(|k| titulo.contains(k))
                .then(|| ThematicFront {
                    legislatura: front.property("idLegislatura").and_then(|v| v.as_i64()),
                    titulo,
                })
        })
        .collect();
    rows.sort_by(|a, b| a.titulo.cmp(&b.titulo));
    rows.truncate(TOP_FRONTS);
    rows
}
