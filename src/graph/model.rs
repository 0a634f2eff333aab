//! Property graph model
//!
//! Labels, relationship types and the upsert commands understood by every
//! [`GraphStore`](super::GraphStore).

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::camara::types::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum NodeLabel {
    Deputado,
    Partido,
    Frente,
    #[serde(rename = "UF")]
    Uf,
}

impl NodeLabel {
    pub const ALL: [NodeLabel; 4] = [Self::Deputado, Self::Partido, Self::Frente, Self::Uf];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deputado => "Deputado",
            Self::Partido => "Partido",
            Self::Frente => "Frente",
            Self::Uf => "UF",
        }
    }

    /// Property a node is merged on
    pub fn key_property(&self) -> &'static str {
        match self {
            Self::Uf => "sigla",
            _ => "id",
        }
    }

    /// Properties written besides the key
    pub fn properties(&self) -> &'static [&'static str] {
        match self {
            Self::Deputado => &["nome", "siglaPartido", "siglaUf", "urlFoto", "email"],
            Self::Partido => &["sigla", "nome", "uri"],
            Self::Frente => &["titulo", "idLegislatura", "uri"],
            Self::Uf => &["nome", "regiao"],
        }
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum EdgeType {
    #[serde(rename = "FILIADO_A")]
    FiliadoA,
    #[serde(rename = "REPRESENTA")]
    Representa,
    #[serde(rename = "MEMBRO_DE")]
    MembroDe,
}

impl EdgeType {
    pub const ALL: [EdgeType; 3] = [Self::FiliadoA, Self::Representa, Self::MembroDe];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FiliadoA => "FILIADO_A",
            Self::Representa => "REPRESENTA",
            Self::MembroDe => "MEMBRO_DE",
        }
    }

    /// Source and target labels
    pub fn endpoints(&self) -> (NodeLabel, NodeLabel) {
        match self {
            Self::FiliadoA => (NodeLabel::Deputado, NodeLabel::Partido),
            Self::Representa => (NodeLabel::Deputado, NodeLabel::Uf),
            Self::MembroDe => (NodeLabel::Deputado, NodeLabel::Frente),
        }
    }

    pub fn properties(&self) -> &'static [&'static str] {
        match self {
            Self::MembroDe => &["titulo"],
            _ => &[],
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of a stored property
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Integer(i64),
    Text(String),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Integer(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&EntityId> for PropertyValue {
    fn from(value: &EntityId) -> Self {
        match value {
            EntityId::Number(n) => Self::Integer(*n),
            EntityId::Text(s) => Self::Text(s.clone()),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

pub type Properties = BTreeMap<String, PropertyValue>;

/// Identity of a node: its label plus the value of its key property
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeRef {
    pub label: NodeLabel,
    pub key: EntityId,
}

impl NodeRef {
    pub fn new(label: NodeLabel, key: impl Into<EntityId>) -> Self {
        Self {
            label,
            key: key.into(),
        }
    }
}

/// Create the node if no node with this label and key exists, then set properties
#[derive(Debug, Clone, PartialEq)]
pub struct NodeUpsert {
    pub node: NodeRef,
    pub properties: Properties,
}

/// Ensure exactly one edge of this type between two existing nodes, then set properties
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeUpsert {
    pub edge: EdgeType,
    pub from: NodeRef,
    pub to: NodeRef,
    pub properties: Properties,
}

/// Edges derived from a property match, e.g. `Deputado.siglaPartido = Partido.sigla`
///
/// Source nodes whose property is missing or empty get no edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedLink {
    pub edge: EdgeType,
    pub from_property: &'static str,
    pub to_property: &'static str,
}

impl DerivedLink {
    pub const PARTY_AFFILIATION: DerivedLink = DerivedLink {
        edge: EdgeType::FiliadoA,
        from_property: "siglaPartido",
        to_property: "sigla",
    };

    pub const STATE_REPRESENTATION: DerivedLink = DerivedLink {
        edge: EdgeType::Representa,
        from_property: "siglaUf",
        to_property: "sigla",
    };
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredNode {
    pub node: NodeRef,
    pub properties: Properties,
}

impl StoredNode {
    /// Property lookup that also answers for the key property
    pub fn property(&self, name: &str) -> Option<PropertyValue> {
        if name == self.node.label.key_property() {
            return Some(PropertyValue::from(&self.node.key));
        }
        self.properties.get(name).cloned()
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.property(name)
            .and_then(|v| v.as_str().map(str::to_string))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredEdge {
    pub edge: EdgeType,
    pub from: NodeRef,
    pub to: NodeRef,
    pub properties: Properties,
}

/// Read model of a whole graph, used by the analyses
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<StoredNode>,
    pub edges: Vec<StoredEdge>,
}

impl GraphSnapshot {
    pub fn nodes_with(&self, label: NodeLabel) -> impl Iterator<Item = &StoredNode> {
        self.nodes.iter().filter(move |n| n.node.label == label)
    }

    pub fn edges_of(&self, edge: EdgeType) -> impl Iterator<Item = &StoredEdge> {
        self.edges.iter().filter(move |e| e.edge == edge)
    }

    pub fn node(&self, node: &NodeRef) -> Option<&StoredNode> {
        self.nodes.iter().find(|n| &n.node == node)
    }

    pub fn count_nodes(&self, label: NodeLabel) -> usize {
        self.nodes_with(label).count()
    }

    pub fn count_edges(&self, edge: EdgeType) -> usize {
        self.edges_of(edge).count()
    }
}
