//! In-memory graph store

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

use super::model::{
    DerivedLink, EdgeType, EdgeUpsert, GraphSnapshot, NodeRef, NodeUpsert, Properties,
    PropertyValue, StoredEdge, StoredNode,
};
use super::GraphStore;
use crate::error::GraphError;

type EdgeKey = (EdgeType, NodeRef, NodeRef);

#[derive(Default)]
struct Inner {
    nodes: BTreeMap<NodeRef, Properties>,
    edges: BTreeMap<EdgeKey, Properties>,
    constraints_ensured: bool,
}

/// Graph held in ordered maps; merges are keyed the same way as the Neo4j store
#[derive(Default)]
pub struct MemoryGraph {
    inner: Mutex<Inner>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn constraints_ensured(&self) -> bool {
        self.inner.lock().await.constraints_ensured
    }
}

fn node_property(node: &NodeRef, properties: &Properties, name: &str) -> Option<PropertyValue> {
    if name == node.label.key_property() {
        return Some(PropertyValue::from(&node.key));
    }
    properties.get(name).cloned()
}

#[async_trait]
impl GraphStore for MemoryGraph {
    async fn ensure_constraints(&self) -> Result<(), GraphError> {
        self.inner.lock().await.constraints_ensured = true;
        Ok(())
    }

    async fn clear(&self) -> Result<(), GraphError> {
        let mut inner = self.inner.lock().await;
        inner.nodes.clear();
        inner.edges.clear();
        Ok(())
    }

    async fn merge_node(&self, upsert: &NodeUpsert) -> Result<(), GraphError> {
        let mut inner = self.inner.lock().await;
        inner
            .nodes
            .entry(upsert.node.clone())
            .or_default()
            .extend(upsert.properties.clone());
        Ok(())
    }

    async fn merge_edge(&self, upsert: &EdgeUpsert) -> Result<bool, GraphError> {
        let mut inner = self.inner.lock().await;
        if !inner.nodes.contains_key(&upsert.from) || !inner.nodes.contains_key(&upsert.to) {
            return Ok(false);
        }
        inner
            .edges
            .entry((upsert.edge, upsert.from.clone(), upsert.to.clone()))
            .or_default()
            .extend(upsert.properties.clone());
        Ok(true)
    }

    async fn link_on_property(&self, link: &DerivedLink) -> Result<u64, GraphError> {
        let mut inner = self.inner.lock().await;
        let (from_label, to_label) = link.edge.endpoints();

        let mut pairs = Vec::new();
        for (from, from_props) in inner.nodes.iter().filter(|(n, _)| n.label == from_label) {
            let Some(PropertyValue::Text(value)) = from_props.get(link.from_property) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            for (to, to_props) in inner.nodes.iter().filter(|(n, _)| n.label == to_label) {
                if node_property(to, to_props, link.to_property).as_ref().and_then(PropertyValue::as_str)
                    == Some(value.as_str())
                {
                    pairs.push((from.clone(), to.clone()));
                }
            }
        }

        let linked = pairs.len() as u64;
        for (from, to) in pairs {
            inner.edges.entry((link.edge, from, to)).or_default();
        }
        Ok(linked)
    }

    async fn snapshot(&self) -> Result<GraphSnapshot, GraphError> {
        let inner = self.inner.lock().await;
        Ok(GraphSnapshot {
            nodes: inner
                .nodes
                .iter()
                .map(|(node, properties)| StoredNode {
                    node: node.clone(),
                    properties: properties.clone(),
                })
                .collect(),
            edges: inner
                .edges
                .iter()
                .map(|((edge, from, to), properties)| StoredEdge {
                    edge: *edge,
                    from: from.clone(),
                    to: to.clone(),
                    properties: properties.clone(),
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::NodeLabel;

    fn upsert(label: NodeLabel, key: i64, props: &[(&str, &str)]) -> NodeUpsert {
        NodeUpsert {
            node: NodeRef::new(label, key),
            properties: props
                .iter()
                .map(|(k, v)| (k.to_string(), PropertyValue::from(*v)))
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_merge_node_updates_in_place() {
        let graph = MemoryGraph::new();

        graph
            .merge_node(&upsert(NodeLabel::Partido, 1, &[("sigla", "PT"), ("nome", "Old")]))
            .await
            .unwrap();
        graph
            .merge_node(&upsert(NodeLabel::Partido, 1, &[("nome", "New")]))
            .await
            .unwrap();

        let snapshot = graph.snapshot().await.unwrap();
        assert_eq!(snapshot.nodes.len(), 1);
        assert_eq!(snapshot.nodes[0].text("nome").as_deref(), Some("New"));
        assert_eq!(snapshot.nodes[0].text("sigla").as_deref(), Some("PT"));
    }

    #[tokio::test]
    async fn test_merge_edge_requires_both_endpoints() {
        let graph = MemoryGraph::new();
        graph
            .merge_node(&upsert(NodeLabel::Deputado, 10, &[]))
            .await
            .unwrap();

        let edge = EdgeUpsert {
            edge: EdgeType::MembroDe,
            from: NodeRef::new(NodeLabel::Deputado, 10i64),
            to: NodeRef::new(NodeLabel::Frente, 99i64),
            properties: Properties::new(),
        };
        assert!(!graph.merge_edge(&edge).await.unwrap());

        graph
            .merge_node(&upsert(NodeLabel::Frente, 99, &[]))
            .await
            .unwrap();
        assert!(graph.merge_edge(&edge).await.unwrap());
        assert!(graph.merge_edge(&edge).await.unwrap());
        assert_eq!(graph.snapshot().await.unwrap().edges.len(), 1);
    }

    #[tokio::test]
    async fn test_link_on_property_matches_key_property() {
        let graph = MemoryGraph::new();
        graph
            .merge_node(&NodeUpsert {
                node: NodeRef::new(NodeLabel::Uf, "SP"),
                properties: Properties::new(),
            })
            .await
            .unwrap();
        graph
            .merge_node(&upsert(NodeLabel::Deputado, 1, &[("siglaUf", "SP")]))
            .await
            .unwrap();
        graph
            .merge_node(&upsert(NodeLabel::Deputado, 2, &[("siglaUf", "")]))
            .await
            .unwrap();

        let linked = graph
            .link_on_property(&DerivedLink::STATE_REPRESENTATION)
            .await
            .unwrap();

        assert_eq!(linked, 1);
        let snapshot = graph.snapshot().await.unwrap();
        assert_eq!(snapshot.count_edges(EdgeType::Representa), 1);
        assert_eq!(snapshot.edges[0].from, NodeRef::new(NodeLabel::Deputado, 1i64));
    }

    #[tokio::test]
    async fn test_clear_empties_graph() {
        let graph = MemoryGraph::new();
        graph
            .merge_node(&upsert(NodeLabel::Frente, 1, &[]))
            .await
            .unwrap();
        graph.clear().await.unwrap();
        assert_eq!(graph.snapshot().await.unwrap(), GraphSnapshot::default());
    }
}
