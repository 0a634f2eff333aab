//! Neo4j graph store (feature `neo4j`)
//!
//! Labels, relationship types and property names come from the static model
//! tables and are interpolated into the Cypher text; every value is bound as
//! a parameter.

use async_trait::async_trait;
use neo4rs::{query, Graph, Query, Row};
use tracing::{debug, info};

use super::model::{
    DerivedLink, EdgeType, EdgeUpsert, GraphSnapshot, NodeLabel, NodeRef, NodeUpsert, Properties,
    PropertyValue, StoredEdge, StoredNode,
};
use super::GraphStore;
use crate::camara::types::EntityId;
use crate::error::GraphError;

pub struct Neo4jGraph {
    graph: Graph,
}

impl Neo4jGraph {
    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self, GraphError> {
        let graph = Graph::new(uri, user, password)
            .await
            .map_err(|e| GraphError::Backend(format!("Failed to connect to {}: {}", uri, e)))?;
        info!(uri, "Connected to Neo4j");
        Ok(Self { graph })
    }

    pub fn from_graph(graph: Graph) -> Self {
        Self { graph }
    }

    async fn run(&self, text: &str, q: Query) -> Result<(), GraphError> {
        debug!(query = text, "Running Cypher");
        self.graph.run(q).await.map_err(|e| query_error(text, e))
    }

    async fn rows(&self, text: &str, q: Query) -> Result<Vec<Row>, GraphError> {
        debug!(query = text, "Executing Cypher");
        let mut stream = self.graph.execute(q).await.map_err(|e| query_error(text, e))?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await.map_err(|e| query_error(text, e))? {
            rows.push(row);
        }
        Ok(rows)
    }

    async fn count(&self, text: &str, q: Query, column: &str) -> Result<u64, GraphError> {
        let rows = self.rows(text, q).await?;
        Ok(rows
            .first()
            .and_then(|row| row.get::<i64>(column).ok())
            .unwrap_or(0)
            .max(0) as u64)
    }
}

fn query_error(text: &str, e: neo4rs::Error) -> GraphError {
    GraphError::Query {
        query: text.to_string(),
        message: e.to_string(),
    }
}

fn bind_key(q: Query, name: &str, key: &EntityId) -> Query {
    match key {
        EntityId::Number(n) => q.param(name, *n),
        EntityId::Text(s) => q.param(name, s.as_str()),
    }
}

fn bind_value(q: Query, name: &str, value: &PropertyValue) -> Query {
    match value {
        PropertyValue::Integer(n) => q.param(name, *n),
        PropertyValue::Text(s) => q.param(name, s.as_str()),
    }
}

/// `SET var.a = $p0, var.b = $p1` plus the bound query; empty when there is nothing to set
fn set_clause<'a>(
    var: &str,
    properties: &'a Properties,
) -> (String, Vec<(String, &'a PropertyValue)>) {
    if properties.is_empty() {
        return (String::new(), Vec::new());
    }
    let mut assignments = Vec::new();
    let mut params = Vec::new();
    for (i, (name, value)) in properties.iter().enumerate() {
        let param = format!("p{}", i);
        assignments.push(format!("{}.{} = ${}", var, name, param));
        params.push((param, value));
    }
    (format!(" SET {}", assignments.join(", ")), params)
}

/// Ids come back through `toString`; integral strings are read as numbers
fn parse_key(raw: &str) -> EntityId {
    raw.parse::<i64>()
        .map(EntityId::Number)
        .unwrap_or_else(|_| EntityId::Text(raw.to_string()))
}

fn read_property(row: &Row, column: &str) -> Option<PropertyValue> {
    if let Ok(s) = row.get::<String>(column) {
        return Some(PropertyValue::Text(s));
    }
    row.get::<i64>(column).ok().map(PropertyValue::Integer)
}

#[async_trait]
impl GraphStore for Neo4jGraph {
    async fn ensure_constraints(&self) -> Result<(), GraphError> {
        for label in NodeLabel::ALL {
            let text = format!(
                "CREATE CONSTRAINT {}_{} IF NOT EXISTS FOR (n:{}) REQUIRE n.{} IS UNIQUE",
                label.as_str().to_lowercase(),
                label.key_property(),
                label.as_str(),
                label.key_property()
            );
            self.run(&text, query(&text)).await?;
        }
        info!("Ensured graph constraints");
        Ok(())
    }

    async fn clear(&self) -> Result<(), GraphError> {
        let text = "MATCH (n) DETACH DELETE n";
        self.run(text, query(text)).await
    }

    async fn merge_node(&self, upsert: &NodeUpsert) -> Result<(), GraphError> {
        let label = upsert.node.label;
        let (set, params) = set_clause("n", &upsert.properties);
        let text = format!(
            "MERGE (n:{} {{{}: $key}}){}",
            label.as_str(),
            label.key_property(),
            set
        );

        let mut q = bind_key(query(&text), "key", &upsert.node.key);
        for (name, value) in params {
            q = bind_value(q, &name, value);
        }
        self.run(&text, q).await
    }

    async fn merge_edge(&self, upsert: &EdgeUpsert) -> Result<bool, GraphError> {
        let (set, params) = set_clause("r", &upsert.properties);
        let text = format!(
            "MATCH (a:{} {{{}: $from}}) MATCH (b:{} {{{}: $to}}) MERGE (a)-[r:{}]->(b){} RETURN count(r) AS merged",
            upsert.from.label.as_str(),
            upsert.from.label.key_property(),
            upsert.to.label.as_str(),
            upsert.to.label.key_property(),
            upsert.edge.as_str(),
            set
        );

        let mut q = bind_key(query(&text), "from", &upsert.from.key);
        q = bind_key(q, "to", &upsert.to.key);
        for (name, value) in params {
            q = bind_value(q, &name, value);
        }
        Ok(self.count(&text, q, "merged").await? > 0)
    }

    async fn link_on_property(&self, link: &DerivedLink) -> Result<u64, GraphError> {
        let (from, to) = link.edge.endpoints();
        let text = format!(
            "MATCH (a:{from}) WHERE a.{fp} IS NOT NULL AND a.{fp} <> '' \
             MATCH (b:{to} {{{tp}: a.{fp}}}) \
             MERGE (a)-[:{edge}]->(b) \
             RETURN count(*) AS linked",
            from = from.as_str(),
            to = to.as_str(),
            fp = link.from_property,
            tp = link.to_property,
            edge = link.edge.as_str()
        );
        let linked = self.count(&text, query(&text), "linked").await?;
        info!(edge = %link.edge, linked, "Derived edges");
        Ok(linked)
    }

    async fn snapshot(&self) -> Result<GraphSnapshot, GraphError> {
        let mut snapshot = GraphSnapshot::default();

        for label in NodeLabel::ALL {
            let columns: Vec<String> = label
                .properties()
                .iter()
                .map(|p| format!("n.{p} AS {p}"))
                .collect();
            let text = format!(
                "MATCH (n:{}) RETURN toString(n.{}) AS key, {}",
                label.as_str(),
                label.key_property(),
                columns.join(", ")
            );
            for row in self.rows(&text, query(&text)).await? {
                let Ok(key) = row.get::<String>("key") else {
                    continue;
                };
                let properties = label
                    .properties()
                    .iter()
                    .filter_map(|p| read_property(&row, p).map(|v| (p.to_string(), v)))
                    .collect();
                snapshot.nodes.push(StoredNode {
                    node: NodeRef::new(label, parse_key(&key)),
                    properties,
                });
            }
        }

        for edge in EdgeType::ALL {
            let (from, to) = edge.endpoints();
            let columns: String = edge
                .properties()
                .iter()
                .map(|p| format!(", r.{p} AS {p}"))
                .collect();
            let text = format!(
                "MATCH (a:{})-[r:{}]->(b:{}) RETURN toString(a.{}) AS source, toString(b.{}) AS target{}",
                from.as_str(),
                edge.as_str(),
                to.as_str(),
                from.key_property(),
                to.key_property(),
                columns
            );
            for row in self.rows(&text, query(&text)).await? {
                let (Ok(source), Ok(target)) =
                    (row.get::<String>("source"), row.get::<String>("target"))
                else {
                    continue;
                };
                let properties = edge
                    .properties()
                    .iter()
                    .filter_map(|p| read_property(&row, p).map(|v| (p.to_string(), v)))
                    .collect();
                snapshot.edges.push(StoredEdge {
                    edge,
                    from: NodeRef::new(from, parse_key(&source)),
                    to: NodeRef::new(to, parse_key(&target)),
                    properties,
                });
            }
        }

        Ok(snapshot)
    }
}
