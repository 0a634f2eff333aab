//! Entity collectors
//!
//! One operation per entity type of the open-data API, plus the detail and
//! sub-resource lookups used to enrich them.

use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use super::client::{param, CamaraClient, Collected, Detail, Query};
use super::types::{EntityId, EntityRecord, Fields};
use crate::error::{ConfigError, FetchFailure};

pub const DEFAULT_PROPOSAL_CAP: usize = 5000;
pub const DEFAULT_VOTING_CAP: usize = 1000;

/// Inclusive date filter applied to the dated collections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ConfigError> {
        if start > end {
            return Err(ConfigError::InvertedDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// `dataInicio` / `dataFim` query parameters
    pub fn query_pairs(&self) -> Query {
        vec![
            param("dataInicio", self.start.format("%Y-%m-%d")),
            param("dataFim", self.end.format("%Y-%m-%d")),
        ]
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2019, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Top-level collections exposed by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Party,
    Deputy,
    Front,
    Proposal,
    Voting,
    Body,
}

impl EntityKind {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Party => "/partidos",
            Self::Deputy => "/deputados",
            Self::Front => "/frentes",
            Self::Proposal => "/proposicoes",
            Self::Voting => "/votacoes",
            Self::Body => "/orgaos",
        }
    }

    /// `ordenarPor` field and direction, when the collection is sorted
    pub fn sort(&self) -> Option<(&'static str, SortOrder)> {
        match self {
            Self::Party => Some(("sigla", SortOrder::Asc)),
            Self::Deputy => Some(("nome", SortOrder::Asc)),
            Self::Front => None,
            Self::Proposal => Some(("id", SortOrder::Desc)),
            Self::Voting => Some(("dataHoraRegistro", SortOrder::Desc)),
            Self::Body => Some(("id", SortOrder::Asc)),
        }
    }

    /// Whether the collection accepts `dataInicio` / `dataFim`
    pub fn dated(&self) -> bool {
        matches!(
            self,
            Self::Party | Self::Deputy | Self::Proposal | Self::Voting
        )
    }
}

/// Collects entities and their sub-resources through a shared client
#[derive(Clone)]
pub struct EntityCollector {
    client: Arc<CamaraClient>,
    range: DateRange,
}

impl EntityCollector {
    pub fn new(client: Arc<CamaraClient>, range: DateRange) -> Self {
        Self { client, range }
    }

    pub fn client(&self) -> &CamaraClient {
        &self.client
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    /// Query parameters for a collection: dates first, then sorting
    pub fn collection_query(&self, kind: EntityKind) -> Query {
        let mut query = if kind.dated() {
            self.range.query_pairs()
        } else {
            Vec::new()
        };
        if let Some((field, order)) = kind.sort() {
            query.push(param("ordem", order.as_str()));
            query.push(param("ordenarPor", field));
        }
        query
    }

    pub async fn collect(&self, kind: EntityKind, max_items: Option<usize>) -> Collected {
        info!(endpoint = kind.endpoint(), "Collecting");
        let query = self.collection_query(kind);
        self.client.paginate(kind.endpoint(), &query, max_items).await
    }

    pub async fn parties(&self) -> Collected {
        self.collect(EntityKind::Party, None).await
    }

    pub async fn deputies(&self) -> Collected {
        self.collect(EntityKind::Deputy, None).await
    }

    /// Parliamentary fronts, optionally kept only for one legislature
    pub async fn fronts(&self, legislature: Option<i64>) -> Collected {
        let mut collected = self.collect(EntityKind::Front, None).await;
        if let Some(legislature) = legislature {
            collected
                .items
                .retain(|front| front.i64_field("idLegislatura") == Some(legislature));
            info!(
                legislature,
                fronts = collected.items.len(),
                "Filtered fronts by legislature"
            );
        }
        collected
    }

    pub async fn proposals(&self, max_items: usize) -> Collected {
        self.collect(EntityKind::Proposal, Some(max_items)).await
    }

    pub async fn votings(&self, max_items: usize) -> Collected {
        self.collect(EntityKind::Voting, Some(max_items)).await
    }

    pub async fn bodies(&self) -> Collected {
        self.collect(EntityKind::Body, None).await
    }

    // =========================================================================
    // Detail lookups
    // =========================================================================

    /// Full profile of one deputy
    pub async fn deputy_details(&self, id: &EntityId) -> Detail<EntityRecord> {
        self.client
            .fetch_data(&format!("/deputados/{}", id))
            .await
            .and_then(|dados| match EntityRecord::from_value(dados) {
                Some(record) => Detail::Found(record),
                None => {
                    warn!(deputy = %id, "Deputy detail has no usable id");
                    Detail::Unavailable(FetchFailure::MissingData)
                }
            })
    }

    pub async fn front_members(&self, id: &EntityId) -> Detail<Vec<Fields>> {
        self.list_detail(&format!("/frentes/{}/membros", id)).await
    }

    pub async fn body_members(&self, id: &EntityId) -> Detail<Vec<Fields>> {
        self.list_detail(&format!("/orgaos/{}/membros", id)).await
    }

    pub async fn proposal_authors(&self, id: &EntityId) -> Detail<Vec<Fields>> {
        self.list_detail(&format!("/proposicoes/{}/autores", id)).await
    }

    /// Voting sessions a proposal went through
    pub async fn proposal_votings(&self, id: &EntityId) -> Detail<Vec<Fields>> {
        self.list_detail(&format!("/proposicoes/{}/votacoes", id)).await
    }

    pub async fn voting_votes(&self, id: &EntityId) -> Detail<Vec<Fields>> {
        self.list_detail(&format!("/votacoes/{}/votos", id)).await
    }

    async fn list_detail(&self, endpoint: &str) -> Detail<Vec<Fields>> {
        self.client.fetch_data(endpoint).await.and_then(|dados| match dados {
            Value::Array(items) => Detail::Found(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::Object(fields) => Some(fields),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => {
                warn!(endpoint, "Expected a list payload");
                Detail::Unavailable(FetchFailure::MissingData)
            }
        })
    }
}
