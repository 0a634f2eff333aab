//! Relationship flattening
//!
//! Fans out over a parent list, fetches one sub-resource per parent and
//! projects every (parent, child) pair into a flat join record.

use serde_json::Value;
use std::future::Future;
use tracing::{debug, info, warn};

use super::client::Detail;
use super::types::{id_of, str_of, EntityId, EntityRecord, Fields};
use super::types::{BodyMembership, FrontMembership, IndividualVote, ProposalAuthorship};
use crate::error::FetchFailure;

const DEFAULT_ROLE: &str = "Membro";
const UNKNOWN: &str = "Desconhecido";
const PROGRESS_EVERY: usize = 50;

/// Joins produced by one fan-out
#[derive(Debug, Clone)]
pub struct Flattened<J> {
    pub joins: Vec<J>,
    pub parents_visited: usize,
    /// Parents whose sub-resource could not be fetched; they contribute no joins
    pub failed_parents: Vec<(EntityId, FetchFailure)>,
}

impl<J> Default for Flattened<J> {
    fn default() -> Self {
        Self {
            joins: Vec::new(),
            parents_visited: 0,
            failed_parents: Vec::new(),
        }
    }
}

/// Fetch each parent's children in order and project them into joins
///
/// Parents are visited one at a time; a failed lookup is recorded and the
/// fan-out moves on to the next parent.
pub async fn flatten<J, F, Fut, P>(
    parents: &[EntityRecord],
    mut fetch_children: F,
    mut project: P,
) -> Flattened<J>
where
    F: FnMut(EntityId) -> Fut,
    Fut: Future<Output = Detail<Vec<Fields>>>,
    P: FnMut(&EntityRecord, &Fields) -> J,
{
    let mut flattened = Flattened::default();
    let total = parents.len();

    for (i, parent) in parents.iter().enumerate() {
        flattened.parents_visited += 1;
        match fetch_children(parent.id.clone()).await {
            Detail::Found(children) => {
                flattened
                    .joins
                    .extend(children.iter().map(|child| project(parent, child)));
            }
            Detail::Unavailable(failure) => {
                warn!(parent = %parent.id, error = %failure, "Skipping parent");
                flattened.failed_parents.push((parent.id.clone(), failure));
            }
        }

        if (i + 1) % PROGRESS_EVERY == 0 {
            debug!(visited = i + 1, total, joins = flattened.joins.len(), "Fan-out progress");
        }
    }

    info!(
        parents = total,
        joins = flattened.joins.len(),
        failed = flattened.failed_parents.len(),
        "Fan-out finished"
    );
    flattened
}

pub fn front_membership(front: &EntityRecord, member: &Fields) -> FrontMembership {
    FrontMembership {
        front_id: front.id.clone(),
        front_title: front.str_field("titulo").map(str::to_string),
        deputy_id: id_of(member, "id"),
        deputy_name: str_of(member, "nome"),
        role: str_of(member, "titulo").unwrap_or_else(|| DEFAULT_ROLE.to_string()),
    }
}

pub fn body_membership(body: &EntityRecord, member: &Fields) -> BodyMembership {
    BodyMembership {
        body_id: body.id.clone(),
        body_acronym: body.str_field("sigla").map(str::to_string),
        deputy_id: id_of(member, "id"),
        deputy_name: str_of(member, "nome"),
        role: str_of(member, "titulo").unwrap_or_else(|| DEFAULT_ROLE.to_string()),
    }
}

pub fn proposal_authorship(proposal: &EntityRecord, author: &Fields) -> ProposalAuthorship {
    ProposalAuthorship {
        proposal_id: proposal.id.clone(),
        proposal_type: proposal.str_field("siglaTipo").map(str::to_string),
        author_id: id_of(author, "id"),
        author_name: str_of(author, "nome"),
        author_type: str_of(author, "tipo").unwrap_or_else(|| UNKNOWN.to_string()),
        author_uri: str_of(author, "uri"),
    }
}

/// Votes nest the deputy under `deputado_`
pub fn individual_vote(voting: &EntityRecord, vote: &Fields) -> IndividualVote {
    let deputy = vote.get("deputado_").and_then(Value::as_object);
    let deputy_str = |key: &str| deputy.and_then(|d| str_of(d, key));

    IndividualVote {
        voting_id: voting.id.clone(),
        voting_date: voting.str_field("data").map(str::to_string),
        deputy_id: deputy.and_then(|d| id_of(d, "id")),
        deputy_name: deputy_str("nome"),
        party_acronym: deputy_str("siglaPartido"),
        state: deputy_str("siglaUf"),
        vote: str_of(vote, "tipoVoto").unwrap_or_else(|| UNKNOWN.to_string()),
    }
}
