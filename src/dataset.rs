//! Named datasets produced by a harvest run

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::camara::types::{
    BodyMembership, EntityRecord, FrontMembership, IndividualVote, ProposalAuthorship,
};

/// Every dataset a run can produce, in run order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DatasetKind {
    #[serde(rename = "partidos")]
    Parties,
    #[serde(rename = "deputados")]
    Deputies,
    #[serde(rename = "deputados_detalhados")]
    DeputyDetails,
    #[serde(rename = "frentes")]
    Fronts,
    #[serde(rename = "membros_frentes")]
    FrontMembers,
    #[serde(rename = "proposicoes")]
    Proposals,
    #[serde(rename = "autores_proposicoes")]
    ProposalAuthors,
    #[serde(rename = "votacoes")]
    Votings,
    #[serde(rename = "votos")]
    Votes,
    #[serde(rename = "orgaos")]
    Bodies,
    #[serde(rename = "membros_orgaos")]
    BodyMembers,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 11] = [
        Self::Parties,
        Self::Deputies,
        Self::DeputyDetails,
        Self::Fronts,
        Self::FrontMembers,
        Self::Proposals,
        Self::ProposalAuthors,
        Self::Votings,
        Self::Votes,
        Self::Bodies,
        Self::BodyMembers,
    ];

    /// Dataset name, also the output file stem
    pub fn name(&self) -> &'static str {
        match self {
            Self::Parties => "partidos",
            Self::Deputies => "deputados",
            Self::DeputyDetails => "deputados_detalhados",
            Self::Fronts => "frentes",
            Self::FrontMembers => "membros_frentes",
            Self::Proposals => "proposicoes",
            Self::ProposalAuthors => "autores_proposicoes",
            Self::Votings => "votacoes",
            Self::Votes => "votos",
            Self::Bodies => "orgaos",
            Self::BodyMembers => "membros_orgaos",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Records of one dataset, serialized as a plain JSON list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Dataset {
    Entities(Vec<EntityRecord>),
    FrontMembers(Vec<FrontMembership>),
    BodyMembers(Vec<BodyMembership>),
    Authorships(Vec<ProposalAuthorship>),
    Votes(Vec<IndividualVote>),
}

impl Dataset {
    pub fn len(&self) -> usize {
        match self {
            Self::Entities(v) => v.len(),
            Self::FrontMembers(v) => v.len(),
            Self::BodyMembers(v) => v.len(),
            Self::Authorships(v) => v.len(),
            Self::Votes(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_entities(&self) -> Option<&[EntityRecord]> {
        match self {
            Self::Entities(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Vec<EntityRecord>> for Dataset {
    fn from(v: Vec<EntityRecord>) -> Self {
        Self::Entities(v)
    }
}

impl From<Vec<FrontMembership>> for Dataset {
    fn from(v: Vec<FrontMembership>) -> Self {
        Self::FrontMembers(v)
    }
}

impl From<Vec<BodyMembership>> for Dataset {
    fn from(v: Vec<BodyMembership>) -> Self {
        Self::BodyMembers(v)
    }
}

impl From<Vec<ProposalAuthorship>> for Dataset {
    fn from(v: Vec<ProposalAuthorship>) -> Self {
        Self::Authorships(v)
    }
}

impl From<Vec<IndividualVote>> for Dataset {
    fn from(v: Vec<IndividualVote>) -> Self {
        Self::Votes(v)
    }
}

/// Datasets collected by one run, keyed and ordered by kind
///
/// A stage that was not run has no entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RunResult {
    datasets: BTreeMap<DatasetKind, Dataset>,
}

impl RunResult {
    pub fn insert(&mut self, kind: DatasetKind, dataset: impl Into<Dataset>) {
        self.datasets.insert(kind, dataset.into());
    }

    pub fn get(&self, kind: DatasetKind) -> Option<&Dataset> {
        self.datasets.get(&kind)
    }

    pub fn contains(&self, kind: DatasetKind) -> bool {
        self.datasets.contains_key(&kind)
    }

    /// Entity list for an entity dataset; empty when absent
    pub fn entities(&self, kind: DatasetKind) -> &[EntityRecord] {
        self.get(kind).and_then(Dataset::as_entities).unwrap_or(&[])
    }

    pub fn front_members(&self) -> &[FrontMembership] {
        match self.get(DatasetKind::FrontMembers) {
            Some(Dataset::FrontMembers(v)) => v,
            _ => &[],
        }
    }

    pub fn kinds(&self) -> impl Iterator<Item = DatasetKind> + '_ {
        self.datasets.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DatasetKind, &Dataset)> {
        self.datasets.iter().map(|(kind, dataset)| (*kind, dataset))
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camara::types::EntityId;
    use serde_json::json;

    #[test]
    fn test_names_round_trip() {
        for kind in DatasetKind::ALL {
            assert_eq!(DatasetKind::from_name(kind.name()), Some(kind));
            assert_eq!(serde_json::to_value(kind).unwrap(), json!(kind.name()));
        }
        assert_eq!(DatasetKind::from_name("desconhecido"), None);
    }

    #[test]
    fn test_run_result_serializes_in_run_order() {
        let mut result = RunResult::default();
        result.insert(DatasetKind::Bodies, Vec::<EntityRecord>::new());
        result.insert(
            DatasetKind::Parties,
            vec![EntityRecord::from_value(json!({"id": 1, "sigla": "PT"})).unwrap()],
        );

        let kinds: Vec<_> = result.kinds().collect();
        assert_eq!(kinds, vec![DatasetKind::Parties, DatasetKind::Bodies]);
        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            r#"{"partidos":[{"id":1,"sigla":"PT"}],"orgaos":[]}"#
        );
    }

    #[test]
    fn test_typed_accessors() {
        let mut result = RunResult::default();
        result.insert(
            DatasetKind::FrontMembers,
            vec![FrontMembership {
                front_id: EntityId::Number(1),
                front_title: None,
                deputy_id: Some(EntityId::Number(2)),
                deputy_name: None,
                role: "Membro".to_string(),
            }],
        );

        assert_eq!(result.front_members().len(), 1);
        assert!(result.entities(DatasetKind::Deputies).is_empty());
        assert!(!result.contains(DatasetKind::Votes));
    }
}
