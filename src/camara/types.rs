//! Open-data API record types
//!
//! The API returns every collection as `{ "dados": [...], "links": [...] }`.
//! Entities keep their full field bag; only `id` is validated on the way in.
//! Join records are the flat rows produced by the relationship flattener and
//! keep the API's camelCase keys on the wire.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Raw JSON object as returned by the API
pub type Fields = Map<String, Value>;

/// Identifier of an API entity
///
/// Most entities use numeric ids; voting sessions use composite strings
/// such as `"2265603-43"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Number(i64),
    Text(String),
}

impl EntityId {
    /// Read an id from a JSON value (integers and non-empty strings only)
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Number),
            Value::String(s) if !s.trim().is_empty() => Some(Self::Text(s.trim().to_string())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Number(n) => Value::from(*n),
            Self::Text(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// One entity as returned by the API (party, deputy, front, proposal, ...)
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub id: EntityId,
    fields: Fields,
}

impl EntityRecord {
    /// Build a record from a raw object; `None` when `id` is missing or unusable
    pub fn from_fields(fields: Fields) -> Option<Self> {
        let id = fields.get("id").and_then(EntityId::from_value)?;
        Some(Self { id, fields })
    }

    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Self::from_fields(fields),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// String field, `None` when absent or not a string
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn i64_field(&self, key: &str) -> Option<i64> {
        self.fields.get(key).and_then(Value::as_i64)
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }
}

impl Serialize for EntityRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EntityRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = Fields::deserialize(deserializer)?;
        Self::from_fields(fields).ok_or_else(|| D::Error::custom("record has no usable `id`"))
    }
}

/// One page of a collection endpoint
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub items: Vec<EntityRecord>,
    /// Items present in `dados` before id validation
    pub raw_len: usize,
    /// Items dropped because they carried no usable `id`
    pub rejected: usize,
    pub has_next: bool,
}

impl Page {
    /// Parse a response body; `None` when `dados` is missing or not a list
    pub fn from_body(body: &Value) -> Option<Self> {
        let dados = body.get("dados")?.as_array()?;
        let mut page = Page {
            raw_len: dados.len(),
            has_next: has_next_link(body),
            ..Default::default()
        };
        for item in dados {
            match EntityRecord::from_value(item.clone()) {
                Some(record) => page.items.push(record),
                None => page.rejected += 1,
            }
        }
        Some(page)
    }
}

/// True when the body's `links` list contains `rel == "next"`
pub fn has_next_link(body: &Value) -> bool {
    body.get("links")
        .and_then(Value::as_array)
        .map(|links| {
            links
                .iter()
                .any(|link| link.get("rel").and_then(Value::as_str) == Some("next"))
        })
        .unwrap_or(false)
}

/// Read a string field from a raw object
pub fn str_of(fields: &Fields, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Read an id-like field from a raw object
pub fn id_of(fields: &Fields, key: &str) -> Option<EntityId> {
    fields.get(key).and_then(EntityId::from_value)
}

// =============================================================================
// Join records
// =============================================================================

/// Deputy membership of a parliamentary front (`membros_frentes`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontMembership {
    #[serde(rename = "idFrente")]
    pub front_id: EntityId,
    #[serde(rename = "tituloFrente")]
    pub front_title: Option<String>,
    #[serde(rename = "idDeputado")]
    pub deputy_id: Option<EntityId>,
    #[serde(rename = "nomeDeputado")]
    pub deputy_name: Option<String>,
    #[serde(rename = "titulo")]
    pub role: String,
}

/// Deputy membership of a committee or other body (`membros_orgaos`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyMembership {
    #[serde(rename = "idOrgao")]
    pub body_id: EntityId,
    #[serde(rename = "siglaOrgao")]
    pub body_acronym: Option<String>,
    #[serde(rename = "idDeputado")]
    pub deputy_id: Option<EntityId>,
    #[serde(rename = "nomeDeputado")]
    pub deputy_name: Option<String>,
    #[serde(rename = "titulo")]
    pub role: String,
}

/// Author of a proposal (`autores_proposicoes`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalAuthorship {
    #[serde(rename = "idProposicao")]
    pub proposal_id: EntityId,
    #[serde(rename = "tipoProposicao")]
    pub proposal_type: Option<String>,
    #[serde(rename = "idAutor")]
    pub author_id: Option<EntityId>,
    #[serde(rename = "nomeAutor")]
    pub author_name: Option<String>,
    #[serde(rename = "tipo")]
    pub author_type: String,
    #[serde(rename = "uriAutor")]
    pub author_uri: Option<String>,
}

/// One deputy's vote in a voting session (`votos`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualVote {
    #[serde(rename = "idVotacao")]
    pub voting_id: EntityId,
    #[serde(rename = "dataVotacao")]
    pub voting_date: Option<String>,
    #[serde(rename = "idDeputado")]
    pub deputy_id: Option<EntityId>,
    #[serde(rename = "nomeDeputado")]
    pub deputy_name: Option<String>,
    #[serde(rename = "siglaPartido")]
    pub party_acronym: Option<String>,
    #[serde(rename = "siglaUf")]
    pub state: Option<String>,
    #[serde(rename = "voto")]
    pub vote: String,
}
