//! Shared fakes for the integration tests
//!
//! `FakeApi` answers requests by URL path suffix, so a whole harvest can run
//! against canned JSON regardless of the order the stages issue requests in.

#![allow(dead_code)]

use async_trait::async_trait;
use camara_collector::camara::{HttpResponse, HttpTransport, Sleeper, TransportError};
use camara_collector::{CamaraClient, CollectorConfig, EntityCollector};
use camara_collector::camara::DateRange;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// Records requested sleeps and returns immediately
#[derive(Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// Canned open-data API keyed by path suffix; unknown paths answer 404
#[derive(Default)]
pub struct FakeApi {
    routes: Vec<(String, u16, Value)>,
    requests: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond 200 with `{"dados": dados, "links": [self]}`
    pub fn route(mut self, suffix: &str, dados: Value) -> Self {
        let body = json!({
            "dados": dados,
            "links": [{"rel": "self", "href": format!("https://dadosabertos.test{}", suffix)}],
        });
        self.routes.push((suffix.to_string(), 200, body));
        self
    }

    pub fn fail(mut self, suffix: &str, status: u16) -> Self {
        self.routes.push((suffix.to_string(), status, Value::Null));
        self
    }

    /// Paths requested so far, in order
    pub fn requested_paths(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count_requests(&self, suffix: &str) -> usize {
        self.requested_paths()
            .iter()
            .filter(|p| p.ends_with(suffix))
            .count()
    }
}

#[async_trait]
impl HttpTransport for FakeApi {
    async fn get(
        &self,
        url: &Url,
        _query: &[(String, String)],
    ) -> Result<HttpResponse, TransportError> {
        let path = url.path().to_string();
        self.requests.lock().unwrap().push(path.clone());

        let (status, body) = self
            .routes
            .iter()
            .find(|(suffix, _, _)| path.ends_with(suffix.as_str()))
            .map(|(_, status, body)| (*status, body.to_string()))
            .unwrap_or((404, String::new()));

        Ok(HttpResponse {
            status,
            url: url.to_string(),
            body,
        })
    }
}

pub fn collector(api: Arc<FakeApi>) -> (EntityCollector, Arc<RecordingSleeper>) {
    let sleeper = Arc::new(RecordingSleeper::default());
    let client = CamaraClient::with_transport(&CollectorConfig::default(), api, sleeper.clone());
    (
        EntityCollector::new(Arc::new(client), DateRange::default()),
        sleeper,
    )
}

/// A small chamber: two parties, three deputies, two fronts, one proposal,
/// one voting and one body. Deputy 204556 details and front 54001 members
/// always fail.
pub fn small_chamber() -> FakeApi {
    FakeApi::new()
        .route(
            "/partidos",
            json!([
                {"id": 36844, "sigla": "PT", "nome": "Partido dos Trabalhadores", "uri": "https://dadosabertos.test/partidos/36844"},
                {"id": 37906, "sigla": "PL", "nome": "Partido Liberal", "uri": "https://dadosabertos.test/partidos/37906"}
            ]),
        )
        .route(
            "/deputados",
            json!([
                {"id": 204554, "nome": "Ana Souza", "siglaPartido": "PT", "siglaUf": "SP", "email": "ana@camara.leg.br"},
                {"id": 204555, "nome": "Bruno Lima", "siglaPartido": "PL", "siglaUf": "RJ"},
                {"id": 204556, "nome": "Carla Dias", "siglaPartido": "PT", "siglaUf": "BA"}
            ]),
        )
        .route(
            "/deputados/204554",
            json!({"id": 204554, "nomeCivil": "Ana Maria Souza", "sexo": "F"}),
        )
        .route(
            "/deputados/204555",
            json!({"id": 204555, "nomeCivil": "Bruno Lima", "sexo": "M"}),
        )
        .fail("/deputados/204556", 500)
        .route(
            "/frentes",
            json!([
                {"id": 54000, "titulo": "Frente Parlamentar em Defesa da Agricultura", "idLegislatura": 57},
                {"id": 54001, "titulo": "Frente Parlamentar Mista da Cultura", "idLegislatura": 57}
            ]),
        )
        .route(
            "/frentes/54000/membros",
            json!([
                {"id": 204554, "nome": "Ana Souza", "titulo": "Coordenador"},
                {"id": 204555, "nome": "Bruno Lima"}
            ]),
        )
        .fail("/frentes/54001/membros", 500)
        .route(
            "/proposicoes",
            json!([{"id": 2265603, "siglaTipo": "PL", "numero": 1, "ano": 2021}]),
        )
        .route(
            "/proposicoes/2265603/autores",
            json!([{"uri": "https://dadosabertos.test/deputados/204554", "nome": "Ana Souza", "tipo": "Deputado"}]),
        )
        .route(
            "/votacoes",
            json!([{"id": "2265603-43", "data": "2021-05-04"}]),
        )
        .route(
            "/votacoes/2265603-43/votos",
            json!([
                {"tipoVoto": "Sim", "deputado_": {"id": 204554, "nome": "Ana Souza", "siglaPartido": "PT", "siglaUf": "SP"}},
                {"tipoVoto": "Não", "deputado_": {"id": 204555, "nome": "Bruno Lima", "siglaPartido": "PL", "siglaUf": "RJ"}}
            ]),
        )
        .route("/orgaos", json!([{"id": 180, "sigla": "CCJC", "nome": "Comissão de Constituição e Justiça"}]))
}
