//! Fakes for exercising the client without a network

use super::rate_limit::Sleeper;
use super::transport::{HttpResponse, HttpTransport, TransportError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;
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

pub type Scripted = Result<HttpResponse, TransportError>;

/// Replays a fixed sequence of responses, one per request
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// URL and query of every request made, in order
    pub fn requests(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(
        &self,
        url: &Url,
        query: &[(String, String)],
    ) -> Result<HttpResponse, TransportError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), query.to_vec()));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError("script exhausted".to_string())))
    }
}

pub fn ok(body: Value) -> Scripted {
    Ok(HttpResponse {
        status: 200,
        url: "https://dadosabertos.test/api/v2".to_string(),
        body: body.to_string(),
    })
}

pub fn status(code: u16) -> Scripted {
    Ok(HttpResponse {
        status: code,
        url: "https://dadosabertos.test/api/v2".to_string(),
        body: String::new(),
    })
}

pub fn raw_body(body: &str) -> Scripted {
    Ok(HttpResponse {
        status: 200,
        url: "https://dadosabertos.test/api/v2".to_string(),
        body: body.to_string(),
    })
}

pub fn transport_error() -> Scripted {
    Err(TransportError("connection reset by peer".to_string()))
}

/// Collection page whose items carry the given ids
pub fn page_body(ids: &[i64], has_next: bool) -> Value {
    let dados: Vec<Value> = ids
        .iter()
        .map(|id| json!({"id": id, "nome": format!("item {}", id)}))
        .collect();
    let mut links = vec![json!({"rel": "self", "href": "https://dadosabertos.test/x"})];
    if has_next {
        links.push(json!({"rel": "next", "href": "https://dadosabertos.test/x?pagina=next"}));
    }
    json!({"dados": dados, "links": links})
}

/// Detail response wrapping `dados`
pub fn data_body(dados: Value) -> Value {
    json!({"dados": dados, "links": []})
}
