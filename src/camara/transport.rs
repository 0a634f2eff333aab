//! HTTP transport seam
//!
//! The client only needs "GET this URL with these query parameters"; keeping
//! that behind a trait lets the retry and pagination logic run against a
//! scripted transport in tests.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Status, final URL and body of a completed request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub url: String,
    pub body: String,
}

/// Connection, timeout or body-read failure
#[derive(Error, Debug, Clone)]
#[error("{0}")]
pub struct TransportError(pub String);

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(
        &self,
        url: &Url,
        query: &[(String, String)],
    ) -> std::result::Result<HttpResponse, TransportError>;
}

/// reqwest-backed transport with a fixed per-request timeout
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { http })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(
        &self,
        url: &Url,
        query: &[(String, String)],
    ) -> std::result::Result<HttpResponse, TransportError> {
        let response = self
            .http
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        let url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError(format!("Failed to read response body: {}", e)))?;

        Ok(HttpResponse { status, url, body })
    }
}
