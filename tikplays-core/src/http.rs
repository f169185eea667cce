//! HTTP client abstraction for outbound side effects.
//!
//! Webhooks and the game-server command sink both go through [`HttpClient`],
//! so tests can swap in a recording client without touching the network.
//! The default implementation wraps `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::Error;

/// Upper bound on a single outbound call. Callers never see it; a slow
/// endpoint only delays its own task.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Status and body of a completed request, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A generic trait for making HTTP requests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpResponse, Error>;
    async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<HttpResponse, Error>;
}

#[derive(Clone, Default)]
pub struct DefaultHttpClient {
    client: reqwest::Client,
}

impl DefaultHttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl HttpClient for DefaultHttpClient {
    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpResponse, Error> {
        let resp = self
            .client
            .post(url)
            .timeout(REQUEST_TIMEOUT)
            .json(body)
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Ok(HttpResponse { status, body })
    }

    async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<HttpResponse, Error> {
        let resp = self
            .client
            .post(url)
            .timeout(REQUEST_TIMEOUT)
            .form(form)
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Ok(HttpResponse { status, body })
    }
}
