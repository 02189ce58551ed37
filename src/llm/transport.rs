//! HTTP transport for the completion endpoint
//!
//! One POST, no retries and no status interpretation. The completion client
//! decides what a status code means.

use crate::config::EndpointConfig;
use crate::error::{Nl2SqlError, Result};
use crate::llm::types::ChatCompletionRequest;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Status and body of one HTTP exchange
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send one request. Fails only with `Timeout` or `Transport`.
    async fn post(&self, request: &ChatCompletionRequest) -> Result<RawResponse>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    url: String,
    api_key: String,
}

impl ReqwestTransport {
    pub fn new(endpoint: &EndpointConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Nl2SqlError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: endpoint.completions_url(),
            api_key: endpoint.api_key.clone(),
        })
    }

    fn map_error(err: reqwest::Error) -> Nl2SqlError {
        if err.is_timeout() {
            Nl2SqlError::Timeout
        } else {
            Nl2SqlError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl ChatTransport for ReqwestTransport {
    async fn post(&self, request: &ChatCompletionRequest) -> Result<RawResponse> {
        debug!("POST {} (model: {})", self.url, request.model);

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(Self::map_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(Self::map_error)?;

        Ok(RawResponse { status, body })
    }
}
