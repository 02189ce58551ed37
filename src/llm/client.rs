//! Remote Completion Client
//!
//! Wraps one logical call to the chat-completion endpoint:
//! - fixed pause before every HTTP attempt
//! - status policy: 401 fails at once, 429 / timeout / transport errors are
//!   retried with a fixed backoff, any other non-success status fails at once
//! - response must carry at least one choice
//! - reported completion tokens are added to the caller's accumulator

use crate::config::{EndpointConfig, PacingConfig};
use crate::error::{Nl2SqlError, Result};
use crate::llm::transport::{ChatTransport, RawResponse, ReqwestTransport};
use crate::llm::types::{ChatCompletionRequest, ChatCompletionResponse, Completion};
use crate::pacing::{Pacer, PauseKind};
use crate::retry::RetryPolicy;
use crate::usage::UsageAccumulator;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Longest slice of an error body carried into an error message
const MAX_ERROR_BODY: usize = 512;

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        request: &ChatCompletionRequest,
        usage: &UsageAccumulator,
    ) -> Result<Completion>;
}

pub struct LlmClient<T: ChatTransport> {
    transport: T,
    pacer: Arc<dyn Pacer>,
    retry: RetryPolicy,
    inter_call_delay: Duration,
}

impl LlmClient<ReqwestTransport> {
    /// Client talking to the real endpoint over HTTPS
    pub fn from_config(
        endpoint: &EndpointConfig,
        pacing: &PacingConfig,
        pacer: Arc<dyn Pacer>,
    ) -> Result<Self> {
        let transport = ReqwestTransport::new(endpoint, pacing.request_timeout)?;
        Ok(Self::new(transport, pacing, pacer))
    }
}

impl<T: ChatTransport> LlmClient<T> {
    pub fn new(transport: T, pacing: &PacingConfig, pacer: Arc<dyn Pacer>) -> Self {
        Self {
            transport,
            pacer,
            retry: pacing.client_retry(),
            inter_call_delay: pacing.inter_call_delay,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn attempt(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        self.pacer
            .pause(PauseKind::InterCall, self.inter_call_delay)
            .await;

        let raw = self.transport.post(request).await.map_err(|e| {
            warn!("Completion request failed: {}", e);
            e
        })?;

        Self::interpret(raw)
    }

    /// Map one HTTP exchange to a response or a classified error
    fn interpret(raw: RawResponse) -> Result<ChatCompletionResponse> {
        match raw.status {
            401 => return Err(Nl2SqlError::Auth),
            429 => return Err(Nl2SqlError::RateLimited),
            status if !(200..300).contains(&status) => {
                return Err(Nl2SqlError::Server {
                    status,
                    body: truncate(&raw.body, MAX_ERROR_BODY),
                });
            }
            _ => {}
        }

        let response: ChatCompletionResponse = serde_json::from_str(&raw.body).map_err(|e| {
            Nl2SqlError::MalformedResponse(format!("Invalid JSON response from API: {}", e))
        })?;

        if response.choices.is_empty() {
            return Err(Nl2SqlError::MalformedResponse(
                "response contains no choices".to_string(),
            ));
        }

        Ok(response)
    }
}

#[async_trait]
impl<T: ChatTransport> CompletionClient for LlmClient<T> {
    async fn complete(
        &self,
        request: &ChatCompletionRequest,
        usage: &UsageAccumulator,
    ) -> Result<Completion> {
        let response = self
            .retry
            .run(
                self.pacer.as_ref(),
                PauseKind::ClientBackoff,
                "Completion request",
                Nl2SqlError::is_retryable_in_client,
                |_| self.attempt(request),
            )
            .await?;

        let tokens = response.completion_tokens();
        let cumulative_usage = usage.record(tokens);
        debug!(
            "Completion used {} tokens ({} total)",
            tokens, cumulative_usage
        );

        Ok(Completion {
            response,
            cumulative_usage,
        })
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
