//! Scripted fakes shared by unit tests

use crate::config::PacingConfig;
use crate::error::{Nl2SqlError, Result};
use crate::llm::client::CompletionClient;
use crate::llm::transport::{ChatTransport, RawResponse};
use crate::llm::types::{ChatCompletionRequest, ChatCompletionResponse, Completion};
use crate::pacing::RecordingPacer;
use crate::pipeline::PipelineContext;
use crate::usage::UsageAccumulator;
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

type Fallback<T> = Box<dyn Fn() -> Result<T> + Send + Sync>;

/// JSON body of a successful chat completion
pub fn completion_body(text: &str, completion_tokens: Option<u64>) -> String {
    let mut body = json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }]
    });
    if let Some(tokens) = completion_tokens {
        body["usage"] = json!({"completion_tokens": tokens});
    }
    body.to_string()
}

pub fn completion_response(text: &str, completion_tokens: u64) -> ChatCompletionResponse {
    serde_json::from_str(&completion_body(text, Some(completion_tokens))).unwrap()
}

/// Response whose only choice has `"content": null`
pub fn null_content_response(completion_tokens: u64) -> ChatCompletionResponse {
    serde_json::from_value(json!({
        "choices": [{"index": 0, "message": {"role": "assistant", "content": null}}],
        "usage": {"completion_tokens": completion_tokens}
    }))
    .unwrap()
}

/// Queue of replies, then an optional repeating fallback
struct Script<T> {
    replies: Mutex<VecDeque<Result<T>>>,
    fallback: Option<Fallback<T>>,
    calls: AtomicUsize,
}

impl<T> Script<T> {
    fn new(replies: Vec<Result<T>>, fallback: Option<Fallback<T>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            fallback,
            calls: AtomicUsize::new(0),
        }
    }

    fn next(&self) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reply) = self.replies.lock().unwrap().pop_front() {
            return reply;
        }
        match &self.fallback {
            Some(fallback) => fallback(),
            None => Err(Nl2SqlError::Transport("script exhausted".to_string())),
        }
    }
}

pub struct ScriptedTransport {
    script: Script<RawResponse>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Result<RawResponse>>) -> Self {
        Self {
            script: Script::new(replies, None),
        }
    }

    pub fn repeating(reply: impl Fn() -> Result<RawResponse> + Send + Sync + 'static) -> Self {
        Self {
            script: Script::new(Vec::new(), Some(Box::new(reply))),
        }
    }

    pub fn calls(&self) -> usize {
        self.script.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn post(&self, _request: &ChatCompletionRequest) -> Result<RawResponse> {
        self.script.next()
    }
}

/// Completion client that replays canned outcomes and keeps every request
pub struct ScriptedClient {
    script: Script<ChatCompletionResponse>,
    requests: Mutex<Vec<ChatCompletionRequest>>,
}

impl ScriptedClient {
    pub fn new(replies: Vec<Result<ChatCompletionResponse>>) -> Self {
        Self {
            script: Script::new(replies, None),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn repeating(
        reply: impl Fn() -> Result<ChatCompletionResponse> + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Script::new(Vec::new(), Some(Box::new(reply))),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.script.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ChatCompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(
        &self,
        request: &ChatCompletionRequest,
        usage: &UsageAccumulator,
    ) -> Result<Completion> {
        self.requests.lock().unwrap().push(request.clone());
        let response = self.script.next()?;
        let cumulative_usage = usage.record(response.completion_tokens());
        Ok(Completion {
            response,
            cumulative_usage,
        })
    }
}

/// Scripted client with the pacer, usage counter and pacing a pipeline borrows
pub struct PipelineFixture {
    pub client: ScriptedClient,
    pub pacer: RecordingPacer,
    pub usage: UsageAccumulator,
    pub pacing: PacingConfig,
    pub model: String,
}

impl PipelineFixture {
    pub fn new(client: ScriptedClient) -> Self {
        Self {
            client,
            pacer: RecordingPacer::new(),
            usage: UsageAccumulator::new(),
            pacing: PacingConfig::default(),
            model: "m".to_string(),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn ctx(&self) -> PipelineContext<'_> {
        PipelineContext {
            client: &self.client,
            pacer: &self.pacer,
            usage: &self.usage,
            pacing: &self.pacing,
            model: &self.model,
        }
    }
}
