//! Batch Configuration
//!
//! Endpoint, model, file locations, pacing constants and retry ceilings.
//! Values come from the command line with environment fallbacks; see `main.rs`.

use crate::error::{Nl2SqlError, Result};
use crate::retry::RetryPolicy;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "mixtral-8x7b-32768";

pub const DEFAULT_GENERATE_INPUT: &str = "train_generate_task.json";
pub const DEFAULT_CORRECT_INPUT: &str = "train_query_correction_task.json";
pub const DEFAULT_GENERATE_OUTPUT: &str = "output_sql_generation_task.json";
pub const DEFAULT_CORRECT_OUTPUT: &str = "output_sql_correction_task.json";

/// Where the completion endpoint lives and how to authenticate against it
#[derive(Clone)]
pub struct EndpointConfig {
    pub base_url: String,
    pub api_key: String,
}

impl EndpointConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        let api_key = api_key.into();

        if api_key.trim().is_empty() {
            return Err(Nl2SqlError::Config(
                "API key is empty (set GROQ_API_KEY or pass --api-key)".to_string(),
            ));
        }
        if base_url.trim().is_empty() {
            return Err(Nl2SqlError::Config("base URL is empty".to_string()));
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

// Keep the credential out of logs.
impl fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Pacing and retry constants shared by the client and both pipelines
#[derive(Debug, Clone, PartialEq)]
pub struct PacingConfig {
    /// Unconditional pause before every HTTP attempt
    pub inter_call_delay: Duration,
    /// Bound on a single HTTP request
    pub request_timeout: Duration,
    /// Pause between attempts inside the completion client
    pub client_backoff: Duration,
    pub client_max_attempts: usize,
    /// Pause between attempts of a pipeline's outer loop
    pub pipeline_retry_pause: Duration,
    pub pipeline_max_attempts: usize,
    /// Extra pause before every `batch_spacing_every`-th generation record
    pub batch_spacing_every: usize,
    pub batch_spacing_pause: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            inter_call_delay: Duration::from_secs(2),
            request_timeout: Duration::from_secs(30),
            client_backoff: Duration::from_secs(10),
            client_max_attempts: 3,
            pipeline_retry_pause: Duration::from_secs(5),
            pipeline_max_attempts: 3,
            batch_spacing_every: 5,
            batch_spacing_pause: Duration::from_secs(5),
        }
    }
}

impl PacingConfig {
    /// Inner retry layer, owned by the completion client
    pub fn client_retry(&self) -> RetryPolicy {
        RetryPolicy::new(self.client_max_attempts, self.client_backoff)
    }

    /// Outer retry layer, owned by each pipeline
    pub fn pipeline_retry(&self) -> RetryPolicy {
        RetryPolicy::new(self.pipeline_max_attempts, self.pipeline_retry_pause)
    }

    /// Whether the record at `index` gets the periodic batch pause.
    pub fn needs_batch_spacing(&self, index: usize) -> bool {
        self.batch_spacing_every > 0 && index > 0 && index % self.batch_spacing_every == 0
    }
}

/// Input and output file locations
#[derive(Debug, Clone)]
pub struct BatchPaths {
    pub generate_input: PathBuf,
    pub correct_input: PathBuf,
    pub generate_output: PathBuf,
    pub correct_output: PathBuf,
}

impl Default for BatchPaths {
    fn default() -> Self {
        Self {
            generate_input: PathBuf::from(DEFAULT_GENERATE_INPUT),
            correct_input: PathBuf::from(DEFAULT_CORRECT_INPUT),
            generate_output: PathBuf::from(DEFAULT_GENERATE_OUTPUT),
            correct_output: PathBuf::from(DEFAULT_CORRECT_OUTPUT),
        }
    }
}

/// Everything one batch run needs
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub endpoint: EndpointConfig,
    pub model: String,
    pub paths: BatchPaths,
    pub pacing: PacingConfig,
    /// Treat a non-SELECT correction as a failed attempt instead of an empty result
    pub retry_on_invalid: bool,
}

impl BatchConfig {
    pub fn new(endpoint: EndpointConfig, model: impl Into<String>) -> Self {
        Self {
            endpoint,
            model: model.into(),
            paths: BatchPaths::default(),
            pacing: PacingConfig::default(),
            retry_on_invalid: false,
        }
    }
}
