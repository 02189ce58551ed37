use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Nl2SqlError {
    // Remote completion failures
    #[error("Invalid API key")]
    Auth,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Request timed out")]
    Timeout,

    #[error("API request failed: {0}")]
    Transport(String),

    #[error("Invalid response format from API: {0}")]
    MalformedResponse(String),

    #[error("API request failed with status code {status}: {body}")]
    Server { status: u16, body: String },

    #[error("Invalid SQL query generated: {0}")]
    InvalidCorrection(String),

    // Batch-level failures
    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Invalid JSON format in file {path}: {reason}")]
    InputMalformed { path: PathBuf, reason: String },

    #[error("{task} produced {outputs} outputs for {inputs} inputs")]
    OutputMismatch {
        task: &'static str,
        inputs: usize,
        outputs: usize,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Nl2SqlError {
    /// Whether the completion client's own attempt loop should try again.
    ///
    /// Everything else propagates straight to the pipeline's outer loop.
    pub fn is_retryable_in_client(&self) -> bool {
        matches!(
            self,
            Nl2SqlError::RateLimited | Nl2SqlError::Timeout | Nl2SqlError::Transport(_)
        )
    }

    /// Process exit code used when this error aborts the batch.
    pub fn exit_code(&self) -> i32 {
        match self {
            Nl2SqlError::InputNotFound(_) => 2,
            Nl2SqlError::InputMalformed { .. } => 3,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Nl2SqlError>;
