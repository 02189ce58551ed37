pub mod batch;
pub mod config;
pub mod error;
pub mod llm;
pub mod pacing;
pub mod pipeline;
pub mod prompts;
pub mod records;
pub mod retry;
pub mod sanitize;
pub mod usage;

#[cfg(test)]
mod test_support;

pub use batch::{run_batch, BatchDriver, BatchOutcome, BatchReport};
pub use config::{BatchConfig, BatchPaths, EndpointConfig, PacingConfig};
pub use error::{Nl2SqlError, Result};
