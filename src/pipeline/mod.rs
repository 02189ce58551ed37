//! Record pipelines
//!
//! Both pipelines walk their inputs strictly in order, one remote call
//! sequence at a time, and emit exactly one output per input. Per-record
//! failures end up as an empty result field, never as an error.

pub mod correct;
pub mod generate;

pub use correct::correct;
pub use generate::generate;

use crate::config::PacingConfig;
use crate::llm::client::CompletionClient;
use crate::pacing::Pacer;
use crate::usage::UsageAccumulator;

/// Collaborators shared by both pipelines for one batch run
pub struct PipelineContext<'a> {
    pub client: &'a dyn CompletionClient,
    pub pacer: &'a dyn Pacer,
    pub usage: &'a UsageAccumulator,
    pub pacing: &'a PacingConfig,
    pub model: &'a str,
}
