//! Batch Driver
//!
//! Loads both input files, runs generation then correction, checks that
//! every input produced exactly one output, writes both output files and
//! reports phase timings with the final usage total.

use crate::config::BatchConfig;
use crate::error::{Nl2SqlError, Result};
use crate::llm::client::{CompletionClient, LlmClient};
use crate::pacing::{Pacer, TokioPacer};
use crate::pipeline::{self, PipelineContext};
use crate::records::{self, CorrectionInput, GenerationInput};
use crate::usage::UsageAccumulator;
use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Result of a batch that got past loading
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub generation_records: usize,
    pub correction_records: usize,
    pub generation_time: Duration,
    pub correction_time: Duration,
    pub total_usage: u64,
    /// Whether both output files were written
    pub saved: bool,
}

/// What the top-level boundary hands back to the process
#[derive(Debug)]
pub enum BatchOutcome {
    Completed(BatchReport),
    /// Load or setup failed; timings read as zero
    Failed { error: Nl2SqlError, total_usage: u64 },
}

impl BatchReport {
    /// One-line summary logged when the batch finishes
    pub fn summary(&self) -> String {
        format!(
            "Batch started {} finished: {} generated in {:.2}s, {} corrected in {:.2}s, {} tokens",
            self.started_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.generation_records,
            self.generation_time.as_secs_f64(),
            self.correction_records,
            self.correction_time.as_secs_f64(),
            self.total_usage
        )
    }
}

impl BatchOutcome {
    pub fn failed(error: Nl2SqlError) -> Self {
        BatchOutcome::Failed {
            error,
            total_usage: 0,
        }
    }

    pub fn generation_time(&self) -> Duration {
        match self {
            BatchOutcome::Completed(report) => report.generation_time,
            BatchOutcome::Failed { .. } => Duration::ZERO,
        }
    }

    pub fn correction_time(&self) -> Duration {
        match self {
            BatchOutcome::Completed(report) => report.correction_time,
            BatchOutcome::Failed { .. } => Duration::ZERO,
        }
    }

    pub fn total_usage(&self) -> u64 {
        match self {
            BatchOutcome::Completed(report) => report.total_usage,
            BatchOutcome::Failed { total_usage, .. } => *total_usage,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            BatchOutcome::Completed(_) => 0,
            BatchOutcome::Failed { error, .. } => error.exit_code(),
        }
    }
}

pub struct BatchDriver<'a> {
    config: &'a BatchConfig,
    client: &'a dyn CompletionClient,
    pacer: &'a dyn Pacer,
    usage: UsageAccumulator,
}

impl<'a> BatchDriver<'a> {
    pub fn new(
        config: &'a BatchConfig,
        client: &'a dyn CompletionClient,
        pacer: &'a dyn Pacer,
    ) -> Self {
        Self {
            config,
            client,
            pacer,
            usage: UsageAccumulator::new(),
        }
    }

    pub fn usage(&self) -> &UsageAccumulator {
        &self.usage
    }

    /// Run the batch, propagating load errors
    pub async fn run(&self) -> Result<BatchReport> {
        let started_at = Utc::now();
        let paths = &self.config.paths;

        let generation_inputs: Vec<GenerationInput> = records::load_records(&paths.generate_input)?;
        let correction_inputs: Vec<CorrectionInput> = records::load_records(&paths.correct_input)?;

        info!("Loaded {} queries for generation", generation_inputs.len());
        info!("Loaded {} queries for correction", correction_inputs.len());

        let ctx = PipelineContext {
            client: self.client,
            pacer: self.pacer,
            usage: &self.usage,
            pacing: &self.config.pacing,
            model: &self.config.model,
        };

        let start = Instant::now();
        let generated = pipeline::generate(&ctx, &generation_inputs).await;
        let generation_time = start.elapsed();

        let start = Instant::now();
        let corrected =
            pipeline::correct(&ctx, &correction_inputs, self.config.retry_on_invalid).await;
        let correction_time = start.elapsed();

        // If no answer, the field is left blank; the record is never dropped.
        check_cardinality("Correction", correction_inputs.len(), corrected.len())?;
        check_cardinality("Generation", generation_inputs.len(), generated.len())?;

        let mut saved = true;
        match records::save_records(&paths.correct_output, &corrected) {
            Ok(()) => info!(
                "Successfully saved correction output to {}",
                paths.correct_output.display()
            ),
            Err(e) => {
                error!("Error saving output file {}: {}", paths.correct_output.display(), e);
                saved = false;
            }
        }
        match records::save_records(&paths.generate_output, &generated) {
            Ok(()) => info!(
                "Successfully saved generation output to {}",
                paths.generate_output.display()
            ),
            Err(e) => {
                error!("Error saving output file {}: {}", paths.generate_output.display(), e);
                saved = false;
            }
        }

        let report = BatchReport {
            started_at,
            generation_records: generated.len(),
            correction_records: corrected.len(),
            generation_time,
            correction_time,
            total_usage: self.usage.total(),
            saved,
        };

        info!("✅ {}", report.summary());

        Ok(report)
    }

    /// Run the batch and turn any error into a failed outcome
    pub async fn run_guarded(&self) -> BatchOutcome {
        match self.run().await {
            Ok(report) => BatchOutcome::Completed(report),
            Err(error) => {
                error!("Error in main execution: {}", error);
                BatchOutcome::Failed {
                    error,
                    total_usage: self.usage.total(),
                }
            }
        }
    }
}

fn check_cardinality(task: &'static str, inputs: usize, outputs: usize) -> Result<()> {
    if inputs != outputs {
        return Err(Nl2SqlError::OutputMismatch {
            task,
            inputs,
            outputs,
        });
    }
    Ok(())
}

/// Run a batch against the configured endpoint with real pacing.
pub async fn run_batch(config: &BatchConfig) -> BatchOutcome {
    let pacer: Arc<dyn Pacer> = Arc::new(TokioPacer);

    let client = match LlmClient::from_config(&config.endpoint, &config.pacing, pacer.clone()) {
        Ok(client) => client,
        Err(e) => {
            error!("Error in main execution: {}", e);
            return BatchOutcome::failed(e);
        }
    };

    info!(
        "Using model {} at {}",
        config.model,
        config.endpoint.completions_url()
    );

    BatchDriver::new(config, &client, pacer.as_ref())
        .run_guarded()
        .await
}
