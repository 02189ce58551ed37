//! Generation Pipeline
//!
//! Natural-language question in, sanitized SQL out.

use crate::error::Nl2SqlError;
use crate::pacing::PauseKind;
use crate::pipeline::PipelineContext;
use crate::prompts;
use crate::records::{GenerationInput, GenerationOutput};
use crate::sanitize::sanitize_generated;
use tracing::{debug, error, info};

/// Generate one SQL statement per input record, in input order.
pub async fn generate(
    ctx: &PipelineContext<'_>,
    inputs: &[GenerationInput],
) -> Vec<GenerationOutput> {
    let total = inputs.len();
    let mut outputs = Vec::with_capacity(total);

    for (index, input) in inputs.iter().enumerate() {
        let output = if input.nl.is_empty() {
            GenerationOutput::empty_for(input)
        } else {
            if ctx.pacing.needs_batch_spacing(index) {
                info!(
                    "Waiting {:?} after processing {} queries...",
                    ctx.pacing.batch_spacing_pause, index
                );
                ctx.pacer
                    .pause(PauseKind::BatchSpacing, ctx.pacing.batch_spacing_pause)
                    .await;
            }

            GenerationOutput {
                nl: input.nl.clone(),
                query: generate_one(ctx, &input.nl).await,
            }
        };

        debug!("Generation {}/{} done", index + 1, total);
        outputs.push(output);
    }

    outputs
}

/// Outer retry loop around one completion call. Empty string on failure.
async fn generate_one(ctx: &PipelineContext<'_>, nl_query: &str) -> String {
    let request = prompts::generation_request(ctx.model, nl_query);
    let policy = ctx.pacing.pipeline_retry();
    let label = format!("Error generating SQL for query: {}", nl_query);

    let request = &request;
    let client = ctx.client;
    let usage = ctx.usage;

    let result = policy
        .run(
            ctx.pacer,
            PauseKind::PipelineRetry,
            &label,
            |_| true,
            |_| async move {
                let completion = client.complete(request, usage).await?;
                let text = completion.content()?;
                debug!("API response: {}", text);
                Ok::<_, Nl2SqlError>(sanitize_generated(text))
            },
        )
        .await;

    match result {
        Ok(sql) => {
            info!("Generated SQL for query: {}", nl_query);
            sql
        }
        Err(e) => {
            error!(
                "{} (Attempt {}/{}): {}",
                label, policy.max_attempts, policy.max_attempts, e
            );
            String::new()
        }
    }
}
