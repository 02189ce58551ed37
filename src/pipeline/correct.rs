//! Correction Pipeline
//!
//! Question plus known-incorrect SQL in, corrected SELECT out.
//!
//! A response that is present but does not start with `SELECT` is accepted as
//! a finished attempt with an empty result. With `retry_on_invalid` set it is
//! treated as a failed attempt instead and goes through the outer retry loop.

use crate::error::Nl2SqlError;
use crate::pacing::PauseKind;
use crate::pipeline::PipelineContext;
use crate::prompts;
use crate::records::{CorrectionInput, CorrectionOutput};
use crate::sanitize::{check_correction, CorrectionCheck};
use tracing::{debug, error, info, warn};

/// Correct one SQL statement per input record, in input order.
pub async fn correct(
    ctx: &PipelineContext<'_>,
    inputs: &[CorrectionInput],
    retry_on_invalid: bool,
) -> Vec<CorrectionOutput> {
    let total = inputs.len();
    let mut outputs = Vec::with_capacity(total);

    for (index, input) in inputs.iter().enumerate() {
        let output = if input.nl.is_empty() || input.incorrect_query.is_empty() {
            CorrectionOutput::empty_for(input)
        } else {
            CorrectionOutput {
                nl: input.nl.clone(),
                incorrect_query: input.incorrect_query.clone(),
                correct_query: correct_one(ctx, input, retry_on_invalid).await,
            }
        };

        debug!("Correction {}/{} done", index + 1, total);
        outputs.push(output);
    }

    outputs
}

async fn correct_one(
    ctx: &PipelineContext<'_>,
    input: &CorrectionInput,
    retry_on_invalid: bool,
) -> String {
    let request = prompts::correction_request(ctx.model, &input.nl, &input.incorrect_query);
    let policy = ctx.pacing.pipeline_retry();
    let label = format!("Error correcting SQL for query: {}", input.nl);

    debug!(
        "Sending API request with prompt: {}",
        request.messages.last().and_then(|m| m.content.as_deref()).unwrap_or("")
    );

    let request = &request;
    let client = ctx.client;
    let usage = ctx.usage;
    let nl_query = input.nl.as_str();

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

                match check_correction(text) {
                    CorrectionCheck::Valid(sql) => Ok(sql),
                    CorrectionCheck::Invalid if retry_on_invalid => {
                        Err(Nl2SqlError::InvalidCorrection(nl_query.to_string()))
                    }
                    CorrectionCheck::Invalid => {
                        warn!("Invalid SQL query generated for: {}", nl_query);
                        Ok(String::new())
                    }
                }
            },
        )
        .await;

    match result {
        Ok(sql) => {
            info!("Correcting SQL for query: {}", input.nl);
            info!("Incorrect SQL: {}", input.incorrect_query);
            info!("Corrected SQL: {}", sql);
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
