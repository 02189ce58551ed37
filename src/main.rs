use anyhow::Result;
use clap::Parser;
use nl2sql_batch::config::{
    BatchConfig, BatchPaths, EndpointConfig, DEFAULT_BASE_URL, DEFAULT_CORRECT_INPUT,
    DEFAULT_CORRECT_OUTPUT, DEFAULT_GENERATE_INPUT, DEFAULT_GENERATE_OUTPUT, DEFAULT_MODEL,
};
use nl2sql_batch::{run_batch, BatchOutcome};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nl2sql-batch")]
#[command(about = "Generate SQL from natural language and correct broken SQL with a hosted LLM")]
struct Args {
    /// Generation task input (JSON array of {"NL"})
    #[arg(long, default_value = DEFAULT_GENERATE_INPUT)]
    generate_input: PathBuf,

    /// Correction task input (JSON array of {"NL", "IncorrectQuery"})
    #[arg(long, default_value = DEFAULT_CORRECT_INPUT)]
    correct_input: PathBuf,

    #[arg(long, default_value = DEFAULT_GENERATE_OUTPUT)]
    generate_output: PathBuf,

    #[arg(long, default_value = DEFAULT_CORRECT_OUTPUT)]
    correct_output: PathBuf,

    /// API key (or set GROQ_API_KEY env var)
    #[arg(long)]
    api_key: Option<String>,

    /// API base URL (or set NL2SQL_BASE_URL env var)
    #[arg(long)]
    base_url: Option<String>,

    /// Model name (or set NL2SQL_MODEL env var)
    #[arg(long)]
    model: Option<String>,

    /// Retry a correction that does not start with SELECT instead of leaving it blank
    #[arg(long)]
    retry_on_invalid: bool,
}

impl Args {
    fn into_config(self) -> nl2sql_batch::Result<BatchConfig> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var("GROQ_API_KEY").ok())
            .unwrap_or_default();
        let base_url = self
            .base_url
            .or_else(|| std::env::var("NL2SQL_BASE_URL").ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = self
            .model
            .or_else(|| std::env::var("NL2SQL_MODEL").ok())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let mut config = BatchConfig::new(EndpointConfig::new(base_url, api_key)?, model);
        config.paths = BatchPaths {
            generate_input: self.generate_input,
            correct_input: self.correct_input,
            generate_output: self.generate_output,
            correct_output: self.correct_output,
        };
        config.retry_on_invalid = self.retry_on_invalid;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    info!("NL2SQL batch starting...");

    let outcome = match args.into_config() {
        Ok(config) => run_batch(&config).await,
        Err(e) => {
            error!("Error in main execution: {}", e);
            BatchOutcome::failed(e)
        }
    };

    println!("Time taken to generate SQLs: {:.2} seconds", outcome.generation_time().as_secs_f64());
    println!("Time taken to correct SQLs: {:.2} seconds", outcome.correction_time().as_secs_f64());
    println!("Total tokens used: {}", outcome.total_usage());

    let code = outcome.exit_code();
    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}
