//! Batch run end to end: input files on disk, mock endpoint, output files checked.

use nl2sql_batch::config::{BatchConfig, BatchPaths, EndpointConfig, PacingConfig};
use nl2sql_batch::llm::LlmClient;
use nl2sql_batch::pacing::{PauseKind, RecordingPacer};
use nl2sql_batch::{BatchDriver, BatchOutcome};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion(text: &str, completion_tokens: u64) -> Value {
    json!({
        "choices": [{"index": 0, "message": {"role": "assistant", "content": text}}],
        "usage": {"completion_tokens": completion_tokens}
    })
}

fn write_inputs(dir: &Path) -> BatchPaths {
    let paths = BatchPaths {
        generate_input: dir.join("train_generate_task.json"),
        correct_input: dir.join("train_query_correction_task.json"),
        generate_output: dir.join("output_sql_generation_task.json"),
        correct_output: dir.join("output_sql_correction_task.json"),
    };

    std::fs::write(
        &paths.generate_input,
        json!([
            {"NL": "Lister tous les employés"},
            {"NL": ""},
            {"NL": "Count the orders"},
            {"NL": null}
        ])
        .to_string(),
    )
    .unwrap();
    std::fs::write(
        &paths.correct_input,
        json!([
            {"NL": "Names of customers", "IncorrectQuery": "SELEC name FROM customers"},
            {"NL": "Drop everything", "IncorrectQuery": "DELETE FROM t"},
            {"NL": "Missing query"}
        ])
        .to_string(),
    )
    .unwrap();

    paths
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_full_batch_against_mock_endpoint() {
    let dir = tempdir().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("employ"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("```sql\nSELECT * FROM employés;\n```", 10)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("Count the orders"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("Names of customers"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion("SELECT name FROM customers;", 15)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("Drop everything"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("DELETE FROM t", 4)))
        .mount(&server)
        .await;

    let mut config = BatchConfig::new(
        EndpointConfig::new(server.uri(), "test-key").unwrap(),
        "mixtral-8x7b-32768",
    );
    config.paths = write_inputs(dir.path());

    let pacer = Arc::new(RecordingPacer::new());
    let client =
        LlmClient::from_config(&config.endpoint, &PacingConfig::default(), pacer.clone())
            .unwrap();
    let outcome = BatchDriver::new(&config, &client, pacer.as_ref()).run_guarded().await;

    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(outcome.total_usage(), 29);
    match &outcome {
        BatchOutcome::Completed(report) => {
            assert_eq!(report.generation_records, 4);
            assert_eq!(report.correction_records, 3);
            assert!(report.saved);
        }
        other => panic!("expected completed batch, got {:?}", other),
    }

    let generated = read_json(&config.paths.generate_output);
    assert_eq!(
        generated,
        json!([
            {"NL": "Lister tous les employés", "Query": "SELECT * FROM employés"},
            {"NL": "", "Query": ""},
            {"NL": "Count the orders", "Query": ""},
            {"NL": "", "Query": ""}
        ])
    );

    let corrected = read_json(&config.paths.correct_output);
    assert_eq!(
        corrected,
        json!([
            {
                "NL": "Names of customers",
                "IncorrectQuery": "SELEC name FROM customers",
                "CorrectQuery": "SELECT name FROM customers"
            },
            {"NL": "Drop everything", "IncorrectQuery": "DELETE FROM t", "CorrectQuery": ""},
            {"NL": "Missing query", "IncorrectQuery": "", "CorrectQuery": ""}
        ])
    );

    let raw = std::fs::read_to_string(&config.paths.generate_output).unwrap();
    assert!(raw.contains("employés"));

    // the rate-limited record: 3 outer x 3 inner attempts
    let limited = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| String::from_utf8_lossy(&r.body).contains("Count the orders"))
        .count();
    assert_eq!(limited, 9);
    assert_eq!(pacer.count(PauseKind::PipelineRetry), 2);
}

#[tokio::test]
async fn test_missing_input_leaves_no_outputs() {
    let dir = tempdir().unwrap();
    let server = MockServer::start().await;

    let endpoint = EndpointConfig::new(server.uri(), "test-key").unwrap();
    let mut config = BatchConfig::new(endpoint, "m");
    config.paths = BatchPaths {
        generate_input: dir.path().join("nope.json"),
        correct_input: dir.path().join("nope_either.json"),
        generate_output: dir.path().join("gen.json"),
        correct_output: dir.path().join("fix.json"),
    };

    let pacer = Arc::new(RecordingPacer::new());
    let client = LlmClient::from_config(&config.endpoint, &config.pacing, pacer.clone()).unwrap();
    let outcome = BatchDriver::new(&config, &client, pacer.as_ref()).run_guarded().await;

    assert_eq!(outcome.exit_code(), 2);
    assert_eq!(outcome.generation_time().as_secs_f64(), 0.0);
    assert!(!config.paths.generate_output.exists());
    assert!(!config.paths.correct_output.exists());
    assert!(server.received_requests().await.unwrap().is_empty());
}
