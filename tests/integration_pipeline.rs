#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// End-to-end pipeline tests against a mocked Ollama HTTP API.

use complisense::config::Config;
use complisense::dataset::RegulationClause;
use complisense::embeddings::EmbeddingClient;
use complisense::index::RegulationIndex;
use complisense::llm::OllamaChatClient;
use complisense::pipeline::ComplianceAnalyzer;
use complisense::schema::{ComplianceStatus, RiskLevel};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(server: &MockServer) -> Config {
    let address = server.address();
    let mut config = Config::default();
    config.ollama.host = address.ip().to_string();
    config.ollama.port = address.port();
    config
}

fn test_clauses() -> Vec<RegulationClause> {
    vec![
        RegulationClause {
            regulation: Some("GDPR".to_string()),
            clause_id: "Article_5_1e".to_string(),
            heading: "Article 5 - Clause 1(e)".to_string(),
            text: "Personal data shall be kept no longer than necessary.".to_string(),
        },
        RegulationClause {
            regulation: Some("GDPR".to_string()),
            clause_id: "Article_6_1".to_string(),
            heading: "Article 6 - Clause 1".to_string(),
            text: "Processing is lawful only with a valid legal basis.".to_string(),
        },
        RegulationClause {
            regulation: Some("GDPR".to_string()),
            clause_id: "Article_17_1".to_string(),
            heading: "Article 17 - Clause 1".to_string(),
            text: "The data subject shall have the right to erasure.".to_string(),
        },
    ]
}

/// Mount embedding mocks: one batch response for index build, one single
/// response for query embedding.
async fn mount_embedding_mocks(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_string_contains("\"input\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[1.0, 0.0], [0.0, 1.0], [0.5, 0.5]]
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_string_contains("\"prompt\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embedding": [0.9, 0.1]
        })))
        .mount(server)
        .await;
}

async fn mount_chat_mock(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "tinyllama:latest",
            "message": {"role": "assistant", "content": content},
            "done": true
        })))
        .mount(server)
        .await;
}

fn build_analyzer(config: &Config) -> ComplianceAnalyzer {
    let embedder = EmbeddingClient::new(config).expect("can create embedding client");
    let index =
        RegulationIndex::build(test_clauses(), &embedder).expect("can build regulation index");
    let chat = OllamaChatClient::new(config).expect("can create chat client");
    ComplianceAnalyzer::from_parts(index, Box::new(embedder), Box::new(chat), 2)
}

#[tokio::test(flavor = "multi_thread")]
async fn end_to_end_analysis_with_prose_wrapped_json() {
    let server = MockServer::start().await;
    mount_embedding_mocks(&server).await;
    mount_chat_mock(
        &server,
        "Sure, here is my analysis: {\"compliance_status\":\"Non-Compliant\",\"reason\":\"the clause has no retention limit\",\"risk_level\":\"High\",\"confidence_score\":0.7} Hope that helps!",
    )
    .await;

    let config = test_config(&server);
    let result = tokio::task::spawn_blocking(move || {
        let analyzer = build_analyzer(&config);
        analyzer.analyze("Customer data may be stored for as long as the vendor wishes.")
    })
    .await
    .expect("analysis task should not panic");

    assert_eq!(result.compliance_status, ComplianceStatus::NonCompliant);
    assert_eq!(result.risk_level, RiskLevel::High);
    assert!((result.confidence_score - 0.7).abs() < f64::EPSILON);
    assert_eq!(result.reason, "the clause has no retention limit");
}

#[tokio::test(flavor = "multi_thread")]
async fn rule_override_beats_model_verdict() {
    let server = MockServer::start().await;
    mount_embedding_mocks(&server).await;
    mount_chat_mock(
        &server,
        "{\"compliance_status\":\"Compliant\",\"reason\":\"the model sees no problem\",\"risk_level\":\"Low\",\"confidence_score\":0.3}",
    )
    .await;

    let config = test_config(&server);
    let result = tokio::task::spawn_blocking(move || {
        let analyzer = build_analyzer(&config);
        analyzer.analyze("All records shall be retained indefinitely by the processor.")
    })
    .await
    .expect("analysis task should not panic");

    assert_eq!(result.compliance_status, ComplianceStatus::NonCompliant);
    assert_eq!(result.risk_level, RiskLevel::High);
    assert!(result.confidence_score >= 0.85);
    assert!(result.reason.contains("GDPR"));
}

#[tokio::test(flavor = "multi_thread")]
async fn model_server_error_degrades_to_unknown() {
    let server = MockServer::start().await;
    mount_embedding_mocks(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = test_config(&server);
    let result = tokio::task::spawn_blocking(move || {
        let analyzer = build_analyzer(&config);
        analyzer.analyze("Customer data is processed for billing.")
    })
    .await
    .expect("analysis task should not panic");

    assert_eq!(result.compliance_status, ComplianceStatus::Unknown);
    assert!((result.confidence_score - 0.0).abs() < f64::EPSILON);
    assert!(!result.reason.trim().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn unstructured_model_output_degrades_to_unknown() {
    let server = MockServer::start().await;
    mount_embedding_mocks(&server).await;
    mount_chat_mock(&server, "I am not sure.").await;

    let config = test_config(&server);
    let result = tokio::task::spawn_blocking(move || {
        let analyzer = build_analyzer(&config);
        analyzer.analyze("Customer data is processed for billing.")
    })
    .await
    .expect("analysis task should not panic");

    assert_eq!(result.compliance_status, ComplianceStatus::Unknown);
    assert_eq!(result.reason, "LLM did not return structured output");
}
