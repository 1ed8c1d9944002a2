use super::*;

#[test]
fn client_configuration() {
    let mut config = Config::default();
    config.ollama.host = "chat-host".to_string();
    config.ollama.port = 4321;
    config.ollama.chat_model = "judge-model".to_string();

    let client = OllamaChatClient::new(&config).expect("Failed to create client");

    assert_eq!(client.model, "judge-model");
    assert_eq!(client.base_url.host_str(), Some("chat-host"));
    assert_eq!(client.base_url.port(), Some(4321));
}

#[test]
fn chat_request_wire_format() {
    let request = ChatRequest {
        model: "judge-model".to_string(),
        messages: vec![ChatMessage {
            role: "user",
            content: "Analyze this clause".to_string(),
        }],
        format: "json",
        stream: false,
    };

    let json = serde_json::to_string(&request).expect("should serialize chat request");
    assert!(json.contains("\"format\":\"json\""));
    assert!(json.contains("\"stream\":false"));
    assert!(json.contains("\"role\":\"user\""));
}

#[test]
fn chat_response_parsing() {
    let raw = r#"{
        "model": "judge-model",
        "message": {"role": "assistant", "content": "{\"compliance_status\":\"Compliant\"}"},
        "done": true
    }"#;

    let response: ChatResponse = serde_json::from_str(raw).expect("should parse chat response");
    assert!(response.message.content.contains("Compliant"));
}
