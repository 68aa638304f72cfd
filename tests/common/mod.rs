#![allow(dead_code)]

use std::path::Path;

use claimdoc::auth::StaticToken;
use claimdoc::{Config, Variant, VertexClient};
use serde_json::{Value, json};
use wiremock::MockServer;

pub const TEST_TOKEN: &str = "test-token";
pub const GENERATE_PATH: &str =
    "/v1/projects/demo/locations/us-central1/publishers/google/models/gemini-1.5-flash-001:generateContent";

/// Configuration pointing at a mock server.
pub fn mock_config(server: &MockServer, variant: Variant, docs_path: &Path) -> Config {
    config_for_base(&server.uri(), variant, docs_path)
}

/// Configuration pointing at an arbitrary API base URL.
pub fn config_for_base(api_base: &str, variant: Variant, docs_path: &Path) -> Config {
    let docs = docs_path.display().to_string();
    Config::from_lookup(variant, |key| match key {
        "PROJECT_ID" => Some("demo".to_string()),
        "VERTEX_API_BASE" => Some(api_base.to_string()),
        "DOCS_PATH" => Some(docs.clone()),
        "FILES_URL" => Some("gs://claims-bucket/incoming/".to_string()),
        _ => None,
    })
    .expect("mock config should load")
}

pub fn mock_client(server: &MockServer, variant: Variant, docs_path: &Path) -> VertexClient {
    client_for(mock_config(server, variant, docs_path))
}

pub fn client_for(config: Config) -> VertexClient {
    VertexClient::new(config, Box::new(StaticToken::new(TEST_TOKEN))).expect("client should build")
}

/// A successful envelope whose first part carries `text`.
pub fn envelope_with_text(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }],
        "usageMetadata": { "promptTokenCount": 1290, "candidatesTokenCount": 120, "totalTokenCount": 1410 },
        "modelVersion": "gemini-1.5-flash-001"
    })
}

pub fn classification_text(doc_type: &str) -> String {
    json!({
        "docTitle": "Official Receipt",
        "organization": "Queen Mary Hospital",
        "docType": doc_type,
        "description": "Itemized hospital bill",
        "explanation": "Contains itemized charges and a receipt number"
    })
    .to_string()
}
