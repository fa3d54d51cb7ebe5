//! Tests for schema generation functionality
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::fs;
use std::process::Command;

#[test]
fn test_schema_generation_produces_valid_json() {
    // Run the schema generation binary
    let output = Command::new("cargo")
        .args(["run", "--bin", "generate-schema", "--features", "schema-gen"])
        .output()
        .expect("Failed to run schema generation");

    assert!(output.status.success(), "Schema generation failed: {output:?}");

    // Check that gateway_schema.json was created
    assert!(fs::metadata("gateway_schema.json").is_ok(), "gateway_schema.json was not created");

    let content = fs::read_to_string("gateway_schema.json").expect("Failed to read gateway_schema.json");
    let schema: serde_json::Value = serde_json::from_str(&content).expect("Invalid JSON in gateway_schema.json");

    assert!(schema.is_array(), "Schema should be an array");
    let documents = schema.as_array().unwrap();
    assert_eq!(documents.len(), 2, "Schema should describe the envelope and the proxy response");

    for document in documents {
        let obj = document.as_object().unwrap();
        assert!(obj["name"].is_string(), "Document name should be a string");
        assert!(obj["description"].is_string(), "Document description should be a string");
        assert!(obj["schema"].is_object(), "schema should be an object");
        assert!(!obj["schema"].as_object().unwrap().contains_key("$schema"));
    }

    let envelope = documents
        .iter()
        .find(|d| d["name"] == "error_envelope")
        .expect("error_envelope should be generated");
    assert!(
        envelope["schema"]["properties"].get("error").is_some(),
        "Envelope schema should have an error property"
    );
}
