//! Schema generator for gateway consumers.
//!
//! This binary generates `gateway_schema.json` with the JSON Schemas of the
//! documents the gateway returns, so dashboard clients can validate error
//! envelopes and proxy responses without reading the Rust types.

use payments_gateway::models::{ErrorEnvelope, ProxyResponse};
use schemars::{JsonSchema, schema_for};
use serde_json::{Value, json};
use std::fs;

// A named schema with its description
struct Document {
    name: String,
    description: String,
    schema: Value,
}

fn main() {
    let documents = vec![
        Document {
            name: "error_envelope".into(),
            description: "Body of every error response. `type` is one of MissingCredentials, InvalidCredentialFormat, UpstreamUnreachable, UpstreamError, MalformedRequest or InternalGatewayError.".into(),
            schema: generate_schema::<ErrorEnvelope>(),
        },
        Document {
            name: "proxy_response".into(),
            description: "Response returned to API Gateway for every invocation.".into(),
            schema: generate_schema::<ProxyResponse>(),
        },
    ];

    write_schema(&documents);
    println!("✅ Generated gateway_schema.json with {} document(s)", documents.len());
}

// Generates a schema for the given type, without the meta-schema marker
fn generate_schema<T: JsonSchema>() -> Value {
    let mut schema = serde_json::to_value(schema_for!(T)).unwrap_or_else(|e| {
        eprintln!("Failed to serialize schema: {e}");
        std::process::exit(1);
    });

    if let Some(obj) = schema.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");

        // Remove format fields from properties (integer widths are not useful to clients)
        if let Some(properties) = obj.get_mut("properties").and_then(|p| p.as_object_mut()) {
            for prop_value in properties.values_mut() {
                if let Some(prop_obj) = prop_value.as_object_mut() {
                    prop_obj.remove("format");
                }
            }
        }
    }

    schema
}

// Writes the schemas to gateway_schema.json
fn write_schema(documents: &[Document]) {
    let schemas: Vec<Value> = documents
        .iter()
        .map(|document| {
            json!({
                "name": document.name,
                "description": document.description,
                "schema": document.schema
            })
        })
        .collect();

    let json = serde_json::to_string_pretty(&schemas).unwrap_or_else(|e| {
        eprintln!("Failed to serialize schema: {e}");
        std::process::exit(1);
    });

    fs::write("gateway_schema.json", json).unwrap_or_else(|e| {
        eprintln!("Failed to write gateway_schema.json: {e}");
        std::process::exit(1);
    });
}
