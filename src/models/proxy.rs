//! API Gateway HTTP API (payload format 2.0) event and response models.
//!
//! Only the fields the gateway reads are modelled; everything else in the
//! event is ignored during deserialization.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Inbound HTTP API event
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HttpApiEvent {
    pub request_context: RequestContext,
    pub raw_path: String,
    #[serde(default)]
    pub raw_query_string: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RequestContext {
    pub http: HttpDescription,
}

#[derive(Deserialize, Debug, Clone)]
pub struct HttpDescription {
    pub method: String,
}

/// Response handed back to API Gateway
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    #[schemars(description = "HTTP status code returned to the caller")]
    pub status_code: u16,
    #[schemars(description = "Response headers, lower-case names")]
    pub headers: BTreeMap<String, String>,
    #[schemars(description = "JSON document serialized as a string")]
    pub body: String,
    pub is_base64_encoded: bool,
}

impl ProxyResponse {
    /// Parses the body back into JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid JSON, which the gateway
    /// itself never produces.
    pub fn json_body(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.body)
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_parsing_with_minimal_fields() {
        let event: HttpApiEvent = serde_json::from_value(json!({
            "version": "2.0",
            "routeKey": "$default",
            "rawPath": "/api/hyperswitch/payments",
            "requestContext": { "http": { "method": "GET", "path": "/api/hyperswitch/payments" } }
        }))
        .unwrap_or_else(|e| unreachable!("event should parse: {e}"));

        assert_eq!(event.request_context.http.method, "GET");
        assert_eq!(event.raw_path, "/api/hyperswitch/payments");
        assert!(event.raw_query_string.is_empty());
        assert!(event.headers.is_empty());
        assert!(event.body.is_none());
        assert!(!event.is_base64_encoded);
    }

    #[test]
    fn test_response_serializes_camel_case() {
        let response = ProxyResponse {
            status_code: 200,
            headers: BTreeMap::from([("content-type".to_string(), "application/json".to_string())]),
            body: "{}".to_string(),
            is_base64_encoded: false,
        };
        let value = serde_json::to_value(&response).unwrap_or_default();
        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["isBase64Encoded"], false);
        assert_eq!(response.header("Content-Type"), Some("application/json"));
    }
}
