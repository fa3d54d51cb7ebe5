//! Error taxonomy translation.
//!
//! Every failure (inbound validation, transport, upstream status) is mapped to
//! exactly one [`GatewayError`] kind and rendered as the JSON error envelope.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::gateway::normalizer::json_response;
use crate::models::{GatewayError, ProxyResponse, UpstreamFailure};

impl From<UpstreamFailure> for GatewayError {
    fn from(failure: UpstreamFailure) -> Self {
        match failure {
            UpstreamFailure::Status {
                status,
                code,
                message,
            } => Self::UpstreamError {
                status,
                code: code.unwrap_or_else(|| format!("UE_{status}")),
                message,
            },
            UpstreamFailure::Transport { cause } => {
                Self::UpstreamUnreachable(format!("Upstream processor is unreachable: {cause}"))
            }
        }
    }
}

/// Extracts the upstream error code and message from a non-2xx body.
///
/// Upstream error payloads come in several shapes; the first match wins:
/// `{"error": {"code", "message"}}`, top-level `code`/`message`, then
/// `error_code`/`error_message`. Missing messages fall back to the status
/// text.
#[must_use]
pub fn classify_status(status: u16, status_text: &str, body: &Value) -> UpstreamFailure {
    let nested = body.get("error").filter(|e| e.is_object());
    let field = |names: &[&str]| -> Option<String> {
        let candidates = nested.into_iter().chain(std::iter::once(body));
        candidates
            .flat_map(|source| names.iter().filter_map(move |name| source.get(*name)))
            .find_map(scalar_text)
    };

    let code = field(&["code", "error_code"]);
    let message = field(&["message", "error_message"])
        .or_else(|| body.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| {
            if status_text.is_empty() {
                format!("Upstream responded with status {status}")
            } else {
                status_text.to_string()
            }
        });

    UpstreamFailure::Status {
        status,
        code,
        message,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Renders an error as the gateway's JSON envelope with CORS headers.
#[must_use]
pub fn error_response(error: &GatewayError) -> ProxyResponse {
    error_response_with(error, BTreeMap::new())
}

/// Same as [`error_response`], keeping already-collected headers.
#[must_use]
pub fn error_response_with(error: &GatewayError, headers: BTreeMap<String, String>) -> ProxyResponse {
    let envelope = serde_json::to_value(error.envelope()).unwrap_or(Value::Null);
    json_response(error.status(), &envelope, headers)
}
