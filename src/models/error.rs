//! Error types for the payments gateway.
//!
//! [`GatewayError`] is the client-facing taxonomy: every failure the gateway
//! reports ends up as exactly one of its variants. [`UpstreamFailure`] is what
//! the forwarder and the response normalizer report about the upstream
//! processor before it is translated into the taxonomy.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Public message used for internal faults. Details only go to the log.
const INTERNAL_MESSAGE: &str = "The gateway failed to process the request";

/// Client-facing error taxonomy.
#[must_use = "errors should be turned into a response or propagated"]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Required `Authorization` credential is absent.
    #[error("{0}")]
    MissingCredentials(String),

    /// Credential present but not shaped like any known environment's key.
    #[error("{0}")]
    InvalidCredentialFormat(String),

    /// Network failure or timeout talking to the upstream processor.
    #[error("{0}")]
    UpstreamUnreachable(String),

    /// Upstream answered with a non-2xx status. Status, code and message are
    /// relayed as the upstream sent them.
    #[error("upstream responded with {status}: {message}")]
    UpstreamError {
        status: u16,
        code: String,
        message: String,
    },

    /// Inbound request failed shape validation.
    #[error("{0}")]
    MalformedRequest(String),

    /// Unexpected fault inside the gateway.
    #[error("internal gateway error: {0}")]
    InternalGatewayError(String),
}

impl GatewayError {
    /// Taxonomy kind, as written into the `type` field of the envelope.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredentials(_) => "MissingCredentials",
            Self::InvalidCredentialFormat(_) => "InvalidCredentialFormat",
            Self::UpstreamUnreachable(_) => "UpstreamUnreachable",
            Self::UpstreamError { .. } => "UpstreamError",
            Self::MalformedRequest(_) => "MalformedRequest",
            Self::InternalGatewayError(_) => "InternalGatewayError",
        }
    }

    /// Stable machine-readable code. Upstream errors keep the upstream code.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::MissingCredentials(_) => "GW_01",
            Self::InvalidCredentialFormat(_) => "GW_02",
            Self::UpstreamUnreachable(_) => "GW_03",
            Self::MalformedRequest(_) => "GW_04",
            Self::InternalGatewayError(_) => "GW_05",
            Self::UpstreamError { code, .. } => code,
        }
    }

    /// HTTP status surfaced to the caller.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::MissingCredentials(_) | Self::InvalidCredentialFormat(_) => 401,
            Self::UpstreamUnreachable(_) => 503,
            Self::UpstreamError { status, .. } => *status,
            Self::MalformedRequest(_) => 400,
            Self::InternalGatewayError(_) => 500,
        }
    }

    /// Message safe to hand to the caller.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::InternalGatewayError(_) => INTERNAL_MESSAGE.to_string(),
            Self::UpstreamError { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorBody {
                error_type: self.kind().to_string(),
                message: self.public_message(),
                code: self.code().to_string(),
            },
        }
    }
}

/// Failure reported about the upstream call, before translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamFailure {
    /// Upstream answered, but not with success.
    Status {
        status: u16,
        code: Option<String>,
        message: String,
    },
    /// No usable answer: connect error, timeout, broken body stream.
    Transport { cause: String },
}

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorBody {
    #[serde(rename = "type")]
    #[schemars(description = "Taxonomy kind, e.g. MissingCredentials or UpstreamError")]
    pub error_type: String,
    #[schemars(description = "Human-readable message")]
    pub message: String,
    #[schemars(description = "Stable machine-readable code, or the upstream error code")]
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statuses_per_kind() {
        assert_eq!(GatewayError::MissingCredentials(String::new()).status(), 401);
        assert_eq!(GatewayError::InvalidCredentialFormat(String::new()).status(), 401);
        assert_eq!(GatewayError::UpstreamUnreachable(String::new()).status(), 503);
        assert_eq!(GatewayError::MalformedRequest(String::new()).status(), 400);
        assert_eq!(GatewayError::InternalGatewayError(String::new()).status(), 500);
        let upstream = GatewayError::UpstreamError {
            status: 422,
            code: "IR_06".to_string(),
            message: "Invalid amount".to_string(),
        };
        assert_eq!(upstream.status(), 422);
        assert_eq!(upstream.code(), "IR_06");
    }

    #[test]
    fn test_internal_error_message_is_not_leaked() {
        let error = GatewayError::InternalGatewayError(
            "failed to parse https://internal.example/payments".to_string(),
        );
        let envelope = error.envelope();
        assert_eq!(envelope.error.error_type, "InternalGatewayError");
        assert_eq!(envelope.error.code, "GW_05");
        assert!(!envelope.error.message.contains("internal.example"));
    }

    #[test]
    fn test_envelope_serializes_type_field() {
        let envelope = GatewayError::MalformedRequest("bad body".to_string()).envelope();
        let value = serde_json::to_value(&envelope).unwrap_or_default();
        assert_eq!(value["error"]["type"], "MalformedRequest");
        assert_eq!(value["error"]["message"], "bad body");
        assert_eq!(value["error"]["code"], "GW_04");
    }
}
