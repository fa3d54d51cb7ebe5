//! Response normalization.
//!
//! Turns an upstream answer into the response handed back to the caller:
//! always a JSON body, a fixed allow-list of upstream headers, and permissive
//! CORS headers. The upstream status is never reinterpreted.

use reqwest::header::{HeaderMap, LOCATION};
use serde_json::{Value, json};
use std::collections::BTreeMap;

use crate::gateway::translator;
use crate::models::{ProxyResponse, UpstreamResponse};

/// Upstream headers copied onto the outbound response.
pub const FORWARDED_HEADERS: &[&str] = &[
    "x-request-id",
    "x-correlation-id",
    "x-ratelimit-limit",
    "x-ratelimit-remaining",
    "x-ratelimit-reset",
    "retry-after",
];

pub const ALLOWED_METHODS: &str = "GET, POST, PUT, PATCH, DELETE, OPTIONS";
pub const ALLOWED_HEADERS: &str =
    "Authorization, Content-Type, Accept, X-Profile-Id, X-Merchant-Id, X-Request-Id, X-Idempotency-Key";
/// Seconds a browser may cache the preflight answer.
pub const PREFLIGHT_MAX_AGE: &str = "86400";

/// Normalizes an upstream response.
///
/// 2xx bodies are relayed, 3xx responses are relayed as redirects with their
/// `Location`, and every other status becomes an `UpstreamError` envelope
/// carrying the upstream status.
#[must_use]
pub fn normalize(response: UpstreamResponse) -> ProxyResponse {
    let body = parse_body(&response.body);
    let is_redirect = (300..400).contains(&response.status);
    let headers = forwarded_headers(&response.headers, is_redirect);

    if (200..400).contains(&response.status) {
        return json_response(response.status, &body, headers);
    }

    let failure = translator::classify_status(response.status, &response.status_text, &body);
    translator::error_response_with(&failure.into(), headers)
}

/// Answer to a CORS preflight request. Never touches the upstream.
#[must_use]
pub fn preflight() -> ProxyResponse {
    let mut response = json_response(204, &json!({}), BTreeMap::new());
    response.headers.insert(
        "access-control-max-age".to_string(),
        PREFLIGHT_MAX_AGE.to_string(),
    );
    response
}

/// Builds a JSON response with CORS headers on top of `headers`.
#[must_use]
pub fn json_response(status: u16, body: &Value, mut headers: BTreeMap<String, String>) -> ProxyResponse {
    headers.extend(cors_headers());
    headers.insert("content-type".to_string(), "application/json".to_string());
    ProxyResponse {
        status_code: status,
        headers,
        body: body.to_string(),
        is_base64_encoded: false,
    }
}

/// CORS headers attached to every response.
#[must_use]
pub fn cors_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("access-control-allow-origin".to_string(), "*".to_string()),
        (
            "access-control-allow-methods".to_string(),
            ALLOWED_METHODS.to_string(),
        ),
        (
            "access-control-allow-headers".to_string(),
            ALLOWED_HEADERS.to_string(),
        ),
    ])
}

/// Parses the upstream body, wrapping non-JSON text so the caller always
/// receives JSON. An empty body becomes `{}`.
#[must_use]
pub fn parse_body(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(raw).unwrap_or_else(|_| json!({ "message": raw }))
}

fn forwarded_headers(upstream: &HeaderMap, include_location: bool) -> BTreeMap<String, String> {
    let location = include_location.then_some(LOCATION.as_str());
    FORWARDED_HEADERS
        .iter()
        .copied()
        .chain(location)
        .filter_map(|name| {
            upstream
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(|value| (name.to_string(), value.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn upstream(status: u16, body: &str, headers: &[(&'static str, &'static str)]) -> UpstreamResponse {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.insert(*name, HeaderValue::from_static(*value));
        }
        UpstreamResponse {
            status,
            status_text: String::new(),
            headers: map,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_success_body_and_status_are_relayed() {
        let response = normalize(upstream(200, r#"{"payment_id":"pay_1","amount":100}"#, &[]));
        assert_eq!(response.status_code, 200);
        assert_eq!(
            response.json_body().unwrap_or_default(),
            json!({"payment_id": "pay_1", "amount": 100})
        );
        assert_eq!(response.header("content-type"), Some("application/json"));
    }

    #[test]
    fn test_plain_text_is_wrapped() {
        let response = normalize(upstream(200, "OK", &[]));
        assert_eq!(response.json_body().unwrap_or_default(), json!({"message": "OK"}));
    }

    #[test]
    fn test_empty_body_becomes_empty_object() {
        let response = normalize(upstream(204, "", &[]));
        assert_eq!(response.status_code, 204);
        assert_eq!(response.body, "{}");
    }

    #[test]
    fn test_only_allow_listed_headers_are_copied() {
        let response = normalize(upstream(
            200,
            "{}",
            &[
                ("x-request-id", "req_1"),
                ("x-ratelimit-remaining", "99"),
                ("set-cookie", "session=abc"),
                ("server", "upstream"),
                ("location", "https://elsewhere.example"),
            ],
        ));
        assert_eq!(response.header("x-request-id"), Some("req_1"));
        assert_eq!(response.header("x-ratelimit-remaining"), Some("99"));
        assert_eq!(response.header("set-cookie"), None);
        assert_eq!(response.header("server"), None);
        assert_eq!(response.header("location"), None);
    }

    #[test]
    fn test_cors_headers_always_present() {
        for response in [
            normalize(upstream(200, "{}", &[])),
            normalize(upstream(500, "{}", &[])),
            preflight(),
        ] {
            assert_eq!(response.header("access-control-allow-origin"), Some("*"));
            assert_eq!(response.header("access-control-allow-methods"), Some(ALLOWED_METHODS));
            assert_eq!(response.header("access-control-allow-headers"), Some(ALLOWED_HEADERS));
        }
    }

    #[test]
    fn test_redirect_is_relayed_with_location() {
        let response = normalize(upstream(
            302,
            "",
            &[("location", "https://checkout.example/3ds")],
        ));
        assert_eq!(response.status_code, 302);
        assert_eq!(response.header("location"), Some("https://checkout.example/3ds"));
    }

    #[test]
    fn test_error_status_becomes_envelope() {
        let response = normalize(upstream(
            404,
            r#"{"error":{"type":"invalid_request","message":"Payment does not exist in our records","code":"HE_02"}}"#,
            &[("x-request-id", "req_9")],
        ));
        assert_eq!(response.status_code, 404);
        assert_eq!(response.header("x-request-id"), Some("req_9"));
        let body = response.json_body().unwrap_or_default();
        assert_eq!(body["error"]["type"], "UpstreamError");
        assert_eq!(body["error"]["code"], "HE_02");
        assert_eq!(body["error"]["message"], "Payment does not exist in our records");
    }

    #[test]
    fn test_preflight_has_max_age() {
        let response = preflight();
        assert_eq!(response.status_code, 204);
        assert_eq!(response.header("access-control-max-age"), Some(PREFLIGHT_MAX_AGE));
    }
}
