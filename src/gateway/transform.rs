//! Method and payload transformation.
//!
//! Several upstream list endpoints reject `GET` and expect a `POST` whose JSON
//! body carries the filters. A `GET` with query parameters on such an endpoint
//! is rewritten here; every other request keeps its method and query string.

use lambda_runtime::tracing::debug;
use reqwest::Method;
use serde_json::{Map, Value};

use crate::gateway::endpoint::ResolvedEndpoint;
use crate::models::{GatewayError, InboundRequest, QueryParams};

/// Filters the upstream expects as integers.
const INTEGER_KEYS: &[&str] = &["limit", "offset"];

/// Filters the upstream expects as arrays, whatever their cardinality.
const ARRAY_KEYS: &[&str] = &[
    "status",
    "connector",
    "payment_method",
    "currency",
    "payment_method_type",
];

/// Outbound method, body and query string for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundPlan {
    pub method: Method,
    pub body: Option<String>,
    /// Query string without `?`, forwarded verbatim
    pub query: Option<String>,
}

/// Decides the outbound method and payload.
///
/// # Errors
///
/// Returns [`GatewayError::MalformedRequest`] if a list filter that must be an
/// integer is not one, or if a write request carries a body that is not JSON.
pub fn plan(endpoint: &ResolvedEndpoint, request: &InboundRequest) -> Result<OutboundPlan, GatewayError> {
    if request.method == Method::GET && endpoint.lists_via_post() {
        let filters = list_filters(&request.query)?;
        debug!(
            canonical_path = %endpoint.canonical_path,
            filters = filters.as_object().map_or(0, Map::len),
            "Rewriting GET listing into POST"
        );
        return Ok(OutboundPlan {
            method: Method::POST,
            body: Some(filters.to_string()),
            query: None,
        });
    }

    Ok(OutboundPlan {
        method: request.method.clone(),
        body: forwarded_body(request)?,
        query: (!request.raw_query.is_empty()).then(|| request.raw_query.clone()),
    })
}

/// Converts query parameters into a JSON filter body.
///
/// Empty values are dropped. Repeated keys become arrays, `limit`/`offset`
/// become integers (last value wins) and the array filters are always arrays.
///
/// # Errors
///
/// Returns [`GatewayError::MalformedRequest`] if an integer filter does not
/// parse.
pub fn list_filters(query: &QueryParams) -> Result<Value, GatewayError> {
    let mut grouped: Vec<(&str, Vec<&str>)> = Vec::new();
    for (key, value) in query.iter().filter(|(_, value)| !value.is_empty()) {
        match grouped.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => grouped.push((key, vec![value])),
        }
    }

    let mut body = Map::new();
    for (key, values) in grouped {
        let value = if INTEGER_KEYS.contains(&key) {
            let raw = values.last().copied().unwrap_or_default();
            let number: i64 = raw.trim().parse().map_err(|_| {
                GatewayError::MalformedRequest(format!("Query parameter '{key}' must be an integer"))
            })?;
            Value::from(number)
        } else if ARRAY_KEYS.contains(&key) || values.len() > 1 {
            Value::Array(values.into_iter().map(Value::from).collect())
        } else {
            values.first().copied().map_or(Value::Null, Value::from)
        };
        body.insert(key.to_string(), value);
    }

    Ok(Value::Object(body))
}

/// Body to forward unchanged, after checking it is JSON where one is expected.
fn forwarded_body(request: &InboundRequest) -> Result<Option<String>, GatewayError> {
    let expects_body = matches!(request.method, Method::POST | Method::PUT | Method::PATCH);
    let Some(raw) = request.body.as_deref().filter(|_| expects_body) else {
        return Ok(None);
    };

    let text = std::str::from_utf8(raw)
        .map_err(|_| GatewayError::MalformedRequest("Request body is not valid UTF-8".to_string()))?;
    if text.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str::<Value>(text)
        .map_err(|e| GatewayError::MalformedRequest(format!("Request body is not valid JSON: {e}")))?;

    Ok(Some(text.to_string()))
}
