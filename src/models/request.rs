//! Inbound, outbound and upstream request/response models.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use lambda_runtime::tracing::warn;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};

use crate::models::error::GatewayError;
use crate::models::proxy::HttpApiEvent;
use crate::utils::{is_url_safe_segment, is_verbatim_query, parse_query, strip_route_prefix};

/// Query parameters in the order they were sent. Keys may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    #[must_use]
    pub fn parse(raw_query: &str) -> Self {
        Self(parse_query(raw_query))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A client request as the gateway sees it. Read-only once built.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub segments: Vec<String>,
    /// Query string exactly as received, without the leading `?`
    pub raw_query: String,
    pub query: QueryParams,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl InboundRequest {
    /// Builds an inbound request from an HTTP API event.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MalformedRequest`] if the method is not a valid
    /// HTTP method, the path below `route_prefix` is empty or holds segments
    /// that are not URL-safe, the query string holds characters that are not
    /// percent-encoded, or a base64-flagged body cannot be decoded.
    pub fn from_event(event: HttpApiEvent, route_prefix: &str) -> Result<Self, GatewayError> {
        let method = parse_method(&event.request_context.http.method)?;

        let logical = strip_route_prefix(&event.raw_path, route_prefix);
        if logical.is_empty() {
            return Err(GatewayError::MalformedRequest(
                "Request path does not name a resource".to_string(),
            ));
        }
        let segments: Vec<String> = logical.split('/').map(str::to_string).collect();
        if let Some(bad) = segments.iter().find(|s| !is_url_safe_segment(s)) {
            return Err(GatewayError::MalformedRequest(format!(
                "Invalid path segment '{bad}'"
            )));
        }

        if !is_verbatim_query(&event.raw_query_string) {
            return Err(GatewayError::MalformedRequest(
                "Query string must be percent-encoded".to_string(),
            ));
        }

        let body = match event.body {
            Some(body) if event.is_base64_encoded => Some(STANDARD.decode(body).map_err(|e| {
                GatewayError::MalformedRequest(format!("Request body is not valid base64: {e}"))
            })?),
            Some(body) => Some(body.into_bytes()),
            None => None,
        };

        let query = QueryParams::parse(&event.raw_query_string);

        Ok(Self {
            method,
            segments,
            raw_query: event.raw_query_string,
            query,
            headers: header_map(event.headers),
            body: body.filter(|b| !b.is_empty()),
        })
    }

    /// Slash-joined logical path, e.g. `payments/pay_123`.
    #[must_use]
    pub fn logical_path(&self) -> String {
        self.segments.join("/")
    }

    /// Header value by case-insensitive name, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

fn parse_method(method: &str) -> Result<Method, GatewayError> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| GatewayError::MalformedRequest(format!("Unsupported HTTP method '{method}'")))
}

/// Converts event headers into a case-insensitive map, dropping entries that
/// are not valid HTTP headers.
fn header_map(headers: impl IntoIterator<Item = (String, String)>) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(value)) => {
                map.append(name, value);
            }
            _ => warn!(header = %name, "Dropping invalid inbound header"),
        }
    }
    map
}

/// The request the forwarder sends upstream.
#[derive(Debug, Clone)]
pub struct TransformedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

/// Raw upstream answer. Read once by the normalizer.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: HeaderMap,
    pub body: String,
}
