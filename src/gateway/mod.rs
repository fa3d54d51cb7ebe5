//! The request-translation gateway.
//!
//! Flow per request: credential/environment routing, endpoint resolution,
//! method/payload transformation, one forwarded call, response normalization.
//! Failures at any step are rendered through the error taxonomy.

pub mod endpoint;
pub mod environment;
pub mod normalizer;
pub mod transform;
pub mod translator;

use lambda_runtime::tracing::{debug, error, info, warn};
use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use std::time::{Duration, Instant};

use crate::config::GatewayConfig;
use crate::http::UpstreamClient;
use crate::models::{
    GatewayError, HttpApiEvent, InboundRequest, ProxyResponse, TransformedRequest, UpstreamFailure,
    UpstreamResponse,
};
use endpoint::ResolvedEndpoint;
use environment::{Credential, Environment};
use transform::OutboundPlan;

/// Header carrying the caller's API key upstream.
pub const API_KEY_HEADER: &str = "api-key";
/// Header identifying the gateway to the upstream processor.
pub const CLIENT_SOURCE_HEADER: &str = "x-request-source";
/// Inbound headers passed upstream verbatim when present.
pub const PROPAGATED_HEADERS: &[&str] = &[
    "x-profile-id",
    "x-merchant-id",
    "x-request-id",
    "x-idempotency-key",
];

pub struct Gateway<C> {
    config: GatewayConfig,
    client: C,
}

impl<C: UpstreamClient> Gateway<C> {
    #[must_use]
    pub const fn new(config: GatewayConfig, client: C) -> Self {
        Self { config, client }
    }

    #[must_use]
    pub const fn config(&self) -> &GatewayConfig {
        &self.config
    }

    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Handles one inbound event and always produces a response.
    ///
    /// `budget` bounds the outbound call on top of the configured timeout;
    /// when it runs out the in-flight call is dropped.
    pub async fn handle(&self, event: HttpApiEvent, budget: Option<Duration>) -> ProxyResponse {
        if event
            .request_context
            .http
            .method
            .eq_ignore_ascii_case(Method::OPTIONS.as_str())
        {
            debug!(path = %event.raw_path, "Answering CORS preflight");
            return normalizer::preflight();
        }

        match self.process(event, budget).await {
            Ok(response) => response,
            Err(error) => {
                match &error {
                    GatewayError::UpstreamUnreachable(_) => {
                        error!(kind = error.kind(), "Upstream call failed");
                    }
                    GatewayError::InternalGatewayError(detail) => {
                        error!(kind = error.kind(), detail = %detail, "Gateway fault");
                    }
                    _ => warn!(kind = error.kind(), reason = %error, "Request rejected"),
                }
                translator::error_response(&error)
            }
        }
    }

    async fn process(
        &self,
        event: HttpApiEvent,
        budget: Option<Duration>,
    ) -> Result<ProxyResponse, GatewayError> {
        let request = InboundRequest::from_event(event, &self.config.route_prefix)?;

        let routed = environment::bearer_token(&request.headers)
            .map(|token| environment::route(&self.config, token))
            .transpose()?;

        let logical_path = request.logical_path();
        let endpoint = endpoint::resolve(&logical_path, &request.method)?;

        let (environment, credential) = match routed {
            Some(routed) => (routed.environment, Some(routed.credential)),
            None if endpoint.requires_auth => {
                return Err(GatewayError::MissingCredentials(
                    "Authorization header with a Bearer API key is required".to_string(),
                ));
            }
            None => (self.config.public_environment, None),
        };

        let plan = transform::plan(&endpoint, &request)?;
        let outbound = self.assemble(&request, &endpoint, environment, credential.as_ref(), plan)?;

        info!(
            method = %request.method,
            logical_path = %logical_path,
            canonical_path = %endpoint.canonical_path,
            upstream_method = %outbound.method,
            environment = %environment,
            "Forwarding request"
        );

        let started = Instant::now();
        let response = self.forward(outbound, budget).await?;
        info!(
            status = response.status,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Upstream responded"
        );

        Ok(normalizer::normalize(response))
    }

    /// Exactly one outbound call, bounded by the configured timeout and the
    /// caller's remaining budget.
    async fn forward(
        &self,
        outbound: TransformedRequest,
        budget: Option<Duration>,
    ) -> Result<UpstreamResponse, GatewayError> {
        let limit = budget.map_or(self.config.upstream_timeout, |b| {
            b.min(self.config.upstream_timeout)
        });

        match tokio::time::timeout(limit, self.client.execute(outbound)).await {
            Ok(result) => result.map_err(GatewayError::from),
            Err(_) => Err(UpstreamFailure::Transport {
                cause: "timed out".to_string(),
            }
            .into()),
        }
    }

    fn assemble(
        &self,
        request: &InboundRequest,
        endpoint: &ResolvedEndpoint,
        environment: Environment,
        credential: Option<&Credential>,
        plan: OutboundPlan,
    ) -> Result<TransformedRequest, GatewayError> {
        let mut url = format!(
            "{}/{}",
            self.config.base_url(environment),
            endpoint.canonical_path
        );
        if let Some(query) = &plan.query {
            url.push('?');
            url.push_str(query);
        }
        let url = reqwest::Url::parse(&url)
            .map_err(|e| GatewayError::InternalGatewayError(format!("invalid upstream URL: {e}")))?;
        // Parsing must neither climb out of the resolved path nor re-encode the query
        let rewritten = !url.path().ends_with(endpoint.canonical_path.as_str())
            || url.query() != plan.query.as_deref();
        if rewritten {
            return Err(GatewayError::InternalGatewayError(format!(
                "upstream URL for '{}' was rewritten during parsing",
                endpoint.canonical_path
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static(CLIENT_SOURCE_HEADER),
            header_value(&self.config.client_id)?,
        );
        if let Some(credential) = credential {
            let mut value = header_value(credential.expose())?;
            value.set_sensitive(true);
            headers.insert(HeaderName::from_static(API_KEY_HEADER), value);
        }
        for name in PROPAGATED_HEADERS {
            if let Some(value) = request.headers.get(*name) {
                headers.insert(HeaderName::from_static(*name), value.clone());
            }
        }

        Ok(TransformedRequest {
            method: plan.method,
            url,
            headers,
            body: plan.body,
        })
    }
}

fn header_value(value: &str) -> Result<HeaderValue, GatewayError> {
    HeaderValue::from_str(value)
        .map_err(|_| GatewayError::InternalGatewayError("invalid outbound header value".to_string()))
}
