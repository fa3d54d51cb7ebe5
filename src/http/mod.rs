use async_trait::async_trait;
use lambda_runtime::tracing::{debug, error};
use reqwest::{Client, redirect};

use crate::config::GatewayConfig;
use crate::models::{TransformedRequest, UpstreamFailure, UpstreamResponse};

/// Trait for the outbound call to the upstream processor.
///
/// This trait abstracts the HTTP round-trip so the gateway can be exercised
/// with stubs, preventing tests from making real network calls. One call to
/// [`UpstreamClient::execute`] is exactly one outbound request; implementations
/// must not retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Sends the request and reads the whole response.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamFailure::Transport`] if the connection fails, times
    /// out, or the body cannot be read. An upstream error status is not a
    /// failure at this level.
    async fn execute(&self, request: TransformedRequest) -> Result<UpstreamResponse, UpstreamFailure>;
}

/// Production upstream client using reqwest.
///
/// Redirects are never followed so that a 3xx reaches the caller as-is.
pub struct ReqwestUpstream {
    client: Client,
}

impl ReqwestUpstream {
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds the shared client from the gateway configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn from_config(config: &GatewayConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(config.upstream_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl UpstreamClient for ReqwestUpstream {
    async fn execute(&self, request: TransformedRequest) -> Result<UpstreamResponse, UpstreamFailure> {
        let TransformedRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.client.request(method, url).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(transport_failure)?;
        let status = response.status();
        let response_headers = response.headers().clone();
        debug!(status = status.as_u16(), "Upstream responded");

        let body = response.text().await.map_err(transport_failure)?;

        Ok(UpstreamResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers: response_headers,
            body,
        })
    }
}

/// Describes a reqwest error without the request URL.
fn transport_failure(error: reqwest::Error) -> UpstreamFailure {
    let kind = if error.is_timeout() {
        "timed out"
    } else if error.is_connect() {
        "connection failed"
    } else if error.is_body() || error.is_decode() {
        "response body could not be read"
    } else {
        "request failed"
    };
    let error = error.without_url();
    error!(error = %error, kind, "Upstream call failed");
    UpstreamFailure::Transport {
        cause: kind.to_string(),
    }
}
