//! Gateway configuration.
//!
//! Built once at start-up from environment variables and shared read-only
//! with every request.

use anyhow::{Context, Result, bail, ensure};
use std::time::Duration;

use crate::gateway::environment::Environment;

const DEFAULT_SANDBOX_BASE_URL: &str = "https://sandbox.hyperswitch.io";
const DEFAULT_PRODUCTION_BASE_URL: &str = "https://api.hyperswitch.io";
const DEFAULT_SANDBOX_KEY_PREFIX: &str = "snd_";
const DEFAULT_PRODUCTION_KEY_PREFIX: &str = "prd_";
const DEFAULT_ROUTE_PREFIX: &str = "/api/hyperswitch";
const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 8_000;
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 3_000;
const DEFAULT_CLIENT_ID: &str = "merchant-dashboard-gateway";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub sandbox_base_url: String,
    pub production_base_url: String,
    pub sandbox_key_prefix: String,
    pub production_key_prefix: String,
    /// Mount point of the gateway; stripped from inbound paths
    pub route_prefix: String,
    /// Environment for unauthenticated calls to public resources
    pub public_environment: Environment,
    pub upstream_timeout: Duration,
    pub connect_timeout: Duration,
    /// Value of the identifying client header sent upstream
    pub client_id: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            sandbox_base_url: DEFAULT_SANDBOX_BASE_URL.to_string(),
            production_base_url: DEFAULT_PRODUCTION_BASE_URL.to_string(),
            sandbox_key_prefix: DEFAULT_SANDBOX_KEY_PREFIX.to_string(),
            production_key_prefix: DEFAULT_PRODUCTION_KEY_PREFIX.to_string(),
            route_prefix: DEFAULT_ROUTE_PREFIX.to_string(),
            public_environment: Environment::Sandbox,
            upstream_timeout: Duration::from_millis(DEFAULT_UPSTREAM_TIMEOUT_MS),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            client_id: DEFAULT_CLIENT_ID.to_string(),
        }
    }
}

impl GatewayConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable is set to an invalid value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, falling back to defaults for
    /// unset variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a timeout is not a positive integer, a base URL is
    /// not http(s), the public environment is unknown, or the key prefixes
    /// are empty or equal.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let string = |key: &str, default: String| lookup(key).unwrap_or(default);
        let millis = |key: &str, default: Duration| -> Result<Duration> {
            lookup(key).map_or(Ok(default), |raw| {
                let ms: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{key} must be a number of milliseconds, got '{raw}'"))?;
                ensure!(ms > 0, "{key} must be greater than zero");
                Ok(Duration::from_millis(ms))
            })
        };

        let public_environment = match lookup("GATEWAY_PUBLIC_ENVIRONMENT") {
            Some(raw) => raw
                .parse::<Environment>()
                .map_err(anyhow::Error::msg)
                .context("Invalid GATEWAY_PUBLIC_ENVIRONMENT")?,
            None => defaults.public_environment,
        };

        let config = Self {
            sandbox_base_url: string("GATEWAY_SANDBOX_BASE_URL", defaults.sandbox_base_url)
                .trim_end_matches('/')
                .to_string(),
            production_base_url: string("GATEWAY_PRODUCTION_BASE_URL", defaults.production_base_url)
                .trim_end_matches('/')
                .to_string(),
            sandbox_key_prefix: string("GATEWAY_SANDBOX_KEY_PREFIX", defaults.sandbox_key_prefix),
            production_key_prefix: string(
                "GATEWAY_PRODUCTION_KEY_PREFIX",
                defaults.production_key_prefix,
            ),
            route_prefix: string("GATEWAY_ROUTE_PREFIX", defaults.route_prefix),
            public_environment,
            upstream_timeout: millis("GATEWAY_UPSTREAM_TIMEOUT_MS", defaults.upstream_timeout)?,
            connect_timeout: millis("GATEWAY_CONNECT_TIMEOUT_MS", defaults.connect_timeout)?,
            client_id: string("GATEWAY_CLIENT_ID", defaults.client_id),
        };

        config.validate()?;
        Ok(config)
    }

    /// Base URL of the given environment, without a trailing slash.
    #[must_use]
    pub fn base_url(&self, environment: Environment) -> &str {
        match environment {
            Environment::Sandbox => &self.sandbox_base_url,
            Environment::Production => &self.production_base_url,
        }
    }

    fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("GATEWAY_SANDBOX_BASE_URL", &self.sandbox_base_url),
            ("GATEWAY_PRODUCTION_BASE_URL", &self.production_base_url),
        ] {
            let parsed = reqwest::Url::parse(url).with_context(|| format!("{name} is not a valid URL"))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                bail!("{name} must use http or https");
            }
        }
        ensure!(
            !self.sandbox_key_prefix.is_empty() && !self.production_key_prefix.is_empty(),
            "API key prefixes must not be empty"
        );
        ensure!(
            self.sandbox_key_prefix != self.production_key_prefix,
            "Sandbox and production API key prefixes must differ"
        );
        ensure!(!self.client_id.trim().is_empty(), "GATEWAY_CLIENT_ID must not be empty");
        Ok(())
    }
}
