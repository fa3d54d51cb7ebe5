//! Credential/environment routing.
//!
//! The upstream processor issues API keys whose prefix names the deployment
//! they belong to. The prefix alone picks the base URL; there is no default
//! environment for an authenticated call.

use reqwest::header::{AUTHORIZATION, HeaderMap};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::GatewayConfig;
use crate::models::GatewayError;

/// Upstream deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Sandbox,
    Production,
}

impl Environment {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sandbox => "sandbox",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(Self::Sandbox),
            "production" => Ok(Self::Production),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

/// Caller API key. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// A validated credential and the environment it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedCredential {
    pub environment: Environment,
    pub credential: Credential,
}

/// Extracts the bearer token from the `Authorization` header.
///
/// The scheme is matched case-insensitively. A missing header, another scheme
/// or an empty token all count as no credential.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Validates a credential's shape and selects its environment.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidCredentialFormat`] if the token does not
/// start with a configured environment prefix, has nothing after the prefix,
/// or contains whitespace or non-printable characters.
pub fn route(config: &GatewayConfig, token: &str) -> Result<RoutedCredential, GatewayError> {
    let mut prefixes = [
        (config.sandbox_key_prefix.as_str(), Environment::Sandbox),
        (config.production_key_prefix.as_str(), Environment::Production),
    ];
    // Longest prefix first so that overlapping prefixes stay unambiguous
    prefixes.sort_by_key(|(prefix, _)| std::cmp::Reverse(prefix.len()));

    let environment = prefixes
        .iter()
        .find(|(prefix, _)| {
            token
                .strip_prefix(prefix)
                .is_some_and(|rest| !rest.is_empty())
        })
        .map(|(_, environment)| *environment)
        .ok_or_else(|| {
            GatewayError::InvalidCredentialFormat(
                "API key does not belong to a known environment".to_string(),
            )
        })?;

    if !token.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(GatewayError::InvalidCredentialFormat(
            "API key contains invalid characters".to_string(),
        ));
    }

    Ok(RoutedCredential {
        environment,
        credential: Credential(token.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers_with(authorization: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(authorization) {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&headers_with("Bearer snd_abc")), Some("snd_abc"));
        assert_eq!(bearer_token(&headers_with("bearer   prd_abc ")), Some("prd_abc"));
        assert_eq!(bearer_token(&headers_with("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_sandbox_prefix_routes_to_sandbox() {
        let config = GatewayConfig::default();
        let routed = route(&config, "snd_c0ffee").unwrap_or_else(|e| unreachable!("{e}"));
        assert_eq!(routed.environment, Environment::Sandbox);
        assert_eq!(routed.credential.expose(), "snd_c0ffee");
        assert_eq!(config.base_url(routed.environment), "https://sandbox.hyperswitch.io");
    }

    #[test]
    fn test_production_prefix_routes_to_production() {
        let config = GatewayConfig::default();
        let routed = route(&config, "prd_c0ffee").unwrap_or_else(|e| unreachable!("{e}"));
        assert_eq!(routed.environment, Environment::Production);
        assert_eq!(config.base_url(routed.environment), "https://api.hyperswitch.io");
    }

    #[test]
    fn test_unrecognized_prefix_is_rejected() {
        let config = GatewayConfig::default();
        for token in ["dev_c0ffee", "c0ffee", "snd_", "SND_c0ffee", "snd_a\u{7f}b"] {
            assert!(
                matches!(route(&config, token), Err(GatewayError::InvalidCredentialFormat(_))),
                "{token:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_overlapping_prefixes_prefer_longest() {
        let config = GatewayConfig {
            sandbox_key_prefix: "key_".to_string(),
            production_key_prefix: "key_live_".to_string(),
            ..GatewayConfig::default()
        };
        let routed = route(&config, "key_live_123").unwrap_or_else(|e| unreachable!("{e}"));
        assert_eq!(routed.environment, Environment::Production);
        let routed = route(&config, "key_123").unwrap_or_else(|e| unreachable!("{e}"));
        assert_eq!(routed.environment, Environment::Sandbox);
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let config = GatewayConfig::default();
        let routed = route(&config, "snd_secret").unwrap_or_else(|e| unreachable!("{e}"));
        assert!(!format!("{routed:?}").contains("secret"));
    }

    #[test]
    fn test_environment_from_str() {
        assert_eq!("Sandbox".parse::<Environment>(), Ok(Environment::Sandbox));
        assert_eq!(" production ".parse::<Environment>(), Ok(Environment::Production));
        assert!("staging".parse::<Environment>().is_err());
    }
}
