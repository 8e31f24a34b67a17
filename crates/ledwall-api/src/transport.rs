// Shared transport configuration for building reqwest::Client instances.
//
// The command client and any future request/response surface share the
// timeout and bearer-token settings through this module, avoiding
// duplicated builder logic.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    /// Bearer token sent as `Authorization: Bearer <token>` on every
    /// request. Empty tokens are treated as absent.
    pub token: Option<SecretString>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            token: None,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .default_headers(self.default_headers()?)
            .build()
            .map_err(|e| Error::ClientBuild(e.to_string()))
    }

    /// Attach a bearer token.
    pub fn with_token(mut self, token: Option<SecretString>) -> Self {
        self.token = token;
        self
    }

    fn default_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        if let Some(token) = non_empty(self.token.as_ref()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| Error::ClientBuild(format!("invalid bearer token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }
}

/// Expose a token only if one is configured and non-empty.
pub(crate) fn non_empty(token: Option<&SecretString>) -> Option<&str> {
    token
        .map(ExposeSecret::expose_secret)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn no_authorization_header_without_token() {
        let config = TransportConfig::default();
        assert!(config.default_headers().unwrap().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn empty_token_is_ignored() {
        let config = TransportConfig::default().with_token(Some(SecretString::from(String::new())));
        assert!(config.default_headers().unwrap().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn bearer_header_is_sensitive() {
        let config =
            TransportConfig::default().with_token(Some(SecretString::from("s3cret".to_string())));
        let headers = config.default_headers().unwrap();
        let value = headers.get(AUTHORIZATION).unwrap();
        assert_eq!(value.to_str().unwrap(), "Bearer s3cret");
        assert!(value.is_sensitive());
    }
}
