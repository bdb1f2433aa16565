//! Client configuration.
//!
//! The API key is the only value read from the environment. It is read once
//! at startup and then travels inside an immutable [`ClientConfig`].

use secrecy::SecretString;

use crate::{API_KEY_ENV, DEFAULT_BASE_URL};

/// Immutable configuration for [`crate::ApiClient`].
#[derive(Clone)]
pub struct ClientConfig {
    /// API key, if one was provided.
    api_key: Option<SecretString>,
    /// Base URL without a trailing slash.
    base_url: String,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ClientConfig {
    /// Create a configuration against the production base URL.
    ///
    /// A blank key counts as no key.
    pub fn new(api_key: Option<String>) -> Self {
        let api_key = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .map(|key| SecretString::new(key.into()));
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Load the API key from `INSUMER_API_KEY`.
    pub fn from_env() -> Self {
        Self::new(std::env::var(API_KEY_ENV).ok())
    }

    /// Point the client somewhere else. Used by embedders and tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether an API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn api_key(&self) -> Option<&SecretString> {
        self.api_key.as_ref()
    }
}
