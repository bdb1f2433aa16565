//! Error types for upstream calls.

use thiserror::Error;

use crate::{API_KEY_ENV, SIGNUP_URL};

/// Errors that can occur while talking to the Insumer API.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The operation needs a key and none is configured. Raised before any I/O.
    #[error(
        "{env} is not set. Get an API key at {signup} and set it in the environment.",
        env = API_KEY_ENV,
        signup = SIGNUP_URL
    )]
    MissingApiKey,

    /// The request never produced a readable response.
    #[error("Request to {url} failed: {source}")]
    Transport {
        /// Full request URL.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The upstream answered with something that is not JSON.
    #[error("Upstream returned HTTP {status} with a non-JSON body: {body}")]
    InvalidBody {
        /// HTTP status code.
        status: u16,
        /// Leading part of the body.
        body: String,
    },

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_message_names_variable_and_signup() {
        let message = ClientError::MissingApiKey.to_string();
        assert!(message.contains("INSUMER_API_KEY"));
        assert!(message.contains(SIGNUP_URL));
    }

    #[test]
    fn test_invalid_body_message() {
        let error = ClientError::InvalidBody {
            status: 502,
            body: "<html>Bad Gateway</html>".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Upstream returned HTTP 502 with a non-JSON body: <html>Bad Gateway</html>"
        );
    }
}
