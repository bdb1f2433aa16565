//! HTTP client for the Insumer attestation API.
//!
//! Every call is a single round trip against one fixed base URL. The client
//! performs no retries, caching or rate limiting, and never looks inside the
//! response body beyond parsing it as JSON.

mod client;
mod config;
mod error;
mod request;

pub use client::{ApiClient, create_http_client};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use request::{Access, ApiRequest, ApiResponse, HttpMethod};

/// Base URL every request is issued against.
pub const DEFAULT_BASE_URL: &str = "https://api.insumermodel.com/v1";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "INSUMER_API_KEY";

/// Header carrying the API key on authenticated calls.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Where callers are sent to obtain a key.
pub const SIGNUP_URL: &str = "https://insumermodel.com/developers/";

/// User-Agent string for all HTTP requests.
pub const USER_AGENT: &str = concat!("insumer-mcp/", env!("CARGO_PKG_VERSION"));
