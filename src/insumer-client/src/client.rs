//! Insumer API client implementation

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::request::{Access, ApiRequest, ApiResponse};
use crate::{API_KEY_HEADER, ClientError, Result, USER_AGENT};

/// Timeout for a whole upstream round trip.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for establishing the TCP/TLS connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest slice of a non-JSON body kept for the error message.
const BODY_SNIPPET_CHARS: usize = 500;

/// Creates the HTTP client shared by every tool invocation.
///
/// Includes: User-Agent, tcp_nodelay, 30s request timeout, 10s connect timeout.
pub fn create_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .tcp_nodelay(true)
        .build()
        .map_err(ClientError::Build)
}

/// Client for the Insumer API.
///
/// Cheap to clone; clones share the connection pool and configuration.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
}

impl ApiClient {
    /// Create a client for the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            http: create_http_client()?,
            config: Arc::new(config),
        })
    }

    /// Configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Full URL for a path below the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url(), path)
    }

    /// Issue one request and return the parsed body with its status.
    ///
    /// A request that needs the key fails with [`ClientError::MissingApiKey`]
    /// before anything touches the network. Non-2xx statuses are not errors
    /// here; they come back as an [`ApiResponse`] for the caller to flag.
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let api_key = match request.access {
            Access::ApiKey => Some(self.config.api_key().ok_or(ClientError::MissingApiKey)?),
            Access::Public => None,
        };

        let url = self.url(&request.path);
        let mut builder = self.http.request(request.method.into(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(key) = api_key {
            builder = builder.header(API_KEY_HEADER, key.expose_secret());
        }

        debug!(method = %request.method, url = %url, "Sending upstream request");

        let response = builder
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.clone(),
                source,
            })?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.clone(),
                source,
            })?;

        info!(method = %request.method, url = %url, status, "Upstream responded");

        let body = serde_json::from_str(&text).map_err(|_| ClientError::InvalidBody {
            status,
            body: text.chars().take(BODY_SNIPPET_CHARS).collect(),
        })?;

        Ok(ApiResponse { status, body })
    }
}
