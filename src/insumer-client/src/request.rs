//! Request and response shapes for a single upstream round trip.

use serde_json::Value;

/// HTTP methods the catalog uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

impl HttpMethod {
    /// Whether arguments travel in the query string rather than a JSON body.
    pub fn uses_query(self) -> bool {
        matches!(self, Self::Get)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
        })
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
        }
    }
}

/// Whether a call needs the API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Free endpoint, callable without a key.
    Public,
    /// Sends `X-API-Key`; fails locally when no key is configured.
    ApiKey,
}

/// A fully built upstream request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    /// Path below the base URL, starting with `/`, already percent-encoded.
    pub path: String,
    /// Query parameters, in the order they were supplied.
    pub query: Vec<(String, String)>,
    /// JSON body for POST/PUT.
    pub body: Option<Value>,
    pub access: Access,
}

impl ApiRequest {
    /// Create a request with no query and no body.
    pub fn new(method: HttpMethod, path: impl Into<String>, access: Access) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            access,
        }
    }

    /// Append a query parameter.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Set the JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// What came back: the status and the parsed body, untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    /// A 2xx status whose body does not carry `"ok": false`.
    ///
    /// Bodies without an `ok` member (for example a raw JWKS document) count
    /// as successful when the status does.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status) && self.body.get("ok") != Some(&Value::Bool(false))
    }
}
