//! JSON-RPC 2.0 framing.
//!
//! Every line read from the transport goes through [`Frame::parse`], which
//! decides whether it is answered, silently handled or rejected. Ids are
//! echoed back exactly as the client sent them, so numeric ids keep their
//! full `serde_json::Number` form (fractions and values past `i64::MAX`
//! included).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// JSON-RPC version string.
pub const JSONRPC_VERSION: &str = "2.0";

/// Request id as sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum RequestId {
    Number(Number),
    String(String),
    /// Answers to frames whose id could not be read.
    Null,
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
            Self::Null => f.write_str("null"),
        }
    }
}

/// A call that expects an answer.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: RequestId,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// A call without an id; never answered.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// Exactly one of `result` and `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: RequestId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: RequestId, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// One classified transport line.
#[derive(Debug, Clone)]
pub enum Frame {
    Request(JsonRpcRequest),
    Notification(JsonRpcNotification),
    /// Well-formed JSON that is neither. Carries the id to answer with
    /// (`Null` when the frame had none or it was unreadable) and the reason.
    Invalid { id: RequestId, reason: String },
}

impl Frame {
    /// Classify one line. Fails only when the line is not JSON at all.
    ///
    /// A frame with an `id` member is always treated as a request, so a
    /// malformed request is rejected with its id rather than mistaken for a
    /// notification.
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(line)?;
        Ok(Self::classify(value))
    }

    fn classify(value: Value) -> Self {
        if value.get("id").is_none() {
            return match serde_json::from_value::<JsonRpcNotification>(value) {
                Ok(notification) if notification.jsonrpc == JSONRPC_VERSION => {
                    Self::Notification(notification)
                }
                Ok(notification) => Self::wrong_version(RequestId::Null, &notification.jsonrpc),
                Err(e) => Self::Invalid {
                    id: RequestId::Null,
                    reason: e.to_string(),
                },
            };
        }

        let id = value
            .get("id")
            .and_then(|raw| RequestId::deserialize(raw).ok())
            .unwrap_or(RequestId::Null);
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) if request.jsonrpc == JSONRPC_VERSION => Self::Request(request),
            Ok(request) => Self::wrong_version(request.id, &request.jsonrpc),
            Err(e) => Self::Invalid {
                id,
                reason: e.to_string(),
            },
        }
    }

    fn wrong_version(id: RequestId, version: &str) -> Self {
        Self::Invalid {
            id,
            reason: format!("unsupported jsonrpc version {version:?}"),
        }
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PARSE_ERROR, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::INVALID_REQUEST, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            ErrorCode::METHOD_NOT_FOUND,
            format!("Method not found: {method}"),
        )
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::INVALID_PARAMS, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::INTERNAL_ERROR, message)
    }
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for JsonRpcError {}

/// Standard JSON-RPC error codes.
pub struct ErrorCode;

impl ErrorCode {
    /// The line is not JSON.
    pub const PARSE_ERROR: i32 = -32700;
    /// JSON, but not a request or notification.
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Also used for rejected tool arguments.
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}
