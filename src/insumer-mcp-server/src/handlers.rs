//! Tool handler trait and its error type.

use insumer_mcp_types::{CallToolResult, Tool};
use serde_json::Value;

/// Failure of a tool invocation that is not a relayed business outcome.
#[derive(Debug, thiserror::Error)]
pub enum ToolCallError {
    /// The caller's arguments were rejected before any work was done.
    /// Surfaced as a JSON-RPC `-32602` error carrying `data`.
    #[error("{message}")]
    InvalidArguments {
        /// Human-readable description of the failed constraint.
        message: String,
        /// Structured description of the failed constraint.
        data: Option<Value>,
    },

    /// Anything else. Surfaced as an `isError` tool result.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ToolCallError {
    /// Shorthand for an argument rejection.
    pub fn invalid_arguments(message: impl Into<String>, data: Option<Value>) -> Self {
        Self::InvalidArguments {
            message: message.into(),
            data,
        }
    }
}

/// Trait for implementing tool handlers.
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync {
    /// Get the tool definition.
    fn tool(&self) -> Tool;

    /// Execute the tool with given arguments.
    async fn execute(&self, arguments: Value) -> Result<CallToolResult, ToolCallError>;
}
