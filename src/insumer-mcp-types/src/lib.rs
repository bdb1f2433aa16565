//! Insumer MCP Types - Model Context Protocol type definitions.
//!
//! Wire types for the subset of the Model Context Protocol spoken by the
//! Insumer tool server: the JSON-RPC 2.0 envelope, the initialize handshake,
//! tool listing and invocation. `logging/setLevel` is parsed so clients that
//! send it get an answer.
//!
//! # Example
//! ```rust
//! use insumer_mcp_types::{PropertySchema, Tool, ToolInputSchema};
//!
//! let tool = Tool::new("insumer_validate_code", "Look up a discount code")
//!     .with_schema(ToolInputSchema::object()
//!         .property("code", PropertySchema::string().pattern("^INSR-[A-Z0-9]{5}$"))
//!         .required(vec!["code"]));
//! ```

// ============================================================================
// Module declarations
// ============================================================================

mod capabilities;
mod content;
mod initialization;
mod jsonrpc;
mod logging;
mod tools;

/// MCP method name constants.
pub mod methods;

// ============================================================================
// Protocol Version
// ============================================================================

/// Oldest MCP protocol version the server still speaks.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Latest MCP protocol version.
pub const LATEST_PROTOCOL_VERSION: &str = "2025-06-18";

/// Protocol versions the server accepts, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] =
    &[LATEST_PROTOCOL_VERSION, "2025-03-26", PROTOCOL_VERSION];

/// Pick the protocol version to answer an `initialize` request with.
///
/// A supported client version is echoed back; anything else gets the latest.
pub fn negotiate_protocol_version(requested: &str) -> &'static str {
    SUPPORTED_PROTOCOL_VERSIONS
        .iter()
        .copied()
        .find(|v| *v == requested)
        .unwrap_or(LATEST_PROTOCOL_VERSION)
}

// ============================================================================
// Re-exports
// ============================================================================

// JSON-RPC types
pub use jsonrpc::{
    ErrorCode, Frame, JSONRPC_VERSION, JsonRpcError, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, RequestId,
};

// Initialization types
pub use initialization::{Implementation, InitializeParams, InitializeResult};

// Capability types
pub use capabilities::{
    ClientCapabilities, RootsCapability, SamplingCapability, ServerCapabilities, ToolsCapability,
};

// Tool types
pub use tools::{
    CallToolParams, CallToolResult, ListToolsResult, PropertySchema, Tool, ToolInputSchema,
};

// Content types
pub use content::Content;

// Logging types
pub use logging::{LogLevel, SetLogLevelParams};
