//! Insumer MCP Server - Model Context Protocol server core.
//!
//! This crate provides the protocol half of the Insumer tool server:
//! - Registers a fixed set of [`ToolHandler`]s and advertises them via `tools/list`
//! - Routes `tools/call` to the matching handler, mapping argument rejections
//!   to JSON-RPC `-32602` and other failures to `isError` results
//! - Tracks the initialize handshake and negotiated protocol version
//! - Speaks newline-delimited JSON-RPC over stdio
//!
//! # Example
//! ```rust,no_run
//! use insumer_mcp_server::McpServerBuilder;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let server = McpServerBuilder::new("my-server", "1.0.0").build()?;
//!     server.run_stdio().await
//! }
//! ```

// ============================================================================
// Module declarations
// ============================================================================

mod builder;
mod handlers;
mod server;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::McpServerBuilder;
pub use handlers::{ToolCallError, ToolHandler};
pub use server::{McpServer, ServerState};

pub use insumer_mcp_types;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use insumer_mcp_types::{
        CallToolResult, ErrorCode, InitializeParams, InitializeResult, JsonRpcRequest,
        JsonRpcResponse, ListToolsResult, PropertySchema, RequestId, Tool, ToolInputSchema,
        methods,
    };
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    struct EchoTool;

    #[async_trait::async_trait]
    impl ToolHandler for EchoTool {
        fn tool(&self) -> Tool {
            Tool::new("echo", "Echo input").with_schema(
                ToolInputSchema::object().property("message", PropertySchema::string()),
            )
        }

        async fn execute(&self, arguments: Value) -> Result<CallToolResult, ToolCallError> {
            match arguments.get("message").and_then(Value::as_str) {
                Some(message) => Ok(CallToolResult::text(message)),
                None => Err(ToolCallError::invalid_arguments(
                    "message: required",
                    Some(json!({ "path": "message" })),
                )),
            }
        }
    }

    struct BrokenTool;

    #[async_trait::async_trait]
    impl ToolHandler for BrokenTool {
        fn tool(&self) -> Tool {
            Tool::new("broken", "Always fails")
        }

        async fn execute(&self, _arguments: Value) -> Result<CallToolResult, ToolCallError> {
            Err(anyhow!("backend exploded").into())
        }
    }

    fn server() -> Arc<McpServer> {
        McpServerBuilder::new("test-server", "1.0.0")
            .tool_handler(Arc::new(EchoTool))
            .tool_handler(Arc::new(BrokenTool))
            .instructions("Test instructions")
            .build()
            .unwrap()
    }

    fn request(id: i64, method: &str, params: Value) -> JsonRpcRequest {
        serde_json::from_value(json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }))
            .unwrap()
    }

    fn call(name: &str, arguments: Value) -> JsonRpcRequest {
        request(7, methods::TOOLS_CALL, json!({ "name": name, "arguments": arguments }))
    }

    fn error_code(response: &JsonRpcResponse) -> Option<i32> {
        response.error.as_ref().map(|e| e.code)
    }

    #[tokio::test]
    async fn test_server_creation() {
        let server = server();
        assert_eq!(server.info().name, "test-server");
        assert_eq!(server.info().version, "1.0.0");
        assert!(server.capabilities().tools.is_some());
        assert_eq!(
            serde_json::to_value(server.capabilities()).unwrap(),
            json!({ "tools": { "listChanged": false } })
        );
        assert!(!server.is_running());
    }

    #[test]
    fn test_duplicate_tool_names_rejected() {
        let result = McpServerBuilder::new("test-server", "1.0.0")
            .tool_handlers([
                Arc::new(EchoTool) as Arc<dyn ToolHandler>,
                Arc::new(EchoTool) as Arc<dyn ToolHandler>,
            ])
            .build();
        let message = result.err().map(|e| e.to_string()).unwrap_or_default();
        assert!(message.contains("Duplicate tool name: echo"));
    }

    #[tokio::test]
    async fn test_initialize_request() {
        let server = server();
        let params = serde_json::to_value(InitializeParams::default()).unwrap();

        let response = server.handle_request(request(1, methods::INITIALIZE, params)).await;
        assert_eq!(error_code(&response), None);

        let result: InitializeResult = serde_json::from_value(response.result.unwrap()).unwrap();
        assert_eq!(result.server_info.name, "test-server");
        assert_eq!(result.instructions.as_deref(), Some("Test instructions"));
        assert_eq!(
            server.protocol_version().await.as_deref(),
            Some(insumer_mcp_types::LATEST_PROTOCOL_VERSION)
        );
        assert_eq!(
            server.client_info().await.map(|c| c.name).as_deref(),
            Some("unknown-client")
        );
    }

    #[tokio::test]
    async fn test_second_initialize_is_rejected() {
        let server = server();
        let first = server
            .handle_request(request(1, methods::INITIALIZE, Value::Null))
            .await;
        assert_eq!(error_code(&first), None);

        let second = server
            .handle_request(request(2, methods::INITIALIZE, Value::Null))
            .await;
        assert_eq!(error_code(&second), Some(ErrorCode::INVALID_REQUEST));
    }

    #[tokio::test]
    async fn test_list_tools_keeps_registration_order() {
        let server = server();
        let response = server
            .handle_request(request(1, methods::TOOLS_LIST, Value::Null))
            .await;
        assert_eq!(error_code(&response), None);

        let result: ListToolsResult = serde_json::from_value(response.result.unwrap()).unwrap();
        let names: Vec<_> = result.tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["echo", "broken"]);
    }

    #[tokio::test]
    async fn test_call_tool_request() {
        let server = server();
        let response = server
            .handle_request(call("echo", json!({ "message": "Hello, World!" })))
            .await;
        assert_eq!(error_code(&response), None);

        let result: CallToolResult = serde_json::from_value(response.result.unwrap()).unwrap();
        assert!(!result.is_error());
        assert_eq!(result.first_text(), Some("Hello, World!"));
    }

    #[tokio::test]
    async fn test_invalid_arguments_become_invalid_params() {
        let server = server();
        let response = server.handle_request(call("echo", json!({}))).await;

        let error = response.error.unwrap();
        assert_eq!(error.code, ErrorCode::INVALID_PARAMS);
        assert_eq!(error.message, "message: required");
        assert_eq!(error.data, Some(json!({ "path": "message" })));
    }

    #[tokio::test]
    async fn test_internal_failure_becomes_error_result() {
        let server = server();
        let response = server.handle_request(call("broken", json!({}))).await;
        assert_eq!(error_code(&response), None);

        let result: CallToolResult = serde_json::from_value(response.result.unwrap()).unwrap();
        assert!(result.is_error());
        assert_eq!(result.first_text(), Some("backend exploded"));
    }

    #[tokio::test]
    async fn test_unknown_tool_and_method() {
        let server = server();

        let response = server.handle_request(call("nope", json!({}))).await;
        assert_eq!(response.error.unwrap().code, ErrorCode::INVALID_PARAMS);

        let response = server
            .handle_request(request(1, "resources/list", Value::Null))
            .await;
        assert_eq!(response.error.unwrap().code, ErrorCode::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_ping_and_set_log_level() {
        let server = server();

        let response = server.handle_request(request(1, methods::PING, Value::Null)).await;
        assert_eq!(response.result, Some(json!({})));

        let response = server
            .handle_request(request(2, methods::LOGGING_SET_LEVEL, json!({ "level": "debug" })))
            .await;
        assert_eq!(response.result, Some(json!({})));

        let response = server
            .handle_request(request(3, methods::LOGGING_SET_LEVEL, json!({ "level": "verbose" })))
            .await;
        assert_eq!(error_code(&response), Some(ErrorCode::INVALID_PARAMS));
    }

    #[tokio::test]
    async fn test_server_state_transitions() {
        let server = server();
        assert_eq!(server.state().await, ServerState::Uninitialized);

        server
            .handle_request(request(1, methods::INITIALIZE, Value::Null))
            .await;
        assert_eq!(server.state().await, ServerState::Initializing);

        let initialized = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
        assert!(server.handle_message(initialized).await.is_none());
        assert_eq!(server.state().await, ServerState::Ready);

        server.stop().await;
        assert_eq!(server.state().await, ServerState::ShuttingDown);
    }

    #[tokio::test]
    async fn test_handle_message_classifies_frames() {
        let server = server();

        let response = server
            .handle_message(r#"{"jsonrpc":"2.0","id":"a","method":"ping"}"#)
            .await;
        assert!(response.is_some_and(|r| r.error.is_none()));

        let response = server
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/cancelled"}"#)
            .await;
        assert!(response.is_none());

        let response = server.handle_message("not json").await.unwrap();
        assert_eq!(response.id, RequestId::Null);
        assert_eq!(error_code(&response), Some(ErrorCode::PARSE_ERROR));
    }

    #[tokio::test]
    async fn test_requests_with_wide_numeric_ids_are_answered() {
        let server = server();

        let frames = [
            (r#"{"jsonrpc":"2.0","id":1.5,"method":"ping"}"#, json!(1.5)),
            (
                r#"{"jsonrpc":"2.0","id":18446744073709551615,"method":"tools/list"}"#,
                json!(u64::MAX),
            ),
        ];
        for (frame, id) in frames {
            let response = server.handle_message(frame).await.expect("request answered");
            assert_eq!(error_code(&response), None, "{frame}");

            let wire = serde_json::to_value(&response).unwrap();
            assert_eq!(wire["id"], id);
        }
    }

    #[tokio::test]
    async fn test_well_formed_json_with_wrong_shape_is_invalid_request() {
        let server = server();

        let response = server
            .handle_message(r#"{"jsonrpc":"2.0","id":9,"method":42}"#)
            .await
            .unwrap();
        assert_eq!(response.id, RequestId::Number(9.into()));
        assert_eq!(error_code(&response), Some(ErrorCode::INVALID_REQUEST));

        let response = server
            .handle_message(r#"{"jsonrpc":"2.0","method":42}"#)
            .await
            .unwrap();
        assert_eq!(response.id, RequestId::Null);
        assert_eq!(error_code(&response), Some(ErrorCode::INVALID_REQUEST));
    }

    #[tokio::test]
    async fn test_serve_answers_every_request_then_stops_on_eof() {
        let server = server();
        let (mut client_in, server_in) = tokio::io::duplex(4096);
        let (server_out, client_out) = tokio::io::duplex(4096);

        let serving = tokio::spawn(server.clone().serve(server_in, server_out));

        let frames = [
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"echo","arguments":{"message":"hi"}}}"#,
            "",
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/list"}"#,
        ];
        for frame in frames {
            client_in.write_all(frame.as_bytes()).await.unwrap();
            client_in.write_all(b"\n").await.unwrap();
        }
        drop(client_in);

        serving.await.unwrap().unwrap();

        let mut lines = BufReader::new(client_out).lines();
        let mut ids = Vec::new();
        while let Some(line) = lines.next_line().await.unwrap() {
            let value: Value = serde_json::from_str(&line).unwrap();
            assert!(value.get("error").is_none(), "unexpected error: {line}");
            ids.push(value["id"].as_i64().unwrap());
        }
        ids.sort_unstable();
        assert_eq!(ids, [1, 2, 3]);
        assert_eq!(server.state().await, ServerState::Stopped);
    }
}
