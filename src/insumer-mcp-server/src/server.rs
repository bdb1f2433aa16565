//! MCP Server core implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, error, info, warn};

use insumer_mcp_types::{
    CallToolParams, CallToolResult, Frame, Implementation, InitializeParams, InitializeResult,
    JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, ListToolsResult,
    RequestId, ServerCapabilities, SetLogLevelParams, Tool, methods,
};

use crate::handlers::{ToolCallError, ToolHandler};

// ============================================================================
// MCP Server
// ============================================================================

/// MCP server state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Server is not initialized.
    Uninitialized,
    /// `initialize` answered, waiting for `notifications/initialized`.
    Initializing,
    /// Server is ready to handle requests.
    Ready,
    /// Server is shutting down.
    ShuttingDown,
    /// Server has stopped.
    Stopped,
}

/// MCP Server implementation.
///
/// The tool catalog is fixed at construction; everything mutable here is
/// protocol bookkeeping, never per-call tool state.
pub struct McpServer {
    /// Server implementation info.
    pub(crate) info: Implementation,
    /// Server capabilities.
    pub(crate) capabilities: ServerCapabilities,
    /// Tool handlers in registration order.
    pub(crate) tools: Vec<Arc<dyn ToolHandler>>,
    /// Tool name to position in `tools`.
    pub(crate) tool_index: HashMap<String, usize>,
    /// Server state.
    pub(crate) state: RwLock<ServerState>,
    /// Whether the server is running.
    pub(crate) running: AtomicBool,
    /// Client info (set after initialization).
    pub(crate) client_info: RwLock<Option<Implementation>>,
    /// Protocol version negotiated.
    pub(crate) protocol_version: RwLock<Option<String>>,
    /// Optional instructions for clients.
    pub(crate) instructions: Option<String>,
}

impl McpServer {
    /// Get server info.
    pub fn info(&self) -> &Implementation {
        &self.info
    }

    /// Get server capabilities.
    pub fn capabilities(&self) -> &ServerCapabilities {
        &self.capabilities
    }

    /// Get current state.
    pub async fn state(&self) -> ServerState {
        *self.state.read().await
    }

    /// Check if server is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get all registered tools, in registration order.
    pub fn tools(&self) -> Vec<Tool> {
        self.tools.iter().map(|h| h.tool()).collect()
    }

    /// Protocol version agreed during `initialize`, if it happened.
    pub async fn protocol_version(&self) -> Option<String> {
        self.protocol_version.read().await.clone()
    }

    /// Client that completed `initialize`, if any.
    pub async fn client_info(&self) -> Option<Implementation> {
        self.client_info.read().await.clone()
    }

    // ========================================================================
    // Request Handlers
    // ========================================================================

    /// Handle a JSON-RPC request.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!(method = %request.method, id = %request.id, "Handling request");

        let result = match request.method.as_str() {
            methods::INITIALIZE => self.handle_initialize(request.params).await,
            methods::PING => Ok(json!({})),
            methods::TOOLS_LIST => self.handle_list_tools(),
            methods::TOOLS_CALL => self.handle_call_tool(request.params).await,
            methods::LOGGING_SET_LEVEL => self.handle_set_log_level(request.params),
            _ => Err(JsonRpcError::method_not_found(&request.method)),
        };

        match result {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(error) => JsonRpcResponse::error(request.id, error),
        }
    }

    /// Handle a JSON-RPC notification.
    pub async fn handle_notification(&self, notification: JsonRpcNotification) {
        debug!(method = %notification.method, "Handling notification");

        match notification.method.as_str() {
            methods::INITIALIZED => {
                *self.state.write().await = ServerState::Ready;
                info!("Server initialized and ready");
            }
            methods::CANCELLED => {
                // Upstream calls are one-shot round trips; there is nothing to abort.
                debug!(params = ?notification.params, "Cancellation ignored");
            }
            _ => {
                warn!(method = %notification.method, "Unknown notification");
            }
        }
    }

    /// Classify one transport frame and handle it.
    ///
    /// Returns the response to write back, or `None` for notifications.
    /// Lines that are not JSON get `-32700`; JSON that is not a request or
    /// notification gets `-32600`, echoing the id when one was readable.
    pub async fn handle_message(&self, line: &str) -> Option<JsonRpcResponse> {
        match Frame::parse(line) {
            Ok(Frame::Request(request)) => Some(self.handle_request(request).await),
            Ok(Frame::Notification(notification)) => {
                self.handle_notification(notification).await;
                None
            }
            Ok(Frame::Invalid { id, reason }) => {
                warn!(%id, %reason, "Invalid JSON-RPC request");
                Some(JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_request(format!("Invalid request: {reason}")),
                ))
            }
            Err(e) => {
                warn!(error = %e, line = %line, "Unparseable JSON-RPC frame");
                Some(JsonRpcResponse::error(
                    RequestId::Null,
                    JsonRpcError::parse_error(format!("Parse error: {e}")),
                ))
            }
        }
    }

    async fn handle_initialize(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let init_params: InitializeParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {e}")))?
            .unwrap_or_default();

        // Hold the write lock across check and transition so two concurrent
        // initialize requests cannot both succeed.
        {
            let mut state_guard = self.state.write().await;
            if *state_guard != ServerState::Uninitialized {
                return Err(JsonRpcError::invalid_request("Server already initialized"));
            }
            *state_guard = ServerState::Initializing;
        }

        let result = InitializeResult::negotiated(
            &init_params.protocol_version,
            self.info.clone(),
            self.capabilities.clone(),
        )
        .with_instructions(self.instructions.clone());

        info!(
            client = %init_params.client_info.name,
            version = %init_params.client_info.version,
            requested = %init_params.protocol_version,
            negotiated = %result.protocol_version,
            "Client connected"
        );

        *self.client_info.write().await = Some(init_params.client_info);
        *self.protocol_version.write().await = Some(result.protocol_version.clone());

        serde_json::to_value(result).map_err(|e| JsonRpcError::internal_error(e.to_string()))
    }

    fn handle_list_tools(&self) -> Result<Value, JsonRpcError> {
        let result = ListToolsResult::new(self.tools());
        serde_json::to_value(result).map_err(|e| JsonRpcError::internal_error(e.to_string()))
    }

    async fn handle_call_tool(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let call_params: CallToolParams = params
            .ok_or_else(|| JsonRpcError::invalid_params("Missing params"))
            .and_then(|p| {
                serde_json::from_value(p)
                    .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {e}")))
            })?;

        let handler = self
            .tool_index
            .get(&call_params.name)
            .map(|&i| self.tools[i].clone())
            .ok_or_else(|| {
                JsonRpcError::invalid_params(format!("Unknown tool: {}", call_params.name))
            })?;

        debug!(tool = %call_params.name, "Calling tool");

        let arguments = call_params.arguments.unwrap_or_else(|| json!({}));
        let call_result = match handler.execute(arguments).await {
            Ok(call_result) => call_result,
            Err(ToolCallError::InvalidArguments { message, data }) => {
                debug!(tool = %call_params.name, %message, "Rejected tool arguments");
                let error = JsonRpcError::invalid_params(message);
                return Err(match data {
                    Some(data) => error.with_data(data),
                    None => error,
                });
            }
            Err(ToolCallError::Internal(e)) => {
                error!(tool = %call_params.name, error = %e, "Tool failed");
                CallToolResult::error(e.to_string())
            }
        };

        serde_json::to_value(call_result).map_err(|e| JsonRpcError::internal_error(e.to_string()))
    }

    fn handle_set_log_level(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let level_params: SetLogLevelParams = params
            .ok_or_else(|| JsonRpcError::invalid_params("Missing params"))
            .and_then(|p| {
                serde_json::from_value(p)
                    .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {e}")))
            })?;

        // Server logs go to stderr under the process filter; the requested
        // level is acknowledged but changes nothing.
        debug!(level = %level_params.level, "Client log level request acknowledged");

        Ok(json!({}))
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// Run the server with stdio transport.
    pub async fn run_stdio(self: Arc<Self>) -> Result<()> {
        info!(server = %self.info.name, "Starting MCP server with stdio transport");
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve newline-delimited JSON-RPC frames from `reader`, answering on `writer`.
    ///
    /// Each request runs on its own task. Responses go through a single writer
    /// task so frames never interleave. Returns once `reader` hits EOF and all
    /// in-flight requests have been answered.
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        self.running.store(true, Ordering::SeqCst);

        let (tx, rx) = mpsc::unbounded_channel::<JsonRpcResponse>();
        let writer_task = tokio::spawn(write_responses(rx, writer));

        let mut reader = BufReader::new(reader);
        let mut line = String::new();

        while self.running.load(Ordering::SeqCst) {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    debug!("EOF received, shutting down");
                    break;
                }
                Ok(_) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    let frame = trimmed.to_string();
                    let server = self.clone();
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        if let Some(response) = server.handle_message(&frame).await {
                            // The writer only goes away after a write failure, which it logs.
                            let _ = tx.send(response);
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "Error reading from transport");
                    break;
                }
            }
        }

        drop(tx);
        let written = writer_task.await.context("Response writer panicked")?;

        *self.state.write().await = ServerState::Stopped;
        self.running.store(false, Ordering::SeqCst);
        info!("MCP server stopped");

        written
    }

    /// Stop the server after the frame currently being read.
    pub async fn stop(&self) {
        info!("Stopping MCP server");
        *self.state.write().await = ServerState::ShuttingDown;
        self.running.store(false, Ordering::SeqCst);
    }
}

async fn write_responses<W>(mut rx: mpsc::UnboundedReceiver<JsonRpcResponse>, mut writer: W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut frame = serde_json::to_vec(&response).context("Failed to serialize response")?;
        frame.push(b'\n');
        if let Err(e) = writer.write_all(&frame).await {
            error!(error = %e, "Failed to write response");
            return Err(e).context("Failed to write response");
        }
        writer.flush().await.context("Failed to flush response")?;
    }
    Ok(())
}
