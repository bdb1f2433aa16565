//! MCP Server builder.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::{Result, bail};
use insumer_mcp_types::{Implementation, ServerCapabilities};
use tokio::sync::RwLock;

use crate::handlers::ToolHandler;
use crate::server::{McpServer, ServerState};

/// Builder for creating MCP servers.
pub struct McpServerBuilder {
    name: String,
    version: String,
    capabilities: ServerCapabilities,
    tools: Vec<Arc<dyn ToolHandler>>,
    instructions: Option<String>,
}

impl McpServerBuilder {
    /// Create a new server builder.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            capabilities: ServerCapabilities::default(),
            tools: Vec::new(),
            instructions: None,
        }
    }

    /// Add a tool handler.
    pub fn tool_handler(mut self, handler: Arc<dyn ToolHandler>) -> Self {
        self.tools.push(handler);
        self.capabilities = self.capabilities.with_tools();
        self
    }

    /// Add several tool handlers, keeping their order.
    pub fn tool_handlers(self, handlers: impl IntoIterator<Item = Arc<dyn ToolHandler>>) -> Self {
        handlers.into_iter().fold(self, Self::tool_handler)
    }

    /// Set instructions for clients.
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Build the server. Fails if two handlers claim the same tool name.
    pub fn build(self) -> Result<Arc<McpServer>> {
        let mut tool_index = HashMap::with_capacity(self.tools.len());
        for (i, handler) in self.tools.iter().enumerate() {
            let name = handler.tool().name;
            if tool_index.insert(name.clone(), i).is_some() {
                bail!("Duplicate tool name: {name}");
            }
        }

        Ok(Arc::new(McpServer {
            info: Implementation::new(self.name, self.version),
            capabilities: self.capabilities,
            tools: self.tools,
            tool_index,
            state: RwLock::new(ServerState::Uninitialized),
            running: AtomicBool::new(false),
            client_info: RwLock::new(None),
            protocol_version: RwLock::new(None),
            instructions: self.instructions,
        }))
    }
}
