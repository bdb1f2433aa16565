//! [`ToolHandler`] implementation backed by the catalog.

use std::sync::Arc;

use async_trait::async_trait;
use insumer_client::{ApiClient, ClientError};
use insumer_mcp_server::{ToolCallError, ToolHandler};
use insumer_mcp_types::{CallToolResult, Tool};
use serde_json::Value;
use tracing::{debug, warn};

use crate::catalog::{ToolSpec, catalog};
use crate::dispatch::build_request;
use crate::relay::relay;
use crate::schema::validate;

/// One catalog entry bound to the shared upstream client.
pub struct ApiTool {
    spec: ToolSpec,
    tool: Tool,
    client: ApiClient,
}

impl ApiTool {
    pub fn new(spec: ToolSpec, client: ApiClient) -> Self {
        let tool = spec.tool();
        Self { spec, tool, client }
    }
}

#[async_trait]
impl ToolHandler for ApiTool {
    fn tool(&self) -> Tool {
        self.tool.clone()
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult, ToolCallError> {
        let name = self.spec.name;

        let args = validate(&self.spec.fields, &arguments).map_err(|error| {
            debug!(tool = name, path = %error.path, "Rejected arguments");
            ToolCallError::invalid_arguments(format!("{name}: {error}"), Some(error.to_data(name)))
        })?;

        let request = build_request(&self.spec.route, args).map_err(anyhow::Error::from)?;
        debug!(tool = name, method = %request.method, path = %request.path, "Dispatching");

        let outcome = self.client.send(&request).await;
        if let Err(ClientError::MissingApiKey) = &outcome {
            warn!(tool = name, "API key required but not configured");
        }

        Ok(relay(outcome))
    }
}

/// Handlers for every tool in the catalog, sharing one client.
pub fn tool_handlers(client: &ApiClient) -> Vec<Arc<dyn ToolHandler>> {
    catalog()
        .into_iter()
        .map(|spec| Arc::new(ApiTool::new(spec, client.clone())) as Arc<dyn ToolHandler>)
        .collect()
}
