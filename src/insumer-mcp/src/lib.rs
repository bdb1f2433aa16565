//! Insumer MCP server assembly.
//!
//! Wires the upstream client, the tool catalog and the protocol server
//! together. The binary in `main.rs` adds the CLI and logging on top.

use std::sync::Arc;

use anyhow::{Context, Result};
use insumer_client::{ApiClient, ClientConfig, ClientError};
use insumer_mcp_server::{McpServer, McpServerBuilder};
use insumer_tools::tool_handlers;
use tracing::{info, warn};

/// Server name reported in the initialize handshake.
pub const SERVER_NAME: &str = "insumer";

/// Server version reported in the initialize handshake.
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Instructions returned to the client on initialize.
pub const INSTRUCTIONS: &str = "Tools for the Insumer on-chain verification API: \
wallet attestations and trust profiles, discount codes, the merchant directory, \
merchant onboarding and credit purchases. Set INSUMER_API_KEY to use tools that \
need an API key; insumer_jwks, insumer_compliance_templates and \
insumer_validate_code work without one.";

/// What to do when no API key is configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyPolicy {
    /// Start anyway; tools that need the key fail on each call.
    #[default]
    Warn,
    /// Refuse to start.
    Require,
}

/// Apply the key policy to a loaded configuration.
pub fn check_api_key(config: &ClientConfig, policy: KeyPolicy) -> Result<(), ClientError> {
    if config.has_api_key() {
        info!("API key configured");
        return Ok(());
    }
    match policy {
        KeyPolicy::Warn => {
            warn!(
                "{} Free tools stay available; the rest will fail until it is set.",
                ClientError::MissingApiKey
            );
            Ok(())
        }
        KeyPolicy::Require => Err(ClientError::MissingApiKey),
    }
}

/// Build the server with every catalog tool registered.
pub fn build_server(config: ClientConfig) -> Result<Arc<McpServer>> {
    let client = ApiClient::new(config).context("Failed to create Insumer API client")?;
    let handlers = tool_handlers(&client);
    info!(tools = handlers.len(), base_url = %client.config().base_url(), "Tool catalog loaded");

    McpServerBuilder::new(SERVER_NAME, SERVER_VERSION)
        .instructions(INSTRUCTIONS)
        .tool_handlers(handlers)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_policy() {
        let without = ClientConfig::new(None);
        let with = ClientConfig::new(Some("k".to_string()));

        assert!(check_api_key(&without, KeyPolicy::Warn).is_ok());
        assert!(matches!(
            check_api_key(&without, KeyPolicy::Require),
            Err(ClientError::MissingApiKey)
        ));
        assert!(check_api_key(&with, KeyPolicy::Require).is_ok());
        assert_eq!(KeyPolicy::default(), KeyPolicy::Warn);
    }

    #[test]
    fn test_build_server_registers_catalog() {
        let server = build_server(ClientConfig::new(None)).expect("server");
        assert_eq!(server.info().name, SERVER_NAME);
        assert_eq!(server.tools().len(), insumer_tools::catalog().len());
        assert!(server.capabilities().tools.is_some());
        let advertised = serde_json::to_value(server.capabilities()).unwrap();
        assert!(advertised.get("logging").is_none());
    }
}
