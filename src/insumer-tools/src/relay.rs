//! Mapping an upstream outcome onto a tool result.

use insumer_client::{ApiResponse, ClientError};
use insumer_mcp_types::CallToolResult;

/// Convert the outcome of one upstream call into the result the caller sees.
///
/// The parsed body is passed through verbatim as pretty-printed JSON with
/// its member order intact. It is flagged as an error unless the status is
/// 2xx and the body does not say `"ok": false`. Local and transport failures
/// become error results carrying their message.
pub fn relay(outcome: Result<ApiResponse, ClientError>) -> CallToolResult {
    match outcome {
        Ok(response) => {
            let text = serde_json::to_string_pretty(&response.body)
                .unwrap_or_else(|_| response.body.to_string());
            if response.is_success() {
                CallToolResult::text(text)
            } else {
                CallToolResult::error(text)
            }
        }
        Err(error) => CallToolResult::error(error.to_string()),
    }
}
