//! sw_install and sw_activate tool implementations.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::Lifecycle;
use shellcache_core::Error;

/// Output from the sw_install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwInstallOutput {
    pub version: String,
    /// App shell entries now stored under `version`.
    pub cached: usize,
}

/// Output from the sw_activate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwActivateOutput {
    pub version: String,
    /// Stale versions that were deleted.
    pub deleted: Vec<String>,
}

fn to_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Implementation of the sw_install tool.
pub async fn install_impl(lifecycle: &Lifecycle) -> Result<CallToolResult, McpError> {
    let outcome = lifecycle.install().await?;
    to_result(&SwInstallOutput { version: outcome.version, cached: outcome.cached })
}

/// Implementation of the sw_activate tool.
pub async fn activate_impl(lifecycle: &Lifecycle) -> Result<CallToolResult, McpError> {
    let outcome = lifecycle.activate().await?;
    to_result(&SwActivateOutput { version: outcome.version, deleted: outcome.deleted })
}
