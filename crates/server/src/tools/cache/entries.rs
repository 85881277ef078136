//! cache_entries tool implementation.
//!
//! Lists the URLs stored under one cache version.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::{CacheDb, CacheStorage, Error};

/// Parameters for the cache_entries tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheEntriesParams {
    /// Cache version name.
    pub name: String,
}

/// Output from the cache_entries tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheEntriesOutput {
    pub name: String,
    pub urls: Vec<String>,
}

/// Implementation of the cache_entries tool.
pub async fn entries_impl(cache: &CacheDb, params: CacheEntriesParams) -> Result<CallToolResult, McpError> {
    if !cache.exists(&params.name).await? {
        return Err(Error::CacheMiss(params.name).into());
    }

    let urls = cache.keys(&params.name).await?;
    let output = CacheEntriesOutput { name: params.name, urls };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
