//! cache_list tool implementation.
//!
//! Lists every cache version with its entry count.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::{CacheDb, Error, StoreSummary};

/// Output from the cache_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheListOutput {
    /// The version the router reads and writes.
    pub current: String,
    pub caches: Vec<StoreSummary>,
}

/// Implementation of the cache_list tool.
pub async fn list_impl(cache: &CacheDb, current: &str) -> Result<CallToolResult, McpError> {
    let caches = cache.summaries().await?;
    let output = CacheListOutput { current: current.to_string(), caches };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::stub::output_of;
    use shellcache_core::{CacheStorage, RequestKey, ResponseSnapshot};

    #[tokio::test]
    async fn test_list_counts() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let key = RequestKey::get(&url::Url::parse("https://news.example/").unwrap());
        cache.put("v1", &key, &ResponseSnapshot::new(200, "a")).await.unwrap();
        cache.open("v2").await.unwrap();

        let output: CacheListOutput = output_of(&list_impl(&cache, "v2").await.unwrap());
        assert_eq!(output.current, "v2");
        assert_eq!(output.caches.len(), 2);
        let v1 = output.caches.iter().find(|c| c.name == "v1").unwrap();
        assert_eq!(v1.entries, 1);
    }

    #[tokio::test]
    async fn test_list_empty() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let output: CacheListOutput = output_of(&list_impl(&cache, "v1").await.unwrap());
        assert!(output.caches.is_empty());
    }
}
