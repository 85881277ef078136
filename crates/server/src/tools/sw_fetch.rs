//! sw_fetch tool implementation.
//!
//! Hands one intercepted request to the router and reports how it was served.

use bytes::Bytes;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::{CacheRouter, canonicalize};
use shellcache_core::{Error, RequestDescriptor, RequestMode};

/// Input parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL, or a path resolved against the serving origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request mode: navigate, same-origin, no-cors, or cors (default: no-cors).
    #[serde(default = "default_mode")]
    pub mode: RequestMode,

    /// Declared destination, e.g. "document", "script", "serviceworker".
    #[serde(default)]
    pub destination: String,

    /// Request headers as name/value pairs, forwarded as-is.
    #[serde(default)]
    pub headers: Vec<(String, String)>,

    /// Optional request body, forwarded as-is.
    #[serde(default)]
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

fn default_mode() -> RequestMode {
    RequestMode::NoCors
}

/// Output structure for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// Response body decoded as UTF-8 (lossy).
    pub body: String,
    /// passthrough, network, cache, or offline_fallback.
    pub served_from: String,
    /// Routing label, e.g. "static" or "excluded:cross_origin".
    pub class: String,
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(router: &CacheRouter, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    if params.method.trim().is_empty() {
        return Err(Error::InvalidInput("method cannot be empty".into()).into());
    }

    let url = canonicalize(&params.url, &router.settings().rules.origin)
        .map_err(|e| Error::InvalidUrl(e.to_string()))?;

    let mut request = RequestDescriptor::new(&params.method, url, params.mode, &params.destination);
    for (name, value) in params.headers {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("header name cannot be empty".into()).into());
        }
        request = request.with_header(name, value);
    }
    if let Some(body) = params.body {
        request = request.with_body(Bytes::from(body));
    }

    let served = router.dispatch(&request).await?;

    let output = SwFetchOutput {
        url: request.url.to_string(),
        status: served.response.status,
        headers: served.response.headers.clone(),
        body: String::from_utf8_lossy(&served.response.body).to_string(),
        served_from: served.from.to_string(),
        class: served.class.to_string(),
    };

    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
