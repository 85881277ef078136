//! MCP server handler implementation.
//!
//! Plays the hosting runtime for the cache router: lifecycle events and
//! intercepted fetches arrive as tool calls and are routed to the
//! implementations in `tools`.
use std::sync::Arc;

use crate::tools::{
    cache::{CacheEntriesParams, entries_impl, list_impl},
    lifecycle::{activate_impl, install_impl},
    sw_fetch::{SwFetchParams, fetch_impl},
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use shellcache_client::Lifecycle;
use shellcache_core::CacheDb;

/// The main MCP server handler for shellcache.
#[derive(Clone)]
pub struct ShellCacheServer {
    tool_router: ToolRouter<Self>,
    db: Arc<CacheDb>,
    lifecycle: Arc<Lifecycle>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl ShellCacheServer {
    /// Create a new server handler over an opened store and lifecycle.
    pub fn new(db: Arc<CacheDb>, lifecycle: Arc<Lifecycle>) -> Self {
        Self { tool_router: Self::tool_router(), db, lifecycle }
    }

    /// Route one intercepted request through the cache router.
    #[tool(description = "Serve a request as the offline cache router would. Returns status, headers, body, \
                          where it was served from, and the routing class.")]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(self.lifecycle.router(), params.0).await
    }

    /// Re-run the install phase for the current version.
    #[tool(description = "Fetch and store the app shell under the current cache version.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.lifecycle).await
    }

    /// Run the activate phase for the current version.
    #[tool(description = "Delete every cache version except the current one and start intercepting requests.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.lifecycle).await
    }

    /// List cache versions.
    #[tool(description = "List cache versions with their entry counts.")]
    async fn cache_list(&self) -> Result<CallToolResult, McpError> {
        list_impl(&self.db, self.lifecycle.router().version()).await
    }

    /// List the URLs stored under one version.
    #[tool(description = "List the request URLs stored under a cache version.")]
    async fn cache_entries(&self, params: Parameters<CacheEntriesParams>) -> Result<CallToolResult, McpError> {
        entries_impl(&self.db, params.0).await
    }
}

impl ServerHandler for ShellCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "shellcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
