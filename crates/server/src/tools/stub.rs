//! Shared doubles for tool tests.

use std::sync::{Arc, Mutex};

use rmcp::model::CallToolResult;
use serde::de::DeserializeOwned;
use shellcache_client::{CacheRouter, Lifecycle, Network, RouterSettings};
use shellcache_core::{AppConfig, CacheDb, Error, RequestDescriptor, ResponseSnapshot};

pub(crate) const ORIGIN: &str = "https://news.example";

/// Network with at most one canned path; everything else is a 404.
#[derive(Default)]
pub(crate) struct StubNetwork {
    path: Option<String>,
    response: Option<ResponseSnapshot>,
    last_headers: Mutex<Vec<(String, String)>>,
}

impl StubNetwork {
    pub(crate) fn with(path: &str, response: ResponseSnapshot) -> Self {
        Self { path: Some(path.to_string()), response: Some(response), ..Self::default() }
    }

    /// Headers carried by the most recent request.
    pub(crate) fn last_headers(&self) -> Vec<(String, String)> {
        self.last_headers.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &RequestDescriptor) -> Result<ResponseSnapshot, Error> {
        *self.last_headers.lock().unwrap() = request.headers.clone();
        match (&self.path, &self.response) {
            (Some(path), Some(response)) if request.url.path() == path => Ok(response.clone()),
            _ => Ok(ResponseSnapshot::new(404, "not found")),
        }
    }
}

fn config(version: &str) -> AppConfig {
    AppConfig {
        origin: ORIGIN.into(),
        cache_version: version.into(),
        app_shell: vec!["/".into()],
        ..Default::default()
    }
}

/// Claimed router over a fresh in-memory store.
pub(crate) async fn router(network: Arc<StubNetwork>) -> (CacheRouter, Arc<CacheDb>) {
    let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
    let settings = RouterSettings::from_config(&config("v1")).unwrap();
    let router = CacheRouter::new(network, db.clone(), settings);
    router.claim();
    (router, db)
}

/// Unclaimed lifecycle with app shell `["/"]`.
pub(crate) async fn lifecycle(network: Arc<StubNetwork>, version: &str) -> (Lifecycle, Arc<CacheDb>) {
    let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
    let config = config(version);
    let settings = RouterSettings::from_config(&config).unwrap();
    let router = Arc::new(CacheRouter::new(network, db.clone(), settings));
    (Lifecycle::new(router, config.app_shell), db)
}

/// Decode the JSON text content of a tool result.
pub(crate) fn output_of<T: DeserializeOwned>(result: &CallToolResult) -> T {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
