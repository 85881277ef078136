//! Retrieval strategies.
//!
//! | Class      | Policy                                         |
//! |------------|------------------------------------------------|
//! | Excluded   | forward untouched                              |
//! | Navigation | network-first, offline document on transport failure |
//! | Static     | cache-first, detached store write on miss      |
//!
//! Store failures never reach the caller: reads degrade to a miss and
//! writes run in a detached task whose errors are logged and dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use shellcache_core::{AppConfig, CacheStorage, ConfigError, Error, RequestDescriptor, RequestKey, ResponseSnapshot};
use tokio::task::JoinHandle;
use url::Url;

use super::classify::{RequestClass, RouteRules, classify};
use crate::fetch::Network;

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServedFrom {
    /// Forwarded without touching the store.
    Passthrough,
    Network,
    Cache,
    /// Network unreachable; the stored offline document was served instead.
    OfflineFallback,
}

impl std::fmt::Display for ServedFrom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ServedFrom::Passthrough => "passthrough",
            ServedFrom::Network => "network",
            ServedFrom::Cache => "cache",
            ServedFrom::OfflineFallback => "offline_fallback",
        })
    }
}

/// Outcome of routing one request.
#[derive(Debug)]
pub struct Served {
    pub response: ResponseSnapshot,
    pub from: ServedFrom,
    pub class: RequestClass,
    /// Store write started by a cache-first miss, if any.
    pub write: Option<DetachedWrite>,
}

/// A store write running off the response path.
///
/// The task's output is `()`: a failed write is logged inside the task and
/// can never be observed by the caller. Dropping the handle detaches it.
#[derive(Debug)]
pub struct DetachedWrite {
    handle: JoinHandle<()>,
}

impl DetachedWrite {
    fn spawn(store: Arc<dyn CacheStorage>, version: String, key: RequestKey, response: ResponseSnapshot) -> Self {
        let handle = tokio::spawn(async move {
            match store.put(&version, &key, &response).await {
                Ok(()) => tracing::debug!(url = key.url(), version = %version, "stored"),
                Err(e) => tracing::warn!(url = key.url(), version = %version, error = %e, "cache write failed"),
            }
        });
        Self { handle }
    }

    /// Wait until the write has finished, successfully or not.
    pub async fn settled(self) {
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "cache write task aborted");
        }
    }
}

/// Static inputs of a router.
#[derive(Debug, Clone)]
pub struct RouterSettings {
    /// Current cache version; the only store read or written.
    pub version: String,
    pub rules: RouteRules,
    /// Absolute URL of the offline document.
    pub offline_document: Url,
    /// Skip storing non-2xx responses on a static miss.
    pub store_success_only: bool,
    /// Bodies larger than this are served but not stored.
    pub max_entry_bytes: usize,
}

impl RouterSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let rules = RouteRules::from_config(config)?;
        let offline_document = rules
            .origin
            .join(&config.offline_document)
            .map_err(|e| ConfigError::Invalid { field: "offline_document".into(), reason: e.to_string() })?;
        Ok(Self {
            version: config.cache_version.clone(),
            rules,
            offline_document,
            store_success_only: config.store_success_only,
            max_entry_bytes: config.max_bytes,
        })
    }
}

/// Routes intercepted requests between the store and the network.
pub struct CacheRouter {
    network: Arc<dyn Network>,
    store: Arc<dyn CacheStorage>,
    settings: RouterSettings,
    controlling: AtomicBool,
}

impl CacheRouter {
    pub fn new(network: Arc<dyn Network>, store: Arc<dyn CacheStorage>, settings: RouterSettings) -> Self {
        Self { network, store, settings, controlling: AtomicBool::new(false) }
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    pub fn version(&self) -> &str {
        &self.settings.version
    }

    pub(crate) fn network(&self) -> &Arc<dyn Network> {
        &self.network
    }

    pub(crate) fn store(&self) -> &Arc<dyn CacheStorage> {
        &self.store
    }

    /// Start intercepting requests from every open client.
    pub fn claim(&self) {
        if !self.controlling.swap(true, Ordering::SeqCst) {
            tracing::info!(version = %self.settings.version, "claimed clients");
        }
    }

    /// Whether requests are currently intercepted.
    pub fn is_controlling(&self) -> bool {
        self.controlling.load(Ordering::SeqCst)
    }

    /// Serve `request` and return only the response.
    pub async fn handle(&self, request: &RequestDescriptor) -> Result<ResponseSnapshot, Error> {
        self.dispatch(request).await.map(|served| served.response)
    }

    /// Serve `request`, reporting how it was served.
    pub async fn dispatch(&self, request: &RequestDescriptor) -> Result<Served, Error> {
        let class = classify(&self.settings.rules, request);

        if !self.is_controlling() {
            tracing::debug!(url = %request.url, "not controlling yet; forwarding");
            return self.passthrough(request, class).await;
        }

        tracing::debug!(method = %request.method, url = %request.url, ?class, "routing");

        match class {
            RequestClass::Excluded(_) => self.passthrough(request, class).await,
            RequestClass::Navigation => self.network_first(request, class).await,
            RequestClass::Static => self.cache_first(request, class).await,
        }
    }

    async fn passthrough(&self, request: &RequestDescriptor, class: RequestClass) -> Result<Served, Error> {
        let response = self.network.fetch(request).await?;
        Ok(Served { response, from: ServedFrom::Passthrough, class, write: None })
    }

    async fn network_first(&self, request: &RequestDescriptor, class: RequestClass) -> Result<Served, Error> {
        let err = match self.network.fetch(request).await {
            Ok(response) => return Ok(Served { response, from: ServedFrom::Network, class, write: None }),
            Err(e) if e.is_transport() => e,
            Err(e) => return Err(e),
        };

        let key = RequestKey::get(&self.settings.offline_document);
        match self.store.match_request(&self.settings.version, &key).await {
            Ok(Some(response)) => {
                tracing::info!(url = %request.url, error = %err, "network unreachable; serving offline document");
                Ok(Served { response, from: ServedFrom::OfflineFallback, class, write: None })
            }
            Ok(None) => {
                tracing::warn!(url = %request.url, document = key.url(), "offline document not in cache");
                Err(err)
            }
            Err(store_err) => {
                tracing::warn!(url = %request.url, error = %store_err, "offline document lookup failed");
                Err(err)
            }
        }
    }

    async fn cache_first(&self, request: &RequestDescriptor, class: RequestClass) -> Result<Served, Error> {
        let key = RequestKey::get(&request.url);

        match self.store.match_request(&self.settings.version, &key).await {
            Ok(Some(response)) => return Ok(Served { response, from: ServedFrom::Cache, class, write: None }),
            Ok(None) => {}
            Err(e) => tracing::warn!(url = key.url(), error = %e, "cache read failed; treating as miss"),
        }

        let response = self.network.fetch(request).await?;

        let write = if self.settings.store_success_only && !response.is_success() {
            tracing::debug!(url = key.url(), status = response.status, "not storing error response");
            None
        } else if response.body.len() > self.settings.max_entry_bytes {
            tracing::debug!(url = key.url(), bytes = response.body.len(), "not storing oversized response");
            None
        } else {
            Some(DetachedWrite::spawn(
                Arc::clone(&self.store),
                self.settings.version.clone(),
                key,
                response.clone(),
            ))
        };

        Ok(Served { response, from: ServedFrom::Network, class, write })
    }
}
