//! Install and activate phases.
//!
//! Install pre-warms the current version with the app shell. Activate
//! deletes every other version and then claims clients on the router.
//! Eviction is by version only: entries never expire on their own, so the
//! version must be bumped whenever the app shell or policy changes.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::try_join_all;
use serde::Serialize;
use shellcache_core::{Error, RequestDescriptor, RequestKey};
use tokio::sync::Mutex;
use url::Url;

use super::strategy::CacheRouter;

/// Result of a completed install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallOutcome {
    pub version: String,
    /// Distinct app shell entries written.
    pub cached: usize,
    /// Activate may run right away instead of waiting for clients to close.
    pub skip_waiting: bool,
}

/// Result of a completed activate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivateOutcome {
    pub version: String,
    /// Stale versions removed, in store order.
    pub deleted: Vec<String>,
    pub claimed: bool,
}

/// Drives the install/activate phases for one router.
pub struct Lifecycle {
    router: Arc<CacheRouter>,
    app_shell: Vec<String>,
    phase: Mutex<()>,
}

impl Lifecycle {
    pub fn new(router: Arc<CacheRouter>, app_shell: Vec<String>) -> Self {
        Self { router, app_shell, phase: Mutex::new(()) }
    }

    pub fn router(&self) -> &Arc<CacheRouter> {
        &self.router
    }

    fn shell_urls(&self) -> Result<Vec<Url>, Error> {
        let origin = &self.router.settings().rules.origin;
        self.app_shell
            .iter()
            .map(|path| origin.join(path).map_err(|e| Error::InvalidUrl(format!("{path}: {e}"))))
            .collect()
    }

    /// Populate the current version with the app shell.
    ///
    /// All resources are fetched before anything is written, and the
    /// writes land in one transaction. A transport failure or non-2xx
    /// status on any of them fails the install and leaves the store
    /// untouched apart from the opened (empty) version.
    pub async fn install(&self) -> Result<InstallOutcome, Error> {
        let _phase = self.phase.lock().await;
        let version = self.router.version().to_string();
        let store = self.router.store();
        let network = self.router.network();

        store.open(&version).await?;

        let urls = self.shell_urls()?;
        let fetched = try_join_all(urls.iter().map(|url| async move {
            let response = network
                .fetch(&RequestDescriptor::get(url.clone()))
                .await
                .map_err(|e| Error::InstallFailed(format!("{url}: {e}")))?;
            if !response.is_success() {
                return Err(Error::InstallFailed(format!("{url}: status {}", response.status)));
            }
            Ok::<_, Error>((RequestKey::get(url), response))
        }))
        .await?;

        store.put_all(&version, &fetched).await?;

        let cached = fetched.iter().map(|(key, _)| key.hash()).collect::<HashSet<_>>().len();
        tracing::info!(version = %version, cached, "installed app shell");

        Ok(InstallOutcome { version, cached, skip_waiting: true })
    }

    /// Delete every stale version, then take control of open clients.
    pub async fn activate(&self) -> Result<ActivateOutcome, Error> {
        let _phase = self.phase.lock().await;
        let version = self.router.version().to_string();
        let store = self.router.store();

        let stale: Vec<String> = store.names().await?.into_iter().filter(|name| *name != version).collect();

        try_join_all(stale.iter().map(|name| store.delete(name))).await?;

        for name in &stale {
            tracing::info!(stale = %name, current = %version, "deleted stale cache");
        }

        self.router.claim();

        Ok(ActivateOutcome { version, deleted: stale, claimed: true })
    }
}
