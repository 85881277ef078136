//! In-process doubles for router tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use shellcache_core::{CacheStorage, Error, RequestDescriptor, RequestKey, ResponseSnapshot};
use tokio::sync::Barrier;

use crate::fetch::Network;

pub(crate) const ORIGIN: &str = "https://news.example";

/// Programmable network: canned responses per `METHOD URL`, 404 otherwise.
#[derive(Default)]
pub(crate) struct FakeNetwork {
    responses: Mutex<HashMap<String, ResponseSnapshot>>,
    requested: Mutex<Vec<String>>,
    last_headers: Mutex<Vec<(String, String)>>,
    calls: AtomicUsize,
    offline: AtomicBool,
    gate: Option<Barrier>,
}

impl FakeNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Hold every fetch until `n` fetches are in flight together.
    pub(crate) fn gated(n: usize) -> Self {
        Self { gate: Some(Barrier::new(n)), ..Self::default() }
    }

    pub(crate) fn respond(&self, method: &str, path: &str, response: ResponseSnapshot) {
        let key = format!("{method} {ORIGIN}{path}");
        self.responses.lock().unwrap().insert(key, response);
    }

    /// Canned response for an absolute URL on any origin.
    pub(crate) fn respond_any(&self, url: &str, response: ResponseSnapshot) {
        self.responses.lock().unwrap().insert(format!("GET {url}"), response);
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    /// Headers carried by the most recent request.
    pub(crate) fn last_headers(&self) -> Vec<(String, String)> {
        self.last_headers.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, request: &RequestDescriptor) -> Result<ResponseSnapshot, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = format!("{} {}", request.method, request.url);
        self.requested.lock().unwrap().push(key.clone());
        *self.last_headers.lock().unwrap() = request.headers.clone();

        if let Some(gate) = &self.gate {
            gate.wait().await;
        }

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Transport("offline".into()));
        }

        let canned = self.responses.lock().unwrap().get(&key).cloned();
        Ok(canned.unwrap_or_else(|| ResponseSnapshot::new(404, "not found")))
    }
}

fn unavailable() -> Error {
    Error::Database(tokio_rusqlite::Error::ConnectionClosed)
}

fn quota_exceeded() -> Error {
    let code = tokio_rusqlite::rusqlite::ffi::Error::new(tokio_rusqlite::rusqlite::ffi::SQLITE_FULL);
    Error::from(tokio_rusqlite::rusqlite::Error::SqliteFailure(code, Some("quota exceeded".into())))
}

/// Store whose every operation fails, as when quota is exhausted.
pub(crate) struct BrokenStore;

#[async_trait::async_trait]
impl CacheStorage for BrokenStore {
    async fn open(&self, _name: &str) -> Result<(), Error> {
        Err(unavailable())
    }

    async fn names(&self) -> Result<Vec<String>, Error> {
        Err(unavailable())
    }

    async fn delete(&self, _name: &str) -> Result<bool, Error> {
        Err(unavailable())
    }

    async fn match_request(&self, _name: &str, _key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error> {
        Err(unavailable())
    }

    async fn put(&self, _name: &str, _key: &RequestKey, _response: &ResponseSnapshot) -> Result<(), Error> {
        Err(quota_exceeded())
    }

    async fn put_all(&self, _name: &str, _entries: &[(RequestKey, ResponseSnapshot)]) -> Result<(), Error> {
        Err(quota_exceeded())
    }

    async fn keys(&self, _name: &str) -> Result<Vec<String>, Error> {
        Err(unavailable())
    }
}
