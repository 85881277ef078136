//! Request classification.
//!
//! A pure function of the request's method, URL, mode, and destination
//! against fixed rules. Rules are checked in order and the first match
//! wins; the push provider exclusions always precede the navigation check
//! because that SDK breaks if its worker scripts are ever intercepted.

use serde::Serialize;
use shellcache_core::{AppConfig, ConfigError, RequestDescriptor, RequestMode};
use url::Url;

/// Why a request bypasses the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Exclusion {
    NonGet,
    PushProvider,
    ReservedPrefix,
    WorkerScript,
    ServiceWorkerDestination,
    CrossOrigin,
}

/// Routing label of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "class", content = "reason")]
pub enum RequestClass {
    /// Forward to the network untouched.
    Excluded(Exclusion),
    /// Full document load; network-first with offline fallback.
    Navigation,
    /// Same-origin subresource; cache-first.
    Static,
}

impl Exclusion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Exclusion::NonGet => "non_get",
            Exclusion::PushProvider => "push_provider",
            Exclusion::ReservedPrefix => "reserved_prefix",
            Exclusion::WorkerScript => "worker_script",
            Exclusion::ServiceWorkerDestination => "service_worker_destination",
            Exclusion::CrossOrigin => "cross_origin",
        }
    }
}

impl std::fmt::Display for RequestClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestClass::Excluded(reason) => write!(f, "excluded:{}", reason.as_str()),
            RequestClass::Navigation => f.write_str("navigation"),
            RequestClass::Static => f.write_str("static"),
        }
    }
}

/// Fixed inputs to classification.
#[derive(Debug, Clone)]
pub struct RouteRules {
    pub origin: Url,
    pub push_host: String,
    pub reserved_prefixes: Vec<String>,
    pub worker_script: String,
}

impl RouteRules {
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            origin: config.origin_url()?,
            push_host: config.push_host.clone(),
            reserved_prefixes: config.reserved_prefixes.clone(),
            worker_script: config.worker_script.clone(),
        })
    }

    fn exclusion(&self, request: &RequestDescriptor) -> Option<Exclusion> {
        let path = request.url.path();

        if !self.push_host.is_empty()
            && request
                .url
                .host_str()
                .is_some_and(|host| host.contains(self.push_host.as_str()))
        {
            return Some(Exclusion::PushProvider);
        }
        if self.reserved_prefixes.iter().any(|prefix| path.starts_with(prefix.as_str())) {
            return Some(Exclusion::ReservedPrefix);
        }
        if path == self.worker_script {
            return Some(Exclusion::WorkerScript);
        }
        if request.destination == "serviceworker" {
            return Some(Exclusion::ServiceWorkerDestination);
        }
        None
    }
}

/// Label `request` according to `rules`.
pub fn classify(rules: &RouteRules, request: &RequestDescriptor) -> RequestClass {
    if !request.is_get() {
        return RequestClass::Excluded(Exclusion::NonGet);
    }
    if let Some(reason) = rules.exclusion(request) {
        return RequestClass::Excluded(reason);
    }
    if request.url.origin() != rules.origin.origin() {
        return RequestClass::Excluded(Exclusion::CrossOrigin);
    }
    match request.mode {
        RequestMode::Navigate => RequestClass::Navigation,
        RequestMode::SameOrigin | RequestMode::NoCors | RequestMode::Cors => RequestClass::Static,
    }
}
