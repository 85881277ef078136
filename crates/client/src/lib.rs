//! Client code for shellcache.
//!
//! This crate provides the network transport and the request router:
//! classification, retrieval strategies, and the install/activate
//! lifecycle over a versioned cache store.

pub mod fetch;
pub mod route;

pub use fetch::{FetchClient, FetchConfig, Network, UrlError, canonicalize};
pub use route::{
    ActivateOutcome, CacheRouter, DetachedWrite, Exclusion, InstallOutcome, Lifecycle, RequestClass, RouteRules,
    RouterSettings, Served, ServedFrom, classify,
};
