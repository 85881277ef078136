//! Request routing for the offline cache.
//!
//! - `classify` labels each intercepted request
//! - `strategy` serves it per label (bypass, network-first, cache-first)
//! - `lifecycle` installs the app shell and evicts stale versions

pub mod classify;
pub mod lifecycle;
pub mod strategy;

#[cfg(test)]
pub(crate) mod testing;

pub use classify::{Exclusion, RequestClass, RouteRules, classify};
pub use lifecycle::{ActivateOutcome, InstallOutcome, Lifecycle};
pub use strategy::{CacheRouter, DetachedWrite, RouterSettings, Served, ServedFrom};
