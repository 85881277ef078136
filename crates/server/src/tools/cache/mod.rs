//! Cache inspection MCP tools.
//!
//! Read-only views over the versioned store.

pub mod entries;
pub mod list;

pub use entries::{CacheEntriesParams, entries_impl};
pub use list::list_impl;
