//! SQLite-backed versioned cache store.
//!
//! Each cache version is a named store of request identity → response
//! snapshot. It supports:
//!
//! - GET-only request identity keys hashed with SHA-256
//! - Atomic whole-entry put with last-write-wins
//! - Version eviction by deleting every stale store name
//! - Automatic schema migrations and WAL mode

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod response;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use hash::RequestKey;
pub use response::ResponseSnapshot;
pub use store::{CacheStorage, StoreSummary};
