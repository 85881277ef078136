//! MCP tool implementations.
//!
//! This module contains all tools exposed by the shellcache server.

pub mod cache;
pub mod lifecycle;
pub mod sw_fetch;

#[cfg(test)]
pub(crate) mod stub;
