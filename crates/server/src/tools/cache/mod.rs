//! Cache-related MCP tools.
//!
//! This module provides read-only views of the worker's versioned cache.

pub mod get;
pub mod keys;

pub use get::{CacheGetParams, get_impl};
pub use keys::{CacheKeysParams, keys_impl};
