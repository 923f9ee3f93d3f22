//! SQLite-backed, versioned response cache.
//!
//! Each deployment writes to a single named cache version; activation evicts
//! every other version. Access goes through tokio-rusqlite so handlers never
//! block the runtime, and WAL mode lets concurrent handlers read while one
//! writes.

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CacheEntry;
pub use store::CacheStore;
