//! Core types and shared functionality for the SOID offline worker.
//!
//! This crate provides:
//! - Versioned response cache with SQLite backend
//! - The worker: request routing, caching strategies, lifecycle and push relay
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod worker;

pub use cache::{CacheDb, CacheEntry, CacheStore};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use http::{Request, Response};
pub use worker::{Worker, WorkerConfig};
