//! Network side of the SOID offline worker.
//!
//! This crate provides the reqwest transport the worker fetches through and
//! a client for the web app's companion JSON API, shared by the server.

pub mod api;
pub mod fetch;

pub use api::{ApiConfig, ApiError, Attachment, Member, MemberQuery, SoidApi};
pub use fetch::{FetchClient, FetchConfig};
