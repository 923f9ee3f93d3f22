//! Page ↔ worker message protocol.

use serde::{Deserialize, Serialize};

/// Message sent by a page to the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageMessage {
    /// `"SKIP_WAITING"`: activate a waiting worker now.
    SkipWaiting,
    /// `"GET_VERSION"`: reply with the current cache version.
    GetVersion,
    Unknown(String),
}

impl PageMessage {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "SKIP_WAITING" => PageMessage::SkipWaiting,
            "GET_VERSION" => PageMessage::GetVersion,
            other => PageMessage::Unknown(other.to_string()),
        }
    }
}

/// Reply to `GET_VERSION`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct VersionReply {
    pub version: String,
}

/// Message broadcast by the worker to open pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "type")]
pub enum WorkerMessage {
    #[serde(rename = "PUSH_RECIBIDO")]
    PushReceived { badge_count: u32, url: String, title: String, body: String },
}
