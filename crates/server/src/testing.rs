//! Fixtures for tool tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use soid_core::worker::Network;
use soid_core::{AppConfig, CacheDb, Error, Request, Response, Worker};

use crate::host::{HostNotifications, HostPages};

/// Network answering from a URL table; unknown URLs fail like a dead connection.
#[derive(Default)]
pub struct StubNetwork {
    routes: Mutex<HashMap<String, Response>>,
}

impl StubNetwork {
    pub fn respond(&self, url: &str, response: Response) {
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    pub fn clear(&self) {
        self.routes.lock().unwrap().clear();
    }
}

#[async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.routes
            .lock()
            .unwrap()
            .get(request.url.as_str())
            .cloned()
            .ok_or_else(|| Error::Network(format!("no route to {}", request.url)))
    }
}

/// Worker on `https://soid.example` wired to the in-process hosts.
pub struct Fixture {
    pub worker: Arc<Worker>,
    pub network: Arc<StubNetwork>,
    pub pages: Arc<HostPages>,
    pub notifications: Arc<HostNotifications>,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_badges(true).await
    }

    pub async fn with_badges(badge_supported: bool) -> Self {
        let config = AppConfig { origin: "https://soid.example".into(), badge_supported, ..Default::default() };
        let store = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let network = Arc::new(StubNetwork::default());
        let pages = Arc::new(HostPages::default());
        let notifications = Arc::new(HostNotifications::new(config.badge_supported));
        let worker = Arc::new(Worker::new(
            config.worker_config().unwrap(),
            store,
            network.clone(),
            notifications.clone(),
            pages.clone(),
        ));
        Self { worker, network, pages, notifications }
    }
}

/// Parse the JSON text block of a tool result.
pub fn output_json(result: &CallToolResult) -> serde_json::Value {
    let text = &result.content.first().and_then(|c| c.as_text()).unwrap().text;
    serde_json::from_str(text).unwrap()
}
