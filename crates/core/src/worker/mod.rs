//! The offline request router.
//!
//! A [`Worker`] sits between pages and the network for one origin. It routes
//! each request to a caching strategy, manages the versioned cache across
//! deployments, and relays push notifications to open pages.
//!
//! Host events arrive through [`Worker::dispatch`], or through the individual
//! handlers it maps to:
//!
//! | event                | handler                               |
//! |----------------------|---------------------------------------|
//! | install              | [`Worker::install`]                   |
//! | activate             | [`Worker::activate`]                  |
//! | fetch                | [`Worker::handle_fetch`]              |
//! | message              | [`Worker::handle_message`]            |
//! | push                 | [`Worker::handle_push`]               |
//! | notification click   | [`Worker::handle_notification_click`] |
//!
//! Side effects that must not delay a response (cache writes after a
//! network-first fetch, stale-while-revalidate refreshes) run as tracked
//! background tasks; [`Worker::settle`] waits for them.

pub mod host;
pub mod lifecycle;
pub mod message;
pub mod push;
pub mod route;
pub mod strategy;

#[cfg(test)]
pub(crate) mod testing;

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use bytes::Bytes;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinSet;
use url::Url;

use crate::Error;
use crate::cache::CacheStore;
use crate::http::Request;

pub use host::{Network, NotificationOptions, NotificationSink, PageClients, PageHandle};
pub use lifecycle::{ActivateReport, InstallReport, WorkerState};
pub use message::{PageMessage, VersionReply, WorkerMessage};
pub use push::{BadgeUpdate, ClickOutcome, NotificationClick, NotificationDefaults, NotificationPayload, PushReport};
pub use route::{RoutePolicy, RouteRules};
pub use strategy::{FetchOutcome, ResponseSource, Served};

/// Immutable worker-wide configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// The only cache version this worker reads or writes.
    pub cache_version: String,
    pub origin: Url,
    pub precache_urls: Vec<String>,
    pub offline_path: String,
    pub routes: RouteRules,
    pub skip_waiting_on_install: bool,
    pub notifications: NotificationDefaults,
}

/// Events a host delivers to the worker.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(Request),
    Message(String),
    Push(Option<Bytes>),
    NotificationClick(NotificationClick),
}

/// What the worker produced for an event.
#[derive(Debug, Clone)]
pub enum EventOutcome {
    Installed(InstallReport),
    Activated(ActivateReport),
    Fetched(FetchOutcome),
    Replied(Option<VersionReply>),
    Pushed(PushReport),
    Clicked(ClickOutcome),
}

/// Offline request router bound to one origin and one cache version.
pub struct Worker {
    config: Arc<WorkerConfig>,
    store: Arc<dyn CacheStore>,
    network: Arc<dyn Network>,
    notifications: Arc<dyn NotificationSink>,
    pages: Arc<dyn PageClients>,
    state: RwLock<WorkerState>,
    background: Mutex<JoinSet<()>>,
    tag_seq: AtomicU64,
}

impl Worker {
    pub fn new(
        config: WorkerConfig, store: Arc<dyn CacheStore>, network: Arc<dyn Network>,
        notifications: Arc<dyn NotificationSink>, pages: Arc<dyn PageClients>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            network,
            notifications,
            pages,
            state: RwLock::new(WorkerState::Parsed),
            background: Mutex::new(JoinSet::new()),
            tag_seq: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// The cache store shared with the host.
    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Route one host event to its handler.
    ///
    /// # Errors
    ///
    /// Fails only where the individual handler does: network-only fetches
    /// and host failures while handling a notification click.
    pub async fn dispatch(&self, event: WorkerEvent) -> Result<EventOutcome, Error> {
        let outcome = match event {
            WorkerEvent::Install => EventOutcome::Installed(self.install().await),
            WorkerEvent::Activate => EventOutcome::Activated(self.activate().await),
            WorkerEvent::Fetch(request) => EventOutcome::Fetched(self.handle_fetch(&request).await?),
            WorkerEvent::Message(raw) => EventOutcome::Replied(self.handle_message(&raw).await),
            WorkerEvent::Push(data) => EventOutcome::Pushed(self.handle_push(data.as_deref()).await),
            WorkerEvent::NotificationClick(click) => {
                EventOutcome::Clicked(self.handle_notification_click(&click).await?)
            }
        };
        Ok(outcome)
    }

    /// Resolve a path or absolute URL against the worker's origin.
    pub fn resolve(&self, target: &str) -> Result<Url, Error> {
        Ok(self.config.origin.join(target.trim())?)
    }

    pub(crate) async fn spawn_background<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut background = self.background.lock().await;
        while background.try_join_next().is_some() {}
        background.spawn(task);
    }

    /// Wait for every outstanding background task.
    ///
    /// The lock is only held to take the pending set, so fetches keep
    /// spawning work while this waits. Tasks spawned meanwhile are awaited in
    /// a later pass.
    pub async fn settle(&self) {
        loop {
            let mut pending = std::mem::take(&mut *self.background.lock().await);
            if pending.is_empty() {
                break;
            }
            while let Some(result) = pending.join_next().await {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "background task failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Response;
    use testing::Harness;

    #[tokio::test]
    async fn test_dispatch_routes_events() {
        let h = Harness::new().await;
        h.network.respond("https://soid.example/", Response::new(200, "home"));

        let installed = h.worker.dispatch(WorkerEvent::Install).await.unwrap();
        assert!(matches!(installed, EventOutcome::Installed(report) if report.precached.len() == 1));

        let request = Request::get(h.worker.resolve("/").unwrap()).with_accept("text/html");
        let fetched = h.worker.dispatch(WorkerEvent::Fetch(request)).await.unwrap();
        assert!(matches!(fetched, EventOutcome::Fetched(FetchOutcome::Respond(_))));

        let replied = h.worker.dispatch(WorkerEvent::Message("GET_VERSION".into())).await.unwrap();
        assert!(matches!(replied, EventOutcome::Replied(Some(reply)) if reply.version == Harness::VERSION));

        let pushed = h.worker.dispatch(WorkerEvent::Push(Some(Bytes::from_static(b"hola")))).await.unwrap();
        assert!(matches!(pushed, EventOutcome::Pushed(report) if report.payload.body == "hola"));

        let click = NotificationClick { tag: "t".into(), url: None };
        let clicked = h.worker.dispatch(WorkerEvent::NotificationClick(click)).await.unwrap();
        assert!(matches!(clicked, EventOutcome::Clicked(ClickOutcome::Opened { .. })));

        let activated = h.worker.dispatch(WorkerEvent::Activate).await.unwrap();
        assert!(matches!(activated, EventOutcome::Activated(report) if report.evicted.is_empty()));
    }

    #[tokio::test]
    async fn test_resolve_paths_and_absolute_urls() {
        let h = Harness::new().await;
        assert_eq!(h.worker.resolve("/miembros/").unwrap().as_str(), "https://soid.example/miembros/");
        assert_eq!(h.worker.resolve("https://cdn.example/a.js").unwrap().as_str(), "https://cdn.example/a.js");
    }

    #[tokio::test]
    async fn test_settle_with_nothing_pending() {
        let h = Harness::new().await;
        h.worker.settle().await;
    }
}
