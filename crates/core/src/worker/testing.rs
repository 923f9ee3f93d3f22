//! In-memory hosts for worker tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use url::Url;

use super::host::{Network, NotificationOptions, NotificationSink, PageClients, PageHandle};
use super::message::WorkerMessage;
use super::push::NotificationDefaults;
use super::route::RouteRules;
use super::{Worker, WorkerConfig};
use crate::Error;
use crate::cache::{CacheDb, CacheEntry, CacheStore};
use crate::http::{Request, Response};

/// Network answering from a URL table; unknown URLs fail like a dead connection.
#[derive(Default)]
pub struct FakeNetwork {
    routes: Mutex<HashMap<String, Response>>,
    offline: AtomicBool,
    hang: AtomicBool,
    calls: AtomicUsize,
}

impl FakeNetwork {
    pub fn respond(&self, url: &str, response: Response) {
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    /// Make every fetch wait forever.
    pub fn hang(&self) {
        self.hang.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("offline".into()));
        }
        self.routes
            .lock()
            .unwrap()
            .get(request.url.as_str())
            .cloned()
            .ok_or_else(|| Error::Network(format!("no route to {}", request.url)))
    }
}

#[derive(Default)]
struct SinkState {
    shown: Vec<(String, NotificationOptions)>,
    closed: Vec<String>,
    badge: Option<u32>,
}

/// Notification sink that records everything it is asked to do.
#[derive(Default)]
pub struct RecordingSink {
    state: Mutex<SinkState>,
    no_badges: AtomicBool,
}

impl RecordingSink {
    pub fn shown(&self) -> Vec<(String, NotificationOptions)> {
        self.state.lock().unwrap().shown.clone()
    }

    pub fn closed(&self) -> Vec<String> {
        self.state.lock().unwrap().closed.clone()
    }

    pub fn badge(&self) -> Option<u32> {
        self.state.lock().unwrap().badge
    }

    pub fn set_badge_value(&self, badge: Option<u32>) {
        self.state.lock().unwrap().badge = badge;
    }

    pub fn disable_badges(&self) {
        self.no_badges.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn show(&self, title: &str, options: &NotificationOptions) -> Result<(), Error> {
        self.state.lock().unwrap().shown.push((title.to_string(), options.clone()));
        Ok(())
    }

    async fn close(&self, tag: &str) -> Result<(), Error> {
        self.state.lock().unwrap().closed.push(tag.to_string());
        Ok(())
    }

    async fn set_badge(&self, count: u32) -> Result<(), Error> {
        if self.no_badges.load(Ordering::SeqCst) {
            return Err(Error::Unsupported("badges".into()));
        }
        self.state.lock().unwrap().badge = Some(count);
        Ok(())
    }

    async fn clear_badge(&self) -> Result<(), Error> {
        if self.no_badges.load(Ordering::SeqCst) {
            return Err(Error::Unsupported("badges".into()));
        }
        self.state.lock().unwrap().badge = None;
        Ok(())
    }
}

#[derive(Default)]
struct PagesState {
    pages: Vec<PageHandle>,
    mailboxes: HashMap<String, Vec<WorkerMessage>>,
    focused: Vec<String>,
    navigations: Vec<(String, String)>,
    opened: Vec<String>,
    claims: usize,
}

/// Open pages kept in a list, in the order they were added.
#[derive(Default)]
pub struct FakePages {
    state: Mutex<PagesState>,
}

impl FakePages {
    pub fn add(&self, url: &str) -> String {
        let mut state = self.state.lock().unwrap();
        let id = format!("page-{}", state.pages.len() + 1);
        state.pages.push(PageHandle { id: id.clone(), url: Url::parse(url).unwrap() });
        id
    }

    pub fn mailboxes(&self) -> Vec<(String, Vec<WorkerMessage>)> {
        let state = self.state.lock().unwrap();
        state
            .pages
            .iter()
            .map(|p| (p.id.clone(), state.mailboxes.get(&p.id).cloned().unwrap_or_default()))
            .collect()
    }

    pub fn focused(&self) -> Vec<String> {
        self.state.lock().unwrap().focused.clone()
    }

    pub fn navigations(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().navigations.clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.state.lock().unwrap().opened.clone()
    }

    pub fn claims(&self) -> usize {
        self.state.lock().unwrap().claims
    }
}

#[async_trait]
impl PageClients for FakePages {
    async fn match_all(&self) -> Result<Vec<PageHandle>, Error> {
        Ok(self.state.lock().unwrap().pages.clone())
    }

    async fn focus(&self, id: &str) -> Result<(), Error> {
        self.state.lock().unwrap().focused.push(id.to_string());
        Ok(())
    }

    async fn navigate(&self, id: &str, url: &Url) -> Result<(), Error> {
        self.state.lock().unwrap().navigations.push((id.to_string(), url.to_string()));
        Ok(())
    }

    async fn open_window(&self, url: &Url) -> Result<PageHandle, Error> {
        let mut state = self.state.lock().unwrap();
        state.opened.push(url.to_string());
        Ok(PageHandle { id: format!("opened-{}", state.opened.len()), url: url.clone() })
    }

    async fn post_message(&self, id: &str, message: &WorkerMessage) -> Result<(), Error> {
        self.state
            .lock()
            .unwrap()
            .mailboxes
            .entry(id.to_string())
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn claim(&self) -> Result<usize, Error> {
        let mut state = self.state.lock().unwrap();
        state.claims += 1;
        Ok(state.pages.len())
    }
}

/// Store whose every operation fails.
pub struct FailingStore;

#[async_trait]
impl CacheStore for FailingStore {
    async fn open(&self, _version: &str) -> Result<(), Error> {
        Err(Error::MigrationFailed("disk full".into()))
    }

    async fn versions(&self) -> Result<Vec<String>, Error> {
        Err(Error::MigrationFailed("disk full".into()))
    }

    async fn delete_version(&self, _version: &str) -> Result<bool, Error> {
        Err(Error::MigrationFailed("disk full".into()))
    }

    async fn get(&self, _version: &str, _key: &str) -> Result<Option<CacheEntry>, Error> {
        Err(Error::MigrationFailed("disk full".into()))
    }

    async fn put(&self, _entry: &CacheEntry) -> Result<(), Error> {
        Err(Error::MigrationFailed("disk full".into()))
    }

    async fn delete(&self, _version: &str, _key: &str) -> Result<bool, Error> {
        Err(Error::MigrationFailed("disk full".into()))
    }

    async fn keys(&self, _version: &str) -> Result<Vec<String>, Error> {
        Err(Error::MigrationFailed("disk full".into()))
    }
}

/// A worker wired to in-memory hosts on `https://soid.example`.
pub struct Harness {
    pub worker: Worker,
    pub store: Arc<dyn CacheStore>,
    pub network: Arc<FakeNetwork>,
    pub sink: Arc<RecordingSink>,
    pub pages: Arc<FakePages>,
}

impl Harness {
    pub const VERSION: &'static str = "soid-tf-cache-v5";

    pub fn config() -> WorkerConfig {
        WorkerConfig {
            cache_version: Self::VERSION.into(),
            origin: Url::parse("https://soid.example").unwrap(),
            precache_urls: vec!["/".into(), "/offline/".into()],
            offline_path: "/offline/".into(),
            routes: RouteRules::default(),
            skip_waiting_on_install: true,
            notifications: NotificationDefaults::default(),
        }
    }

    pub async fn new() -> Self {
        Self::with_config(Self::config()).await
    }

    pub async fn with_config(config: WorkerConfig) -> Self {
        let store: Arc<dyn CacheStore> = Arc::new(CacheDb::open_in_memory().await.unwrap());
        Self::build(config, store)
    }

    pub async fn with_store(store: Arc<dyn CacheStore>) -> Self {
        Self::build(Self::config(), store)
    }

    fn build(config: WorkerConfig, store: Arc<dyn CacheStore>) -> Self {
        let network = Arc::new(FakeNetwork::default());
        let sink = Arc::new(RecordingSink::default());
        let pages = Arc::new(FakePages::default());
        let worker = Worker::new(config, Arc::clone(&store), network.clone(), sink.clone(), pages.clone());
        Self { worker, store, network, sink, pages }
    }
}
