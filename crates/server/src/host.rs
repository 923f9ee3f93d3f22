//! In-process hosts for the worker.
//!
//! A tool client plays the part of the browser: it attaches pages, reads what
//! the worker posted to them, and inspects the notifications it showed.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use soid_core::Error;
use soid_core::worker::{NotificationOptions, NotificationSink, PageClients, PageHandle, WorkerMessage};
use tokio::sync::Mutex;
use url::Url;

/// Messages kept per page; older ones are dropped first.
const MAILBOX_CAPACITY: usize = 100;

/// Notifications kept in the log; older ones are dropped first.
const LOG_CAPACITY: usize = 200;

/// Drop the oldest entries so at most `capacity` remain.
fn trim_front<T>(items: &mut Vec<T>, capacity: usize) {
    let excess = items.len().saturating_sub(capacity);
    items.drain(..excess);
}

/// An open page and whether the worker controls it.
#[derive(Debug, Clone, Serialize)]
pub struct PageRecord {
    pub page: PageHandle,
    pub controlled: bool,
    pub focused: bool,
}

#[derive(Default)]
struct PageTable {
    pages: Vec<PageRecord>,
    mailboxes: HashMap<String, Vec<WorkerMessage>>,
    next_id: u64,
}

impl PageTable {
    fn add(&mut self, url: Url, controlled: bool) -> PageHandle {
        self.next_id += 1;
        let page = PageHandle { id: format!("page-{}", self.next_id), url };
        self.pages.push(PageRecord { page: page.clone(), controlled, focused: false });
        page
    }

    fn find(&mut self, id: &str) -> Result<&mut PageRecord, Error> {
        self.pages
            .iter_mut()
            .find(|r| r.page.id == id)
            .ok_or_else(|| Error::Host(format!("no open page {id}")))
    }
}

/// Registry of open pages with a mailbox per page.
#[derive(Default)]
pub struct HostPages {
    table: Mutex<PageTable>,
}

impl HostPages {
    /// Register a page opened by the user. It stays uncontrolled until the
    /// worker claims it.
    pub async fn attach(&self, url: Url) -> PageHandle {
        let page = self.table.lock().await.add(url, false);
        tracing::debug!(page = %page.id, url = %page.url, "page attached");
        page
    }

    pub async fn list(&self) -> Vec<PageRecord> {
        self.table.lock().await.pages.clone()
    }

    /// Take every message posted to a page so far.
    pub async fn drain(&self, id: &str) -> Result<Vec<WorkerMessage>, Error> {
        let mut table = self.table.lock().await;
        table.find(id)?;
        Ok(table.mailboxes.remove(id).unwrap_or_default())
    }
}

#[async_trait]
impl PageClients for HostPages {
    async fn match_all(&self) -> Result<Vec<PageHandle>, Error> {
        Ok(self.table.lock().await.pages.iter().map(|r| r.page.clone()).collect())
    }

    async fn focus(&self, id: &str) -> Result<(), Error> {
        let mut table = self.table.lock().await;
        table.find(id)?;
        for record in &mut table.pages {
            record.focused = record.page.id == id;
        }
        Ok(())
    }

    async fn navigate(&self, id: &str, url: &Url) -> Result<(), Error> {
        let mut table = self.table.lock().await;
        table.find(id)?.page.url = url.clone();
        Ok(())
    }

    async fn open_window(&self, url: &Url) -> Result<PageHandle, Error> {
        let mut table = self.table.lock().await;
        let page = table.add(url.clone(), true);
        for record in &mut table.pages {
            record.focused = record.page.id == page.id;
        }
        Ok(page)
    }

    async fn post_message(&self, id: &str, message: &WorkerMessage) -> Result<(), Error> {
        let mut table = self.table.lock().await;
        table.find(id)?;
        let mailbox = table.mailboxes.entry(id.to_string()).or_default();
        mailbox.push(message.clone());
        trim_front(mailbox, MAILBOX_CAPACITY);
        Ok(())
    }

    async fn claim(&self) -> Result<usize, Error> {
        let mut table = self.table.lock().await;
        let mut claimed = 0;
        for record in table.pages.iter_mut().filter(|r| !r.controlled) {
            record.controlled = true;
            claimed += 1;
        }
        Ok(claimed)
    }
}

/// A notification the worker showed.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationRecord {
    pub title: String,
    pub options: NotificationOptions,
    pub shown_at: DateTime<Utc>,
    pub closed: bool,
}

/// Notification log and badge state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NotificationLog {
    pub notifications: Vec<NotificationRecord>,
    /// `None` when no badge is set.
    pub badge: Option<u32>,
    pub badge_supported: bool,
}

/// Notification sink that keeps everything in memory.
pub struct HostNotifications {
    log: Mutex<NotificationLog>,
}

impl HostNotifications {
    pub fn new(badge_supported: bool) -> Self {
        Self { log: Mutex::new(NotificationLog { badge_supported, ..Default::default() }) }
    }

    pub async fn snapshot(&self) -> NotificationLog {
        self.log.lock().await.clone()
    }

    /// Target URL carried by the most recent notification with this tag.
    pub async fn target_url(&self, tag: &str) -> Option<String> {
        let log = self.log.lock().await;
        log.notifications.iter().rev().find(|r| r.options.tag == tag).map(|r| r.options.url.clone())
    }
}

#[async_trait]
impl NotificationSink for HostNotifications {
    async fn show(&self, title: &str, options: &NotificationOptions) -> Result<(), Error> {
        let mut log = self.log.lock().await;
        log.notifications.push(NotificationRecord {
            title: title.to_string(),
            options: options.clone(),
            shown_at: Utc::now(),
            closed: false,
        });
        trim_front(&mut log.notifications, LOG_CAPACITY);
        Ok(())
    }

    async fn close(&self, tag: &str) -> Result<(), Error> {
        let mut log = self.log.lock().await;
        for record in log.notifications.iter_mut().filter(|r| r.options.tag == tag) {
            record.closed = true;
        }
        Ok(())
    }

    async fn set_badge(&self, count: u32) -> Result<(), Error> {
        let mut log = self.log.lock().await;
        if !log.badge_supported {
            return Err(Error::Unsupported("app badge".into()));
        }
        log.badge = Some(count);
        Ok(())
    }

    async fn clear_badge(&self) -> Result<(), Error> {
        let mut log = self.log.lock().await;
        if !log.badge_supported {
            return Err(Error::Unsupported("app badge".into()));
        }
        log.badge = None;
        Ok(())
    }
}
