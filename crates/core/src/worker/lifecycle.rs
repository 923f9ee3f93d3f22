//! Install, activation and skip-waiting.

use serde::{Deserialize, Serialize};

use super::Worker;
use super::message::{PageMessage, VersionReply};
use crate::cache::CacheEntry;
use crate::http::Request;

/// Worker lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// Constructed; install has not started.
    Parsed,
    Installing,
    /// Installed and waiting for activation.
    Installed,
    Activating,
    Activated,
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerState::Parsed => write!(f, "parsed"),
            WorkerState::Installing => write!(f, "installing"),
            WorkerState::Installed => write!(f, "installed"),
            WorkerState::Activating => write!(f, "activating"),
            WorkerState::Activated => write!(f, "activated"),
        }
    }
}

/// Outcome of an install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct InstallReport {
    pub version: String,
    pub precached: Vec<String>,
    /// URLs that could not be pre-cached, with the reason.
    pub failed: Vec<(String, String)>,
    /// Present when install went straight on to activation.
    pub activation: Option<ActivateReport>,
}

/// Outcome of an activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ActivateReport {
    pub version: String,
    pub evicted: Vec<String>,
    pub claimed: usize,
}

impl Worker {
    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    async fn set_state(&self, next: WorkerState) {
        let mut state = self.state.write().await;
        if *state != next {
            tracing::info!(from = %*state, to = %next, version = %self.config.cache_version, "worker state");
            *state = next;
        }
    }

    /// Open the current cache version and pre-cache the configured URLs.
    ///
    /// Each URL is fetched independently; failures are reported and logged but
    /// never abort the install. When `skip_waiting_on_install` is set the worker
    /// activates right away.
    pub async fn install(&self) -> InstallReport {
        self.set_state(WorkerState::Installing).await;
        let version = self.config.cache_version.clone();

        if let Err(e) = self.store.open(&version).await {
            tracing::warn!(error = %e, version = %version, "failed to open cache version");
        }

        let mut precached = Vec::new();
        let mut failed = Vec::new();
        for path in &self.config.precache_urls {
            match self.precache(path).await {
                Ok(url) => precached.push(url),
                Err(reason) => {
                    tracing::warn!(url = %path, reason = %reason, "pre-cache failed");
                    failed.push((path.clone(), reason));
                }
            }
        }

        self.set_state(WorkerState::Installed).await;

        let activation = if self.config.skip_waiting_on_install { Some(self.activate().await) } else { None };

        InstallReport { version, precached, failed, activation }
    }

    async fn precache(&self, path: &str) -> Result<String, String> {
        let url = self.config.origin.join(path).map_err(|e| e.to_string())?;
        let request = Request::get(url).with_accept("text/html");
        let response = self.network.fetch(&request).await.map_err(|e| e.to_string())?;
        if !response.is_ok() {
            return Err(format!("status {}", response.status));
        }
        let entry = CacheEntry::capture(&self.config.cache_version, &request, &response);
        self.store.put(&entry).await.map_err(|e| e.to_string())?;
        Ok(entry.url)
    }

    /// Evict every cache version except the current one, then claim open pages.
    pub async fn activate(&self) -> ActivateReport {
        self.set_state(WorkerState::Activating).await;
        let current = &self.config.cache_version;

        let evicted = match self.store.retain_only(current).await {
            Ok(evicted) => {
                for version in &evicted {
                    tracing::info!(version = %version, "evicted stale cache version");
                }
                evicted
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to evict stale cache versions");
                Vec::new()
            }
        };

        let claimed = match self.pages.claim().await {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "failed to claim open pages");
                0
            }
        };

        self.set_state(WorkerState::Activated).await;
        ActivateReport { version: current.clone(), evicted, claimed }
    }

    /// Activate now if the worker is installed and waiting.
    ///
    /// Returns `None` when there was nothing waiting.
    pub async fn skip_waiting(&self) -> Option<ActivateReport> {
        if self.state().await == WorkerState::Installed {
            Some(self.activate().await)
        } else {
            let state = self.state().await;
            tracing::debug!(state = %state, "skip waiting ignored");
            None
        }
    }

    /// Handle a message posted by a page.
    pub async fn handle_message(&self, raw: &str) -> Option<VersionReply> {
        match PageMessage::parse(raw) {
            PageMessage::SkipWaiting => {
                self.skip_waiting().await;
                None
            }
            PageMessage::GetVersion => Some(VersionReply { version: self.config.cache_version.clone() }),
            PageMessage::Unknown(other) => {
                tracing::debug!(message = %other, "ignoring unknown page message");
                None
            }
        }
    }
}
