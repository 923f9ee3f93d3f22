//! The narrow key/value interface the worker uses to reach its cache.

use async_trait::async_trait;

use super::connection::CacheDb;
use super::entries::CacheEntry;
use crate::Error;

/// Versioned async key/value store of captured responses.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Make sure `version` exists, creating it empty if needed.
    async fn open(&self, version: &str) -> Result<(), Error>;

    /// Every version currently present.
    async fn versions(&self) -> Result<Vec<String>, Error>;

    /// Remove a version and everything stored under it.
    async fn delete_version(&self, version: &str) -> Result<bool, Error>;

    async fn get(&self, version: &str, key: &str) -> Result<Option<CacheEntry>, Error>;

    /// Store `entry`, replacing any previous entry with the same key.
    async fn put(&self, entry: &CacheEntry) -> Result<(), Error>;

    async fn delete(&self, version: &str, key: &str) -> Result<bool, Error>;

    /// Request URLs stored under `version`.
    async fn keys(&self, version: &str) -> Result<Vec<String>, Error>;

    /// Delete every version except `current`; returns the evicted names.
    async fn retain_only(&self, current: &str) -> Result<Vec<String>, Error> {
        let mut evicted = Vec::new();
        for version in self.versions().await?.into_iter().filter(|v| v != current) {
            if self.delete_version(&version).await? {
                evicted.push(version);
            }
        }
        Ok(evicted)
    }
}

#[async_trait]
impl CacheStore for CacheDb {
    async fn open(&self, version: &str) -> Result<(), Error> {
        self.open_version(version).await
    }

    async fn versions(&self) -> Result<Vec<String>, Error> {
        self.list_versions().await
    }

    async fn delete_version(&self, version: &str) -> Result<bool, Error> {
        self.remove_version(version).await
    }

    async fn get(&self, version: &str, key: &str) -> Result<Option<CacheEntry>, Error> {
        self.get_entry(version, key).await
    }

    async fn put(&self, entry: &CacheEntry) -> Result<(), Error> {
        self.upsert_entry(entry).await
    }

    async fn delete(&self, version: &str, key: &str) -> Result<bool, Error> {
        self.delete_entry(version, key).await
    }

    async fn keys(&self, version: &str) -> Result<Vec<String>, Error> {
        self.entry_urls(version).await
    }

    async fn retain_only(&self, current: &str) -> Result<Vec<String>, Error> {
        self.purge_versions_except(current).await
    }
}
