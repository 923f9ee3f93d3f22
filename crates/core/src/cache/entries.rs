//! Cache entry and version operations.
//!
//! Every entry belongs to exactly one cache version. An entry is only ever
//! replaced as a whole by a single UPSERT, so an interrupted handler can
//! never leave a half-written response behind.

use std::collections::BTreeMap;

use super::connection::CacheDb;
use crate::Error;
use crate::http::{Request, Response};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A captured response stored under a request descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CacheEntry {
    pub version: String,
    pub key: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl CacheEntry {
    /// Capture `response` for `request` under the given cache version.
    pub fn capture(version: &str, request: &Request, response: &Response) -> Self {
        Self {
            version: version.to_string(),
            key: request.cache_key(),
            method: request.method.clone(),
            url: request.url.to_string(),
            status: response.status,
            headers: response.headers.clone(),
            body: response.body.to_vec(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Rebuild the stored response.
    pub fn to_response(&self) -> Response {
        Response { status: self.status, headers: self.headers.clone(), body: Bytes::from(self.body.clone()) }
    }
}

impl CacheDb {
    /// Register a cache version if it does not exist yet.
    pub async fn open_version(&self, version: &str) -> Result<(), Error> {
        let version = version.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO cache_versions (name, created_at) VALUES (?1, ?2)",
                    params![version, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// List every cache version, oldest first.
    pub async fn list_versions(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM cache_versions ORDER BY created_at ASC, name ASC")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a cache version and, through the cascade, all of its entries.
    ///
    /// Returns false if the version did not exist.
    pub async fn remove_version(&self, version: &str) -> Result<bool, Error> {
        let version = version.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM cache_versions WHERE name = ?1", params![version])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every version except `current`.
    ///
    /// Returns the names of the evicted versions.
    pub async fn purge_versions_except(&self, current: &str) -> Result<Vec<String>, Error> {
        let current = current.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let tx = conn.transaction()?;
                let stale = {
                    let mut stmt = tx.prepare("SELECT name FROM cache_versions WHERE name != ?1 ORDER BY name")?;
                    stmt.query_map(params![current], |row| row.get::<_, String>(0))?
                        .collect::<Result<Vec<_>, _>>()?
                };
                tx.execute("DELETE FROM cache_versions WHERE name != ?1", params![current])?;
                tx.commit()?;
                Ok(stale)
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace an entry, registering its version if needed.
    pub async fn upsert_entry(&self, entry: &CacheEntry) -> Result<(), Error> {
        let entry = entry.clone();
        let headers_json = serde_json::to_string(&entry.headers)?;
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO cache_versions (name, created_at) VALUES (?1, ?2)",
                    params![&entry.version, &entry.stored_at],
                )?;
                tx.execute(
                    "INSERT INTO cache_entries (
                    version, key, method, url, status, headers_json, body, stored_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT(version, key) DO UPDATE SET
                    method = excluded.method,
                    url = excluded.url,
                    status = excluded.status,
                    headers_json = excluded.headers_json,
                    body = excluded.body,
                    stored_at = excluded.stored_at",
                    params![
                        &entry.version,
                        &entry.key,
                        &entry.method,
                        &entry.url,
                        entry.status as i64,
                        &headers_json,
                        &entry.body,
                        &entry.stored_at,
                    ],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get an entry by version and key.
    pub async fn get_entry(&self, version: &str, key: &str) -> Result<Option<CacheEntry>, Error> {
        let version = version.to_string();
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT version, key, method, url, status, headers_json, body, stored_at
                FROM cache_entries WHERE version = ?1 AND key = ?2",
                )?;

                let result = stmt.query_row(params![version, key], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, Vec<u8>>(6)?,
                        row.get::<_, String>(7)?,
                    ))
                });

                match result {
                    Ok((version, key, method, url, status, headers_json, body, stored_at)) => {
                        let status = u16::try_from(status)
                            .map_err(|_| Error::CorruptEntry(format!("status {status} out of range")))?;
                        Ok(Some(CacheEntry {
                            version,
                            key,
                            method,
                            url,
                            status,
                            headers: serde_json::from_str(&headers_json)?,
                            body,
                            stored_at,
                        }))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a single entry. Returns false if it did not exist.
    pub async fn delete_entry(&self, version: &str, key: &str) -> Result<bool, Error> {
        let version = version.to_string();
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted =
                    conn.execute("DELETE FROM cache_entries WHERE version = ?1 AND key = ?2", params![version, key])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Request URLs stored in a version, sorted.
    pub async fn entry_urls(&self, version: &str) -> Result<Vec<String>, Error> {
        let version = version.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM cache_entries WHERE version = ?1 ORDER BY url")?;
                let urls = stmt
                    .query_map(params![version], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }
}
