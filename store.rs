//! The shared store holding the latest reading, and the record format that
//! crosses it.
//!
//! The acquisition side writes one JSON value under [`TPH_KEY`] per cycle; the
//! read API fetches it back with [`TphRecord::parse`]. A record is always
//! written as a single `SET`, so readers see either the old or the new value.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Timelike};
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::error::{RecordError, StoreError};
use crate::structs::AggregatedReading;

pub const TPH_KEY: &str = "tph";

/// Upper bound on establishing one Redis connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

#[async_trait]
pub trait Store: Send + Sync {
    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Liveness check.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Release the underlying connection. Later calls may reconnect.
    async fn close(&self) {}
}

/// Redis-backed store. The connection is opened on first use and kept until
/// [`Store::close`].
///
/// Each connect is a single TCP attempt bounded by [`CONNECT_TIMEOUT`]; retry
/// policy belongs to the caller ([`connect_with_retry`] at startup, the next
/// request or cycle afterwards).
pub struct RedisStore {
    client: redis::Client,
    conn: Mutex<Option<ConnectionManager>>,
}

impl RedisStore {
    pub fn open(url: &str) -> Result<Self, StoreError> {
        Ok(Self {
            client: redis::Client::open(url)?,
            conn: Mutex::new(None),
        })
    }

    /// Open and verify with a `PING`.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let store = Self::open(url)?;
        store.ping().await?;
        Ok(store)
    }

    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        let mut guard = self.conn.lock().await;
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(0)
            .set_connection_timeout(CONNECT_TIMEOUT);
        let conn = ConnectionManager::new_with_config(self.client.clone(), config).await?;
        debug!("opened redis connection");
        *guard = Some(conn.clone());
        Ok(conn)
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn close(&self) {
        if self.conn.lock().await.take().is_some() {
            debug!("closed redis connection");
        }
    }
}

/// In-process store, also able to pretend the backend is down.
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store marked unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.check()?;
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check()?;
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check()
    }
}

/// Try `connect` up to `retries` times (at least once), waiting `delay`
/// between attempts. The last error is returned once attempts run out.
pub async fn connect_with_retry<S, F, Fut>(
    mut connect: F,
    retries: u32,
    delay: Duration,
) -> Result<S, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<S, StoreError>>,
{
    let attempts = retries.max(1);
    let mut attempt = 1;
    loop {
        match connect().await {
            Ok(store) => {
                info!(attempt, "connected to store");
                return Ok(store);
            }
            Err(e) if attempt >= attempts => return Err(e),
            Err(e) => {
                warn!(
                    attempt,
                    error = %e,
                    "failed to connect to store, retrying in {:?}", delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Overwrite the latest reading.
pub async fn publish(store: &dyn Store, reading: &AggregatedReading) -> Result<(), StoreError> {
    let value = serde_json::to_string(reading)?;
    store.set(TPH_KEY, value).await
}

/// A reading as served by the read API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TphRecord {
    pub temperature: f64,
    pub pressure: f64,
    pub humidity: f64,
    pub timestamp: String,
}

impl TphRecord {
    /// Decode a stored value, requiring every field and normalizing the
    /// timestamp to canonical ISO-8601.
    pub fn parse(raw: &str) -> Result<Self, RecordError> {
        let mut record: TphRecord = serde_json::from_str(raw)?;
        record.timestamp = normalize_timestamp(&record.timestamp)?;
        Ok(record)
    }
}

/// Timestamps with an offset are written with a numeric offset
/// (`+00:00`), naive ones stay naive. Seconds are always present and a
/// fractional part, if any, is written as microseconds.
pub fn normalize_timestamp(s: &str) -> Result<String, RecordError> {
    if let Some(ts) = parse_with_offset(s) {
        return Ok(format!("{}{}", iso_seconds(&ts.naive_local()), ts.format("%:z")));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|ts| iso_seconds(&ts))
        .ok_or_else(|| RecordError::Timestamp(s.to_string()))
}

fn parse_with_offset(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M%:z"))
        .ok()
}

fn iso_seconds(ts: &NaiveDateTime) -> String {
    if ts.nanosecond() == 0 {
        ts.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        ts.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}
