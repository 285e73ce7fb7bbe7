use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use oasis_core::{CacheStore, OasisError};
use tokio::sync::RwLock;

enum Slot {
    Value(String),
    Hash(HashMap<String, String>),
}

struct Entry {
    slot: Slot,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// Process-local [`CacheStore`] with Redis-like semantics.
///
/// Plain keys and hash buckets share one keyspace; reading a key with the
/// wrong kind of command is an error. Expired entries read as absent.
pub struct InMemoryCacheStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of live keys and buckets.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries.values().filter(|e| e.is_live(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of fields in a live bucket, `0` if absent.
    pub async fn hlen(&self, bucket: &str) -> usize {
        let now = Instant::now();
        let entries = self.entries.read().await;
        match entries.get(bucket).filter(|e| e.is_live(now)) {
            Some(Entry {
                slot: Slot::Hash(fields),
                ..
            }) => fields.len(),
            _ => 0,
        }
    }

    /// Remaining time to live of a key, `None` if it is absent or has no expiry.
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|e| e.is_live(now))
            .and_then(|e| e.expires_at)
            .map(|at| at.saturating_duration_since(now))
    }
}

impl Default for InMemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

fn wrong_type(key: &str) -> OasisError {
    OasisError::Cache(format!(
        "WRONGTYPE operation against key '{key}' holding the wrong kind of value"
    ))
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, OasisError> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        match entries.get(key).filter(|e| e.is_live(now)) {
            Some(Entry {
                slot: Slot::Value(value),
                ..
            }) => Ok(Some(value.clone())),
            Some(_) => Err(wrong_type(key)),
            None => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: &str, seconds: u64) -> Result<(), OasisError> {
        let expires_at = deadline(Instant::now(), seconds)?;
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            Entry {
                slot: Slot::Value(value.to_string()),
                expires_at: Some(expires_at),
            },
        );
        Ok(())
    }

    async fn hget(&self, bucket: &str, field: &str) -> Result<Option<String>, OasisError> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        match entries.get(bucket).filter(|e| e.is_live(now)) {
            Some(Entry {
                slot: Slot::Hash(fields),
                ..
            }) => Ok(fields.get(field).cloned()),
            Some(_) => Err(wrong_type(bucket)),
            None => Ok(None),
        }
    }

    async fn hset(&self, bucket: &str, field: &str, value: &str) -> Result<(), OasisError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        if entries.get(bucket).is_some_and(|e| !e.is_live(now)) {
            entries.remove(bucket);
        }
        let entry = entries.entry(bucket.to_string()).or_insert_with(|| Entry {
            slot: Slot::Hash(HashMap::new()),
            expires_at: None,
        });
        match &mut entry.slot {
            Slot::Hash(fields) => {
                fields.insert(field.to_string(), value.to_string());
                Ok(())
            }
            Slot::Value(_) => Err(wrong_type(bucket)),
        }
    }

    async fn del(&self, key: &str) -> Result<(), OasisError> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<(), OasisError> {
        let now = Instant::now();
        let expires_at = deadline(now, seconds)?;
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(key).filter(|e| e.is_live(now)) {
            entry.expires_at = Some(expires_at);
        }
        Ok(())
    }
}

fn deadline(now: Instant, seconds: u64) -> Result<Instant, OasisError> {
    now.checked_add(Duration::from_secs(seconds))
        .ok_or_else(|| OasisError::Cache(format!("TTL of {seconds}s is out of range")))
}
