use std::sync::Arc;

use async_trait::async_trait;
use oasis_core::{CacheMode, CacheStore, OasisError, Query, QueryExecutor, QueryResult};

use crate::config::QueryCacheConfig;
use crate::keys::derive_cache_key;
use crate::payload::{decode_payload, encode_payload};

/// A [`QueryExecutor`] decorator that serves cache-marked queries from a [`CacheStore`].
///
/// Unmarked queries pass straight through to the inner executor and never
/// touch the store. Session-mode queries always run live and refresh their
/// entry. Cache-mode queries consult their bucket first and only run live on
/// a miss.
pub struct CachingQueryExecutor {
    inner: Arc<dyn QueryExecutor>,
    store: Arc<dyn CacheStore>,
    config: QueryCacheConfig,
}

impl CachingQueryExecutor {
    pub fn new(inner: Arc<dyn QueryExecutor>, store: Arc<dyn CacheStore>) -> Self {
        Self::with_config(inner, store, QueryCacheConfig::default())
    }

    pub fn with_config(
        inner: Arc<dyn QueryExecutor>,
        store: Arc<dyn CacheStore>,
        config: QueryCacheConfig,
    ) -> Self {
        Self {
            inner,
            store,
            config,
        }
    }

    pub fn config(&self) -> &QueryCacheConfig {
        &self.config
    }

    /// Drop every cached result grouped under `bucket`.
    pub async fn invalidate_bucket(&self, bucket: &str) -> Result<(), OasisError> {
        self.store.del(bucket).await?;
        tracing::info!(bucket = %bucket, "query cache bucket invalidated");
        Ok(())
    }

    /// Drop the session entry stored under `key`.
    pub async fn invalidate_session(&self, key: &str) -> Result<(), OasisError> {
        self.store.del(key).await?;
        tracing::info!(key = %key, "query cache session invalidated");
        Ok(())
    }

    /// Read back the result last written for a session key.
    pub async fn session_snapshot(&self, key: &str) -> Result<Option<QueryResult>, OasisError> {
        match self.store.get(key).await? {
            Some(payload) => decode_payload(&payload).map(Some),
            None => Ok(None),
        }
    }

    async fn execute_session(&self, query: &Query, key: &str) -> Result<QueryResult, OasisError> {
        let result = self.inner.execute(query).await?;
        let payload = encode_payload(&result)?;
        self.store
            .set_ex(key, &payload, self.config.session_ttl)
            .await?;
        tracing::debug!(
            collection = %query.collection,
            key = %key,
            ttl = self.config.session_ttl,
            "query cache session stored"
        );
        Ok(result)
    }

    async fn execute_bucket(&self, query: &Query, bucket: &str) -> Result<QueryResult, OasisError> {
        let field = derive_cache_key(query)?;

        if let Some(payload) = self.store.hget(bucket, &field).await? {
            tracing::debug!(collection = %query.collection, bucket = %bucket, "query cache hit");
            return decode_payload(&payload);
        }

        tracing::debug!(collection = %query.collection, bucket = %bucket, "query cache miss");
        let result = self.inner.execute(query).await?;
        let payload = encode_payload(&result)?;
        self.store.hset(bucket, &field, &payload).await?;
        if let Some(ttl) = self.config.bucket_ttl {
            self.store.expire(bucket, ttl).await?;
        }
        Ok(result)
    }
}

#[async_trait]
impl QueryExecutor for CachingQueryExecutor {
    async fn execute(&self, query: &Query) -> Result<QueryResult, OasisError> {
        let Some(options) = query.cache_options() else {
            return self.inner.execute(query).await;
        };

        match options.mode {
            CacheMode::Session => self.execute_session(query, &options.key).await,
            CacheMode::Cache => self.execute_bucket(query, &options.key).await,
        }
    }
}
