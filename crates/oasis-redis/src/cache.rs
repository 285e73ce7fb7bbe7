use async_trait::async_trait;
use oasis_core::OasisError;
use redis::AsyncCommands;

/// Configuration for [`RedisCacheStore`].
#[derive(Debug, Clone)]
pub struct RedisCacheStoreConfig {
    /// Prefix for every key and bucket name. Defaults to `"oasis:"`.
    pub prefix: String,
}

impl Default for RedisCacheStoreConfig {
    fn default() -> Self {
        Self {
            prefix: "oasis:".to_string(),
        }
    }
}

/// Redis-backed implementation of the [`CacheStore`](oasis_core::CacheStore) trait.
///
/// Session entries are plain string keys written with `SET .. EX`; cache
/// buckets are Redis hashes. Both live under `{prefix}{name}`.
pub struct RedisCacheStore {
    client: redis::Client,
    config: RedisCacheStoreConfig,
}

impl RedisCacheStore {
    /// Create a new `RedisCacheStore` with an existing Redis client and configuration.
    pub fn new(client: redis::Client, config: RedisCacheStoreConfig) -> Self {
        Self { client, config }
    }

    /// Create a new `RedisCacheStore` from a Redis URL with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn from_url(url: &str) -> Result<Self, OasisError> {
        Self::from_url_with_config(url, RedisCacheStoreConfig::default())
    }

    /// Create a new `RedisCacheStore` from a Redis URL with custom configuration.
    pub fn from_url_with_config(
        url: &str,
        config: RedisCacheStoreConfig,
    ) -> Result<Self, OasisError> {
        let client = redis::Client::open(url)
            .map_err(|e| OasisError::Cache(format!("failed to connect to Redis: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RedisCacheStoreConfig {
        &self.config
    }

    /// Build the full Redis key for a session key or bucket name.
    pub fn redis_key(&self, key: &str) -> String {
        format!("{}{key}", self.config.prefix)
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection, OasisError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| OasisError::Cache(format!("Redis connection error: {e}")))
    }
}

#[async_trait]
impl oasis_core::CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, OasisError> {
        let mut con = self.get_connection().await?;
        let raw: Option<String> = con
            .get(self.redis_key(key))
            .await
            .map_err(|e| OasisError::Cache(format!("Redis GET error: {e}")))?;
        Ok(raw)
    }

    async fn set_ex(&self, key: &str, value: &str, seconds: u64) -> Result<(), OasisError> {
        let ttl = ttl_arg(seconds)?;
        let mut con = self.get_connection().await?;
        let redis_key = self.redis_key(key);

        let _: () = redis::cmd("SET")
            .arg(&redis_key)
            .arg(value)
            .arg("EX")
            .arg(ttl)
            .query_async(&mut con)
            .await
            .map_err(|e| OasisError::Cache(format!("Redis SET error: {e}")))?;

        tracing::trace!(key = %redis_key, ttl = seconds, "redis SET EX");
        Ok(())
    }

    async fn hget(&self, bucket: &str, field: &str) -> Result<Option<String>, OasisError> {
        let mut con = self.get_connection().await?;
        let raw: Option<String> = con
            .hget(self.redis_key(bucket), field)
            .await
            .map_err(|e| OasisError::Cache(format!("Redis HGET error: {e}")))?;
        Ok(raw)
    }

    async fn hset(&self, bucket: &str, field: &str, value: &str) -> Result<(), OasisError> {
        let mut con = self.get_connection().await?;
        con.hset::<_, _, _, ()>(self.redis_key(bucket), field, value)
            .await
            .map_err(|e| OasisError::Cache(format!("Redis HSET error: {e}")))?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), OasisError> {
        let mut con = self.get_connection().await?;
        con.del::<_, ()>(self.redis_key(key))
            .await
            .map_err(|e| OasisError::Cache(format!("Redis DEL error: {e}")))?;
        Ok(())
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<(), OasisError> {
        let ttl = ttl_arg(seconds)?;
        let mut con = self.get_connection().await?;
        con.expire::<_, ()>(self.redis_key(key), ttl)
            .await
            .map_err(|e| OasisError::Cache(format!("Redis EXPIRE error: {e}")))?;
        Ok(())
    }
}

/// Redis rejects or misreads TTLs that do not fit a signed 64-bit integer.
fn ttl_arg(seconds: u64) -> Result<i64, OasisError> {
    i64::try_from(seconds)
        .map_err(|_| OasisError::Cache(format!("TTL of {seconds}s is out of range for Redis")))
}
