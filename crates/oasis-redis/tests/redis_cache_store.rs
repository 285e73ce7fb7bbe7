use oasis_redis::{RedisCacheStore, RedisCacheStoreConfig};

// ---------------------------------------------------------------------------
// Unit tests for config construction (no Redis required)
// ---------------------------------------------------------------------------

#[test]
fn config_defaults() {
    let config = RedisCacheStoreConfig::default();
    assert_eq!(config.prefix, "oasis:");
}

#[test]
fn keys_carry_prefix() {
    let config = RedisCacheStoreConfig {
        prefix: "wild-oasis:".to_string(),
    };
    let store = RedisCacheStore::from_url_with_config("redis://127.0.0.1/", config).unwrap();
    assert_eq!(store.redis_key("bookings"), "wild-oasis:bookings");
    assert_eq!(store.config().prefix, "wild-oasis:");
}

#[test]
fn from_url_invalid_url() {
    // An obviously invalid URL should produce an error
    let result = RedisCacheStore::from_url("not-a-valid-url");
    assert!(result.is_err());
}

#[tokio::test]
async fn oversized_ttl_is_rejected_before_connecting() {
    use oasis_redis::CacheStore;

    // Nothing listens on port 1; the TTL check fails first.
    let store = RedisCacheStore::from_url("redis://127.0.0.1:1/").unwrap();
    let err = store.expire("bookings", u64::MAX).await.unwrap_err();
    assert!(err.to_string().contains("out of range"));
    let err = store.set_ex("session:1", "v", u64::MAX).await.unwrap_err();
    assert!(err.to_string().contains("out of range"));
}

// ---------------------------------------------------------------------------
// Integration tests: require a running Redis instance.
// Run with: cargo test -p oasis-redis -- --ignored
// ---------------------------------------------------------------------------

#[cfg(test)]
mod integration {
    use std::sync::Arc;

    use oasis_cache::{CachingQueryExecutor, QueryCacheConfig};
    use oasis_core::{
        document, CacheOptions, OasisError, Query, QueryExecutor, QueryResult,
    };
    use oasis_redis::{CacheStore, RedisCacheStore, RedisCacheStoreConfig};

    const REDIS_URL: &str = "redis://127.0.0.1/";

    fn test_store(prefix: &str) -> RedisCacheStore {
        let config = RedisCacheStoreConfig {
            prefix: format!("oasis:test:{prefix}:"),
        };
        RedisCacheStore::from_url_with_config(REDIS_URL, config)
            .expect("Redis client creation failed")
    }

    struct StaticExecutor;

    #[async_trait::async_trait]
    impl QueryExecutor for StaticExecutor {
        async fn execute(&self, _query: &Query) -> Result<QueryResult, OasisError> {
            Ok(QueryResult::Many(vec![
                document! { "_id": "r1", "rating": 5 },
                document! { "_id": "r2", "rating": 4 },
            ]))
        }
    }

    #[tokio::test]
    #[ignore = "requires running Redis"]
    async fn set_ex_and_get() {
        let store = test_store("kv");
        store.set_ex("session:1", "hello", 60).await.unwrap();

        let value = store.get("session:1").await.unwrap();
        assert_eq!(value.as_deref(), Some("hello"));

        // Cleanup
        store.del("session:1").await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires running Redis"]
    async fn get_nonexistent() {
        let store = test_store("kv");
        assert!(store.get("nonexistent_key_12345").await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "requires running Redis"]
    async fn hset_hget_and_del_bucket() {
        let store = test_store("hash");
        store.hset("reviews", "a", "1").await.unwrap();
        store.hset("reviews", "b", "2").await.unwrap();

        assert_eq!(store.hget("reviews", "a").await.unwrap().as_deref(), Some("1"));
        assert!(store.hget("reviews", "missing").await.unwrap().is_none());

        store.del("reviews").await.unwrap();
        assert!(store.hget("reviews", "b").await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "requires running Redis"]
    async fn set_ex_expires() {
        let store = test_store("ttl");
        store.set_ex("short", "expires soon", 1).await.unwrap();
        assert!(store.get("short").await.unwrap().is_some());

        // Wait for TTL to expire
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;

        assert!(store.get("short").await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "requires running Redis"]
    async fn caching_executor_round_trip() {
        let store = Arc::new(test_store("exec"));
        store.del("reviews").await.unwrap();
        let executor = CachingQueryExecutor::with_config(
            Arc::new(StaticExecutor),
            store.clone(),
            QueryCacheConfig::default().with_bucket_ttl(60),
        );

        let query = Query::find("reviews", document! { "cabin_id": "c1" })
            .cache(CacheOptions::bucket("reviews"));
        let live = executor.execute(&query).await.unwrap();
        let cached = executor.execute(&query).await.unwrap();
        assert_eq!(live, cached);
        assert_eq!(cached.len(), 2);

        executor.invalidate_bucket("reviews").await.unwrap();
    }
}
