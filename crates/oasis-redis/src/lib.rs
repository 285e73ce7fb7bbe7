//! Redis integration for Oasis.
//!
//! [`RedisCacheStore`] implements the [`CacheStore`](oasis_core::CacheStore)
//! trait so the query cache can keep session entries and hash buckets in Redis.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use oasis_redis::{RedisCacheStore, RedisCacheStoreConfig};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = RedisCacheStore::from_url("redis://127.0.0.1/")?;
//!
//! let config = RedisCacheStoreConfig { prefix: "wild-oasis:".to_string() };
//! let store = RedisCacheStore::from_url_with_config("redis://127.0.0.1/", config)?;
//! # Ok(())
//! # }
//! ```

mod cache;

pub use cache::{RedisCacheStore, RedisCacheStoreConfig};

// Re-export core traits for convenience.
pub use oasis_core::CacheStore;
