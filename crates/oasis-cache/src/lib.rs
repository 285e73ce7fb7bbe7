//! Query-result caching for Oasis.
//!
//! [`CachingQueryExecutor`] wraps any [`QueryExecutor`](oasis_core::QueryExecutor)
//! and a [`CacheStore`](oasis_core::CacheStore). Queries opt in with
//! [`Query::cache`](oasis_core::Query::cache):
//!
//! - [`CacheMode::Session`](oasis_core::CacheMode::Session): the live result is
//!   written under the caller's key with the session TTL.
//! - [`CacheMode::Cache`](oasis_core::CacheMode::Cache): the result is stored as
//!   a field of the named hash bucket, addressed by [`derive_cache_key`].
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use oasis_cache::{CachingQueryExecutor, InMemoryCacheStore, QueryCacheConfig};
//! use oasis_core::{document, CacheOptions, Query, QueryExecutor};
//!
//! # async fn example(db: Arc<dyn QueryExecutor>) -> Result<(), oasis_core::OasisError> {
//! let executor = CachingQueryExecutor::with_config(
//!     db,
//!     Arc::new(InMemoryCacheStore::new()),
//!     QueryCacheConfig::default().with_bucket_ttl(600),
//! );
//! let query = Query::find("bookings", document! { "status": "confirmed" })
//!     .cache(CacheOptions::bucket("bookings"));
//! let bookings = executor.execute(&query).await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod executor;
mod in_memory;
mod keys;
mod payload;

pub use config::{parse_seconds, QueryCacheConfig, DEFAULT_SESSION_TTL_SECS, MAX_TTL_SECS};
pub use executor::CachingQueryExecutor;
pub use in_memory::InMemoryCacheStore;
pub use keys::derive_cache_key;
pub use payload::{decode_payload, encode_payload};

// Re-export core traits for convenience.
pub use oasis_core::{CacheMode, CacheOptions, CacheStore, QueryExecutor};
