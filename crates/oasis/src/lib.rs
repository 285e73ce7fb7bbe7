//! Oasis: query-result caching for the Wild Oasis booking backend.
//!
//! This crate re-exports the Oasis sub-crates for single-import usage.
//! Enable features to control which modules are available.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `default` | `cache`, `resources` |
//! | `cache` | `CachingQueryExecutor`, `InMemoryCacheStore`, cache key derivation |
//! | `resources` | Booking models, `ListParams`, the cached CRUD `Resource<M>` |
//! | `redis` | Redis-backed `CacheStore` |
//! | `mongodb` | MongoDB-backed `QueryExecutor` and `DocumentWriter` |
//! | `full` | All features enabled |
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use oasis::core::{document, CacheOptions, Query, QueryExecutor};
//! use oasis::cache::{CachingQueryExecutor, InMemoryCacheStore};
//! use oasis::resources::{Cabin, ListParams, Resource};
//! ```

/// Query model, cache marker, error type and the store traits. Always available.
pub use oasis_core as core;

/// Caching executor, in-memory cache store, key derivation and payload codec.
#[cfg(feature = "cache")]
pub use oasis_cache as cache;

/// Domain models and the cached CRUD resource layer.
#[cfg(feature = "resources")]
pub use oasis_resources as resources;

/// Redis cache store.
#[cfg(feature = "redis")]
pub use oasis_redis as redis;

/// MongoDB document store.
#[cfg(feature = "mongodb")]
pub use oasis_mongodb as mongodb;
