//! Booking domain models and the cached CRUD layer built on them.
//!
//! A [`Resource<M>`] serves list and single-document reads through a
//! [`CachingQueryExecutor`](oasis_cache::CachingQueryExecutor), grouping every
//! cached result for a model under the bucket named after its collection.
//! Writes go to a [`DocumentWriter`](oasis_core::DocumentWriter) and then drop
//! that bucket.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use oasis_cache::{CachingQueryExecutor, InMemoryCacheStore};
//! use oasis_resources::{Cabin, InMemoryDocumentStore, ListParams, Resource};
//!
//! # async fn example() -> Result<(), oasis_core::OasisError> {
//! let db = Arc::new(InMemoryDocumentStore::new());
//! let executor = Arc::new(CachingQueryExecutor::new(
//!     db.clone(),
//!     Arc::new(InMemoryCacheStore::new()),
//! ));
//! let cabins: Resource<Cabin> = Resource::new(executor, db);
//! let params = ListParams::from_pairs([("max_capacity[gte]", "4"), ("sort", "regular_price")])?;
//! let roomy = cabins.get_all(&params).await?;
//! # Ok(())
//! # }
//! ```

mod in_memory;
mod models;
mod params;
mod resource;

pub use in_memory::InMemoryDocumentStore;
pub use models::{Booking, BookingStatus, Bookmark, Cabin, Guest, Review, Role, Setting, User};
pub use params::{ListParams, DEFAULT_LIMIT, DEFAULT_SORT};
pub use resource::Resource;
