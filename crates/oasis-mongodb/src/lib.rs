//! MongoDB integration for Oasis.
//!
//! [`MongoDocumentStore`] implements both [`QueryExecutor`](oasis_core::QueryExecutor)
//! and [`DocumentWriter`](oasis_core::DocumentWriter) over one MongoDB database,
//! so it can sit underneath a [`CachingQueryExecutor`](https://docs.rs/oasis-cache).
//!
//! # Example
//!
//! ```rust,no_run
//! use oasis_mongodb::{MongoDocumentStore, MongoStoreConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MongoStoreConfig::new("wild_oasis");
//! let store = MongoDocumentStore::from_uri("mongodb://localhost:27017", config).await?;
//! # Ok(())
//! # }
//! ```

mod convert;
mod document_store;

pub use document_store::{MongoDocumentStore, MongoStoreConfig};

// Re-export core traits for convenience.
pub use oasis_core::{DocumentWriter, QueryExecutor};
