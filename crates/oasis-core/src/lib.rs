use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[doc(hidden)]
pub use serde_json;

/// A single record as stored in a collection: a JSON object keyed by field name.
pub type Document = Map<String, Value>;

/// Build a [`Document`] from JSON object syntax.
///
/// ```rust
/// use oasis_core::document;
///
/// let filter = document! { "status": "confirmed", "num_guests": { "$gte": 2 } };
/// assert_eq!(filter.len(), 2);
/// ```
#[macro_export]
macro_rules! document {
    ($($body:tt)*) => {
        match $crate::serde_json::json!({ $($body)* }) {
            $crate::serde_json::Value::Object(map) => map,
            _ => unreachable!("object literal always yields an object"),
        }
    };
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Unified error type for Oasis with variants covering every subsystem.
#[derive(Debug, Error)]
pub enum OasisError {
    #[error("query error: {0}")]
    Query(String),
    #[error("cache error: {0}")]
    Cache(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("config error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Cache marker
// ---------------------------------------------------------------------------

/// Addressing strategy for a cache-marked query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// The marker key is the storage key; the entry expires with the session.
    Session,
    /// The marker key names a hash bucket; the field is derived from the query.
    Cache,
}

/// Marker attached to a [`Query`] to opt it into result caching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheOptions {
    pub key: String,
    #[serde(rename = "type")]
    pub mode: CacheMode,
}

impl CacheOptions {
    pub fn new(key: impl Into<String>, mode: CacheMode) -> Self {
        Self {
            key: key.into(),
            mode,
        }
    }

    /// Session-mode marker stored verbatim under `key`.
    pub fn session(key: impl Into<String>) -> Self {
        Self::new(key, CacheMode::Session)
    }

    /// Cache-mode marker grouping entries under the hash bucket `bucket`.
    pub fn bucket(bucket: impl Into<String>) -> Self {
        Self::new(bucket, CacheMode::Cache)
    }
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// The read operation a [`Query`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryOp {
    /// Every matching document, in sort order.
    Find,
    /// The first matching document, if any.
    FindOne,
}

/// A read query against one collection.
///
/// Built with [`Query::find`] / [`Query::find_one`] and the chainable
/// modifiers; [`Query::cache`] marks it for the caching executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub collection: String,
    pub op: QueryOp,
    pub filter: Document,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<Document>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Document>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip)]
    pub cache: Option<CacheOptions>,
}

impl Query {
    fn new(collection: impl Into<String>, op: QueryOp, filter: Document) -> Self {
        Self {
            collection: collection.into(),
            op,
            filter,
            projection: None,
            sort: None,
            skip: None,
            limit: None,
            cache: None,
        }
    }

    pub fn find(collection: impl Into<String>, filter: Document) -> Self {
        Self::new(collection, QueryOp::Find, filter)
    }

    pub fn find_one(collection: impl Into<String>, filter: Document) -> Self {
        Self::new(collection, QueryOp::FindOne, filter)
    }

    pub fn find_by_id(collection: impl Into<String>, id: &str) -> Self {
        Self::find_one(collection, document! { "_id": id })
    }

    pub fn sort(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn select(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Mark this query for result caching.
    pub fn cache(mut self, options: CacheOptions) -> Self {
        self.cache = Some(options);
        self
    }

    pub fn cache_options(&self) -> Option<&CacheOptions> {
        self.cache.as_ref()
    }

    pub fn is_cacheable(&self) -> bool {
        self.cache.is_some()
    }
}

// ---------------------------------------------------------------------------
// Query results
// ---------------------------------------------------------------------------

/// The raw documents a [`Query`] produced.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    One(Option<Document>),
    Many(Vec<Document>),
}

impl QueryResult {
    pub fn len(&self) -> usize {
        match self {
            QueryResult::One(doc) => usize::from(doc.is_some()),
            QueryResult::Many(docs) => docs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into a list of documents.
    pub fn into_many(self) -> Vec<Document> {
        match self {
            QueryResult::One(doc) => doc.into_iter().collect(),
            QueryResult::Many(docs) => docs,
        }
    }

    /// The first document, if any.
    pub fn into_one(self) -> Option<Document> {
        match self {
            QueryResult::One(doc) => doc,
            QueryResult::Many(docs) => docs.into_iter().next(),
        }
    }

    /// Reconstruct model instances, one per document, preserving order.
    pub fn hydrate<M: Model>(self) -> Result<Hydrated<M>, OasisError> {
        match self {
            QueryResult::One(None) => Ok(Hydrated::One(None)),
            QueryResult::One(Some(doc)) => Ok(Hydrated::One(Some(M::from_document(doc)?))),
            QueryResult::Many(docs) => docs
                .into_iter()
                .map(M::from_document)
                .collect::<Result<Vec<_>, _>>()
                .map(Hydrated::Many),
        }
    }
}

/// Typed counterpart of [`QueryResult`].
#[derive(Debug, Clone, PartialEq)]
pub enum Hydrated<M> {
    One(Option<M>),
    Many(Vec<M>),
}

impl<M> Hydrated<M> {
    pub fn into_many(self) -> Vec<M> {
        match self {
            Hydrated::One(model) => model.into_iter().collect(),
            Hydrated::Many(models) => models,
        }
    }

    pub fn into_one(self) -> Option<M> {
        match self {
            Hydrated::One(model) => model,
            Hydrated::Many(models) => models.into_iter().next(),
        }
    }
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// A typed record living in a named collection.
pub trait Model: Serialize + DeserializeOwned + Send + Sync {
    /// Name of the collection holding this model's documents.
    const COLLECTION: &'static str;

    fn from_document(doc: Document) -> Result<Self, OasisError> {
        serde_json::from_value(Value::Object(doc))
            .map_err(|e| OasisError::Serialization(format!("{}: {e}", Self::COLLECTION)))
    }

    fn to_document(&self) -> Result<Document, OasisError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(doc)) => Ok(doc),
            Ok(other) => Err(OasisError::Serialization(format!(
                "{} serialized to a non-document value: {other}",
                Self::COLLECTION
            ))),
            Err(e) => Err(OasisError::Serialization(format!("{}: {e}", Self::COLLECTION))),
        }
    }
}

// ---------------------------------------------------------------------------
// Core traits
// ---------------------------------------------------------------------------

/// Executes read queries against a document store.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, query: &Query) -> Result<QueryResult, OasisError>;
}

/// Write side of a document store. Documents are addressed by their `_id`.
#[async_trait]
pub trait DocumentWriter: Send + Sync {
    /// Insert a document, assigning an `_id` when absent. Returns the stored document.
    async fn insert_one(&self, collection: &str, document: Document)
        -> Result<Document, OasisError>;

    /// Apply `changes` field by field. Returns the updated document, or `None` if no match.
    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        changes: Document,
    ) -> Result<Option<Document>, OasisError>;

    /// Delete a document. Returns whether one was removed.
    async fn delete_by_id(&self, collection: &str, id: &str) -> Result<bool, OasisError>;
}

/// Key/value and hash store holding serialized cache entries.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, OasisError>;
    /// Set `key` to `value`, expiring after `seconds`.
    async fn set_ex(&self, key: &str, value: &str, seconds: u64) -> Result<(), OasisError>;
    async fn hget(&self, bucket: &str, field: &str) -> Result<Option<String>, OasisError>;
    async fn hset(&self, bucket: &str, field: &str, value: &str) -> Result<(), OasisError>;
    /// Remove a key or a whole bucket.
    async fn del(&self, key: &str) -> Result<(), OasisError>;
    async fn expire(&self, key: &str, seconds: u64) -> Result<(), OasisError>;
}
