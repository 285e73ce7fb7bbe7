use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use oasis_cache::CachingQueryExecutor;
use oasis_core::{
    CacheOptions, Document, DocumentWriter, Model, OasisError, Query, QueryExecutor,
};
use serde_json::Value;

use crate::params::ListParams;

/// Generic CRUD handlers for one model.
///
/// Reads go through the caching executor with the model's collection name as
/// the hash bucket. Every successful write drops that bucket so the next read
/// repopulates it.
pub struct Resource<M: Model> {
    executor: Arc<CachingQueryExecutor>,
    writer: Arc<dyn DocumentWriter>,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> Clone for Resource<M> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            writer: self.writer.clone(),
            _model: PhantomData,
        }
    }
}

impl<M: Model> Resource<M> {
    pub fn new(executor: Arc<CachingQueryExecutor>, writer: Arc<dyn DocumentWriter>) -> Self {
        Self {
            executor,
            writer,
            _model: PhantomData,
        }
    }

    /// The cache bucket holding this model's read results.
    pub fn bucket(&self) -> &'static str {
        M::COLLECTION
    }

    pub async fn get_all(&self, params: &ListParams) -> Result<Vec<M>, OasisError> {
        let query = params
            .to_query(M::COLLECTION)?
            .cache(CacheOptions::bucket(M::COLLECTION));
        let models = self.executor.execute(&query).await?.hydrate::<M>()?.into_many();
        tracing::debug!(collection = M::COLLECTION, count = models.len(), "listed documents");
        Ok(models)
    }

    pub async fn get_one(&self, id: &str) -> Result<M, OasisError> {
        let query = Query::find_by_id(M::COLLECTION, id).cache(CacheOptions::bucket(M::COLLECTION));
        self.fetch_one(&query, id).await
    }

    /// Read a document live and keep its snapshot under `session_key`.
    pub async fn get_for_session(&self, id: &str, session_key: &str) -> Result<M, OasisError> {
        let query = Query::find_by_id(M::COLLECTION, id).cache(CacheOptions::session(session_key));
        self.fetch_one(&query, id).await
    }

    /// Insert `model`, stamping `created_at` with the current time when unset.
    ///
    /// `created_at` is always stored as RFC 3339 UTC with millisecond
    /// precision so stored timestamps order consistently.
    pub async fn create_one(&self, model: &M) -> Result<M, OasisError> {
        let mut doc = model.to_document()?;
        let created_at = match doc.get("created_at").and_then(Value::as_str) {
            Some(raw) => DateTime::parse_from_rfc3339(raw)
                .map_err(|e| OasisError::Validation(format!("created_at '{raw}': {e}")))?
                .with_timezone(&Utc),
            None => Utc::now(),
        };
        doc.insert("created_at".to_string(), timestamp(created_at));

        let stored = self.writer.insert_one(M::COLLECTION, doc).await?;
        self.invalidate().await?;
        let id = stored.get("_id").and_then(Value::as_str).unwrap_or_default();
        tracing::info!(collection = M::COLLECTION, id = %id, "document created");
        M::from_document(stored)
    }

    /// Apply `changes` field by field. `_id` cannot be changed.
    pub async fn update_one(&self, id: &str, mut changes: Document) -> Result<M, OasisError> {
        changes.remove("_id");
        let updated = self
            .writer
            .update_by_id(M::COLLECTION, id, changes)
            .await?
            .ok_or_else(|| not_found::<M>(id))?;
        self.invalidate().await?;
        tracing::info!(collection = M::COLLECTION, id = %id, "document updated");
        M::from_document(updated)
    }

    pub async fn delete_one(&self, id: &str) -> Result<(), OasisError> {
        if !self.writer.delete_by_id(M::COLLECTION, id).await? {
            return Err(not_found::<M>(id));
        }
        self.invalidate().await?;
        tracing::info!(collection = M::COLLECTION, id = %id, "document deleted");
        Ok(())
    }

    /// Drop every cached read for this model.
    pub async fn invalidate(&self) -> Result<(), OasisError> {
        self.executor.invalidate_bucket(M::COLLECTION).await
    }

    async fn fetch_one(&self, query: &Query, id: &str) -> Result<M, OasisError> {
        self.executor
            .execute(query)
            .await?
            .hydrate::<M>()?
            .into_one()
            .ok_or_else(|| not_found::<M>(id))
    }
}

fn not_found<M: Model>(id: &str) -> OasisError {
    OasisError::NotFound(format!("no document in {} with id {id}", M::COLLECTION))
}

fn timestamp(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339_opts(SecondsFormat::Millis, true))
}
