use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document as BsonDocument};
use futures::TryStreamExt;
use mongodb::options::{FindOneAndUpdateOptions, FindOneOptions, FindOptions, ReturnDocument};
use mongodb::{Client, Collection, Database};
use oasis_core::{
    Document, DocumentWriter, OasisError, Query, QueryExecutor, QueryOp, QueryResult,
};
use serde_json::Value;

use crate::convert::{bson_doc_to_json_map, id_filter, json_map_to_bson, query_filter};

// ---------------------------------------------------------------------------
// MongoStoreConfig
// ---------------------------------------------------------------------------

/// Configuration for a [`MongoDocumentStore`].
#[derive(Debug, Clone)]
pub struct MongoStoreConfig {
    /// MongoDB database name.
    pub database: String,
}

impl MongoStoreConfig {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// MongoDocumentStore
// ---------------------------------------------------------------------------

/// Document store backed by one MongoDB database; each [`Query`] collection
/// maps to a MongoDB collection of the same name.
pub struct MongoDocumentStore {
    config: MongoStoreConfig,
    client: Client,
    database: Database,
}

impl MongoDocumentStore {
    /// Create a new store by connecting to MongoDB at the given URI.
    pub async fn from_uri(uri: &str, config: MongoStoreConfig) -> Result<Self, OasisError> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| OasisError::Store(format!("failed to connect to MongoDB: {e}")))?;

        Ok(Self::from_client(client, config))
    }

    /// Create a new store from an existing MongoDB client.
    pub fn from_client(client: Client, config: MongoStoreConfig) -> Self {
        let database = client.database(&config.database);
        Self {
            config,
            client,
            database,
        }
    }

    /// Return a reference to the underlying MongoDB client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Return a reference to the configuration.
    pub fn config(&self) -> &MongoStoreConfig {
        &self.config
    }

    fn collection(&self, name: &str) -> Collection<BsonDocument> {
        self.database.collection::<BsonDocument>(name)
    }

    async fn find_many(&self, query: &Query) -> Result<Vec<Document>, OasisError> {
        let mut options = FindOptions::default();
        options.sort = query.sort.as_ref().map(json_map_to_bson);
        options.projection = query.projection.as_ref().map(json_map_to_bson);
        options.skip = query.skip;
        options.limit = query.limit;

        let mut cursor = self
            .collection(&query.collection)
            .find(query_filter(&query.filter))
            .with_options(options)
            .await
            .map_err(|e| OasisError::Query(format!("MongoDB find: {e}")))?;

        let mut docs = Vec::new();
        while let Some(doc) = cursor
            .try_next()
            .await
            .map_err(|e| OasisError::Query(format!("MongoDB cursor: {e}")))?
        {
            docs.push(bson_doc_to_json_map(&doc));
        }
        Ok(docs)
    }

    async fn find_first(&self, query: &Query) -> Result<Option<Document>, OasisError> {
        let mut options = FindOneOptions::default();
        options.sort = query.sort.as_ref().map(json_map_to_bson);
        options.projection = query.projection.as_ref().map(json_map_to_bson);
        options.skip = query.skip;

        let found = self
            .collection(&query.collection)
            .find_one(query_filter(&query.filter))
            .with_options(options)
            .await
            .map_err(|e| OasisError::Query(format!("MongoDB find_one: {e}")))?;

        Ok(found.as_ref().map(bson_doc_to_json_map))
    }
}

// ---------------------------------------------------------------------------
// QueryExecutor implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl QueryExecutor for MongoDocumentStore {
    async fn execute(&self, query: &Query) -> Result<QueryResult, OasisError> {
        tracing::trace!(collection = %query.collection, op = ?query.op, "MongoDB query");
        match query.op {
            QueryOp::Find => self.find_many(query).await.map(QueryResult::Many),
            QueryOp::FindOne => self.find_first(query).await.map(QueryResult::One),
        }
    }
}

// ---------------------------------------------------------------------------
// DocumentWriter implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl DocumentWriter for MongoDocumentStore {
    async fn insert_one(
        &self,
        collection: &str,
        mut document: Document,
    ) -> Result<Document, OasisError> {
        if !matches!(document.get("_id"), Some(Value::String(id)) if !id.is_empty()) {
            document.insert("_id".to_string(), Value::String(ObjectId::new().to_hex()));
        }

        self.collection(collection)
            .insert_one(json_map_to_bson(&document))
            .await
            .map_err(|e| OasisError::Store(format!("MongoDB insert failed: {e}")))?;

        Ok(document)
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        mut changes: Document,
    ) -> Result<Option<Document>, OasisError> {
        changes.remove("_id");
        let coll = self.collection(collection);

        if changes.is_empty() {
            let found = coll
                .find_one(id_filter(id))
                .await
                .map_err(|e| OasisError::Store(format!("MongoDB find_one: {e}")))?;
            return Ok(found.as_ref().map(bson_doc_to_json_map));
        }

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let set = json_map_to_bson(&changes);
        let updated = coll
            .find_one_and_update(id_filter(id), doc! { "$set": set })
            .with_options(options)
            .await
            .map_err(|e| OasisError::Store(format!("MongoDB update failed: {e}")))?;

        Ok(updated.as_ref().map(bson_doc_to_json_map))
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> Result<bool, OasisError> {
        let result = self
            .collection(collection)
            .delete_one(id_filter(id))
            .await
            .map_err(|e| OasisError::Store(format!("MongoDB delete failed: {e}")))?;

        Ok(result.deleted_count > 0)
    }
}

