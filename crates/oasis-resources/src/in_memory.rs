use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use async_trait::async_trait;
use chrono::DateTime;
use oasis_core::{Document, DocumentWriter, OasisError, Query, QueryExecutor, QueryOp, QueryResult};
use serde_json::Value;
use tokio::sync::RwLock;

/// Process-local document store for tests and demos.
///
/// Supports equality filters, the comparison operators `$eq $ne $gt $gte $lt
/// $lte $in $nin`, dotted field paths, sort, skip, limit and projection.
/// Two RFC 3339 strings compare as instants.
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
    executions: AtomicUsize,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            executions: AtomicUsize::new(0),
        }
    }

    /// Insert documents without going through [`DocumentWriter`].
    pub async fn seed(&self, collection: &str, docs: Vec<Document>) {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .extend(docs);
    }

    /// How many read queries have been executed against this store.
    pub fn executions(&self) -> usize {
        self.executions.load(AtomicOrdering::SeqCst)
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryExecutor for InMemoryDocumentStore {
    async fn execute(&self, query: &Query) -> Result<QueryResult, OasisError> {
        self.executions.fetch_add(1, AtomicOrdering::SeqCst);

        let collections = self.collections.read().await;
        let mut docs: Vec<Document> = collections
            .get(&query.collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| matches_filter(doc, &query.filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(collections);

        if let Some(sort) = &query.sort {
            docs.sort_by(|a, b| compare_by_sort(a, b, sort));
        }

        let skip = query.skip.unwrap_or(0) as usize;
        let docs = docs.into_iter().skip(skip);
        let docs: Vec<Document> = match (query.op, query.limit) {
            (QueryOp::FindOne, _) => docs.take(1).collect(),
            (QueryOp::Find, Some(limit)) if limit > 0 => docs.take(limit as usize).collect(),
            (QueryOp::Find, _) => docs.collect(),
        };
        let docs: Vec<Document> = match &query.projection {
            Some(projection) => docs.into_iter().map(|d| project(d, projection)).collect(),
            None => docs,
        };

        Ok(match query.op {
            QueryOp::Find => QueryResult::Many(docs),
            QueryOp::FindOne => QueryResult::One(docs.into_iter().next()),
        })
    }
}

#[async_trait]
impl DocumentWriter for InMemoryDocumentStore {
    async fn insert_one(
        &self,
        collection: &str,
        mut document: Document,
    ) -> Result<Document, OasisError> {
        if !matches!(document.get("_id"), Some(Value::String(id)) if !id.is_empty()) {
            document.insert(
                "_id".to_string(),
                Value::String(uuid::Uuid::new_v4().simple().to_string()),
            );
        }

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.iter().any(|d| d.get("_id") == document.get("_id")) {
            return Err(OasisError::Store(format!(
                "duplicate _id {} in {collection}",
                document["_id"]
            )));
        }
        docs.push(document.clone());
        Ok(document)
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        changes: Document,
    ) -> Result<Option<Document>, OasisError> {
        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| has_id(d, id)))
        else {
            return Ok(None);
        };
        for (field, value) in changes {
            if field != "_id" {
                doc.insert(field, value);
            }
        }
        Ok(Some(doc.clone()))
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> Result<bool, OasisError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|d| !has_id(d, id));
        Ok(docs.len() < before)
    }
}

fn has_id(doc: &Document, id: &str) -> bool {
    doc.get("_id").and_then(Value::as_str) == Some(id)
}

fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn matches_filter(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(field, condition)| {
        let actual = lookup(doc, field);
        match condition {
            Value::Object(ops) if !ops.is_empty() && ops.keys().all(|k| k.starts_with('$')) => ops
                .iter()
                .all(|(op, expected)| matches_operator(actual, op, expected)),
            expected => actual == Some(expected),
        }
    })
}

fn matches_operator(actual: Option<&Value>, op: &str, expected: &Value) -> bool {
    let ordering = || actual.and_then(|a| compare_values(a, expected));
    match op {
        "$eq" => actual == Some(expected),
        "$ne" => actual != Some(expected),
        "$gt" => ordering() == Some(Ordering::Greater),
        "$gte" => matches!(ordering(), Some(Ordering::Greater | Ordering::Equal)),
        "$lt" => ordering() == Some(Ordering::Less),
        "$lte" => matches!(ordering(), Some(Ordering::Less | Ordering::Equal)),
        "$in" => expected
            .as_array()
            .is_some_and(|options| actual.is_some_and(|a| options.contains(a))),
        "$nin" => expected
            .as_array()
            .is_some_and(|options| actual.is_none_or(|a| !options.contains(a))),
        _ => false,
    }
}

fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(x), Ok(y)) => Some(x.cmp(&y)),
                _ => Some(x.cmp(y)),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn compare_by_sort(a: &Document, b: &Document, sort: &Document) -> Ordering {
    for (field, direction) in sort {
        let ord = match (lookup(a, field), lookup(b, field)) {
            (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        let ord = if direction.as_i64() == Some(-1) {
            ord.reverse()
        } else {
            ord
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn project(doc: Document, projection: &Document) -> Document {
    let including = projection.values().any(|v| v.as_i64() == Some(1));
    doc.into_iter()
        .filter(|(field, _)| {
            let flag = projection.get(field).and_then(Value::as_i64);
            if including {
                field == "_id" || flag == Some(1)
            } else {
                flag != Some(0)
            }
        })
        .collect()
}
