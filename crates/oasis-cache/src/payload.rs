use oasis_core::{OasisError, QueryResult};
use serde_json::Value;

/// Serialize a query result for storage.
///
/// `Many` becomes a JSON array, `One(Some(_))` an object and `One(None)` `null`.
pub fn encode_payload(result: &QueryResult) -> Result<String, OasisError> {
    let value = match result {
        QueryResult::Many(docs) => Value::Array(docs.iter().cloned().map(Value::Object).collect()),
        QueryResult::One(Some(doc)) => Value::Object(doc.clone()),
        QueryResult::One(None) => Value::Null,
    };
    serde_json::to_string(&value)
        .map_err(|e| OasisError::Cache(format!("JSON serialize error: {e}")))
}

/// Reconstruct a query result from a stored payload.
///
/// An array payload yields one document per element in order; an object or
/// `null` yields a single result.
pub fn decode_payload(payload: &str) -> Result<QueryResult, OasisError> {
    let value: Value = serde_json::from_str(payload)
        .map_err(|e| OasisError::Cache(format!("JSON deserialize error: {e}")))?;

    match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(doc) => Ok(doc),
                other => Err(OasisError::Cache(format!(
                    "cached element {i} is not a document: {other}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(QueryResult::Many),
        Value::Object(doc) => Ok(QueryResult::One(Some(doc))),
        Value::Null => Ok(QueryResult::One(None)),
        other => Err(OasisError::Cache(format!(
            "cached payload is not a document: {other}"
        ))),
    }
}
