use bson::oid::ObjectId;
use bson::{doc, Bson, Document as BsonDocument};
use oasis_core::Document;
use serde_json::Value;

/// Convert a JSON document to BSON.
pub(crate) fn json_map_to_bson(map: &Document) -> BsonDocument {
    let mut doc = BsonDocument::new();
    for (k, v) in map {
        doc.insert(k.clone(), json_to_bson(v));
    }
    doc
}

/// Convert a `serde_json::Value` to a `bson::Bson` value.
fn json_to_bson(value: &Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Bson::Int64(i)
            } else if let Some(f) = n.as_f64() {
                Bson::Double(f)
            } else {
                Bson::Null
            }
        }
        Value::String(s) => Bson::String(s.clone()),
        Value::Array(arr) => Bson::Array(arr.iter().map(json_to_bson).collect()),
        Value::Object(map) => Bson::Document(json_map_to_bson(map)),
    }
}

/// Convert a BSON document to JSON. ObjectIds become hex strings and dates RFC 3339 strings.
pub(crate) fn bson_doc_to_json_map(doc: &BsonDocument) -> Document {
    doc.iter()
        .map(|(k, v)| (k.clone(), bson_to_json(v)))
        .collect()
}

fn bson_to_json(bson: &Bson) -> Value {
    match bson {
        Bson::Null => Value::Null,
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(i) => Value::Number((*i as i64).into()),
        Bson::Int64(i) => Value::Number((*i).into()),
        Bson::Double(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Bson::String(s) => Value::String(s.clone()),
        Bson::Array(arr) => Value::Array(arr.iter().map(bson_to_json).collect()),
        Bson::Document(doc) => Value::Object(bson_doc_to_json_map(doc)),
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => Value::String(
            dt.try_to_rfc3339_string()
                .unwrap_or_else(|_| dt.to_string()),
        ),
        other => other.clone().into_relaxed_extjson(),
    }
}

/// Build a BSON filter from a query filter.
///
/// A string `_id` that parses as an ObjectId matches either representation,
/// so documents inserted by other tools stay addressable.
pub(crate) fn query_filter(filter: &Document) -> BsonDocument {
    let mut bson_filter = json_map_to_bson(filter);
    let string_id = match bson_filter.get("_id") {
        Some(Bson::String(id)) => Some(id.clone()),
        _ => None,
    };
    if let Some(id) = string_id {
        bson_filter.insert("_id", id_condition(&id));
    }
    bson_filter
}

/// Filter addressing a single document by id.
pub(crate) fn id_filter(id: &str) -> BsonDocument {
    doc! { "_id": id_condition(id) }
}

fn id_condition(id: &str) -> Bson {
    match ObjectId::parse_str(id) {
        Ok(oid) => Bson::Document(doc! { "$in": [id, oid] }),
        Err(_) => Bson::String(id.to_string()),
    }
}
