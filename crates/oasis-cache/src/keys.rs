use oasis_core::{OasisError, Query};
use serde_json::{Map, Value};

/// Derive the hash-field key addressing `query`'s result inside a bucket.
///
/// The key is the canonical JSON of the query shape: collection, operation,
/// filter and any projection/sort/skip/limit. Object fields are emitted in
/// sorted order at every depth, so filters that differ only in field order
/// share a key, while identical filters against different collections never do.
pub fn derive_cache_key(query: &Query) -> Result<String, OasisError> {
    let shape = serde_json::to_value(query)
        .map_err(|e| OasisError::Cache(format!("failed to serialize query shape: {e}")))?;
    serde_json::to_string(&canonicalize(shape))
        .map_err(|e| OasisError::Cache(format!("failed to serialize cache key: {e}")))
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::with_capacity(entries.len());
            for (k, v) in entries {
                sorted.insert(k, canonicalize(v));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oasis_core::{document, CacheOptions};

    #[test]
    fn same_shape_same_key() {
        let a = Query::find("bookings", document! { "status": "confirmed", "num_nights": 3 });
        let b = Query::find("bookings", document! { "num_nights": 3, "status": "confirmed" });
        assert_eq!(derive_cache_key(&a).unwrap(), derive_cache_key(&b).unwrap());
    }

    #[test]
    fn collection_separates_keys() {
        let bookings = Query::find("bookings", document! { "status": "confirmed" });
        let reviews = Query::find("reviews", document! { "status": "confirmed" });
        assert_ne!(
            derive_cache_key(&bookings).unwrap(),
            derive_cache_key(&reviews).unwrap()
        );
    }

    #[test]
    fn filter_field_named_collection_does_not_collide() {
        let a = Query::find("bookings", document! { "collection": "reviews" });
        let b = Query::find("reviews", document! { "collection": "bookings" });
        assert_ne!(derive_cache_key(&a).unwrap(), derive_cache_key(&b).unwrap());
    }

    #[test]
    fn pagination_is_part_of_the_key() {
        let page1 = Query::find("cabins", document! {}).limit(10);
        let page2 = Query::find("cabins", document! {}).skip(10).limit(10);
        assert_ne!(derive_cache_key(&page1).unwrap(), derive_cache_key(&page2).unwrap());
    }

    #[test]
    fn cache_marker_does_not_affect_key() {
        let plain = Query::find("cabins", document! {});
        let marked = plain.clone().cache(CacheOptions::bucket("cabins"));
        assert_eq!(derive_cache_key(&plain).unwrap(), derive_cache_key(&marked).unwrap());
    }

    #[test]
    fn nested_objects_are_sorted() {
        let a = Query::find("bookings", document! { "price": { "$lt": 500, "$gt": 100 } });
        let b = Query::find("bookings", document! { "price": { "$gt": 100, "$lt": 500 } });
        let key = derive_cache_key(&a).unwrap();
        assert_eq!(key, derive_cache_key(&b).unwrap());
        assert!(key.contains(r#"{"$gt":100,"$lt":500}"#));
    }
}
