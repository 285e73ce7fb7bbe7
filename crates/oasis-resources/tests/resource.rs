use std::sync::Arc;

use chrono::{DateTime, Utc};
use oasis_cache::{CachingQueryExecutor, InMemoryCacheStore};
use oasis_core::{document, OasisError, Query, QueryExecutor};
use oasis_resources::{
    Booking, BookingStatus, Cabin, InMemoryDocumentStore, ListParams, Resource,
};

struct Fixture {
    db: Arc<InMemoryDocumentStore>,
    cache: Arc<InMemoryCacheStore>,
    executor: Arc<CachingQueryExecutor>,
}

impl Fixture {
    async fn new() -> Self {
        let db = Arc::new(InMemoryDocumentStore::new());
        db.seed(
            "cabins",
            vec![
                document! { "_id": "c1", "name": "001", "max_capacity": 2, "regular_price": 250.0, "created_at": "2024-01-01T00:00:00Z" },
                document! { "_id": "c2", "name": "002", "max_capacity": 4, "regular_price": 350.0, "created_at": "2024-01-02T00:00:00Z" },
                document! { "_id": "c3", "name": "003", "max_capacity": 6, "regular_price": 500.0, "created_at": "2024-01-03T00:00:00Z" },
            ],
        )
        .await;
        let cache = Arc::new(InMemoryCacheStore::new());
        let executor = Arc::new(CachingQueryExecutor::new(db.clone(), cache.clone()));
        Self {
            db,
            cache,
            executor,
        }
    }

    fn cabins(&self) -> Resource<Cabin> {
        Resource::new(self.executor.clone(), self.db.clone())
    }

    fn bookings(&self) -> Resource<Booking> {
        Resource::new(self.executor.clone(), self.db.clone())
    }
}

fn names(cabins: &[Cabin]) -> Vec<&str> {
    cabins.iter().map(|c| c.name.as_str()).collect()
}

#[tokio::test]
async fn get_all_uses_default_sort_newest_first() {
    let fx = Fixture::new().await;
    let cabins = fx.cabins().get_all(&ListParams::new()).await.unwrap();
    assert_eq!(names(&cabins), vec!["003", "002", "001"]);
}

#[tokio::test]
async fn get_all_is_served_from_bucket_on_repeat() {
    let fx = Fixture::new().await;
    let cabins = fx.cabins();
    let params = ListParams::from_pairs([("max_capacity[gte]", "4")]).unwrap();

    let first = cabins.get_all(&params).await.unwrap();
    let second = cabins.get_all(&params).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(fx.db.executions(), 1);
    assert_eq!(fx.cache.hlen("cabins").await, 1);
}

#[tokio::test]
async fn different_params_get_separate_fields_in_bucket() {
    let fx = Fixture::new().await;
    let cabins = fx.cabins();

    cabins.get_all(&ListParams::new()).await.unwrap();
    cabins
        .get_all(&ListParams::new().with_page(2, 1))
        .await
        .unwrap();
    cabins.get_one("c1").await.unwrap();

    assert_eq!(fx.db.executions(), 3);
    assert_eq!(fx.cache.hlen("cabins").await, 3);
}

#[tokio::test]
async fn paging_and_sort_apply() {
    let fx = Fixture::new().await;
    let params = ListParams::new().with_sort("regular_price").with_page(2, 2);
    let cabins = fx.cabins().get_all(&params).await.unwrap();
    assert_eq!(names(&cabins), vec!["003"]);
}

#[tokio::test]
async fn get_one_returns_model_and_caches_it() {
    let fx = Fixture::new().await;
    let cabins = fx.cabins();

    let cabin = cabins.get_one("c2").await.unwrap();
    assert_eq!(cabin.name, "002");
    assert_eq!(cabin.max_capacity, 4);

    cabins.get_one("c2").await.unwrap();
    assert_eq!(fx.db.executions(), 1);
}

#[tokio::test]
async fn get_one_missing_is_not_found() {
    let fx = Fixture::new().await;
    let err = fx.cabins().get_one("nope").await.unwrap_err();
    assert!(matches!(err, OasisError::NotFound(_)));
}

#[tokio::test]
async fn create_invalidates_bucket_and_stamps_created_at() {
    let fx = Fixture::new().await;
    let cabins = fx.cabins();
    assert_eq!(cabins.get_all(&ListParams::new()).await.unwrap().len(), 3);

    let created = cabins
        .create_one(&Cabin {
            id: String::new(),
            name: "004".into(),
            max_capacity: 8,
            regular_price: 800.0,
            discount: 50.0,
            description: "Largest cabin".into(),
            image: None,
            created_at: None,
        })
        .await
        .unwrap();
    assert!(!created.id.is_empty());
    assert!(created.created_at.is_some());
    assert_eq!(fx.cache.hlen("cabins").await, 0);

    let all = cabins.get_all(&ListParams::new()).await.unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(all[0].name, "004");
    assert_eq!(fx.db.executions(), 2);
}

#[tokio::test]
async fn update_invalidates_and_returns_updated_model() {
    let fx = Fixture::new().await;
    let cabins = fx.cabins();
    cabins.get_one("c1").await.unwrap();

    let updated = cabins
        .update_one("c1", document! { "_id": "hijack", "regular_price": 199.0 })
        .await
        .unwrap();
    assert_eq!(updated.id, "c1");
    assert_eq!(updated.regular_price, 199.0);

    let reread = cabins.get_one("c1").await.unwrap();
    assert_eq!(reread.regular_price, 199.0);
    assert_eq!(fx.db.executions(), 2);
}

#[tokio::test]
async fn update_missing_is_not_found_and_keeps_cache() {
    let fx = Fixture::new().await;
    let cabins = fx.cabins();
    cabins.get_all(&ListParams::new()).await.unwrap();

    let err = cabins
        .update_one("nope", document! { "name": "x" })
        .await
        .unwrap_err();
    assert!(matches!(err, OasisError::NotFound(_)));
    assert_eq!(fx.cache.hlen("cabins").await, 1);
}

#[tokio::test]
async fn delete_invalidates_and_missing_is_not_found() {
    let fx = Fixture::new().await;
    let cabins = fx.cabins();
    cabins.get_all(&ListParams::new()).await.unwrap();

    cabins.delete_one("c3").await.unwrap();
    assert_eq!(fx.cache.hlen("cabins").await, 0);
    assert_eq!(cabins.get_all(&ListParams::new()).await.unwrap().len(), 2);

    let err = cabins.delete_one("c3").await.unwrap_err();
    assert!(matches!(err, OasisError::NotFound(_)));
}

#[tokio::test]
async fn writes_only_invalidate_their_own_bucket() {
    let fx = Fixture::new().await;
    fx.db
        .seed(
            "bookings",
            vec![document! {
                "_id": "b1", "cabin_id": "c1", "guest_id": "g1",
                "start_date": "2024-05-01T00:00:00Z", "end_date": "2024-05-04T00:00:00Z",
                "num_nights": 3, "num_guests": 2, "cabin_price": 750.0, "total_price": 750.0,
                "status": "checked-in"
            }],
        )
        .await;

    fx.bookings().get_all(&ListParams::new()).await.unwrap();
    fx.cabins().delete_one("c1").await.unwrap();

    assert_eq!(fx.cache.hlen("bookings").await, 1);
    let booking = fx.bookings().get_one("b1").await.unwrap();
    assert_eq!(booking.status, BookingStatus::CheckedIn);
}

#[tokio::test]
async fn session_read_always_runs_live_and_keeps_snapshot() {
    let fx = Fixture::new().await;
    let cabins = fx.cabins();

    let cabin = cabins.get_for_session("c1", "session:42").await.unwrap();
    assert_eq!(cabin.name, "001");
    cabins.get_for_session("c1", "session:42").await.unwrap();
    assert_eq!(fx.db.executions(), 2);

    let snapshot = fx
        .executor
        .session_snapshot("session:42")
        .await
        .unwrap()
        .unwrap()
        .into_one()
        .unwrap();
    assert_eq!(snapshot["name"], "001");
    assert!(fx.cache.ttl("session:42").await.is_some());
}

#[tokio::test]
async fn session_read_missing_is_not_found() {
    let fx = Fixture::new().await;
    let err = fx
        .cabins()
        .get_for_session("nope", "session:1")
        .await
        .unwrap_err();
    assert!(matches!(err, OasisError::NotFound(_)));
}

#[tokio::test]
async fn malformed_document_is_serialization_error() {
    let fx = Fixture::new().await;
    fx.db
        .seed("cabins", vec![document! { "_id": "bad", "name": 12 }])
        .await;
    let err = fx.cabins().get_one("bad").await.unwrap_err();
    assert!(matches!(err, OasisError::Serialization(_)));
}

#[tokio::test]
async fn out_of_range_page_is_validation_error() {
    let fx = Fixture::new().await;
    let params = ListParams::from_pairs([("page", "18446744073709551615")]).unwrap();
    let err = fx.cabins().get_all(&params).await.unwrap_err();
    assert!(matches!(err, OasisError::Validation(_)));
    assert_eq!(fx.db.executions(), 0);
}

#[tokio::test]
async fn created_at_is_normalised_and_sorts_with_seeded_timestamps() {
    let fx = Fixture::new().await;
    let cabins = fx.cabins();
    let created_at: DateTime<Utc> = "2024-01-03T00:00:00.5+00:00".parse().unwrap();

    let created = cabins
        .create_one(&Cabin {
            id: String::new(),
            name: "004".into(),
            max_capacity: 2,
            regular_price: 100.0,
            discount: 0.0,
            description: String::new(),
            image: None,
            created_at: Some(created_at),
        })
        .await
        .unwrap();
    assert_eq!(created.created_at, Some(created_at));

    let stored = fx
        .db
        .execute(&Query::find_by_id("cabins", &created.id))
        .await
        .unwrap()
        .into_one()
        .unwrap();
    assert_eq!(stored["created_at"], "2024-01-03T00:00:00.500Z");

    let all = cabins.get_all(&ListParams::new()).await.unwrap();
    assert_eq!(names(&all), vec!["004", "003", "002", "001"]);
}
