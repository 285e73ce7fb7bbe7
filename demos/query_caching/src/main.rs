use std::sync::Arc;

use oasis::cache::{derive_cache_key, CachingQueryExecutor, InMemoryCacheStore, QueryCacheConfig};
use oasis::core::{
    document, CacheStore, DocumentWriter, OasisError, Query, QueryExecutor,
};
use oasis::mongodb::{MongoDocumentStore, MongoStoreConfig};
use oasis::redis::RedisCacheStore;
use oasis::resources::{Cabin, InMemoryDocumentStore, ListParams, Resource};

fn cache_store() -> Result<Arc<dyn CacheStore>, OasisError> {
    match std::env::var("REDIS_URL") {
        Ok(url) => {
            println!("Cache store: Redis at {url}");
            Ok(Arc::new(RedisCacheStore::from_url(&url)?))
        }
        Err(_) => {
            println!("Cache store: in-memory (set REDIS_URL to use Redis)");
            Ok(Arc::new(InMemoryCacheStore::new()))
        }
    }
}

async fn document_store() -> Result<(Arc<dyn QueryExecutor>, Arc<dyn DocumentWriter>), OasisError>
{
    match std::env::var("MONGODB_URI") {
        Ok(uri) => {
            println!("Document store: MongoDB at {uri}");
            let db = Arc::new(
                MongoDocumentStore::from_uri(&uri, MongoStoreConfig::new("oasis_demo")).await?,
            );
            let reader: Arc<dyn QueryExecutor> = db.clone();
            let writer: Arc<dyn DocumentWriter> = db;
            Ok((reader, writer))
        }
        Err(_) => {
            println!("Document store: in-memory (set MONGODB_URI to use MongoDB)");
            let db = Arc::new(InMemoryDocumentStore::new());
            let reader: Arc<dyn QueryExecutor> = db.clone();
            let writer: Arc<dyn DocumentWriter> = db;
            Ok((reader, writer))
        }
    }
}

fn cabin(name: &str, max_capacity: u32, regular_price: f64) -> Cabin {
    Cabin {
        id: String::new(),
        name: name.to_string(),
        max_capacity,
        regular_price,
        discount: 0.0,
        description: format!("Cabin {name}"),
        image: None,
        created_at: None,
    }
}

#[tokio::main]
async fn main() -> Result<(), OasisError> {
    tracing_subscriber::fmt::init();

    let config = QueryCacheConfig::from_env()?;
    println!(
        "Session TTL: {}s, bucket TTL: {:?}",
        config.session_ttl, config.bucket_ttl
    );

    let (reader, writer) = document_store().await?;
    let executor = Arc::new(CachingQueryExecutor::with_config(
        reader,
        cache_store()?,
        config,
    ));
    let cabins: Resource<Cabin> = Resource::new(executor.clone(), writer);

    // --- Seed ---
    println!("\n=== Seed cabins ===");
    let mut ids = Vec::new();
    for (name, capacity, price) in [("001", 2, 250.0), ("002", 4, 350.0), ("003", 6, 500.0)] {
        let created = cabins.create_one(&cabin(name, capacity, price)).await?;
        println!("Created cabin {} ({})", created.name, created.id);
        ids.push(created.id);
    }

    // --- Unmarked query: always live, never cached ---
    println!("\n=== Unmarked query ===");
    let live = executor
        .execute(&Query::find("cabins", document! {}))
        .await?;
    println!("Live result: {} documents", live.len());

    // --- Cache mode: first read populates the bucket, second read is a hit ---
    println!("\n=== Cache mode (bucket \"cabins\") ===");
    let params = ListParams::from_pairs([("max_capacity[gte]", "4"), ("sort", "regular_price")])?;
    let key = derive_cache_key(&params.to_query("cabins")?)?;
    println!("Derived cache key: {key}");

    let first = cabins.get_all(&params).await?;
    println!("Miss: {:?}", first.iter().map(|c| &c.name).collect::<Vec<_>>());
    let second = cabins.get_all(&params).await?;
    println!("Hit:  {:?}", second.iter().map(|c| &c.name).collect::<Vec<_>>());
    println!("Same result: {}", first == second);

    // --- Session mode: always live, snapshot kept under the caller's key ---
    println!("\n=== Session mode ===");
    let session_key = format!("session:{}", ids[0]);
    let current = cabins.get_for_session(&ids[0], &session_key).await?;
    println!("Live read: cabin {}", current.name);
    if let Some(snapshot) = executor.session_snapshot(&session_key).await? {
        println!("Snapshot under {session_key}: {} document(s)", snapshot.len());
    }
    executor.invalidate_session(&session_key).await?;

    // --- Writes invalidate the bucket ---
    println!("\n=== Update invalidates ===");
    let updated = cabins
        .update_one(&ids[1], document! { "regular_price": 299.0 })
        .await?;
    println!("Cabin {} now costs {}", updated.name, updated.regular_price);
    let fresh = cabins.get_all(&params).await?;
    for cabin in &fresh {
        println!("  {} -> {}", cabin.name, cabin.regular_price);
    }

    // --- Cleanup ---
    println!("\n=== Cleanup ===");
    for id in &ids {
        cabins.delete_one(id).await?;
    }
    cabins.invalidate().await?;
    println!("Removed {} cabins", ids.len());

    println!("\nQuery caching demo completed successfully!");
    Ok(())
}
