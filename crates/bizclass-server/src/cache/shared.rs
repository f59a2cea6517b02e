// crates/bizclass-server/src/cache/shared.rs
// Second-tier result cache shared across processes

use crate::db::DatabasePool;
use crate::db::cache::{cache_get_sync, cache_purge_expired_sync, cache_put_sync};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Serialized result storage keyed by request fingerprint
#[async_trait]
pub trait SharedCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn put(&self, key: &str, payload: String, ttl: Duration) -> Result<()>;
}

/// Shared cache stored in the classifier's SQLite database
pub struct SqliteSharedCache {
    pool: Arc<DatabasePool>,
}

impl SqliteSharedCache {
    pub fn new(pool: Arc<DatabasePool>) -> Self {
        Self { pool }
    }

    /// Drop expired rows, returning how many went
    pub async fn purge_expired(&self) -> Result<usize> {
        let now = chrono::Utc::now().timestamp();
        self.pool
            .run(move |conn| cache_purge_expired_sync(conn, now))
            .await
    }
}

#[async_trait]
impl SharedCache for SqliteSharedCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        let now = chrono::Utc::now().timestamp();
        self.pool
            .run(move |conn| cache_get_sync(conn, &key, now))
            .await
    }

    async fn put(&self, key: &str, payload: String, ttl: Duration) -> Result<()> {
        let key = key.to_string();
        let now = chrono::Utc::now().timestamp();
        let ttl_secs = ttl.as_secs() as i64;
        self.pool
            .run_with_retry(move |conn| cache_put_sync(conn, &key, &payload, now, ttl_secs))
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_roundtrip_through_pool() {
        let pool = Arc::new(DatabasePool::open_in_memory().await.unwrap());
        let cache = SqliteSharedCache::new(pool);
        assert!(cache.get("missing").await.unwrap().is_none());
        cache
            .put("k", "{}".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("{}"));
        assert_eq!(cache.purge_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_zero_ttl_is_never_served() {
        let pool = Arc::new(DatabasePool::open_in_memory().await.unwrap());
        let cache = SqliteSharedCache::new(pool);
        cache.put("k", "{}".to_string(), Duration::ZERO).await.unwrap();
        assert!(cache.get("k").await.unwrap().is_none());
    }
}
