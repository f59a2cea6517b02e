// crates/bizclass-server/src/cache/result.rs
// Two-tier result cache: in-process moka cache, then the shared store

use super::SharedCache;
use crate::resilience::CircuitBreaker;
use bizclass_types::ClassificationResult;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Dependency name for the shared tier's breaker
pub const SHARED_CACHE_DEPENDENCY: &str = "shared_cache";

/// Completed results keyed by request fingerprint.
///
/// Entries are immutable `Arc`s; a replay hands back the same value that was
/// stored. The shared tier is optional and every failure there is a miss.
pub struct ResultCache {
    local: Cache<String, Arc<ClassificationResult>>,
    shared: Option<Arc<dyn SharedCache>>,
    breaker: Arc<CircuitBreaker>,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(
        capacity: u64,
        ttl: Duration,
        shared: Option<Arc<dyn SharedCache>>,
        breaker: Arc<CircuitBreaker>,
    ) -> Self {
        Self {
            local: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
            shared,
            breaker,
            ttl,
        }
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub async fn get(&self, key: &str) -> Option<Arc<ClassificationResult>> {
        if let Some(hit) = self.local.get(key).await {
            return Some(hit);
        }

        let shared = self.shared.as_ref()?;
        let permit = self.breaker.acquire()?;
        match shared.get(key).await {
            Ok(Some(payload)) => {
                permit.success();
                match serde_json::from_str::<ClassificationResult>(&payload) {
                    Ok(result) => {
                        let result = Arc::new(result);
                        self.local.insert(key.to_string(), result.clone()).await;
                        debug!(key = %key, "Shared cache hit");
                        Some(result)
                    }
                    Err(e) => {
                        warn!(key = %key, error = %e, "Discarding unreadable shared cache entry");
                        None
                    }
                }
            }
            Ok(None) => {
                permit.success();
                None
            }
            Err(e) => {
                permit.failure();
                warn!(error = %e, "Shared cache read failed");
                None
            }
        }
    }

    pub async fn put(&self, key: &str, result: Arc<ClassificationResult>) {
        self.local.insert(key.to_string(), result.clone()).await;

        let Some(shared) = &self.shared else {
            return;
        };
        let Some(permit) = self.breaker.acquire() else {
            return;
        };
        let payload = match serde_json::to_string(result.as_ref()) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Failed to serialize result for shared cache");
                return;
            }
        };
        match shared.put(key, payload, self.ttl).await {
            Ok(()) => permit.success(),
            Err(e) => {
                permit.failure();
                warn!(error = %e, "Shared cache write failed");
            }
        }
    }

    /// Entries in the local tier
    pub fn local_len(&self) -> u64 {
        self.local.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BreakerSettings;
    use crate::error::{ClassifierError, Result};
    use crate::resilience::BreakerState;
    use async_trait::async_trait;
    use bizclass_types::{
        ClassificationMethod, Explanation, IndustryCodes, IndustryScore,
    };
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn sample(name: &str) -> ClassificationResult {
        let primary = IndustryScore {
            industry: "Restaurants".into(),
            confidence: 0.9,
            raw_score: 0.9,
            contributions: BTreeMap::new(),
            reasoning: "test".into(),
            ambiguous: false,
        };
        ClassificationResult {
            business_name: name.into(),
            primary,
            secondary: Vec::new(),
            confidence: 0.9,
            method: ClassificationMethod::MultiStrategy,
            ambiguous: false,
            codes: IndustryCodes::default(),
            explanation: Explanation::default(),
            processing_time_ms: 3,
        }
    }

    #[derive(Default)]
    struct MemoryShared {
        entries: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl SharedCache for MemoryShared {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }
        async fn put(&self, key: &str, payload: String, _: Duration) -> Result<()> {
            self.entries.lock().unwrap().insert(key.to_string(), payload);
            Ok(())
        }
    }

    #[derive(Default)]
    struct BrokenShared {
        calls: AtomicU32,
    }

    #[async_trait]
    impl SharedCache for BrokenShared {
        async fn get(&self, _: &str) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ClassifierError::Store("down".into()))
        }
        async fn put(&self, _: &str, _: String, _: Duration) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ClassifierError::Store("down".into()))
        }
    }

    fn breaker() -> Arc<CircuitBreaker> {
        Arc::new(CircuitBreaker::new(
            SHARED_CACHE_DEPENDENCY,
            BreakerSettings::default(),
        ))
    }

    #[tokio::test]
    async fn test_local_hit_returns_same_arc() {
        let cache = ResultCache::new(100, Duration::from_secs(60), None, breaker());
        let result = Arc::new(sample("Joe's"));
        cache.put("k", result.clone()).await;
        let hit = cache.get("k").await.unwrap();
        assert!(Arc::ptr_eq(&hit, &result));
        assert!(cache.get("other").await.is_none());
    }

    #[tokio::test]
    async fn test_shared_tier_fills_local() {
        let shared = Arc::new(MemoryShared::default());
        let writer = ResultCache::new(100, Duration::from_secs(60), Some(shared.clone()), breaker());
        writer.put("k", Arc::new(sample("Joe's"))).await;

        // A second process sees the entry through the shared tier
        let reader = ResultCache::new(100, Duration::from_secs(60), Some(shared), breaker());
        let hit = reader.get("k").await.unwrap();
        assert_eq!(*hit, sample("Joe's"));
        reader.local.run_pending_tasks().await;
        assert_eq!(reader.local_len(), 1);
    }

    #[tokio::test]
    async fn test_broken_shared_tier_trips_breaker() {
        let shared = Arc::new(BrokenShared::default());
        let cache = ResultCache::new(100, Duration::from_secs(60), Some(shared.clone()), breaker());
        for i in 0..10 {
            assert!(cache.get(&format!("k{i}")).await.is_none());
        }
        assert_eq!(cache.breaker().state(), BreakerState::Open);
        // Five failures tripped it; the rest never reached the store
        assert_eq!(shared.calls.load(Ordering::SeqCst), 5);
    }
}
