//! Test utilities for bizclass integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use bizclass::config::ClassifierConfig;
use bizclass::db::{DatabasePool, seed_default_taxonomy};
use bizclass::error::{ClassifierError, Result};
use bizclass::ml::{MlClient, MlPrediction, MlRequest, ModelVariant};
use bizclass::service::{ClassificationService, ServiceDeps};
use bizclass::store::SqliteTaxonomyStore;
use bizclass_types::{ClassificationRequest, ClassifyResponse};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// In-memory database loaded with the built-in taxonomy
pub async fn seeded_pool() -> Arc<DatabasePool> {
    let pool = Arc::new(
        DatabasePool::open_in_memory()
            .await
            .expect("Failed to create in-memory pool"),
    );
    pool.interact(|conn| seed_default_taxonomy(conn).map(|_| ()))
        .await
        .expect("Failed to seed taxonomy");
    pool
}

/// Defaults with fast retries and no background warming, so pipeline
/// counts are exact
pub fn test_config() -> ClassifierConfig {
    let mut config = ClassifierConfig::default();
    config.cache.predictive_enabled = false;
    config.retry.base_backoff_ms = 1;
    config.retry.max_backoff_ms = 5;
    config.timeouts.ml_ms = 200;
    config.timeouts.ml_fast_ms = 200;
    config.circuit_breaker.cooldown_ms = 300;
    config
}

/// What the mock ML service does on `classify`
#[derive(Debug, Clone)]
pub enum MockMode {
    Answer(MlPrediction),
    Status(u16),
    /// Never answers within any test deadline
    Hang,
}

/// Scriptable stand-in for the ML service
pub struct MockMl {
    mode: Mutex<MockMode>,
    delay: Mutex<Duration>,
    calls: AtomicU32,
    fast_calls: AtomicU32,
    health_calls: AtomicU32,
}

impl MockMl {
    pub fn new(mode: MockMode) -> Arc<Self> {
        Arc::new(Self {
            mode: Mutex::new(mode),
            delay: Mutex::new(Duration::ZERO),
            calls: AtomicU32::new(0),
            fast_calls: AtomicU32::new(0),
            health_calls: AtomicU32::new(0),
        })
    }

    pub fn answering(industry: &str, confidence: f64) -> Arc<Self> {
        Self::new(MockMode::Answer(prediction(industry, confidence)))
    }

    pub fn failing(status: u16) -> Arc<Self> {
        Self::new(MockMode::Status(status))
    }

    pub fn hanging() -> Arc<Self> {
        Self::new(MockMode::Hang)
    }

    pub fn set_mode(&self, mode: MockMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fast_calls(&self) -> u32 {
        self.fast_calls.load(Ordering::SeqCst)
    }

    pub fn health_calls(&self) -> u32 {
        self.health_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MlClient for MockMl {
    async fn classify(&self, _request: &MlRequest, variant: ModelVariant) -> Result<MlPrediction> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if variant.is_fast() {
            self.fast_calls.fetch_add(1, Ordering::SeqCst);
        }
        let (mode, delay) = {
            let mode = self.mode.lock().unwrap().clone();
            (mode, *self.delay.lock().unwrap())
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match mode {
            MockMode::Answer(p) => Ok(p),
            MockMode::Status(status) => Err(ClassifierError::MlStatus {
                status,
                body: "mock".into(),
            }),
            MockMode::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Err(ClassifierError::Other("mock hang elapsed".into()))
            }
        }
    }

    async fn health(&self) -> Result<()> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn prediction(industry: &str, confidence: f64) -> MlPrediction {
    MlPrediction {
        industry: industry.to_string(),
        confidence,
        alternatives: Vec::new(),
        model: Some("mock".into()),
    }
}

/// Service over a fresh seeded database, optionally with a mock ML client
pub async fn service_with(
    config: ClassifierConfig,
    ml: Option<Arc<MockMl>>,
) -> Arc<ClassificationService> {
    let pool = seeded_pool().await;
    let store = Arc::new(SqliteTaxonomyStore::new(pool, config.cache.index_ttl()));
    let mut deps = ServiceDeps::new(store);
    if let Some(ml) = ml {
        deps = deps.with_ml(ml);
    }
    ClassificationService::new(config, deps)
}

pub async fn classify(service: &Arc<ClassificationService>, name: &str) -> ClassifyResponse {
    service
        .classify(
            ClassificationRequest::new(name),
            ModelVariant::Full,
            &CancellationToken::new(),
        )
        .await
        .expect("classification should succeed")
}
