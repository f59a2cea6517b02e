// crates/bizclass-server/src/ml/gateway.rs
// Guarded access to the ML service: circuit breaker, health probe, deadlines, retries

use super::{MlClient, MlPrediction, MlRequest, ModelVariant};
use crate::config::Timeouts;
use crate::error::{ClassifierError, Result};
use crate::resilience::{AdaptiveRetry, CircuitBreaker, ErrorClass};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Dependency name used for the breaker and retry history
pub const ML_DEPENDENCY: &str = "ml_service";

/// What a guarded call produced
#[derive(Debug)]
pub struct MlCallReport {
    pub prediction: Result<MlPrediction>,
    pub retries: u32,
    /// Requests that actually reached the client
    pub attempts: u32,
}

pub struct MlGateway {
    client: Arc<dyn MlClient>,
    breaker: Arc<CircuitBreaker>,
    retry: Arc<AdaptiveRetry>,
    timeouts: Timeouts,
    health_confirmed: AtomicBool,
}

impl MlGateway {
    pub fn new(
        client: Arc<dyn MlClient>,
        breaker: Arc<CircuitBreaker>,
        retry: Arc<AdaptiveRetry>,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            client,
            breaker,
            retry,
            timeouts,
            health_confirmed: AtomicBool::new(false),
        }
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Ask the ML service for a prediction. Never panics and never hangs past
    /// the per-attempt deadlines; every failure comes back in the report.
    pub async fn predict(
        &self,
        request: &MlRequest,
        variant: ModelVariant,
        token: &CancellationToken,
    ) -> MlCallReport {
        let attempts = AtomicU32::new(0);
        let outcome = self
            .retry
            .run(ML_DEPENDENCY, token, |_| {
                self.attempt(request, variant, token, &attempts)
            })
            .await;

        if let Err(e) = &outcome.result {
            debug!(error = %e, retries = outcome.retries, "ML prediction unavailable");
        }
        MlCallReport {
            prediction: outcome.result,
            retries: outcome.retries,
            attempts: attempts.load(Ordering::Relaxed),
        }
    }

    async fn attempt(
        &self,
        request: &MlRequest,
        variant: ModelVariant,
        token: &CancellationToken,
        attempts: &AtomicU32,
    ) -> Result<MlPrediction> {
        let Some(permit) = self.breaker.acquire() else {
            return Err(ClassifierError::CircuitOpen(ML_DEPENDENCY.to_string()));
        };

        let result = tokio::select! {
            _ = token.cancelled() => Err(ClassifierError::Cancelled),
            r = self.guarded_call(request, variant, permit.is_probe(), attempts) => r,
        };

        // A permit left unsettled here, or dropped with this future, frees
        // its probe slot
        match &result {
            Ok(_) => permit.success(),
            Err(e) => {
                let class = ErrorClass::of(e);
                if class.is_transient() {
                    permit.failure();
                } else if class == ErrorClass::Permanent {
                    // The service answered; it's up
                    permit.success();
                }
            }
        }
        result
    }

    async fn guarded_call(
        &self,
        request: &MlRequest,
        variant: ModelVariant,
        probe: bool,
        attempts: &AtomicU32,
    ) -> Result<MlPrediction> {
        if probe || !self.health_confirmed.load(Ordering::Acquire) {
            self.probe_health().await?;
        }

        attempts.fetch_add(1, Ordering::Relaxed);
        let deadline = self.timeouts.ml(variant.is_fast());
        match tokio::time::timeout(deadline, self.client.classify(request, variant)).await {
            Ok(result) => result,
            Err(_) => Err(ClassifierError::MlTimeout(deadline.as_millis() as u64)),
        }
    }

    async fn probe_health(&self) -> Result<()> {
        let deadline = self.timeouts.ml_health();
        let result = match tokio::time::timeout(deadline, self.client.health()).await {
            Ok(result) => result,
            Err(_) => Err(ClassifierError::MlTimeout(deadline.as_millis() as u64)),
        };
        match &result {
            Ok(()) => {
                if !self.health_confirmed.swap(true, Ordering::AcqRel) {
                    info!("ML service health check passed");
                }
            }
            Err(e) if ErrorClass::of(e) == ErrorClass::Permanent => {
                // No usable health endpoint; the classify call decides
                if !self.health_confirmed.swap(true, Ordering::AcqRel) {
                    warn!(error = %e, "ML health endpoint unavailable, skipping health checks");
                }
                return Ok(());
            }
            Err(e) => {
                self.health_confirmed.store(false, Ordering::Release);
                warn!(error = %e, "ML service health check failed");
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BreakerSettings, RetrySettings};
    use crate::resilience::BreakerState;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Scripted client: answers with `status` (0 = success) after `delay`.
    /// `/health` answers with `health_status` the same way.
    struct ScriptedClient {
        status: u16,
        health_status: u16,
        delay: Duration,
        calls: AtomicU32,
        health_calls: AtomicU32,
    }

    impl ScriptedClient {
        fn new(status: u16, delay: Duration) -> Arc<Self> {
            Self::with_health(status, 0, delay)
        }

        fn with_health(status: u16, health_status: u16, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                status,
                health_status,
                delay,
                calls: AtomicU32::new(0),
                health_calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl MlClient for ScriptedClient {
        async fn classify(&self, _: &MlRequest, _: ModelVariant) -> Result<MlPrediction> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.status == 0 {
                Ok(MlPrediction {
                    industry: "Restaurants".into(),
                    confidence: 0.9,
                    alternatives: Vec::new(),
                    model: None,
                })
            } else {
                Err(ClassifierError::MlStatus {
                    status: self.status,
                    body: "scripted".into(),
                })
            }
        }

        async fn health(&self) -> Result<()> {
            self.health_calls.fetch_add(1, Ordering::SeqCst);
            if self.health_status == 0 {
                Ok(())
            } else {
                Err(ClassifierError::MlStatus {
                    status: self.health_status,
                    body: "scripted".into(),
                })
            }
        }
    }

    fn gateway(client: Arc<ScriptedClient>) -> MlGateway {
        gateway_with_breaker(client, BreakerSettings::default())
    }

    fn gateway_with_breaker(client: Arc<ScriptedClient>, breaker: BreakerSettings) -> MlGateway {
        let timeouts = Timeouts {
            ml_ms: 20,
            ml_fast_ms: 20,
            ..Timeouts::default()
        };
        MlGateway::new(
            client,
            Arc::new(CircuitBreaker::new(ML_DEPENDENCY, breaker)),
            Arc::new(AdaptiveRetry::new(RetrySettings {
                base_backoff_ms: 1,
                max_backoff_ms: 2,
                ..RetrySettings::default()
            })),
            timeouts,
        )
    }

    fn request() -> MlRequest {
        MlRequest {
            business_name: "Joe's Pizza".into(),
            text: "Joe's Pizza".into(),
            keywords: vec!["pizza".into()],
        }
    }

    #[tokio::test]
    async fn test_success_probes_health_once() {
        let client = ScriptedClient::new(0, Duration::ZERO);
        let gw = gateway(client.clone());
        let token = CancellationToken::new();
        for _ in 0..3 {
            let report = gw.predict(&request(), ModelVariant::Full, &token).await;
            assert_eq!(report.prediction.unwrap().industry, "Restaurants");
            assert_eq!(report.retries, 0);
        }
        assert_eq!(client.health_calls.load(Ordering::SeqCst), 1);
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let client = ScriptedClient::new(404, Duration::ZERO);
        let gw = gateway(client.clone());
        let report = gw
            .predict(&request(), ModelVariant::Full, &CancellationToken::new())
            .await;
        assert!(matches!(
            report.prediction,
            Err(ClassifierError::MlStatus { status: 404, .. })
        ));
        assert_eq!(report.retries, 0);
        assert_eq!(report.attempts, 1);
        assert_eq!(gw.breaker().state(), BreakerState::Closed);
    }

    #[tokio::test]
    async fn test_timeouts_open_circuit() {
        let client = ScriptedClient::new(0, Duration::from_millis(200));
        let gw = gateway(client.clone());
        let token = CancellationToken::new();

        // 3 attempts, then 2 more before the breaker trips mid-retry
        let first = gw.predict(&request(), ModelVariant::Full, &token).await;
        assert!(matches!(first.prediction, Err(ClassifierError::MlTimeout(20))));
        assert_eq!(first.attempts, 3);
        let second = gw.predict(&request(), ModelVariant::Full, &token).await;
        assert!(matches!(second.prediction, Err(ClassifierError::CircuitOpen(_))));
        assert_eq!(client.calls.load(Ordering::SeqCst), 5);
        assert_eq!(gw.breaker().state(), BreakerState::Open);

        let started = std::time::Instant::now();
        let third = gw.predict(&request(), ModelVariant::Full, &token).await;
        assert!(matches!(third.prediction, Err(ClassifierError::CircuitOpen(_))));
        assert_eq!(third.attempts, 0);
        assert!(started.elapsed() < Duration::from_millis(20));
        assert_eq!(client.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_cancellation_stops_call() {
        let client = ScriptedClient::new(0, Duration::from_secs(5));
        let mut gw = gateway(client);
        gw.timeouts.ml_ms = 10_000;
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });
        let report = gw.predict(&request(), ModelVariant::Full, &token).await;
        assert!(matches!(report.prediction, Err(ClassifierError::Cancelled)));
        assert_eq!(gw.breaker().state(), BreakerState::Closed);
    }

    #[tokio::test]
    async fn test_missing_health_endpoint_does_not_block_classify() {
        let client = ScriptedClient::with_health(0, 404, Duration::ZERO);
        let gw = gateway(client.clone());
        let token = CancellationToken::new();
        for _ in 0..3 {
            let report = gw.predict(&request(), ModelVariant::Full, &token).await;
            assert_eq!(report.prediction.unwrap().industry, "Restaurants");
        }
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
        assert_eq!(client.health_calls.load(Ordering::SeqCst), 1);
        assert_eq!(gw.breaker().state(), BreakerState::Closed);
    }

    #[tokio::test]
    async fn test_failing_health_check_blocks_classify() {
        let client = ScriptedClient::with_health(0, 503, Duration::ZERO);
        let gw = gateway(client.clone());
        let report = gw
            .predict(&request(), ModelVariant::Full, &CancellationToken::new())
            .await;
        assert!(report.prediction.is_err());
        assert_eq!(report.attempts, 0);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dropped_half_open_call_frees_slot() {
        let client = ScriptedClient::new(0, Duration::from_millis(200));
        let gw = gateway_with_breaker(
            client.clone(),
            BreakerSettings {
                failure_threshold: 1,
                cooldown_ms: 20,
                success_threshold: 1,
            },
        );
        let token = CancellationToken::new();

        gw.predict(&request(), ModelVariant::Full, &token).await;
        assert_eq!(gw.breaker().state(), BreakerState::Open);
        tokio::time::sleep(Duration::from_millis(40)).await;

        // The caller goes away while the Half-Open probe is in flight
        let dropped = tokio::time::timeout(
            Duration::from_millis(5),
            gw.predict(&request(), ModelVariant::Full, &token),
        )
        .await;
        assert!(dropped.is_err());
        assert_eq!(gw.breaker().state(), BreakerState::HalfOpen);

        // The slot is free again, so the next call reaches the service
        let before = client.calls.load(Ordering::SeqCst);
        let report = gw.predict(&request(), ModelVariant::Full, &token).await;
        assert!(report.attempts >= 1);
        assert!(client.calls.load(Ordering::SeqCst) > before);
    }
}
