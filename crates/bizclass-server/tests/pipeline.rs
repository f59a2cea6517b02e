//! End-to-end tests for the classification pipeline
//!
//! Each test builds a service over an in-memory seeded taxonomy. The ML
//! service is replaced by a scriptable mock.

mod test_utils;

use bizclass::config::ClassifierConfig;
use bizclass::ml::ModelVariant;
use bizclass::resilience::BreakerState;
use bizclass::service::{ClassificationService, ServiceDeps};
use bizclass_types::{ClassificationMethod, ClassificationRequest, CodeType};
use std::sync::Arc;
use std::time::Duration;
use test_utils::{MockMl, MockMode, classify, prediction, seeded_pool, service_with, test_config};
use tokio_util::sync::CancellationToken;

fn has_code(codes: &[bizclass_types::GeneratedCode], code: &str) -> bool {
    codes.iter().any(|c| c.code == code)
}

// ============================================================================
// Classification outcomes
// ============================================================================

#[tokio::test]
async fn test_joes_pizza_validated_with_codes() {
    let ml = MockMl::answering("Restaurants", 0.9);
    let service = service_with(test_config(), Some(ml.clone())).await;

    let response = classify(&service, "Joe's Pizza").await;
    let result = &response.result;

    assert_eq!(result.primary.industry, "Restaurants");
    assert!(result.confidence > 0.8, "confidence {}", result.confidence);
    assert!(!result.ambiguous);
    assert_eq!(result.method, ClassificationMethod::MlValidated);
    assert_eq!(result.explanation.ml_tier.as_deref(), Some("validation"));
    assert_eq!(result.explanation.ml_agreement, Some(true));
    assert!(has_code(result.codes.get(CodeType::Mcc), "5812"));
    assert!(has_code(result.codes.get(CodeType::Sic), "5812"));
    assert!(has_code(result.codes.get(CodeType::Naics), "722511"));
    for code_type in CodeType::ALL {
        assert!(result.codes.get(code_type).len() <= 3);
    }
    assert_eq!(ml.calls(), 1);
}

#[tokio::test]
async fn test_abc_corporation_generic_fallback() {
    let ml = MockMl::answering("Retail", 0.9);
    let service = service_with(test_config(), Some(ml.clone())).await;

    let result = classify(&service, "ABC Corporation").await.result;

    assert!(result.confidence <= 0.35);
    assert!(result.ambiguous);
    assert_eq!(result.method, ClassificationMethod::GenericFallback);
    assert!(result.codes.is_empty());
    assert_eq!(service.stats().generic_fallbacks, 1);
}

#[tokio::test]
async fn test_high_confidence_disagreement_keeps_base() {
    let baseline = service_with(test_config(), None).await;
    let base = classify(&baseline, "Joe's Pizza").await.result;
    assert!(base.confidence >= 0.8);

    let ml = MockMl::answering("Retail", 0.95);
    let service = service_with(test_config(), Some(ml)).await;
    let result = classify(&service, "Joe's Pizza").await.result;

    assert_eq!(result.primary.industry, "Restaurants");
    assert_eq!(result.confidence, base.confidence);
    assert_eq!(result.method, ClassificationMethod::MultiStrategy);
    assert_eq!(result.explanation.ml_agreement, Some(false));
    assert_eq!(result.codes, base.codes);
}

// ============================================================================
// Caching and deduplication
// ============================================================================

#[tokio::test]
async fn test_concurrent_duplicates_run_pipeline_once() {
    let ml = MockMl::answering("Coffee Shops", 0.9);
    ml.set_delay(Duration::from_millis(100));
    let service = service_with(test_config(), Some(ml.clone())).await;

    let calls = (0..10).map(|_| {
        let service = service.clone();
        tokio::spawn(async move {
            service
                .classify(
                    ClassificationRequest::new("Starbucks"),
                    ModelVariant::Full,
                    &CancellationToken::new(),
                )
                .await
        })
    });
    let responses: Vec<_> = futures::future::join_all(calls)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    let first = &responses[0].result;
    assert_eq!(first.primary.industry, "Coffee Shops");
    assert!(responses.iter().all(|r| r.result == *first));

    let stats = service.stats();
    assert_eq!(stats.pipeline_runs, 1);
    assert_eq!(stats.dedup_joins + stats.cache_hits, 9);
    assert_eq!(ml.calls(), 1);
}

#[tokio::test]
async fn test_fast_variant_cached_separately() {
    let ml = MockMl::answering("Restaurants", 0.9);
    let service = service_with(test_config(), Some(ml.clone())).await;
    let token = CancellationToken::new();

    let full = service
        .classify(ClassificationRequest::new("Joe's Pizza"), ModelVariant::Full, &token)
        .await
        .unwrap();
    let fast = service
        .classify(ClassificationRequest::new("Joe's Pizza"), ModelVariant::Fast, &token)
        .await
        .unwrap();

    assert!(!full.served_from_cache);
    assert!(!fast.served_from_cache);
    assert_eq!(ml.fast_calls(), 1);
    assert_eq!(service.stats().pipeline_runs, 2);
}

#[tokio::test]
async fn test_shared_cache_serves_new_instance() {
    let pool = seeded_pool().await;
    let config = test_config();

    let first = ClassificationService::new(config.clone(), ServiceDeps::sqlite(pool.clone(), &config));
    let original = classify(&first, "Joe's Pizza").await;
    assert!(!original.served_from_cache);

    // Fresh in-process cache, same database
    let second = ClassificationService::new(config.clone(), ServiceDeps::sqlite(pool, &config));
    let replay = classify(&second, "Joe's Pizza").await;

    assert!(replay.served_from_cache);
    assert_eq!(replay.result, original.result);
    assert_eq!(second.stats().pipeline_runs, 0);
    assert_eq!(second.stats().shared_cache_circuit, Some(BreakerState::Closed));
}

#[tokio::test]
async fn test_predictive_warming_serves_variation() {
    let mut config: ClassifierConfig = test_config();
    config.cache.predictive_enabled = true;
    let service = service_with(config, None).await;

    classify(&service, "Joe's Pizza LLC").await;

    // Two variations: "Joe's Pizza" and "The Joe's Pizza"
    for _ in 0..100 {
        if service.stats().predictive_runs >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    let warmed = classify(&service, "Joe's Pizza").await;
    assert!(warmed.served_from_cache);
    assert_eq!(warmed.result.primary.industry, "Restaurants");

    let stats = service.stats();
    assert_eq!(stats.pipeline_runs, 1);
    assert_eq!(stats.predictive_hits, 1);
    service.shutdown();
}

// ============================================================================
// ML resilience
// ============================================================================

#[tokio::test]
async fn test_ml_permanent_error_not_retried() {
    let baseline = service_with(test_config(), None).await;
    let base = classify(&baseline, "Joe's Pizza").await.result;

    let ml = MockMl::failing(404);
    let service = service_with(test_config(), Some(ml.clone())).await;
    let result = classify(&service, "Joe's Pizza").await.result;

    assert_eq!(ml.calls(), 1);
    assert_eq!(result.primary, base.primary);
    assert_eq!(result.codes, base.codes);
    assert_eq!(result.method, ClassificationMethod::MultiStrategy);
    assert_eq!(result.explanation.ml_agreement, None);

    let stats = service.stats();
    assert_eq!(stats.ml_retries, 0);
    assert_eq!(stats.ml_fallbacks, 1);
    // The service answered, so the circuit stays closed
    assert_eq!(stats.ml_circuit, Some(BreakerState::Closed));
}

#[tokio::test]
async fn test_ml_timeouts_open_circuit_then_recover() {
    let ml = MockMl::hanging();
    let service = service_with(test_config(), Some(ml.clone())).await;

    // First request: initial attempt plus two retries, all timing out
    let first = classify(&service, "Mario's Pizza").await.result;
    assert_eq!(first.primary.industry, "Restaurants");
    assert_eq!(ml.calls(), 3);
    assert_eq!(service.stats().ml_circuit, Some(BreakerState::Closed));

    // Failures four and five trip the breaker mid-retry
    classify(&service, "Luigi's Pizza").await;
    assert_eq!(ml.calls(), 5);
    assert_eq!(service.stats().ml_circuit, Some(BreakerState::Open));

    // Open circuit: the service is not called at all
    let skipped = classify(&service, "Napoli Pizza").await.result;
    assert_eq!(ml.calls(), 5);
    assert_eq!(skipped.method, ClassificationMethod::MultiStrategy);

    // After the cooldown a single probe is let through
    ml.set_mode(MockMode::Answer(prediction("Restaurants", 0.9)));
    tokio::time::sleep(Duration::from_millis(400)).await;
    let probed = classify(&service, "Brick Oven Pizza").await.result;
    assert_eq!(ml.calls(), 6);
    assert_eq!(probed.method, ClassificationMethod::MlValidated);
    assert_eq!(service.stats().ml_circuit, Some(BreakerState::HalfOpen));

    classify(&service, "Slice Pizzeria").await;
    assert_eq!(service.stats().ml_circuit, Some(BreakerState::Closed));
    assert_eq!(service.stats().ml_fallbacks, 3);
}

#[tokio::test]
async fn test_cancelled_leader_hands_off_to_follower() {
    let ml = MockMl::answering("Coffee Shops", 0.9);
    ml.set_delay(Duration::from_millis(300));
    let service: Arc<ClassificationService> = service_with(test_config(), Some(ml.clone())).await;

    let leader_token = CancellationToken::new();
    let leader = {
        let service = service.clone();
        let token = leader_token.clone();
        tokio::spawn(async move {
            service
                .classify(ClassificationRequest::new("Starbucks"), ModelVariant::Full, &token)
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    let follower = {
        let service = service.clone();
        tokio::spawn(async move {
            service
                .classify(
                    ClassificationRequest::new("Starbucks"),
                    ModelVariant::Full,
                    &CancellationToken::new(),
                )
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    leader_token.cancel();

    assert!(leader.await.unwrap().is_err());
    let response = follower.await.unwrap().unwrap();
    assert_eq!(response.result.primary.industry, "Coffee Shops");
    // The follower re-ran the pipeline as the new leader
    assert_eq!(service.stats().pipeline_runs, 2);
}
