// crates/bizclass-server/src/service.rs
// Classification pipeline: caches, dedup, strategies, ML tiers and codes

use crate::cache::{
    Claim, ContentSource, FlightOutcome, InFlight, NoContentSource, PredictiveCache,
    RequestContent, ResultCache, SharedCache, SqliteSharedCache, fingerprint, name_variations,
    wait_for,
};
use crate::codes::CodeGenerator;
use crate::combiner::{CombinedClassification, Combiner, GENERIC_INDUSTRY};
use crate::config::ClassifierConfig;
use crate::context::ClassificationContext;
use crate::db::DatabasePool;
use crate::error::{ClassifierError, Result};
use crate::ml::{
    EnsembleOutcome, ML_DEPENDENCY, MlClient, MlGateway, MlRequest, MlTier, ModelVariant, ensemble,
};
use crate::resilience::{AdaptiveRetry, CircuitBreaker};
use crate::stats::{ServiceStats, StatsSnapshot};
use crate::store::{SqliteTaxonomyStore, TaxonomyStore};
use crate::strategies::{StrategyRegistry, StrategyResult};
use bizclass_types::{
    ClassificationMethod, ClassificationRequest, ClassificationResult, ClassifyResponse,
    Explanation, IndustryCodes, IndustryScore,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Longest business name accepted, in characters
pub const MAX_NAME_CHARS: usize = 512;

/// External collaborators of the service
pub struct ServiceDeps {
    pub store: Arc<dyn TaxonomyStore>,
    pub ml: Option<Arc<dyn MlClient>>,
    pub shared_cache: Option<Arc<dyn SharedCache>>,
    pub content_source: Arc<dyn ContentSource>,
}

impl ServiceDeps {
    /// Store only: no ML, no shared cache, no website fetching
    pub fn new(store: Arc<dyn TaxonomyStore>) -> Self {
        Self {
            store,
            ml: None,
            shared_cache: None,
            content_source: Arc::new(NoContentSource),
        }
    }

    /// Taxonomy store and shared cache over the same SQLite pool
    pub fn sqlite(pool: Arc<DatabasePool>, config: &ClassifierConfig) -> Self {
        let store = Arc::new(SqliteTaxonomyStore::new(pool.clone(), config.cache.index_ttl()));
        Self::new(store).with_shared_cache(Arc::new(SqliteSharedCache::new(pool)))
    }

    pub fn with_ml(mut self, client: Arc<dyn MlClient>) -> Self {
        self.ml = Some(client);
        self
    }

    pub fn with_shared_cache(mut self, cache: Arc<dyn SharedCache>) -> Self {
        self.shared_cache = Some(cache);
        self
    }

    pub fn with_content_source(mut self, source: Arc<dyn ContentSource>) -> Self {
        self.content_source = source;
        self
    }
}

/// What the ML step contributed to one run
struct MlStep {
    tier: MlTier,
    /// `None` when the service failed and the base result stands
    outcome: Option<EnsembleOutcome>,
}

pub struct ClassificationService {
    config: ClassifierConfig,
    strategies: StrategyRegistry,
    combiner: Combiner,
    codes: CodeGenerator,
    ml: Option<MlGateway>,
    results: ResultCache,
    predictive: Option<Arc<PredictiveCache>>,
    inflight: Arc<InFlight>,
    content_source: Arc<dyn ContentSource>,
    stats: ServiceStats,
    shutdown: CancellationToken,
}

impl ClassificationService {
    pub fn new(config: ClassifierConfig, deps: ServiceDeps) -> Arc<Self> {
        let strategies = StrategyRegistry::standard(deps.store.clone(), &config);
        Self::with_strategies(config, deps, strategies)
    }

    /// Build with a custom strategy set
    pub fn with_strategies(
        config: ClassifierConfig,
        deps: ServiceDeps,
        strategies: StrategyRegistry,
    ) -> Arc<Self> {
        let shutdown = CancellationToken::new();

        let ml = deps.ml.map(|client| {
            let breaker = Arc::new(CircuitBreaker::new(
                ML_DEPENDENCY,
                config.circuit_breaker.clone(),
            ));
            let retry = Arc::new(AdaptiveRetry::new(config.retry.clone()));
            MlGateway::new(client, breaker, retry, config.timeouts.clone())
        });

        let shared = deps.shared_cache.filter(|_| config.cache.shared_cache);
        let results = ResultCache::new(
            config.cache.result_capacity,
            config.cache.result_ttl(),
            shared,
            Arc::new(CircuitBreaker::new(
                crate::cache::result::SHARED_CACHE_DEPENDENCY,
                config.circuit_breaker.clone(),
            )),
        );

        let predictive = config.cache.predictive_enabled.then(|| {
            Arc::new(PredictiveCache::new(
                config.cache.predictive_capacity,
                config.cache.predictive_ttl(),
                config.cache.predictive_concurrency,
                config.cache.predictive_variations,
                shutdown.child_token(),
            ))
        });

        info!(
            strategies = strategies.len(),
            ml = ml.is_some(),
            predictive = predictive.is_some(),
            "Classification service ready"
        );

        Arc::new(Self {
            combiner: Combiner::new(&config.thresholds),
            codes: CodeGenerator::new(deps.store, config.timeouts.clone()),
            inflight: Arc::new(InFlight::new(config.cache.inflight_grace())),
            content_source: deps.content_source,
            stats: ServiceStats::default(),
            strategies,
            ml,
            results,
            predictive,
            shutdown,
            config,
        })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn has_ml(&self) -> bool {
        self.ml.is_some()
    }

    pub fn stats(&self) -> StatsSnapshot {
        let mut snapshot = self.stats.snapshot();
        snapshot.ml_circuit = self.ml.as_ref().map(|g| g.breaker().state());
        if self.config.cache.shared_cache {
            snapshot.shared_cache_circuit = Some(self.results.breaker().state());
        }
        snapshot
    }

    /// Stop background warming. In-progress requests are unaffected.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Classify one business.
    ///
    /// Served from the result cache, then the predictive cache, then by
    /// joining an identical in-flight request, and only then by running the
    /// pipeline. Cancelling `token` abandons this caller's wait; other callers
    /// waiting on the same run retry on their own.
    pub async fn classify(
        self: &Arc<Self>,
        request: ClassificationRequest,
        variant: ModelVariant,
        token: &CancellationToken,
    ) -> Result<ClassifyResponse> {
        let started = Instant::now();
        self.stats.record_request();
        validate(&request)?;

        let key = fingerprint(&request, variant);
        let mut counted_miss = false;

        loop {
            if token.is_cancelled() {
                return Err(ClassifierError::Cancelled);
            }

            if let Some(hit) = self.results.get(&key).await {
                self.stats.record_cache_hit();
                return Ok(respond(&hit, true, started, &request));
            }
            if let Some(predictive) = &self.predictive
                && let Some(hit) = predictive.take(&key).await
            {
                self.stats.record_predictive_hit();
                self.results.put(&key, hit.clone()).await;
                return Ok(respond(&hit, true, started, &request));
            }
            if !counted_miss {
                self.stats.record_cache_miss();
                counted_miss = true;
            }

            match self.inflight.claim(&key) {
                Claim::Leader(guard) => {
                    return match self.run_pipeline(&request, variant, token, false).await {
                        Ok(result) => {
                            let result = Arc::new(result);
                            self.results.put(&key, result.clone()).await;
                            guard.complete(FlightOutcome::Done(result.clone()));
                            self.warm_predictive(&request, variant);
                            Ok(respond(&result, false, started, &request))
                        }
                        Err(ClassifierError::Cancelled) => {
                            // Unsettled guard releases the followers
                            drop(guard);
                            Err(ClassifierError::Cancelled)
                        }
                        Err(e) => {
                            guard.complete(FlightOutcome::Failed(e.to_string()));
                            Err(e)
                        }
                    };
                }
                Claim::Follower(rx) => {
                    self.stats.record_dedup_join();
                    match wait_for(rx, token).await {
                        FlightOutcome::Done(result) => {
                            return Ok(respond(&result, false, started, &request));
                        }
                        FlightOutcome::Failed(message) => {
                            return Err(ClassifierError::Other(message));
                        }
                        FlightOutcome::Cancelled if token.is_cancelled() => {
                            return Err(ClassifierError::Cancelled);
                        }
                        FlightOutcome::Cancelled => {
                            debug!(key = %key, "Leader abandoned flight, retrying");
                        }
                    }
                }
            }
        }
    }

    /// One uncached pipeline run
    async fn run_pipeline(
        &self,
        request: &ClassificationRequest,
        variant: ModelVariant,
        token: &CancellationToken,
        predictive: bool,
    ) -> Result<ClassificationResult> {
        let started = Instant::now();
        self.stats.record_pipeline_run(predictive);

        let content = RequestContent::new(
            request,
            self.content_source.as_ref(),
            self.config.timeouts.website_fetch(),
        );
        let ctx = tokio::select! {
            _ = token.cancelled() => return Err(ClassifierError::Cancelled),
            ctx = content.context() => ctx,
        };

        if ctx.is_insufficient() {
            debug!(business = %request.business_name, "Context too thin to classify");
            return Ok(self.generic_result(request, &ctx, started, "insufficient context"));
        }

        let results = self.run_strategies(&ctx, token).await?;
        let Some(base) = self.combiner.combine(&results) else {
            return Ok(self.generic_result(request, &ctx, started, "no industry matched"));
        };

        let base_has_codes = !base.is_ambiguous();
        let (base_codes, ml_step) = tokio::join!(
            async {
                if base_has_codes {
                    self.codes
                        .generate(&base.primary, &base.secondary, &ctx, token)
                        .await
                } else {
                    IndustryCodes::default()
                }
            },
            self.consult_ml(&base, &ctx, variant, token),
        );
        if token.is_cancelled() {
            return Err(ClassifierError::Cancelled);
        }

        let (final_combined, ml_method, ml_tier, ml_agreement) = match ml_step {
            Some(MlStep {
                tier,
                outcome: Some(outcome),
            }) => (
                outcome.combined,
                Some(outcome.method),
                Some(tier),
                Some(outcome.agreement),
            ),
            Some(MlStep { tier, outcome: None }) => (base.clone(), None, Some(tier), None),
            None => (base.clone(), None, None, None),
        };

        if final_combined.is_ambiguous() {
            self.stats.record_generic_fallback();
            return Ok(self.build_result(
                request,
                final_combined,
                ClassificationMethod::GenericFallback,
                IndustryCodes::default(),
                ml_tier,
                ml_agreement,
                started,
            ));
        }

        let codes = if base_has_codes && final_combined.primary.industry == base.primary.industry {
            base_codes
        } else {
            debug!(
                from = %base.primary.industry,
                to = %final_combined.primary.industry,
                "Primary changed after ML, regenerating codes"
            );
            self.codes
                .generate(
                    &final_combined.primary,
                    &final_combined.secondary,
                    &ctx,
                    token,
                )
                .await
        };

        let method = ml_method.unwrap_or(ClassificationMethod::MultiStrategy);
        Ok(self.build_result(
            request,
            final_combined,
            method,
            codes,
            ml_tier,
            ml_agreement,
            started,
        ))
    }

    /// Run every strategy concurrently. A failed or slow strategy contributes
    /// nothing; only cancellation aborts the stage.
    async fn run_strategies(
        &self,
        ctx: &Arc<ClassificationContext>,
        token: &CancellationToken,
    ) -> Result<Vec<StrategyResult>> {
        let deadline = self.config.timeouts.strategy();
        let mut set = JoinSet::new();
        for strategy in self.strategies.iter() {
            let strategy = strategy.clone();
            let ctx = ctx.clone();
            set.spawn(async move {
                let kind = strategy.kind();
                (kind, tokio::time::timeout(deadline, strategy.classify(&ctx)).await)
            });
        }

        let mut results = Vec::with_capacity(self.strategies.len());
        loop {
            let joined = tokio::select! {
                _ = token.cancelled() => {
                    set.abort_all();
                    return Err(ClassifierError::Cancelled);
                }
                joined = set.join_next() => joined,
            };
            let Some(joined) = joined else {
                break;
            };
            match joined {
                Ok((_, Ok(Ok(result)))) => results.push(result),
                Ok((kind, Ok(Err(e)))) => {
                    warn!(strategy = %kind, error = %e, "Strategy failed");
                    self.stats.record_strategy_failure(false);
                }
                Ok((kind, Err(_))) => {
                    warn!(strategy = %kind, timeout_ms = deadline.as_millis() as u64, "Strategy timed out");
                    self.stats.record_strategy_failure(true);
                }
                Err(e) => {
                    warn!(error = %e, "Strategy task aborted");
                    self.stats.record_strategy_failure(false);
                }
            }
        }
        Ok(results)
    }

    async fn consult_ml(
        &self,
        base: &CombinedClassification,
        ctx: &ClassificationContext,
        variant: ModelVariant,
        token: &CancellationToken,
    ) -> Option<MlStep> {
        let gateway = self.ml.as_ref()?;
        let tier = MlTier::select(base.confidence(), &self.config.thresholds);
        let request = MlRequest {
            business_name: ctx.business_name().to_string(),
            text: ctx.text().to_string(),
            keywords: ctx.keyword_list(),
        };

        let report = gateway.predict(&request, variant, token).await;
        let outcome = match report.prediction {
            Ok(prediction) => {
                debug!(
                    tier = tier.as_str(),
                    ml_industry = %prediction.industry,
                    ml_confidence = prediction.confidence,
                    "ML prediction received"
                );
                Some(ensemble::apply(
                    tier,
                    base,
                    &prediction,
                    &self.combiner,
                    &self.config.thresholds,
                ))
            }
            Err(e) => {
                info!(tier = tier.as_str(), error = %e, "ML unavailable, keeping multi-strategy result");
                None
            }
        };
        self.stats
            .record_ml_call(tier, report.retries, outcome.is_none());
        Some(MlStep { tier, outcome })
    }

    #[allow(clippy::too_many_arguments)]
    fn build_result(
        &self,
        request: &ClassificationRequest,
        combined: CombinedClassification,
        method: ClassificationMethod,
        codes: IndustryCodes,
        ml_tier: Option<MlTier>,
        ml_agreement: Option<bool>,
        started: Instant,
    ) -> ClassificationResult {
        let ambiguous = combined.is_ambiguous();
        let explanation = Explanation {
            key_factors: combined.key_factors,
            matched_keywords: combined.matched_keywords,
            has_secondary: !combined.secondary.is_empty(),
            ml_tier: ml_tier.map(|t| t.as_str().to_string()),
            ml_agreement,
        };
        ClassificationResult {
            business_name: request.business_name.clone(),
            confidence: combined.primary.confidence,
            primary: combined.primary,
            secondary: combined.secondary,
            method,
            ambiguous,
            codes,
            explanation,
            processing_time_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Floor-confidence result for requests nothing could place
    fn generic_result(
        &self,
        request: &ClassificationRequest,
        ctx: &ClassificationContext,
        started: Instant,
        reason: &str,
    ) -> ClassificationResult {
        self.stats.record_generic_fallback();
        let floor = self.combiner.floor();
        ClassificationResult {
            business_name: request.business_name.clone(),
            primary: IndustryScore {
                industry: GENERIC_INDUSTRY.to_string(),
                confidence: floor,
                raw_score: 0.0,
                contributions: BTreeMap::new(),
                reasoning: reason.to_string(),
                ambiguous: true,
            },
            secondary: Vec::new(),
            confidence: floor,
            method: ClassificationMethod::GenericFallback,
            ambiguous: true,
            codes: IndustryCodes::default(),
            explanation: Explanation {
                key_factors: vec![reason.to_string()],
                matched_keywords: ctx.keyword_list().into_iter().take(10).collect(),
                has_secondary: false,
                ml_tier: None,
                ml_agreement: None,
            },
            processing_time_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Classify likely follow-up variants of `request` in the background
    fn warm_predictive(self: &Arc<Self>, request: &ClassificationRequest, variant: ModelVariant) {
        let Some(predictive) = &self.predictive else {
            return;
        };
        let candidates: Vec<(String, ClassificationRequest)> =
            name_variations(&request.business_name, predictive.max_variations())
                .into_iter()
                .map(|name| {
                    let mut variation = request.clone();
                    variation.business_name = name;
                    variation.request_id = None;
                    (fingerprint(&variation, variant), variation)
                })
                .collect();
        if candidates.is_empty() {
            return;
        }

        let is_cached = {
            let this = self.clone();
            move |key: String| {
                let this = this.clone();
                async move { this.results.get(&key).await.is_some() }
            }
        };
        let run = {
            let this = self.clone();
            move |request: ClassificationRequest, token: CancellationToken| {
                let this = this.clone();
                async move { this.run_pipeline(&request, variant, &token, true).await }
            }
        };
        predictive.warm(candidates, is_cached, run);
    }
}

fn validate(request: &ClassificationRequest) -> Result<()> {
    let name = request.business_name.trim();
    if name.is_empty() {
        return Err(ClassifierError::InvalidInput(
            "business_name is required".into(),
        ));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(ClassifierError::InvalidInput(format!(
            "business_name exceeds {} characters",
            MAX_NAME_CHARS
        )));
    }
    Ok(())
}

fn respond(
    result: &ClassificationResult,
    served_from_cache: bool,
    started: Instant,
    request: &ClassificationRequest,
) -> ClassifyResponse {
    ClassifyResponse {
        result: result.clone(),
        served_from_cache,
        elapsed_ms: started.elapsed().as_millis() as u64,
        request_id: request.request_id.clone(),
    }
}
