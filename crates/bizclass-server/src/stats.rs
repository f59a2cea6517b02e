// crates/bizclass-server/src/stats.rs
// Service counters exposed on /api/stats

use crate::ml::MlTier;
use crate::resilience::BreakerState;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct ServiceStats {
    requests: AtomicU64,
    pipeline_runs: AtomicU64,
    predictive_runs: AtomicU64,
    cache_hits: AtomicU64,
    predictive_hits: AtomicU64,
    cache_misses: AtomicU64,
    dedup_joins: AtomicU64,
    strategy_failures: AtomicU64,
    strategy_timeouts: AtomicU64,
    generic_fallbacks: AtomicU64,
    ml_calls: AtomicU64,
    ml_fallbacks: AtomicU64,
    ml_retries: AtomicU64,
    tier_assisted: AtomicU64,
    tier_ensemble: AtomicU64,
    tier_validation: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct StatsSnapshot {
    pub requests: u64,
    /// Pipeline executions on behalf of callers
    pub pipeline_runs: u64,
    /// Pipeline executions for predictive warming, counted apart
    pub predictive_runs: u64,
    pub cache_hits: u64,
    pub predictive_hits: u64,
    pub cache_misses: u64,
    pub dedup_joins: u64,
    pub strategy_failures: u64,
    pub strategy_timeouts: u64,
    pub generic_fallbacks: u64,
    pub ml_calls: u64,
    pub ml_fallbacks: u64,
    pub ml_retries: u64,
    pub tier_assisted: u64,
    pub tier_ensemble: u64,
    pub tier_validation: u64,
    pub ml_circuit: Option<BreakerState>,
    pub shared_cache_circuit: Option<BreakerState>,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl ServiceStats {
    pub fn record_request(&self) {
        bump(&self.requests);
    }

    pub fn record_pipeline_run(&self, predictive: bool) {
        if predictive {
            bump(&self.predictive_runs);
        } else {
            bump(&self.pipeline_runs);
        }
    }

    pub fn record_cache_hit(&self) {
        bump(&self.cache_hits);
    }

    pub fn record_predictive_hit(&self) {
        bump(&self.predictive_hits);
    }

    pub fn record_cache_miss(&self) {
        bump(&self.cache_misses);
    }

    pub fn record_dedup_join(&self) {
        bump(&self.dedup_joins);
    }

    pub fn record_strategy_failure(&self, timed_out: bool) {
        if timed_out {
            bump(&self.strategy_timeouts);
        } else {
            bump(&self.strategy_failures);
        }
    }

    pub fn record_generic_fallback(&self) {
        bump(&self.generic_fallbacks);
    }

    pub fn record_ml_call(&self, tier: MlTier, retries: u32, fell_back: bool) {
        bump(&self.ml_calls);
        self.ml_retries.fetch_add(retries as u64, Ordering::Relaxed);
        if fell_back {
            bump(&self.ml_fallbacks);
        }
        match tier {
            MlTier::Assisted => bump(&self.tier_assisted),
            MlTier::Ensemble => bump(&self.tier_ensemble),
            MlTier::Validation => bump(&self.tier_validation),
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        StatsSnapshot {
            requests: load(&self.requests),
            pipeline_runs: load(&self.pipeline_runs),
            predictive_runs: load(&self.predictive_runs),
            cache_hits: load(&self.cache_hits),
            predictive_hits: load(&self.predictive_hits),
            cache_misses: load(&self.cache_misses),
            dedup_joins: load(&self.dedup_joins),
            strategy_failures: load(&self.strategy_failures),
            strategy_timeouts: load(&self.strategy_timeouts),
            generic_fallbacks: load(&self.generic_fallbacks),
            ml_calls: load(&self.ml_calls),
            ml_fallbacks: load(&self.ml_fallbacks),
            ml_retries: load(&self.ml_retries),
            tier_assisted: load(&self.tier_assisted),
            tier_ensemble: load(&self.tier_ensemble),
            tier_validation: load(&self.tier_validation),
            ml_circuit: None,
            shared_cache_circuit: None,
        }
    }
}
