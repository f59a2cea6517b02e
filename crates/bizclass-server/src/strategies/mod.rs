// crates/bizclass-server/src/strategies/mod.rs
// Independent industry scoring strategies and their fixed registry

mod cooccurrence;
mod entity;
mod keyword;
mod topic;

pub use cooccurrence::CoOccurrenceAnalyzer;
pub use entity::EntityStrategy;
pub use keyword::KeywordStrategy;
pub use topic::TopicModeler;

use crate::config::ClassifierConfig;
use crate::context::ClassificationContext;
use crate::error::Result;
use crate::store::TaxonomyStore;
use async_trait::async_trait;
use bizclass_types::StrategyKind;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Fixed fusion weights. Missing strategies contribute zero, never a share.
pub const STRATEGY_WEIGHTS: [(StrategyKind, f64); 4] = [
    (StrategyKind::Keyword, 0.40),
    (StrategyKind::Entity, 0.25),
    (StrategyKind::Topic, 0.20),
    (StrategyKind::CoOccurrence, 0.15),
];

pub fn weight_of(kind: StrategyKind) -> f64 {
    STRATEGY_WEIGHTS
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, w)| *w)
        .unwrap_or(0.0)
}

/// Probabilistic OR: 1 - prod(1 - s). Stays in [0, 1] and rewards
/// independent corroborating evidence without letting sums overflow.
pub fn noisy_or(scores: impl IntoIterator<Item = f64>) -> f64 {
    1.0 - scores
        .into_iter()
        .map(|s| 1.0 - s.clamp(0.0, 1.0))
        .product::<f64>()
}

/// One strategy's opinion about a single request
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyResult {
    pub kind: StrategyKind,
    /// industry -> score in [0, 1]
    pub scores: BTreeMap<String, f64>,
    /// industry -> evidence (matched keywords, entities, topics or pairs)
    pub evidence: BTreeMap<String, Vec<String>>,
    /// Keywords this strategy matched, for the explanation
    pub matched_keywords: BTreeSet<String>,
}

impl StrategyResult {
    pub fn empty(kind: StrategyKind) -> Self {
        Self {
            kind,
            scores: BTreeMap::new(),
            evidence: BTreeMap::new(),
            matched_keywords: BTreeSet::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn score(&self, industry: &str) -> f64 {
        self.scores.get(industry).copied().unwrap_or(0.0)
    }

    /// Highest scoring industry; ties resolve by name
    pub fn top(&self) -> Option<(&str, f64)> {
        self.scores
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(name, score)| (name.as_str(), *score))
    }
}

/// Collects (industry, evidence, score) observations and folds them into a
/// [`StrategyResult`]. Repeated evidence for the same industry keeps its best
/// score, so one keyword can't be counted twice.
#[derive(Debug, Default)]
pub(crate) struct ScoreAccumulator {
    observations: BTreeMap<String, BTreeMap<String, f64>>,
}

impl ScoreAccumulator {
    pub fn add(&mut self, industry: &str, evidence: &str, score: f64) {
        let slot = self
            .observations
            .entry(industry.to_string())
            .or_default()
            .entry(evidence.to_string())
            .or_insert(0.0);
        if score > *slot {
            *slot = score;
        }
    }

    pub fn finish(self, kind: StrategyKind) -> StrategyResult {
        let mut result = StrategyResult::empty(kind);
        for (industry, evidence) in self.observations {
            let score = noisy_or(evidence.values().copied());
            if score <= 0.0 {
                continue;
            }
            result.scores.insert(industry.clone(), score);
            result
                .evidence
                .insert(industry, evidence.into_keys().collect());
        }
        result
    }
}

/// A scoring strategy
#[async_trait]
pub trait Strategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Score industries for the context. Errors are absorbed by the caller
    /// as zero contribution.
    async fn classify(&self, ctx: &ClassificationContext) -> Result<StrategyResult>;
}

/// Explicit, ordered set of strategies the pipeline fans out to
#[derive(Clone)]
pub struct StrategyRegistry {
    strategies: Vec<Arc<dyn Strategy>>,
}

impl StrategyRegistry {
    pub fn new(strategies: Vec<Arc<dyn Strategy>>) -> Self {
        Self { strategies }
    }

    /// The four standard strategies backed by `store`
    pub fn standard(store: Arc<dyn TaxonomyStore>, config: &ClassifierConfig) -> Self {
        Self::new(vec![
            Arc::new(KeywordStrategy::new(store.clone(), config.thresholds.clone())),
            Arc::new(EntityStrategy),
            Arc::new(TopicModeler::new(store.clone(), config.cache.index_ttl())),
            Arc::new(CoOccurrenceAnalyzer::new(store)),
        ])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Strategy>> {
        self.strategies.iter()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one() {
        let total: f64 = STRATEGY_WEIGHTS.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(weight_of(StrategyKind::Entity), 0.25);
    }

    #[test]
    fn test_noisy_or() {
        assert_eq!(noisy_or([]), 0.0);
        assert!((noisy_or([0.8]) - 0.8).abs() < 1e-9);
        assert!((noisy_or([0.8, 0.8]) - 0.96).abs() < 1e-9);
        assert!((noisy_or([1.5, 0.2]) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_accumulator_keeps_best_per_evidence() {
        let mut acc = ScoreAccumulator::default();
        acc.add("Restaurants", "pizza", 0.5);
        acc.add("Restaurants", "pizza", 0.9);
        acc.add("Restaurants", "restaurant", 0.5);
        acc.add("Retail", "store", 0.0);
        let result = acc.finish(StrategyKind::Keyword);
        assert!((result.score("Restaurants") - 0.95).abs() < 1e-9);
        assert_eq!(result.evidence["Restaurants"], vec!["pizza", "restaurant"]);
        assert!(!result.scores.contains_key("Retail"));
    }

    #[test]
    fn test_top_tie_breaks_by_name() {
        let mut result = StrategyResult::empty(StrategyKind::Topic);
        result.scores.insert("Zeta".into(), 0.5);
        result.scores.insert("Alpha".into(), 0.5);
        assert_eq!(result.top(), Some(("Alpha", 0.5)));
    }
}
