// crates/bizclass-server/src/strategies/keyword.rs
// Keyword matching: exact lookup first, trigram fuzzy pass when it's thin

use super::{ScoreAccumulator, Strategy, StrategyResult};
use crate::config::Thresholds;
use crate::context::ClassificationContext;
use crate::error::Result;
use crate::store::TaxonomyStore;
use async_trait::async_trait;
use bizclass_types::StrategyKind;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct KeywordStrategy {
    store: Arc<dyn TaxonomyStore>,
    thresholds: Thresholds,
}

impl KeywordStrategy {
    pub fn new(store: Arc<dyn TaxonomyStore>, thresholds: Thresholds) -> Self {
        Self { store, thresholds }
    }

    async fn exact(&self, ctx: &ClassificationContext) -> Result<(StrategyResult, usize)> {
        let rows = self
            .store
            .match_keywords(&ctx.keyword_list(), ctx.phrase_text())
            .await?;

        let mut acc = ScoreAccumulator::default();
        let mut matched = BTreeSet::new();
        for row in &rows {
            acc.add(&row.industry, &row.keyword, row.weight);
            matched.insert(row.keyword.clone());
        }
        let distinct = matched.len();
        let mut result = acc.finish(StrategyKind::Keyword);
        result.matched_keywords = matched;
        Ok((result, distinct))
    }

    async fn fuzzy(&self, ctx: &ClassificationContext) -> Result<StrategyResult> {
        // Single words only; bigrams are covered by the exact phrase match
        let queries: Vec<String> = ctx
            .keywords()
            .iter()
            .filter(|k| !k.contains(' '))
            .cloned()
            .collect();
        let hits = self
            .store
            .similar_keywords(&queries, self.thresholds.trigram_similarity)
            .await?;

        let mut acc = ScoreAccumulator::default();
        let mut matched = BTreeSet::new();
        for hit in &hits {
            acc.add(&hit.industry, &hit.keyword, hit.weight * hit.similarity);
            matched.insert(hit.keyword.clone());
        }
        let mut result = acc.finish(StrategyKind::Keyword);
        result.matched_keywords = matched;
        Ok(result)
    }

    /// Reconcile the exact and fuzzy passes
    fn merge(&self, exact: StrategyResult, fuzzy: StrategyResult) -> StrategyResult {
        let exact_top = exact.top().map(|(name, score)| (name.to_string(), score));
        let fuzzy_top = fuzzy.top().map(|(name, score)| (name.to_string(), score));

        let Some((fuzzy_name, fuzzy_score)) = fuzzy_top else {
            return exact;
        };
        let (exact_name, exact_score) = exact_top.unwrap_or_default();

        let mut matched = exact.matched_keywords.clone();
        matched.extend(fuzzy.matched_keywords.iter().cloned());

        let mut merged = if exact_name == fuzzy_name {
            let share = self.thresholds.fuzzy_agreement_exact_share;
            let mut merged = StrategyResult::empty(StrategyKind::Keyword);
            let industries: BTreeSet<&String> =
                exact.scores.keys().chain(fuzzy.scores.keys()).collect();
            for industry in industries {
                let score = share * exact.score(industry) + (1.0 - share) * fuzzy.score(industry);
                merged.scores.insert(industry.clone(), score);
                let mut evidence: BTreeSet<String> = BTreeSet::new();
                for source in [&exact.evidence, &fuzzy.evidence] {
                    if let Some(items) = source.get(industry) {
                        evidence.extend(items.iter().cloned());
                    }
                }
                merged
                    .evidence
                    .insert(industry.clone(), evidence.into_iter().collect());
            }
            debug!(industry = %fuzzy_name, exact_score, fuzzy_score, "Fuzzy pass agrees with exact");
            merged
        } else if fuzzy_score >= exact_score + self.thresholds.fuzzy_override_margin {
            debug!(
                exact = %exact_name,
                fuzzy = %fuzzy_name,
                exact_score,
                fuzzy_score,
                "Fuzzy pass overrides exact result"
            );
            fuzzy
        } else {
            exact
        };

        merged.matched_keywords = matched;
        merged
    }
}

#[async_trait]
impl Strategy for KeywordStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Keyword
    }

    async fn classify(&self, ctx: &ClassificationContext) -> Result<StrategyResult> {
        if ctx.keywords().is_empty() {
            return Ok(StrategyResult::empty(StrategyKind::Keyword));
        }

        let (exact, distinct) = self.exact(ctx).await?;
        let exact_score = exact.top().map(|(_, s)| s).unwrap_or(0.0);
        if exact_score >= self.thresholds.exact_match_trigger
            && distinct >= self.thresholds.min_distinct_keywords
        {
            return Ok(exact);
        }

        match self.fuzzy(ctx).await {
            Ok(fuzzy) => Ok(self.merge(exact, fuzzy)),
            Err(e) => {
                warn!(error = %e, "Fuzzy keyword pass failed, keeping exact matches");
                Ok(exact)
            }
        }
    }
}
