// crates/bizclass-server/src/strategies/topic.rs
// Topic modeling: term frequency against calibrated topic-industry mappings

use super::{ScoreAccumulator, Strategy, StrategyResult};
use crate::context::ClassificationContext;
use crate::db::TopicRow;
use crate::error::Result;
use crate::store::TaxonomyStore;
use async_trait::async_trait;
use bizclass_types::StrategyKind;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Most frequent terms considered per request
const MAX_TOPICS: usize = 25;

/// Topic mappings grouped by topic, with the table-wide industry count
#[derive(Debug)]
struct TopicIndex {
    loaded_at: Instant,
    by_topic: HashMap<String, Vec<TopicRow>>,
    industry_count: usize,
}

impl TopicIndex {
    fn build(rows: Vec<TopicRow>) -> Self {
        let industry_count = rows
            .iter()
            .map(|r| r.industry.as_str())
            .collect::<HashSet<_>>()
            .len();
        let mut by_topic: HashMap<String, Vec<TopicRow>> = HashMap::new();
        for row in rows {
            by_topic.entry(row.topic.clone()).or_default().push(row);
        }
        Self {
            loaded_at: Instant::now(),
            by_topic,
            industry_count,
        }
    }

    /// Inverse-frequency factor: a topic claimed by many industries says less.
    /// 1.0 for a topic mapped to a single industry.
    fn specificity(&self, topic_industries: usize) -> f64 {
        if topic_industries == 0 || self.industry_count <= 1 {
            return 1.0;
        }
        let n = self.industry_count as f64;
        (1.0 + n / topic_industries as f64).ln() / (1.0 + n).ln()
    }
}

pub struct TopicModeler {
    store: Arc<dyn TaxonomyStore>,
    index: RwLock<Option<Arc<TopicIndex>>>,
    ttl: Duration,
}

impl TopicModeler {
    pub fn new(store: Arc<dyn TaxonomyStore>, ttl: Duration) -> Self {
        Self {
            store,
            index: RwLock::new(None),
            ttl,
        }
    }

    /// Cached mappings, reloaded once the TTL passes. A failed reload keeps
    /// serving the previous copy.
    async fn mappings(&self) -> Result<Arc<TopicIndex>> {
        let current = self.index.read().await.clone();
        if let Some(index) = &current
            && index.loaded_at.elapsed() < self.ttl
        {
            return Ok(index.clone());
        }

        let mut slot = self.index.write().await;
        if let Some(index) = slot.as_ref()
            && index.loaded_at.elapsed() < self.ttl
        {
            return Ok(index.clone());
        }

        match self.store.topic_mappings().await {
            Ok(rows) => {
                let index = Arc::new(TopicIndex::build(rows));
                debug!(topics = index.by_topic.len(), "Topic mappings loaded");
                *slot = Some(index.clone());
                Ok(index)
            }
            Err(e) => match current {
                Some(stale) => {
                    warn!(error = %e, "Topic mapping reload failed, serving previous copy");
                    Ok(stale)
                }
                None => Err(e),
            },
        }
    }
}

/// Term frequencies normalized by the most frequent term, highest first
pub fn term_frequencies(tokens: &[String]) -> Vec<(String, f64)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for token in tokens {
        *counts.entry(token.as_str()).or_default() += 1;
    }
    let Some(max) = counts.values().copied().max() else {
        return Vec::new();
    };
    let mut tf: Vec<(String, f64)> = counts
        .into_iter()
        .map(|(term, n)| (term.to_string(), n as f64 / max as f64))
        .collect();
    tf.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    tf.truncate(MAX_TOPICS);
    tf
}

#[async_trait]
impl Strategy for TopicModeler {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Topic
    }

    async fn classify(&self, ctx: &ClassificationContext) -> Result<StrategyResult> {
        let tf = term_frequencies(ctx.tokens());
        if tf.is_empty() {
            return Ok(StrategyResult::empty(StrategyKind::Topic));
        }

        let index = self.mappings().await?;
        let mut acc = ScoreAccumulator::default();
        for (term, weight) in &tf {
            let Some(rows) = index.by_topic.get(term) else {
                continue;
            };
            let specificity = index.specificity(rows.len());
            for row in rows {
                acc.add(
                    &row.industry,
                    term,
                    row.relevance * row.accuracy * weight * specificity,
                );
            }
        }
        Ok(acc.finish(StrategyKind::Topic))
    }
}
