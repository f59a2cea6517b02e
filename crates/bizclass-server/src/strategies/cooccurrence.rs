// crates/bizclass-server/src/strategies/cooccurrence.rs
// Co-occurrence analysis: known (keyword, entity) pairs that imply an industry

use super::{ScoreAccumulator, Strategy, StrategyResult};
use crate::context::ClassificationContext;
use crate::error::Result;
use crate::store::TaxonomyStore;
use async_trait::async_trait;
use bizclass_types::StrategyKind;
use std::sync::Arc;
use tracing::warn;

pub struct CoOccurrenceAnalyzer {
    store: Arc<dyn TaxonomyStore>,
}

impl CoOccurrenceAnalyzer {
    pub fn new(store: Arc<dyn TaxonomyStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Strategy for CoOccurrenceAnalyzer {
    fn kind(&self) -> StrategyKind {
        StrategyKind::CoOccurrence
    }

    /// All pairs go to the store in one batch. A failed lookup is zero
    /// signal, not an error.
    async fn classify(&self, ctx: &ClassificationContext) -> Result<StrategyResult> {
        let pairs = ctx.keyword_entity_pairs();
        if pairs.is_empty() {
            return Ok(StrategyResult::empty(StrategyKind::CoOccurrence));
        }

        let rows = match self.store.match_patterns(&pairs).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, pairs = pairs.len(), "Pattern lookup failed");
                return Ok(StrategyResult::empty(StrategyKind::CoOccurrence));
            }
        };

        let mut acc = ScoreAccumulator::default();
        for row in &rows {
            acc.add(
                &row.industry,
                &format!("{}+{}", row.keyword, row.entity),
                row.strength,
            );
        }
        Ok(acc.finish(StrategyKind::CoOccurrence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{FailingStore, seeded_store};
    use bizclass_types::ClassificationRequest;

    fn ctx(name: &str) -> ClassificationContext {
        ClassificationContext::build(&ClassificationRequest::new(name), None)
    }

    #[tokio::test]
    async fn test_pizza_restaurant_pair() {
        let analyzer = CoOccurrenceAnalyzer::new(seeded_store().await);
        let result = analyzer.classify(&ctx("Joe's Pizza Restaurant")).await.unwrap();
        assert_eq!(result.top().unwrap().0, "Restaurants");
        assert!(
            result.evidence["Restaurants"].contains(&"pizza+restaurant".to_string())
        );
    }

    #[tokio::test]
    async fn test_no_entities_no_pairs() {
        let analyzer = CoOccurrenceAnalyzer::new(seeded_store().await);
        assert!(analyzer.classify(&ctx("Acme Widgets")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_zero_signal() {
        let analyzer = CoOccurrenceAnalyzer::new(Arc::new(FailingStore));
        let result = analyzer.classify(&ctx("Joe's Pizza Restaurant")).await.unwrap();
        assert!(result.is_empty());
    }
}
