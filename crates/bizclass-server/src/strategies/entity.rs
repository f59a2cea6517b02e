// crates/bizclass-server/src/strategies/entity.rs
// Entity strategy: industry votes from recognized entities

use super::{ScoreAccumulator, Strategy, StrategyResult};
use crate::context::ClassificationContext;
use crate::error::Result;
use async_trait::async_trait;
use bizclass_types::StrategyKind;

/// Scores industries from the entities already extracted into the context.
/// Entities without an industry (legal forms, locations) cast no vote.
pub struct EntityStrategy;

#[async_trait]
impl Strategy for EntityStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Entity
    }

    async fn classify(&self, ctx: &ClassificationContext) -> Result<StrategyResult> {
        let mut acc = ScoreAccumulator::default();
        for entity in ctx.entities() {
            if let Some(industry) = &entity.industry {
                let label = format!("{}:{}", entity.entity_type.as_str(), entity.value);
                acc.add(industry, &label, entity.confidence);
            }
        }
        Ok(acc.finish(StrategyKind::Entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizclass_types::ClassificationRequest;

    async fn classify(name: &str) -> StrategyResult {
        let ctx = ClassificationContext::build(&ClassificationRequest::new(name), None);
        EntityStrategy.classify(&ctx).await.unwrap()
    }

    #[tokio::test]
    async fn test_two_entities_corroborate() {
        let result = classify("Joe's Pizza Restaurant").await;
        // 1 - (0.2 * 0.2)
        assert!((result.score("Restaurants") - 0.96).abs() < 1e-9);
        assert_eq!(result.evidence["Restaurants"].len(), 2);
    }

    #[tokio::test]
    async fn test_brand_votes_for_its_industry() {
        let result = classify("Starbucks").await;
        assert_eq!(result.top().unwrap().0, "Coffee Shops");
    }

    #[tokio::test]
    async fn test_legal_form_casts_no_vote() {
        assert!(classify("ABC Corporation").await.is_empty());
    }
}
