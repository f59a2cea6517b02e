// crates/bizclass-server/src/combiner.rs
// Weighted fusion of strategy results into a ranked industry list

use crate::config::Thresholds;
use crate::strategies::{StrategyResult, weight_of};
use bizclass_types::{IndustryScore, StrategyKind};
use std::collections::{BTreeMap, BTreeSet};

/// Label used when nothing matched
pub const GENERIC_INDUSTRY: &str = "General Business";

/// Fused output of one pipeline run, before ML and code generation
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedClassification {
    pub primary: IndustryScore,
    pub secondary: Vec<IndustryScore>,
    /// Every ranked industry, primary first. Kept for ML re-blending.
    pub ranked: Vec<IndustryScore>,
    pub matched_keywords: Vec<String>,
    pub key_factors: Vec<String>,
    pub strategies_used: Vec<StrategyKind>,
}

impl CombinedClassification {
    pub fn confidence(&self) -> f64 {
        self.primary.confidence
    }

    pub fn is_ambiguous(&self) -> bool {
        self.primary.ambiguous
    }
}

#[derive(Debug, Clone)]
pub struct Combiner {
    floor: f64,
    min_secondary: f64,
    max_secondary: usize,
}

impl Combiner {
    pub fn new(thresholds: &Thresholds) -> Self {
        Self {
            floor: thresholds.confidence_floor,
            min_secondary: thresholds.min_secondary_score,
            max_secondary: thresholds.max_secondary,
        }
    }

    pub fn floor(&self) -> f64 {
        self.floor
    }

    /// Confidence for a raw fused score and whether it fell under the floor
    pub fn calibrate(&self, raw: f64) -> (f64, bool) {
        (raw.clamp(self.floor, 1.0), raw < self.floor)
    }

    /// Fuse whatever strategy results arrived. Order of `results` does not
    /// matter; `None` when no strategy voted for anything.
    pub fn combine(&self, results: &[StrategyResult]) -> Option<CombinedClassification> {
        let mut by_kind: BTreeMap<StrategyKind, &StrategyResult> = BTreeMap::new();
        for result in results {
            by_kind.insert(result.kind, result);
        }

        let mut contributions: BTreeMap<String, BTreeMap<StrategyKind, f64>> = BTreeMap::new();
        for (kind, result) in &by_kind {
            let weight = weight_of(*kind);
            for (industry, score) in &result.scores {
                contributions
                    .entry(industry.clone())
                    .or_default()
                    .insert(*kind, weight * score);
            }
        }
        if contributions.is_empty() {
            return None;
        }

        let mut ranked: Vec<IndustryScore> = contributions
            .into_iter()
            .map(|(industry, votes)| {
                let raw: f64 = votes.values().sum();
                let (confidence, ambiguous) = self.calibrate(raw);
                let reasoning = reasoning(&industry, &votes, &by_kind);
                IndustryScore {
                    industry,
                    confidence,
                    raw_score: raw,
                    contributions: votes,
                    reasoning,
                    ambiguous,
                }
            })
            .collect();
        rank(&mut ranked);

        let primary = ranked[0].clone();
        let secondary = self.secondaries(&ranked);

        let matched_keywords: BTreeSet<String> = by_kind
            .values()
            .flat_map(|r| r.matched_keywords.iter().cloned())
            .collect();

        let mut key_factors: Vec<String> = primary
            .contributions
            .iter()
            .map(|(kind, value)| format!("{} signal {:.2}", kind, value))
            .collect();
        if primary.ambiguous {
            key_factors.push("combined signal below confidence floor".to_string());
        }

        Some(CombinedClassification {
            primary,
            secondary,
            ranked,
            matched_keywords: matched_keywords.into_iter().collect(),
            key_factors,
            strategies_used: by_kind.keys().copied().collect(),
        })
    }

    /// Runners-up that clear the secondary bar, best first
    pub fn secondaries(&self, ranked: &[IndustryScore]) -> Vec<IndustryScore> {
        ranked
            .iter()
            .skip(1)
            .filter(|s| s.raw_score >= self.min_secondary)
            .take(self.max_secondary)
            .cloned()
            .collect()
    }
}

/// Sort by raw score, then entity contribution, then name
pub fn rank(scores: &mut [IndustryScore]) {
    scores.sort_by(|a, b| {
        b.raw_score
            .total_cmp(&a.raw_score)
            .then_with(|| entity_vote(b).total_cmp(&entity_vote(a)))
            .then_with(|| a.industry.cmp(&b.industry))
    });
}

fn entity_vote(score: &IndustryScore) -> f64 {
    score
        .contributions
        .get(&StrategyKind::Entity)
        .copied()
        .unwrap_or(0.0)
}

fn reasoning(
    industry: &str,
    votes: &BTreeMap<StrategyKind, f64>,
    by_kind: &BTreeMap<StrategyKind, &StrategyResult>,
) -> String {
    let parts: Vec<String> = votes
        .iter()
        .map(|(kind, value)| {
            let evidence = by_kind
                .get(kind)
                .and_then(|r| r.evidence.get(industry))
                .map(|e| e.join(", "))
                .unwrap_or_default();
            format!("{} {:.2} [{}]", kind, value, evidence)
        })
        .collect();
    format!("{}: {}", industry, parts.join("; "))
}
