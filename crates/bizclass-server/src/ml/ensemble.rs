// crates/bizclass-server/src/ml/ensemble.rs
// Confidence-tiered blending of the multi-strategy result with an ML prediction

use super::MlPrediction;
use crate::combiner::{CombinedClassification, Combiner, rank};
use crate::config::Thresholds;
use bizclass_types::{ClassificationMethod, IndustryScore};
use std::collections::BTreeMap;

/// How much say the ML service gets, picked from the base confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum MlTier {
    /// Low base confidence: ML leads the blend
    Assisted,
    /// Medium base confidence: even blend
    Ensemble,
    /// High base confidence: ML can only corroborate
    Validation,
}

impl MlTier {
    pub fn select(confidence: f64, thresholds: &Thresholds) -> Self {
        if confidence < thresholds.ml_low {
            MlTier::Assisted
        } else if confidence < thresholds.ml_high {
            MlTier::Ensemble
        } else {
            MlTier::Validation
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// (base share, ML share) for the blending tiers
    pub fn weights(&self) -> Option<(f64, f64)> {
        match self {
            MlTier::Assisted => Some((0.4, 0.6)),
            MlTier::Ensemble => Some((0.5, 0.5)),
            MlTier::Validation => None,
        }
    }

    pub fn method(&self) -> ClassificationMethod {
        match self {
            MlTier::Assisted => ClassificationMethod::MlAssisted,
            MlTier::Ensemble => ClassificationMethod::EnsembleValidated,
            MlTier::Validation => ClassificationMethod::MlValidated,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleOutcome {
    pub combined: CombinedClassification,
    pub method: ClassificationMethod,
    pub agreement: bool,
}

/// Fold `prediction` into `base` according to `tier`
pub fn apply(
    tier: MlTier,
    base: &CombinedClassification,
    prediction: &MlPrediction,
    combiner: &Combiner,
    thresholds: &Thresholds,
) -> EnsembleOutcome {
    let agreement = prediction.agrees_with(&base.primary.industry);

    match tier.weights() {
        Some((base_share, ml_share)) => {
            let combined = blend(base, prediction, combiner, base_share, ml_share, tier);
            EnsembleOutcome {
                combined,
                method: tier.method(),
                agreement,
            }
        }
        None if agreement => {
            let mut combined = base.clone();
            let c = combined.primary.confidence;
            let ml = prediction.confidence.clamp(0.0, 1.0);
            let boosted = (c + (1.0 - c) * ml * thresholds.ml_validation_boost).min(1.0);
            combined.primary.confidence = boosted;
            if let Some(first) = combined.ranked.first_mut() {
                first.confidence = boosted;
            }
            combined
                .key_factors
                .push(format!("ml validation agreed ({:.2})", ml));
            EnsembleOutcome {
                combined,
                method: tier.method(),
                agreement,
            }
        }
        None => {
            let mut combined = base.clone();
            combined.key_factors.push(format!(
                "ml validation disagreed ({}), base result kept",
                prediction.industry
            ));
            EnsembleOutcome {
                combined,
                method: ClassificationMethod::MultiStrategy,
                agreement,
            }
        }
    }
}

fn blend(
    base: &CombinedClassification,
    prediction: &MlPrediction,
    combiner: &Combiner,
    base_share: f64,
    ml_share: f64,
    tier: MlTier,
) -> CombinedClassification {
    let mut scores: Vec<IndustryScore> = base
        .ranked
        .iter()
        .map(|s| {
            let ml = prediction.confidence_for(&s.industry);
            let raw = base_share * s.raw_score + ml_share * ml;
            let (confidence, ambiguous) = combiner.calibrate(raw);
            let reasoning = if ml > 0.0 {
                format!("{}; ml {:.2}", s.reasoning, ml)
            } else {
                s.reasoning.clone()
            };
            IndustryScore {
                industry: s.industry.clone(),
                confidence,
                raw_score: raw,
                contributions: s.contributions.clone(),
                reasoning,
                ambiguous,
            }
        })
        .collect();

    // Industries only the model proposed
    let mut proposals = vec![(prediction.industry.as_str(), prediction.confidence)];
    proposals.extend(
        prediction
            .alternatives
            .iter()
            .map(|a| (a.industry.as_str(), a.confidence)),
    );
    for (industry, confidence) in proposals {
        if scores
            .iter()
            .any(|s| s.industry.eq_ignore_ascii_case(industry))
        {
            continue;
        }
        let ml = confidence.clamp(0.0, 1.0);
        let raw = ml_share * ml;
        let (calibrated, ambiguous) = combiner.calibrate(raw);
        scores.push(IndustryScore {
            industry: industry.to_string(),
            confidence: calibrated,
            raw_score: raw,
            contributions: BTreeMap::new(),
            reasoning: format!("{}: ml {:.2}", industry, ml),
            ambiguous,
        });
    }
    rank(&mut scores);

    let mut combined = base.clone();
    combined.primary = scores[0].clone();
    combined.secondary = combiner.secondaries(&scores);
    combined.ranked = scores;
    combined.key_factors.push(format!(
        "ml {} blend ({:.0}/{:.0}) with {} {:.2}",
        tier.as_str(),
        base_share * 100.0,
        ml_share * 100.0,
        prediction.industry,
        prediction.confidence
    ));
    combined
}
