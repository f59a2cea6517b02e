// crates/bizclass-server/src/ml/mod.rs
// External ML classification service: client seam, gateway and ensemble tiers

mod client;
pub mod ensemble;
mod gateway;

pub use client::HttpMlClient;
pub(crate) use client::map_transport_error;
pub use ensemble::{EnsembleOutcome, MlTier};
pub use gateway::{ML_DEPENDENCY, MlCallReport, MlGateway};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Which model the service should run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelVariant {
    Full,
    /// Lower-latency model for the fast endpoint
    Fast,
}

impl ModelVariant {
    pub fn is_fast(&self) -> bool {
        matches!(self, ModelVariant::Fast)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelVariant::Full => "full",
            ModelVariant::Fast => "fast",
        }
    }
}

/// Payload sent to the ML service
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MlRequest {
    pub business_name: String,
    pub text: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MlAlternative {
    pub industry: String,
    pub confidence: f64,
}

/// The service's answer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MlPrediction {
    pub industry: String,
    pub confidence: f64,
    #[serde(default)]
    pub alternatives: Vec<MlAlternative>,
    #[serde(default)]
    pub model: Option<String>,
}

impl MlPrediction {
    /// Confidence the model gives `industry`, case-insensitively
    pub fn confidence_for(&self, industry: &str) -> f64 {
        if self.industry.eq_ignore_ascii_case(industry) {
            return self.confidence.clamp(0.0, 1.0);
        }
        self.alternatives
            .iter()
            .find(|a| a.industry.eq_ignore_ascii_case(industry))
            .map(|a| a.confidence.clamp(0.0, 1.0))
            .unwrap_or(0.0)
    }

    pub fn agrees_with(&self, industry: &str) -> bool {
        self.industry.eq_ignore_ascii_case(industry)
    }
}

/// Transport to the ML service. Deadlines, retries and the circuit breaker
/// are applied by [`MlGateway`], not by implementations.
#[async_trait]
pub trait MlClient: Send + Sync {
    async fn classify(&self, request: &MlRequest, variant: ModelVariant) -> Result<MlPrediction>;

    async fn health(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_deserialize_minimal() {
        let p: MlPrediction =
            serde_json::from_str(r#"{"industry":"Retail","confidence":0.7}"#).unwrap();
        assert!(p.alternatives.is_empty());
        assert!(p.model.is_none());
    }

    #[test]
    fn test_confidence_for() {
        let p = MlPrediction {
            industry: "Restaurants".into(),
            confidence: 0.9,
            alternatives: vec![MlAlternative {
                industry: "Coffee Shops".into(),
                confidence: 0.3,
            }],
            model: None,
        };
        assert_eq!(p.confidence_for("restaurants"), 0.9);
        assert_eq!(p.confidence_for("Coffee Shops"), 0.3);
        assert_eq!(p.confidence_for("Retail"), 0.0);
        assert!(p.agrees_with("RESTAURANTS"));
    }
}
