// crates/bizclass-types/src/lib.rs
// Shared types for bizclass (request/response surface)
// No native-only dependencies allowed here

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ═══════════════════════════════════════
// REQUEST
// ═══════════════════════════════════════

/// A business to classify. Only `business_name` is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassificationRequest {
    pub business_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
    /// Text already extracted from the website by the crawler
    #[serde(default)]
    pub website_text: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
}

impl ClassificationRequest {
    pub fn new(business_name: impl Into<String>) -> Self {
        Self {
            business_name: business_name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_website(mut self, url: impl Into<String>) -> Self {
        self.website_url = Some(url.into());
        self
    }

    pub fn with_website_text(mut self, text: impl Into<String>) -> Self {
        self.website_text = Some(text.into());
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }
}

// ═══════════════════════════════════════
// STRATEGIES
// ═══════════════════════════════════════

/// The four independent scoring strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Keyword,
    Entity,
    Topic,
    CoOccurrence,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Keyword,
        StrategyKind::Entity,
        StrategyKind::Topic,
        StrategyKind::CoOccurrence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Entity => "entity",
            Self::Topic => "topic",
            Self::CoOccurrence => "co_occurrence",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ═══════════════════════════════════════
// CODES
// ═══════════════════════════════════════

/// Classification code scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CodeType {
    Mcc,
    Sic,
    Naics,
}

impl CodeType {
    pub const ALL: [CodeType; 3] = [CodeType::Mcc, CodeType::Sic, CodeType::Naics];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mcc => "MCC",
            Self::Sic => "SIC",
            Self::Naics => "NAICS",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "MCC" => Some(Self::Mcc),
            "SIC" => Some(Self::Sic),
            "NAICS" => Some(Self::Naics),
            _ => None,
        }
    }
}

impl fmt::Display for CodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a generated code came from, for downstream trust scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeSource {
    IndustryLookup,
    KeywordLookup,
    CrosswalkGapfill,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratedCode {
    pub code: String,
    pub code_type: CodeType,
    #[serde(default)]
    pub description: Option<String>,
    pub source: CodeSource,
    pub confidence: f64,
}

/// Up to three codes per scheme
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IndustryCodes {
    pub mcc: Vec<GeneratedCode>,
    pub sic: Vec<GeneratedCode>,
    pub naics: Vec<GeneratedCode>,
}

impl IndustryCodes {
    pub fn get(&self, code_type: CodeType) -> &[GeneratedCode] {
        match code_type {
            CodeType::Mcc => &self.mcc,
            CodeType::Sic => &self.sic,
            CodeType::Naics => &self.naics,
        }
    }

    pub fn set(&mut self, code_type: CodeType, codes: Vec<GeneratedCode>) {
        match code_type {
            CodeType::Mcc => self.mcc = codes,
            CodeType::Sic => self.sic = codes,
            CodeType::Naics => self.naics = codes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mcc.is_empty() && self.sic.is_empty() && self.naics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mcc.len() + self.sic.len() + self.naics.len()
    }
}

// ═══════════════════════════════════════
// RESULTS
// ═══════════════════════════════════════

/// One ranked industry with its fused confidence
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndustryScore {
    pub industry: String,
    /// Confidence clamped to [floor, 1.0]
    pub confidence: f64,
    /// Unclamped weighted sum across strategies
    pub raw_score: f64,
    /// weight * score per strategy that voted for this industry
    #[serde(default)]
    pub contributions: BTreeMap<StrategyKind, f64>,
    pub reasoning: String,
    /// Raw score fell below the confidence floor
    #[serde(default)]
    pub ambiguous: bool,
}

/// How the final classification was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMethod {
    MultiStrategy,
    MlAssisted,
    EnsembleValidated,
    MlValidated,
    GenericFallback,
}

impl ClassificationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MultiStrategy => "multi_strategy",
            Self::MlAssisted => "ml_assisted",
            Self::EnsembleValidated => "ensemble_validated",
            Self::MlValidated => "ml_validated",
            Self::GenericFallback => "generic_fallback",
        }
    }
}

impl fmt::Display for ClassificationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Explanation {
    pub key_factors: Vec<String>,
    pub matched_keywords: Vec<String>,
    /// Whether secondary industries were reported alongside the primary
    pub has_secondary: bool,
    /// ML tier evaluated for this request, if the ML service was consulted
    #[serde(default)]
    pub ml_tier: Option<String>,
    /// Whether the ML service agreed with the multi-strategy primary
    #[serde(default)]
    pub ml_agreement: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassificationResult {
    pub business_name: String,
    pub primary: IndustryScore,
    #[serde(default)]
    pub secondary: Vec<IndustryScore>,
    pub confidence: f64,
    pub method: ClassificationMethod,
    #[serde(default)]
    pub ambiguous: bool,
    #[serde(default)]
    pub codes: IndustryCodes,
    pub explanation: Explanation,
    pub processing_time_ms: u64,
}

/// Response envelope for the classify endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub result: ClassificationResult,
    pub served_from_cache: bool,
    pub elapsed_ms: u64,
    #[serde(default)]
    pub request_id: Option<String>,
}

/// Generic API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================================================
    // Request tests
    // ============================================================================

    #[test]
    fn test_request_builder() {
        let req = ClassificationRequest::new("Joe's Pizza")
            .with_description("Wood-fired pizza")
            .with_website("https://joespizza.example");
        assert_eq!(req.business_name, "Joe's Pizza");
        assert_eq!(req.description.as_deref(), Some("Wood-fired pizza"));
        assert_eq!(req.website_url.as_deref(), Some("https://joespizza.example"));
        assert!(req.website_text.is_none());
    }

    #[test]
    fn test_request_deserialize_minimal() {
        let req: ClassificationRequest =
            serde_json::from_str(r#"{"business_name":"ABC Corporation"}"#).unwrap();
        assert_eq!(req.business_name, "ABC Corporation");
        assert!(req.description.is_none());
        assert!(req.request_id.is_none());
    }

    // ============================================================================
    // Enum serialization tests
    // ============================================================================

    #[test]
    fn test_code_type_serialize() {
        assert_eq!(serde_json::to_string(&CodeType::Naics).unwrap(), "\"NAICS\"");
        assert_eq!(CodeType::parse("mcc"), Some(CodeType::Mcc));
        assert_eq!(CodeType::parse("isic"), None);
    }

    #[test]
    fn test_method_serialize() {
        assert_eq!(
            serde_json::to_string(&ClassificationMethod::EnsembleValidated).unwrap(),
            "\"ensemble_validated\""
        );
        assert_eq!(ClassificationMethod::GenericFallback.to_string(), "generic_fallback");
    }

    #[test]
    fn test_strategy_kind_as_map_key() {
        let mut contributions = BTreeMap::new();
        contributions.insert(StrategyKind::CoOccurrence, 0.15);
        contributions.insert(StrategyKind::Keyword, 0.4);
        let json = serde_json::to_string(&contributions).unwrap();
        assert_eq!(json, r#"{"keyword":0.4,"co_occurrence":0.15}"#);
    }

    // ============================================================================
    // IndustryCodes tests
    // ============================================================================

    #[test]
    fn test_industry_codes_get_set() {
        let mut codes = IndustryCodes::default();
        assert!(codes.is_empty());
        codes.set(
            CodeType::Mcc,
            vec![GeneratedCode {
                code: "5812".into(),
                code_type: CodeType::Mcc,
                description: None,
                source: CodeSource::IndustryLookup,
                confidence: 0.9,
            }],
        );
        assert_eq!(codes.get(CodeType::Mcc).len(), 1);
        assert!(codes.get(CodeType::Sic).is_empty());
        assert_eq!(codes.len(), 1);
    }

    #[test]
    fn test_api_response() {
        let ok = ApiResponse::ok(42);
        assert!(ok.success);
        assert_eq!(ok.data, Some(42));
        let err: ApiResponse<i32> = ApiResponse::err("boom");
        assert!(!err.success);
        assert_eq!(err.error.as_deref(), Some("boom"));
    }
}
