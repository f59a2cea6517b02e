// crates/bizclass-server/src/config/file.rs
// File-based tuning configuration from ~/.bizclass/config.toml
//
// Every threshold the pipeline uses lives here as a named, overridable value.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Top-level config structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub thresholds: Thresholds,
    pub timeouts: Timeouts,
    pub retry: RetrySettings,
    pub circuit_breaker: BreakerSettings,
    pub cache: CacheSettings,
}

/// Scoring and policy thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Exact-match confidence below which the fuzzy pass runs
    pub exact_match_trigger: f64,
    /// Distinct matched keywords below which the fuzzy pass runs
    pub min_distinct_keywords: usize,
    /// Minimum trigram similarity for a fuzzy keyword hit
    pub trigram_similarity: f64,
    /// Share of the exact score when fuzzy agrees (fuzzy gets the rest)
    pub fuzzy_agreement_exact_share: f64,
    /// Margin a disagreeing fuzzy result needs to replace the exact result
    pub fuzzy_override_margin: f64,
    /// Combined confidence floor; anything below is flagged ambiguous
    pub confidence_floor: f64,
    /// Below this the ML tier is "assisted"
    pub ml_low: f64,
    /// At or above this the ML tier is "validation"
    pub ml_high: f64,
    /// Fraction of the remaining headroom granted when ML corroborates
    pub ml_validation_boost: f64,
    /// Minimum raw score for an industry to be reported as secondary
    pub min_secondary_score: f64,
    pub max_secondary: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            exact_match_trigger: 0.6,
            min_distinct_keywords: 2,
            trigram_similarity: 0.3,
            fuzzy_agreement_exact_share: 0.4,
            fuzzy_override_margin: 0.15,
            confidence_floor: 0.35,
            ml_low: 0.5,
            ml_high: 0.8,
            ml_validation_boost: 0.5,
            min_secondary_score: 0.05,
            max_secondary: 3,
        }
    }
}

/// Deadlines, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub strategy_ms: u64,
    pub ml_ms: u64,
    pub ml_fast_ms: u64,
    pub ml_health_ms: u64,
    pub code_lookup_ms: u64,
    pub website_fetch_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            strategy_ms: 3_000,
            ml_ms: 4_000,
            ml_fast_ms: 1_500,
            ml_health_ms: 1_000,
            code_lookup_ms: 2_000,
            website_fetch_ms: 3_000,
        }
    }
}

impl Timeouts {
    pub fn strategy(&self) -> Duration {
        Duration::from_millis(self.strategy_ms)
    }

    pub fn ml(&self, fast: bool) -> Duration {
        Duration::from_millis(if fast { self.ml_fast_ms } else { self.ml_ms })
    }

    pub fn ml_health(&self) -> Duration {
        Duration::from_millis(self.ml_health_ms)
    }

    pub fn code_lookup(&self) -> Duration {
        Duration::from_millis(self.code_lookup_ms)
    }

    pub fn website_fetch(&self) -> Duration {
        Duration::from_millis(self.website_fetch_ms)
    }
}

/// Adaptive retry policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Retries for 5xx, timeouts and connection failures
    pub default_retries: u32,
    /// Retries for HTTP 429
    pub rate_limit_retries: u32,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// Success rate under which a class is cut to a single retry
    pub low_success_rate: f64,
    /// Observations required before the success rate is trusted
    pub min_samples: usize,
    /// Rolling window of outcomes kept per error class
    pub history_window: usize,
    /// Maximum number of error classes tracked at once
    pub max_classes: usize,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            default_retries: 2,
            rate_limit_retries: 5,
            base_backoff_ms: 100,
            max_backoff_ms: 2_000,
            low_success_rate: 0.2,
            min_samples: 5,
            history_window: 50,
            max_classes: 256,
        }
    }
}

/// Circuit breaker policy, one breaker per dependency
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerSettings {
    pub failure_threshold: u32,
    pub cooldown_ms: u64,
    /// Successful Half-Open probes needed to close again
    pub success_threshold: u32,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown_ms: 30_000,
            success_threshold: 2,
        }
    }
}

impl BreakerSettings {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

/// Result/predictive/index cache sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub result_ttl_secs: u64,
    pub result_capacity: u64,
    /// Use the SQLite-backed shared cache as a second tier
    pub shared_cache: bool,
    pub predictive_enabled: bool,
    pub predictive_ttl_secs: u64,
    pub predictive_capacity: u64,
    pub predictive_variations: usize,
    pub predictive_concurrency: usize,
    /// How long a finished in-flight entry stays visible to late duplicates
    pub inflight_grace_ms: u64,
    /// Refresh interval for the topic mapping and trigram indexes
    pub index_ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            result_ttl_secs: 3_600,
            result_capacity: 10_000,
            shared_cache: true,
            predictive_enabled: true,
            predictive_ttl_secs: 1_800,
            predictive_capacity: 5_000,
            predictive_variations: 3,
            predictive_concurrency: 2,
            inflight_grace_ms: 3_000,
            index_ttl_secs: 300,
        }
    }
}

impl CacheSettings {
    pub fn result_ttl(&self) -> Duration {
        Duration::from_secs(self.result_ttl_secs)
    }

    pub fn predictive_ttl(&self) -> Duration {
        Duration::from_secs(self.predictive_ttl_secs)
    }

    pub fn inflight_grace(&self) -> Duration {
        Duration::from_millis(self.inflight_grace_ms)
    }

    pub fn index_ttl(&self) -> Duration {
        Duration::from_secs(self.index_ttl_secs)
    }
}

impl ClassifierConfig {
    /// Load config from `explicit` if given, else ~/.bizclass/config.toml
    pub fn load(explicit: Option<&Path>) -> Self {
        let path = explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::config_path);

        match std::fs::read_to_string(&path) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(config) => {
                    debug!(path = %path.display(), "Loaded config from file");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to parse config file");
                    Self::default()
                }
            },
            Err(_) => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Get the config file path
    fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".bizclass")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let config = ClassifierConfig::default();
        assert_eq!(config.thresholds.exact_match_trigger, 0.6);
        assert_eq!(config.thresholds.trigram_similarity, 0.3);
        assert_eq!(config.thresholds.confidence_floor, 0.35);
        assert_eq!(config.thresholds.ml_low, 0.5);
        assert_eq!(config.thresholds.ml_high, 0.8);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[thresholds]
ml_high = 0.85

[circuit_breaker]
failure_threshold = 3
"#;
        let config = ClassifierConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.thresholds.ml_high, 0.85);
        // Untouched fields keep their defaults
        assert_eq!(config.thresholds.ml_low, 0.5);
        assert_eq!(config.circuit_breaker.failure_threshold, 3);
        assert_eq!(config.circuit_breaker.success_threshold, 2);
        assert_eq!(config.retry.rate_limit_retries, 5);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = ClassifierConfig::from_toml_str("").unwrap();
        assert_eq!(config.timeouts.strategy(), Duration::from_secs(3));
        assert_eq!(config.timeouts.ml(true), Duration::from_millis(1_500));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClassifierConfig::load(Some(&dir.path().join("absent.toml")));
        assert_eq!(config.cache.result_capacity, 10_000);
    }

    #[test]
    fn test_load_invalid_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "thresholds = [not valid").unwrap();
        let config = ClassifierConfig::load(Some(&path));
        assert_eq!(config.thresholds.max_secondary, 3);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[cache]\nresult_ttl_secs = 60\n").unwrap();
        let config = ClassifierConfig::load(Some(&path));
        assert_eq!(config.cache.result_ttl(), Duration::from_secs(60));
    }
}
