// crates/bizclass-server/src/config/env.rs
// Environment-based configuration - single source of truth for all env vars

use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Default HTTP port for `bizclass serve`
pub const DEFAULT_PORT: u16 = 8088;

/// Configuration validation result
#[derive(Debug)]
pub struct ConfigValidation {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl Default for ConfigValidation {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigValidation {
    pub fn new() -> Self {
        Self {
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    /// Format as a human-readable report
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        if !self.errors.is_empty() {
            lines.push("Errors:".to_string());
            for err in &self.errors {
                lines.push(format!("  - {}", err));
            }
        }

        if !self.warnings.is_empty() {
            lines.push("Warnings:".to_string());
            for warn in &self.warnings {
                lines.push(format!("  - {}", warn));
            }
        }

        if lines.is_empty() {
            "Configuration OK".to_string()
        } else {
            lines.join("\n")
        }
    }
}

/// Environment configuration - all env vars in one place
#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Base URL of the ML classification service (BIZCLASS_ML_URL)
    pub ml_url: Option<String>,
    /// Skip the ML tier entirely (BIZCLASS_DISABLE_ML)
    pub disable_ml: bool,
    /// Taxonomy database path (BIZCLASS_DB_PATH)
    pub db_path: PathBuf,
    /// HTTP port (BIZCLASS_PORT)
    pub port: u16,
    /// Tuning file override (BIZCLASS_CONFIG)
    pub config_path: Option<PathBuf>,
}

impl EnvConfig {
    /// Load all environment configuration (call once at startup)
    pub fn load() -> Self {
        info!("Loading environment configuration");

        let disable_ml = parse_bool_env("BIZCLASS_DISABLE_ML").unwrap_or(false);
        let ml_url = if disable_ml {
            info!("BIZCLASS_DISABLE_ML is set, ML tier disabled");
            None
        } else {
            read_var("BIZCLASS_ML_URL")
        };

        let port = match read_var("BIZCLASS_PORT") {
            Some(p) => p.parse().unwrap_or_else(|_| {
                warn!(value = %p, "Invalid BIZCLASS_PORT, using default");
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        let config = Self {
            ml_url,
            disable_ml,
            db_path: read_var("BIZCLASS_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_db_path),
            port,
            config_path: read_var("BIZCLASS_CONFIG").map(PathBuf::from),
        };
        debug!(db = %config.db_path.display(), ml = config.ml_url.is_some(), "Environment loaded");
        config
    }

    /// Check if the ML tier can run
    pub fn has_ml_service(&self) -> bool {
        !self.disable_ml && self.ml_url.is_some()
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigValidation {
        let mut validation = ConfigValidation::new();

        if !self.disable_ml && self.ml_url.is_none() {
            validation.add_warning(
                "No ML service configured. Set BIZCLASS_ML_URL to enable ML-assisted tiers.",
            );
        }

        if let Some(ref url) = self.ml_url
            && url::Url::parse(url).is_err()
        {
            validation.add_error(format!("BIZCLASS_ML_URL '{}' is not a valid URL", url));
        }

        if self.port == 0 {
            validation.add_error("BIZCLASS_PORT must be non-zero");
        }

        validation
    }
}

/// Default database location: ~/.bizclass/taxonomy.db
pub fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".bizclass")
        .join("taxonomy.db")
}

fn read_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool_env(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?.to_lowercase();
    match value.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(ml_url: Option<&str>) -> EnvConfig {
        EnvConfig {
            ml_url: ml_url.map(String::from),
            disable_ml: false,
            db_path: PathBuf::from("/tmp/taxonomy.db"),
            port: DEFAULT_PORT,
            config_path: None,
        }
    }

    #[test]
    fn test_validation_without_ml_warns() {
        let validation = config(None).validate();
        assert!(validation.is_valid()); // Warnings don't make it invalid
        assert_eq!(validation.warnings.len(), 1);
    }

    #[test]
    fn test_validation_bad_url_errors() {
        let validation = config(Some("not a url")).validate();
        assert!(!validation.is_valid());
        assert!(validation.report().contains("Errors:"));
    }

    #[test]
    fn test_validation_ok() {
        let cfg = config(Some("http://ml.internal:9000"));
        assert!(cfg.has_ml_service());
        assert_eq!(cfg.validate().report(), "Configuration OK");
    }

    #[test]
    fn test_disabled_ml_has_no_service() {
        let mut cfg = config(Some("http://ml.internal:9000"));
        cfg.disable_ml = true;
        assert!(!cfg.has_ml_service());
    }
}
