// crates/bizclass-server/src/config/mod.rs
// Configuration: environment variables and the TOML tuning file

pub mod env;
pub mod file;

pub use env::{ConfigValidation, EnvConfig};
pub use file::{
    BreakerSettings, CacheSettings, ClassifierConfig, RetrySettings, Thresholds, Timeouts,
};
