// crates/bizclass-server/src/resilience/mod.rs
// Failure handling for external dependencies

mod circuit_breaker;
mod retry;

pub use circuit_breaker::{BreakerState, CallPermit, CircuitBreaker};
pub use retry::{AdaptiveRetry, ErrorClass, RetryOutcome};
