// crates/bizclass-server/src/http.rs
// Shared HTTP client for outbound calls (ML service, website fetches)

use std::time::Duration;

/// Upper bound on any single request; per-call deadlines are tighter
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Create the shared HTTP client with appropriate defaults.
///
/// Created once at startup and handed to every outbound collaborator.
pub fn create_shared_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .pool_max_idle_per_host(10)
        .user_agent(concat!("bizclass/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
