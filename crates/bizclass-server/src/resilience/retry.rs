// crates/bizclass-server/src/resilience/retry.rs
// Adaptive retry: per-error-class budgets tuned by observed retry success

use crate::config::RetrySettings;
use crate::error::{ClassifierError, Result};
use rand::Rng;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Failure classes with distinct retry behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorClass {
    /// Malformed request, auth failure, not found: retrying can't help
    Permanent,
    RateLimited,
    ServerError,
    Timeout,
    Dns,
    Connect,
    CircuitOpen,
    Cancelled,
}

impl ErrorClass {
    pub fn of(err: &ClassifierError) -> Self {
        match err {
            ClassifierError::MlStatus { status, .. } => match *status {
                429 => Self::RateLimited,
                408 => Self::Timeout,
                s if s >= 500 => Self::ServerError,
                _ => Self::Permanent,
            },
            ClassifierError::MlTimeout(_) => Self::Timeout,
            ClassifierError::Dns(_) => Self::Dns,
            ClassifierError::Connect(_) => Self::Connect,
            ClassifierError::Http(e) if e.is_timeout() => Self::Timeout,
            ClassifierError::Http(e) if e.is_connect() => Self::Connect,
            ClassifierError::Http(e) if e.is_decode() || e.is_builder() => Self::Permanent,
            ClassifierError::Http(_) => Self::ServerError,
            ClassifierError::CircuitOpen(_) => Self::CircuitOpen,
            ClassifierError::Cancelled => Self::Cancelled,
            _ => Self::Permanent,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Failures that say something about the dependency's health
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::ServerError | Self::Timeout | Self::Dns | Self::Connect
        )
    }
}

#[derive(Debug)]
struct ClassHistory {
    outcomes: VecDeque<bool>,
    last_seen: Instant,
}

impl ClassHistory {
    fn success_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 1.0;
        }
        self.outcomes.iter().filter(|ok| **ok).count() as f64 / self.outcomes.len() as f64
    }
}

/// Result of a retried operation along with how many retries it took
#[derive(Debug)]
pub struct RetryOutcome<T> {
    pub result: Result<T>,
    pub retries: u32,
}

/// Retry policy keyed by (dependency, error class).
///
/// Each retry's outcome is recorded under the class of the error that
/// triggered it. History is a bounded rolling window per class, and the
/// number of tracked classes is capped (least recently seen is evicted).
#[derive(Debug)]
pub struct AdaptiveRetry {
    settings: RetrySettings,
    history: Mutex<HashMap<String, ClassHistory>>,
}

impl AdaptiveRetry {
    pub fn new(settings: RetrySettings) -> Self {
        Self {
            settings,
            history: Mutex::new(HashMap::new()),
        }
    }

    fn key(dependency: &str, class: ErrorClass) -> String {
        format!("{}:{}", dependency, class.as_str())
    }

    /// Retries allowed for an error of `class` from `dependency`
    pub fn budget(&self, dependency: &str, class: ErrorClass) -> u32 {
        let base = match class {
            ErrorClass::Permanent | ErrorClass::CircuitOpen | ErrorClass::Cancelled => 0,
            ErrorClass::RateLimited => self.settings.rate_limit_retries,
            ErrorClass::Dns => self.settings.default_retries + 1,
            ErrorClass::ServerError | ErrorClass::Timeout | ErrorClass::Connect => {
                self.settings.default_retries
            }
        };
        if base == 0 {
            return 0;
        }
        match self.success_rate(dependency, class) {
            Some(rate) if rate < self.settings.low_success_rate => base.min(1),
            _ => base,
        }
    }

    /// Observed retry success rate, once enough samples exist
    pub fn success_rate(&self, dependency: &str, class: ErrorClass) -> Option<f64> {
        let history = self.history.lock().ok()?;
        let entry = history.get(&Self::key(dependency, class))?;
        (entry.outcomes.len() >= self.settings.min_samples).then(|| entry.success_rate())
    }

    /// Record whether a retry after an error of `class` succeeded
    pub fn record(&self, dependency: &str, class: ErrorClass, success: bool) {
        let Ok(mut history) = self.history.lock() else {
            return;
        };
        let key = Self::key(dependency, class);

        if !history.contains_key(&key)
            && history.len() >= self.settings.max_classes
            && let Some(oldest) = history
                .iter()
                .min_by_key(|(_, h)| h.last_seen)
                .map(|(k, _)| k.clone())
        {
            history.remove(&oldest);
        }

        let entry = history.entry(key).or_insert_with(|| ClassHistory {
            outcomes: VecDeque::new(),
            last_seen: Instant::now(),
        });
        entry.outcomes.push_back(success);
        while entry.outcomes.len() > self.settings.history_window {
            entry.outcomes.pop_front();
        }
        entry.last_seen = Instant::now();
    }

    pub fn tracked_classes(&self) -> usize {
        self.history.lock().map(|h| h.len()).unwrap_or(0)
    }

    /// Exponential backoff with equal jitter: half fixed, half random
    pub fn backoff(&self, retry: u32) -> Duration {
        let exp = self
            .settings
            .base_backoff_ms
            .saturating_mul(1u64 << retry.min(16))
            .min(self.settings.max_backoff_ms);
        if exp == 0 {
            return Duration::ZERO;
        }
        let half = exp / 2;
        let jitter = rand::rng().random_range(0..=exp - half);
        Duration::from_millis(half + jitter)
    }

    /// Run `op` until it succeeds, the budget for its latest error class is
    /// spent, or `token` is cancelled. `op` receives the attempt number.
    pub async fn run<T, F, Fut>(
        &self,
        dependency: &str,
        token: &CancellationToken,
        mut op: F,
    ) -> RetryOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retries = 0u32;
        let mut pending: Option<ErrorClass> = None;

        loop {
            let result = op(retries).await;
            let err = match result {
                Ok(value) => {
                    if let Some(class) = pending {
                        self.record(dependency, class, true);
                    }
                    return RetryOutcome {
                        result: Ok(value),
                        retries,
                    };
                }
                Err(e) => e,
            };

            let class = ErrorClass::of(&err);
            if let Some(previous) = pending
                && class != ErrorClass::Cancelled
            {
                self.record(dependency, previous, false);
            }

            let budget = self.budget(dependency, class);
            if retries >= budget {
                debug!(
                    dependency,
                    class = class.as_str(),
                    retries,
                    budget,
                    "Giving up"
                );
                return RetryOutcome {
                    result: Err(err),
                    retries,
                };
            }

            let delay = self.backoff(retries);
            debug!(
                dependency,
                class = class.as_str(),
                retry = retries + 1,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Retrying"
            );
            tokio::select! {
                _ = token.cancelled() => {
                    return RetryOutcome { result: Err(ClassifierError::Cancelled), retries };
                }
                _ = tokio::time::sleep(delay) => {}
            }
            retries += 1;
            pending = Some(class);
        }
    }
}
