// crates/bizclass-server/src/cache/predictive.rs
// Background warming of likely follow-up lookups (name variations)

use crate::error::Result;
use bizclass_types::{ClassificationRequest, ClassificationResult};
use moka::future::Cache;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Legal-form suffixes stripped when deriving variations
const LEGAL_SUFFIXES: &[&str] = &[
    "co", "company", "corp", "corporation", "inc", "incorporated", "llc", "llp", "ltd", "limited",
    "plc",
];

/// Plausible alternate spellings of a business name: legal suffix removed,
/// leading "The" added or dropped. Never includes the name itself.
pub fn name_variations(name: &str, limit: usize) -> Vec<String> {
    let trimmed = name.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut variations: Vec<String> = Vec::new();
    let mut push = |candidate: String| {
        let candidate = candidate.trim().to_string();
        if !candidate.is_empty()
            && !candidate.eq_ignore_ascii_case(&trimmed)
            && !variations.iter().any(|v| v.eq_ignore_ascii_case(&candidate))
        {
            variations.push(candidate);
        }
    };

    let words: Vec<&str> = trimmed.split(' ').collect();
    let is_suffix = |w: &str| {
        let bare = w.trim_end_matches(['.', ',']).to_lowercase();
        LEGAL_SUFFIXES.contains(&bare.as_str())
    };
    let mut core: Vec<&str> = words.clone();
    while core.len() > 1 && core.last().is_some_and(|w| is_suffix(w)) {
        core.pop();
    }
    let core = core.join(" ").trim_end_matches(',').to_string();
    push(core.clone());

    let lower = core.to_lowercase();
    if let Some(rest) = lower.strip_prefix("the ") {
        push(core[core.len() - rest.len()..].to_string());
    } else {
        push(format!("The {}", core));
    }

    variations.truncate(limit);
    variations
}

/// Results computed ahead of demand, kept apart from the result cache
pub struct PredictiveCache {
    entries: Cache<String, Arc<ClassificationResult>>,
    permits: Arc<Semaphore>,
    shutdown: CancellationToken,
    max_variations: usize,
    runs: AtomicU64,
}

impl PredictiveCache {
    pub fn new(
        capacity: u64,
        ttl: Duration,
        concurrency: usize,
        max_variations: usize,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
            shutdown,
            max_variations,
            runs: AtomicU64::new(0),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Arc<ClassificationResult>> {
        self.entries.get(key).await
    }

    /// Remove and return an entry, for promotion into the result cache
    pub async fn take(&self, key: &str) -> Option<Arc<ClassificationResult>> {
        self.entries.remove(key).await
    }

    pub async fn insert(&self, key: String, result: Arc<ClassificationResult>) {
        self.entries.insert(key, result).await;
    }

    pub fn max_variations(&self) -> usize {
        self.max_variations
    }

    /// Warming runs started so far
    pub fn runs(&self) -> u64 {
        self.runs.load(Ordering::Relaxed)
    }

    /// Spawn background classification of `candidates` (key, request).
    ///
    /// Work is bounded by the semaphore and dropped on shutdown. Keys that are
    /// already cached (per `is_cached`) are skipped when the task gets a permit.
    pub fn warm<F, Fut, C, CFut>(
        self: &Arc<Self>,
        candidates: Vec<(String, ClassificationRequest)>,
        is_cached: C,
        run: F,
    ) where
        F: Fn(ClassificationRequest, CancellationToken) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<ClassificationResult>> + Send + 'static,
        C: Fn(String) -> CFut + Clone + Send + Sync + 'static,
        CFut: Future<Output = bool> + Send + 'static,
    {
        for (key, request) in candidates {
            let this = self.clone();
            let run = run.clone();
            let is_cached = is_cached.clone();
            tokio::spawn(async move {
                let permit = tokio::select! {
                    _ = this.shutdown.cancelled() => return,
                    permit = this.permits.clone().acquire_owned() => permit,
                };
                let Ok(_permit) = permit else {
                    return;
                };
                if this.entries.contains_key(&key) || is_cached(key.clone()).await {
                    return;
                }

                this.runs.fetch_add(1, Ordering::Relaxed);
                let token = this.shutdown.child_token();
                match run(request, token).await {
                    Ok(result) => {
                        debug!(key = %key, industry = %result.primary.industry, "Predictive entry warmed");
                        this.entries.insert(key, Arc::new(result)).await;
                    }
                    Err(e) => debug!(key = %key, error = %e, "Predictive warming skipped"),
                }
            });
        }
    }
}
