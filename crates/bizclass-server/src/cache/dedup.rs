// crates/bizclass-server/src/cache/dedup.rs
// In-flight request deduplication: one pipeline run per fingerprint

use bizclass_types::ClassificationResult;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Terminal state of a flight, as seen by followers
#[derive(Debug, Clone)]
pub enum FlightOutcome {
    Done(Arc<ClassificationResult>),
    Failed(String),
    /// The leader went away without finishing; followers may retry
    Cancelled,
}

type Slot = watch::Sender<Option<FlightOutcome>>;

struct Flight {
    id: u64,
    tx: Slot,
}

/// Registry of pipelines currently running, keyed by fingerprint
pub struct InFlight {
    flights: Mutex<HashMap<String, Arc<Flight>>>,
    grace: Duration,
    next_id: AtomicU64,
}

/// Result of registering interest in a key
pub enum Claim {
    /// Caller runs the pipeline and must settle the guard
    Leader(FlightGuard),
    /// Someone else is already running it
    Follower(watch::Receiver<Option<FlightOutcome>>),
}

impl InFlight {
    pub fn new(grace: Duration) -> Self {
        Self {
            flights: Mutex::new(HashMap::new()),
            grace,
            next_id: AtomicU64::new(1),
        }
    }

    /// Become leader for `key`, or join the flight already registered.
    ///
    /// A finished flight stays registered for the grace period so late
    /// duplicates replay its outcome instead of starting a new run.
    pub fn claim(self: &Arc<Self>, key: &str) -> Claim {
        let mut flights = match self.flights.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(flight) = flights.get(key) {
            return Claim::Follower(flight.tx.subscribe());
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, _) = watch::channel(None);
        flights.insert(key.to_string(), Arc::new(Flight { id, tx }));
        Claim::Leader(FlightGuard {
            registry: self.clone(),
            key: key.to_string(),
            id,
            settled: false,
        })
    }

    pub fn len(&self) -> usize {
        self.flights.lock().map(|f| f.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn publish(&self, key: &str, id: u64, outcome: FlightOutcome) {
        let flights = match self.flights.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(flight) = flights.get(key)
            && flight.id == id
        {
            flight.tx.send_replace(Some(outcome));
        }
    }

    fn remove(&self, key: &str, id: u64) {
        let mut flights = match self.flights.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if flights.get(key).is_some_and(|f| f.id == id) {
            flights.remove(key);
        }
    }
}

/// Leadership of one flight. Dropping it unsettled publishes `Cancelled`.
pub struct FlightGuard {
    registry: Arc<InFlight>,
    key: String,
    id: u64,
    settled: bool,
}

impl FlightGuard {
    /// Publish the outcome and keep it visible for the grace period
    pub fn complete(mut self, outcome: FlightOutcome) {
        self.settled = true;
        self.registry.publish(&self.key, self.id, outcome);

        let registry = self.registry.clone();
        let key = std::mem::take(&mut self.key);
        let id = self.id;
        let grace = registry.grace;
        if grace.is_zero() {
            registry.remove(&key, id);
            return;
        }
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            registry.remove(&key, id);
        });
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        debug!(key = %self.key, "In-flight leader dropped, releasing followers");
        self.registry
            .publish(&self.key, self.id, FlightOutcome::Cancelled);
        self.registry.remove(&self.key, self.id);
    }
}

/// Wait for the leader's outcome. Returns `Cancelled` if the caller's own
/// token fires or the flight disappears without an outcome.
pub async fn wait_for(
    mut rx: watch::Receiver<Option<FlightOutcome>>,
    token: &CancellationToken,
) -> FlightOutcome {
    loop {
        if let Some(outcome) = rx.borrow_and_update().clone() {
            return outcome;
        }
        tokio::select! {
            _ = token.cancelled() => return FlightOutcome::Cancelled,
            changed = rx.changed() => {
                if changed.is_err() {
                    return rx.borrow().clone().unwrap_or(FlightOutcome::Cancelled);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizclass_types::{ClassificationMethod, Explanation, IndustryCodes, IndustryScore};
    use std::collections::BTreeMap;

    fn result() -> Arc<ClassificationResult> {
        Arc::new(ClassificationResult {
            business_name: "Starbucks".into(),
            primary: IndustryScore {
                industry: "Coffee Shops".into(),
                confidence: 0.9,
                raw_score: 0.9,
                contributions: BTreeMap::new(),
                reasoning: String::new(),
                ambiguous: false,
            },
            secondary: Vec::new(),
            confidence: 0.9,
            method: ClassificationMethod::MultiStrategy,
            ambiguous: false,
            codes: IndustryCodes::default(),
            explanation: Explanation::default(),
            processing_time_ms: 1,
        })
    }

    #[tokio::test]
    async fn test_followers_receive_leader_result() {
        let inflight = Arc::new(InFlight::new(Duration::from_millis(50)));
        let Claim::Leader(guard) = inflight.claim("k") else {
            panic!("first claim must lead");
        };
        let Claim::Follower(rx) = inflight.claim("k") else {
            panic!("second claim must follow");
        };

        let token = CancellationToken::new();
        let waiter = tokio::spawn(async move { wait_for(rx, &token).await });
        let shared = result();
        guard.complete(FlightOutcome::Done(shared.clone()));

        match waiter.await.unwrap() {
            FlightOutcome::Done(r) => assert!(Arc::ptr_eq(&r, &shared)),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_grace_period_replays_then_expires() {
        let inflight = Arc::new(InFlight::new(Duration::from_millis(30)));
        let Claim::Leader(guard) = inflight.claim("k") else {
            panic!("first claim must lead");
        };
        guard.complete(FlightOutcome::Done(result()));

        // Late duplicate inside the grace window
        let Claim::Follower(rx) = inflight.claim("k") else {
            panic!("late claim should replay");
        };
        assert!(matches!(
            wait_for(rx, &CancellationToken::new()).await,
            FlightOutcome::Done(_)
        ));

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(inflight.is_empty());
        assert!(matches!(inflight.claim("k"), Claim::Leader(_)));
    }

    #[tokio::test]
    async fn test_dropped_leader_releases_followers() {
        let inflight = Arc::new(InFlight::new(Duration::from_secs(5)));
        let Claim::Leader(guard) = inflight.claim("k") else {
            panic!("first claim must lead");
        };
        let Claim::Follower(rx) = inflight.claim("k") else {
            panic!("second claim must follow");
        };
        drop(guard);
        assert!(matches!(
            wait_for(rx, &CancellationToken::new()).await,
            FlightOutcome::Cancelled
        ));
        // Nothing left behind; the next caller leads
        assert!(matches!(inflight.claim("k"), Claim::Leader(_)));
    }

    #[tokio::test]
    async fn test_follower_cancellation_does_not_affect_leader() {
        let inflight = Arc::new(InFlight::new(Duration::from_secs(5)));
        let Claim::Leader(guard) = inflight.claim("k") else {
            panic!("first claim must lead");
        };
        let Claim::Follower(rx) = inflight.claim("k") else {
            panic!("second claim must follow");
        };
        let token = CancellationToken::new();
        token.cancel();
        assert!(matches!(wait_for(rx, &token).await, FlightOutcome::Cancelled));

        let Claim::Follower(rx2) = inflight.claim("k") else {
            panic!("flight must still be registered");
        };
        guard.complete(FlightOutcome::Failed("boom".into()));
        assert!(matches!(
            wait_for(rx2, &CancellationToken::new()).await,
            FlightOutcome::Failed(_)
        ));
    }
}
