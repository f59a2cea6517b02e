// crates/bizclass-server/src/resilience/circuit_breaker.rs
// Circuit breaker for one external dependency (ML service, shared cache)

use crate::config::BreakerSettings;
use serde::Serialize;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Circuit state for a dependency.
#[derive(Debug, Clone)]
enum State {
    /// Normal operation, counting consecutive failures.
    Closed { consecutive_failures: u32 },
    /// Tripped; calls are rejected until the cooldown expires.
    Open { opened_at: Instant },
    /// Cooldown expired; one probe at a time until enough succeed.
    HalfOpen { successes: u32, probe_in_flight: bool },
}

impl Default for State {
    fn default() -> Self {
        Self::Closed {
            consecutive_failures: 0,
        }
    }
}

/// Public view of the breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

/// Outcome of asking the breaker for permission to call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Allowed,
    /// Allowed as the single Half-Open probe
    Probe,
    Rejected,
}

/// Permission for one call through the breaker.
///
/// Settle it with [`success`](Self::success) or [`failure`](Self::failure).
/// A probe permit dropped unsettled (the call was cancelled, or its future
/// was dropped before the dependency answered) gives the Half-Open slot back.
#[must_use = "an unsettled probe permit is released on drop"]
#[derive(Debug)]
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    probe: bool,
    settled: bool,
}

impl CallPermit<'_> {
    pub fn is_probe(&self) -> bool {
        self.probe
    }

    pub fn success(mut self) {
        self.settled = true;
        self.breaker.record_success();
    }

    pub fn failure(mut self) {
        self.settled = true;
        self.breaker.record_failure();
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if self.probe && !self.settled {
            debug!(dependency = %self.breaker.name, "Probe ended without an outcome, releasing slot");
            self.breaker.release_probe();
        }
    }
}

/// Thread-safe circuit breaker guarding a single dependency.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    settings: BreakerSettings,
    state: Mutex<State>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, settings: BreakerSettings) -> Self {
        Self {
            name: name.into(),
            settings,
            state: Mutex::new(State::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask to make a call; `None` while the circuit rejects calls.
    pub fn acquire(&self) -> Option<CallPermit<'_>> {
        let probe = match self.try_acquire() {
            Admission::Rejected => return None,
            Admission::Allowed => false,
            Admission::Probe => true,
        };
        Some(CallPermit {
            breaker: self,
            probe,
            settled: false,
        })
    }

    /// Open circuits move to Half-Open once the cooldown has passed,
    /// admitting exactly one probe.
    fn try_acquire(&self) -> Admission {
        let Ok(mut state) = self.state.lock() else {
            return Admission::Allowed; // If mutex is poisoned, allow the request
        };

        match &mut *state {
            State::Closed { .. } => Admission::Allowed,
            State::Open { opened_at } => {
                if opened_at.elapsed() >= self.settings.cooldown() {
                    info!(dependency = %self.name, "Circuit half-open, allowing probe request");
                    *state = State::HalfOpen {
                        successes: 0,
                        probe_in_flight: true,
                    };
                    Admission::Probe
                } else {
                    Admission::Rejected
                }
            }
            State::HalfOpen {
                probe_in_flight, ..
            } => {
                if *probe_in_flight {
                    Admission::Rejected
                } else {
                    *probe_in_flight = true;
                    Admission::Probe
                }
            }
        }
    }

    /// Record a call that reached the dependency and got an answer.
    fn record_success(&self) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };

        match &mut *state {
            State::Closed {
                consecutive_failures,
            } => *consecutive_failures = 0,
            State::HalfOpen { successes, .. } => {
                let successes = *successes + 1;
                if successes >= self.settings.success_threshold {
                    info!(dependency = %self.name, "Circuit recovered (half-open probes succeeded)");
                    *state = State::default();
                } else {
                    *state = State::HalfOpen {
                        successes,
                        probe_in_flight: false,
                    };
                }
            }
            // Late answer from a call admitted before the trip
            State::Open { .. } => {}
        }
    }

    /// Record a transient failure; may trip the circuit.
    fn record_failure(&self) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        let now = Instant::now();

        match &mut *state {
            State::Closed {
                consecutive_failures,
            } => {
                *consecutive_failures += 1;
                if *consecutive_failures >= self.settings.failure_threshold {
                    warn!(
                        dependency = %self.name,
                        failures = *consecutive_failures,
                        cooldown_ms = self.settings.cooldown_ms,
                        "Circuit tripped"
                    );
                    *state = State::Open { opened_at: now };
                }
            }
            State::HalfOpen { .. } => {
                warn!(dependency = %self.name, "Half-open probe failed, circuit re-tripped");
                *state = State::Open { opened_at: now };
            }
            State::Open { .. } => {}
        }
    }

    fn release_probe(&self) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if let State::HalfOpen {
            probe_in_flight, ..
        } = &mut *state
        {
            *probe_in_flight = false;
        }
    }

    pub fn state(&self) -> BreakerState {
        let Ok(state) = self.state.lock() else {
            return BreakerState::Closed;
        };
        match *state {
            State::Closed { .. } => BreakerState::Closed,
            State::Open { .. } => BreakerState::Open,
            State::HalfOpen { .. } => BreakerState::HalfOpen,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new("ml_service", BreakerSettings::default())
    }

    fn trip(cb: &CircuitBreaker) {
        for _ in 0..cb.settings.failure_threshold {
            cb.record_failure();
        }
    }

    fn expire_cooldown(cb: &CircuitBreaker) {
        let mut state = cb.state.lock().unwrap();
        *state = State::Open {
            opened_at: Instant::now() - cb.settings.cooldown() - Duration::from_secs(1),
        };
    }

    #[test]
    fn test_new_breaker_is_closed() {
        let cb = breaker();
        assert_eq!(cb.state(), BreakerState::Closed);
        assert_eq!(cb.try_acquire(), Admission::Allowed);
    }

    #[test]
    fn test_failures_below_threshold_do_not_trip() {
        let cb = breaker();
        for _ in 0..4 {
            cb.record_failure();
        }
        assert_eq!(cb.try_acquire(), Admission::Allowed);
    }

    #[test]
    fn test_threshold_failures_trips_circuit() {
        let cb = breaker();
        trip(&cb);
        assert_eq!(cb.state(), BreakerState::Open);
        assert_eq!(cb.try_acquire(), Admission::Rejected);
    }

    #[test]
    fn test_success_resets_consecutive_count() {
        let cb = breaker();
        for _ in 0..4 {
            cb.record_failure();
        }
        cb.record_success();
        cb.record_failure();
        assert_eq!(cb.state(), BreakerState::Closed);
    }

    #[test]
    fn test_half_open_admits_single_probe() {
        let cb = breaker();
        trip(&cb);
        expire_cooldown(&cb);
        assert_eq!(cb.try_acquire(), Admission::Probe);
        assert_eq!(cb.state(), BreakerState::HalfOpen);
        assert_eq!(cb.try_acquire(), Admission::Rejected);
    }

    #[test]
    fn test_half_open_closes_after_success_threshold() {
        let cb = breaker();
        trip(&cb);
        expire_cooldown(&cb);

        assert_eq!(cb.try_acquire(), Admission::Probe);
        cb.record_success();
        assert_eq!(cb.state(), BreakerState::HalfOpen);

        assert_eq!(cb.try_acquire(), Admission::Probe);
        cb.record_success();
        assert_eq!(cb.state(), BreakerState::Closed);
    }

    #[test]
    fn test_half_open_failure_retrips() {
        let cb = breaker();
        trip(&cb);
        expire_cooldown(&cb);
        assert_eq!(cb.try_acquire(), Admission::Probe);
        cb.record_failure();
        assert_eq!(cb.state(), BreakerState::Open);
        assert_eq!(cb.try_acquire(), Admission::Rejected);
    }

    #[test]
    fn test_released_probe_can_be_reissued() {
        let cb = breaker();
        trip(&cb);
        expire_cooldown(&cb);
        assert_eq!(cb.try_acquire(), Admission::Probe);
        cb.release_probe();
        assert_eq!(cb.try_acquire(), Admission::Probe);
    }

    #[test]
    fn test_dropped_half_open_permit_releases_slot() {
        let cb = breaker();
        trip(&cb);
        expire_cooldown(&cb);

        let permit = cb.acquire().unwrap();
        assert!(permit.is_probe());
        assert!(cb.acquire().is_none());
        drop(permit);

        assert_eq!(cb.state(), BreakerState::HalfOpen);
        let retry = cb.acquire().unwrap();
        assert!(retry.is_probe());
        retry.success();
    }

    #[test]
    fn test_settled_permits_drive_transitions() {
        let cb = breaker();
        for _ in 0..cb.settings.failure_threshold {
            cb.acquire().unwrap().failure();
        }
        assert_eq!(cb.state(), BreakerState::Open);
        assert!(cb.acquire().is_none());

        expire_cooldown(&cb);
        for _ in 0..cb.settings.success_threshold {
            cb.acquire().unwrap().success();
        }
        assert_eq!(cb.state(), BreakerState::Closed);
        assert!(!cb.acquire().unwrap().is_probe());
    }
}
