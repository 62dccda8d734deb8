//! Per-provider circuit breaker
//!
//! Three-state breaker keyed off consecutive failures. The chain skips Open
//! providers entirely and attempts HalfOpen providers, so a single trial
//! call adjudicates recovery; there is no request queueing on HalfOpen.
//!
//! All time arithmetic goes through the injected [`Clock`], which is what
//! makes the reset and half-open transitions testable without sleeps.

use crate::domain::ports::Clock;
use crate::infrastructure::constants::{
    BREAKER_FAILURE_THRESHOLD, BREAKER_MAX_RESET_TIMEOUT, BREAKER_RESET_TIMEOUT,
    BREAKER_THRESHOLD_DISABLED,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::warn;

/// Circuit breaker states as observed at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitStatus {
    /// Requests flow normally
    Closed,
    /// The reset timeout has elapsed; the next request is a trial call
    HalfOpen,
    /// Requests are skipped until the reset timeout elapses
    Open,
}

impl std::fmt::Display for CircuitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::HalfOpen => write!(f, "half-open"),
            Self::Open => write!(f, "open"),
        }
    }
}

/// Circuit breaker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// How long the circuit stays open before a trial call is allowed
    #[serde(default = "default_reset_timeout")]
    pub reset_timeout: Duration,
    /// Double the reset timeout on every re-open
    #[serde(default)]
    pub use_exponential_backoff: bool,
    /// Upper bound on the reset timeout under exponential backoff
    #[serde(default = "default_max_reset_timeout")]
    pub max_reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: BREAKER_FAILURE_THRESHOLD,
            reset_timeout: BREAKER_RESET_TIMEOUT,
            use_exponential_backoff: false,
            max_reset_timeout: BREAKER_MAX_RESET_TIMEOUT,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn new(failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            failure_threshold,
            reset_timeout,
            ..Default::default()
        }
    }

    /// Enable exponential backoff capped at `max_reset_timeout`
    pub fn with_exponential_backoff(mut self, max_reset_timeout: Duration) -> Self {
        self.use_exponential_backoff = true;
        self.max_reset_timeout = max_reset_timeout;
        self
    }

    /// Configuration for a breaker that never opens in practice
    ///
    /// Used for the terminal offline fallback, which must always be tried.
    pub fn effectively_disabled() -> Self {
        Self {
            failure_threshold: BREAKER_THRESHOLD_DISABLED,
            ..Default::default()
        }
    }
}

/// Mutable breaker state, guarded by the breaker's mutex
#[derive(Debug)]
struct BreakerState {
    consecutive_failures: u32,
    failure_multiplier: u32,
    open_until: Option<Instant>,
}

/// Point-in-time view of a breaker for diagnostics
#[derive(Debug, Clone, Copy)]
pub struct BreakerSnapshot {
    pub status: CircuitStatus,
    pub open_until: Option<Instant>,
    pub consecutive_failures: u32,
}

/// Per-provider circuit breaker with injected clock
///
/// The mutex scope is field access only; provider I/O never happens under
/// the lock.
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(
        name: impl Into<String>,
        config: CircuitBreakerConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            clock,
            state: Mutex::new(BreakerState {
                consecutive_failures: 0,
                failure_multiplier: 1,
                open_until: None,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Observe the breaker status at the current clock reading
    ///
    /// Open-to-HalfOpen is a passive transition: it is derived from the
    /// stored deadline on observation rather than by a timer.
    pub fn status(&self) -> CircuitStatus {
        let state = self.state.lock().expect("breaker mutex poisoned");
        match state.open_until {
            None => CircuitStatus::Closed,
            Some(open_until) => {
                if self.clock.now() >= open_until {
                    CircuitStatus::HalfOpen
                } else {
                    CircuitStatus::Open
                }
            }
        }
    }

    /// Record a successful call, closing the circuit unconditionally
    pub fn record_success(&self) {
        let mut state = self.state.lock().expect("breaker mutex poisoned");
        state.consecutive_failures = 0;
        state.failure_multiplier = 1;
        state.open_until = None;
    }

    /// Record a failed call, opening the circuit once the threshold is met
    ///
    /// A failure while HalfOpen lands here too: the count is already past
    /// the threshold, so the circuit re-opens with the next timeout (doubled
    /// when exponential backoff is on).
    pub fn record_failure(&self) {
        let mut state = self.state.lock().expect("breaker mutex poisoned");
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);

        if state.consecutive_failures < self.config.failure_threshold {
            return;
        }

        let timeout = if self.config.use_exponential_backoff {
            let scaled = self
                .config
                .reset_timeout
                .saturating_mul(state.failure_multiplier);
            let timeout = scaled.min(self.config.max_reset_timeout);
            state.failure_multiplier = state.failure_multiplier.saturating_mul(2);
            timeout
        } else {
            self.config.reset_timeout
        };

        state.open_until = Some(self.clock.now() + timeout);
        warn!(
            circuit_breaker = %self.name,
            consecutive_failures = state.consecutive_failures,
            timeout_secs = timeout.as_secs(),
            "Circuit opened"
        );
    }

    /// Consistent snapshot of the breaker for status reporting
    pub fn snapshot(&self) -> BreakerSnapshot {
        let state = self.state.lock().expect("breaker mutex poisoned");
        let status = match state.open_until {
            None => CircuitStatus::Closed,
            Some(open_until) => {
                if self.clock.now() >= open_until {
                    CircuitStatus::HalfOpen
                } else {
                    CircuitStatus::Open
                }
            }
        };
        BreakerSnapshot {
            status,
            open_until: state.open_until,
            consecutive_failures: state.consecutive_failures,
        }
    }
}

fn default_failure_threshold() -> u32 {
    BREAKER_FAILURE_THRESHOLD
}

fn default_reset_timeout() -> Duration {
    BREAKER_RESET_TIMEOUT
}

fn default_max_reset_timeout() -> Duration {
    BREAKER_MAX_RESET_TIMEOUT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::VirtualClock;

    fn breaker(config: CircuitBreakerConfig) -> (CircuitBreaker, Arc<VirtualClock>) {
        let clock = Arc::new(VirtualClock::new());
        let cb = CircuitBreaker::new("test", config, clock.clone());
        (cb, clock)
    }

    #[test]
    fn starts_closed() {
        let (cb, _clock) = breaker(CircuitBreakerConfig::default());
        assert_eq!(cb.status(), CircuitStatus::Closed);
        assert_eq!(cb.snapshot().consecutive_failures, 0);
    }

    #[test]
    fn stays_closed_below_threshold() {
        let (cb, _clock) = breaker(CircuitBreakerConfig::new(3, Duration::from_secs(60)));
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.status(), CircuitStatus::Closed);
        assert_eq!(cb.snapshot().consecutive_failures, 2);
    }

    #[test]
    fn opens_at_threshold() {
        let (cb, _clock) = breaker(CircuitBreakerConfig::new(2, Duration::from_secs(60)));
        cb.record_failure();
        assert_eq!(cb.status(), CircuitStatus::Closed);
        cb.record_failure();
        assert_eq!(cb.status(), CircuitStatus::Open);
    }

    #[test]
    fn half_opens_exactly_at_deadline() {
        let (cb, clock) = breaker(CircuitBreakerConfig::new(1, Duration::from_secs(300)));
        cb.record_failure();
        assert_eq!(cb.status(), CircuitStatus::Open);

        clock.advance(Duration::from_secs(299));
        assert_eq!(cb.status(), CircuitStatus::Open);

        clock.advance(Duration::from_secs(1));
        assert_eq!(cb.status(), CircuitStatus::HalfOpen);
    }

    #[test]
    fn success_closes_and_resets_counters() {
        let (cb, clock) = breaker(CircuitBreakerConfig::new(1, Duration::from_secs(60)));
        cb.record_failure();
        clock.advance(Duration::from_secs(61));
        assert_eq!(cb.status(), CircuitStatus::HalfOpen);

        cb.record_success();
        let snapshot = cb.snapshot();
        assert_eq!(snapshot.status, CircuitStatus::Closed);
        assert_eq!(snapshot.consecutive_failures, 0);
        assert!(snapshot.open_until.is_none());
    }

    #[test]
    fn failure_in_half_open_reopens() {
        let (cb, clock) = breaker(CircuitBreakerConfig::new(1, Duration::from_secs(60)));
        cb.record_failure();
        clock.advance(Duration::from_secs(61));
        assert_eq!(cb.status(), CircuitStatus::HalfOpen);

        cb.record_failure();
        assert_eq!(cb.status(), CircuitStatus::Open);
        assert_eq!(cb.snapshot().consecutive_failures, 2);
    }

    #[test]
    fn exponential_backoff_doubles_and_caps() {
        let config = CircuitBreakerConfig::new(1, Duration::from_secs(60))
            .with_exponential_backoff(Duration::from_secs(150));
        let (cb, clock) = breaker(config);

        // First open: 60s
        let t0 = clock.now();
        cb.record_failure();
        assert_eq!(cb.snapshot().open_until, Some(t0 + Duration::from_secs(60)));

        // Second open: 120s
        clock.advance(Duration::from_secs(61));
        let t1 = clock.now();
        cb.record_failure();
        assert_eq!(
            cb.snapshot().open_until,
            Some(t1 + Duration::from_secs(120))
        );

        // Third open: would be 240s, capped at 150s
        clock.advance(Duration::from_secs(121));
        let t2 = clock.now();
        cb.record_failure();
        assert_eq!(
            cb.snapshot().open_until,
            Some(t2 + Duration::from_secs(150))
        );
    }

    #[test]
    fn success_resets_backoff_multiplier() {
        let config = CircuitBreakerConfig::new(1, Duration::from_secs(60))
            .with_exponential_backoff(Duration::from_secs(3600));
        let (cb, clock) = breaker(config);

        cb.record_failure();
        clock.advance(Duration::from_secs(61));
        cb.record_success();

        // After a success the next open uses the base timeout again
        let t = clock.now();
        cb.record_failure();
        assert_eq!(cb.snapshot().open_until, Some(t + Duration::from_secs(60)));
    }

    #[test]
    fn disabled_sentinel_never_opens() {
        let (cb, _clock) = breaker(CircuitBreakerConfig::effectively_disabled());
        for _ in 0..10_000 {
            cb.record_failure();
        }
        assert_eq!(cb.status(), CircuitStatus::Closed);
    }
}
