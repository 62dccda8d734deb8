//! Circuit breaker state machine tests
//!
//! All time-driven transitions are exercised through the virtual clock; no
//! test sleeps.

use std::sync::Arc;
use std::time::Duration;
use vox_relay::infrastructure::clock::VirtualClock;
use vox_relay::{CircuitBreaker, CircuitBreakerConfig, CircuitStatus, Clock};

fn breaker_with_clock(config: CircuitBreakerConfig) -> (CircuitBreaker, Arc<VirtualClock>) {
    let clock = Arc::new(VirtualClock::new());
    let breaker = CircuitBreaker::new("test-provider", config, clock.clone());
    (breaker, clock)
}

#[test]
fn breaker_opens_at_threshold_not_before() {
    let (breaker, _clock) = breaker_with_clock(CircuitBreakerConfig::new(
        3,
        Duration::from_secs(60),
    ));

    breaker.record_failure();
    breaker.record_failure();
    assert_eq!(breaker.status(), CircuitStatus::Closed);

    breaker.record_failure();
    assert_eq!(breaker.status(), CircuitStatus::Open);
}

#[test]
fn open_until_boundary_is_half_open() {
    let (breaker, clock) = breaker_with_clock(CircuitBreakerConfig::new(
        1,
        Duration::from_secs(300),
    ));
    breaker.record_failure();

    // Strictly before the deadline: Open
    clock.advance(Duration::from_millis(299_999));
    assert_eq!(breaker.status(), CircuitStatus::Open);

    // At the deadline: HalfOpen
    clock.advance(Duration::from_millis(1));
    assert_eq!(breaker.status(), CircuitStatus::HalfOpen);

    // Any later time: still HalfOpen
    clock.advance(Duration::from_secs(3600));
    assert_eq!(breaker.status(), CircuitStatus::HalfOpen);
}

#[test]
fn half_open_success_closes_and_resets() {
    let (breaker, clock) = breaker_with_clock(CircuitBreakerConfig::new(
        2,
        Duration::from_secs(60),
    ));
    breaker.record_failure();
    breaker.record_failure();
    clock.advance(Duration::from_secs(61));
    assert_eq!(breaker.status(), CircuitStatus::HalfOpen);

    breaker.record_success();
    let snapshot = breaker.snapshot();
    assert_eq!(snapshot.status, CircuitStatus::Closed);
    assert_eq!(snapshot.consecutive_failures, 0);
    assert!(snapshot.open_until.is_none());
}

#[test]
fn half_open_failure_reopens() {
    let (breaker, clock) = breaker_with_clock(CircuitBreakerConfig::new(
        2,
        Duration::from_secs(60),
    ));
    breaker.record_failure();
    breaker.record_failure();
    clock.advance(Duration::from_secs(61));
    assert_eq!(breaker.status(), CircuitStatus::HalfOpen);

    let reopened_at = clock.now();
    breaker.record_failure();
    let snapshot = breaker.snapshot();
    assert_eq!(snapshot.status, CircuitStatus::Open);
    assert_eq!(snapshot.consecutive_failures, 3);
    assert_eq!(
        snapshot.open_until,
        Some(reopened_at + Duration::from_secs(60))
    );
}

#[test]
fn exponential_backoff_scenario() {
    // threshold=2, reset=1m, exponential, max=1h
    let config = CircuitBreakerConfig::new(2, Duration::from_secs(60))
        .with_exponential_backoff(Duration::from_secs(3600));
    let (breaker, clock) = breaker_with_clock(config);

    // First cycle: two failures open the circuit for 1m
    let t1 = clock.now();
    breaker.record_failure();
    breaker.record_failure();
    assert_eq!(
        breaker.snapshot().open_until,
        Some(t1 + Duration::from_secs(60))
    );

    // Second cycle: re-failure while half-open opens for 2m
    clock.advance(Duration::from_secs(61));
    let t2 = clock.now();
    breaker.record_failure();
    assert_eq!(
        breaker.snapshot().open_until,
        Some(t2 + Duration::from_secs(120))
    );

    // Third cycle: 4m
    clock.advance(Duration::from_secs(121));
    let t3 = clock.now();
    breaker.record_failure();
    assert_eq!(
        breaker.snapshot().open_until,
        Some(t3 + Duration::from_secs(240))
    );
}

#[test]
fn exponential_backoff_caps_at_max() {
    let config = CircuitBreakerConfig::new(1, Duration::from_secs(60))
        .with_exponential_backoff(Duration::from_secs(200));
    let (breaker, clock) = breaker_with_clock(config);

    // 60s, 120s, then capped at 200s instead of 240s
    for expected in [60u64, 120, 200, 200] {
        let opened_at = clock.now();
        breaker.record_failure();
        assert_eq!(
            breaker.snapshot().open_until,
            Some(opened_at + Duration::from_secs(expected))
        );
        clock.advance(Duration::from_secs(expected) + Duration::from_secs(1));
        assert_eq!(breaker.status(), CircuitStatus::HalfOpen);
    }
}

#[test]
fn disabled_sentinel_breaker_never_opens() {
    let (breaker, _clock) = breaker_with_clock(CircuitBreakerConfig::effectively_disabled());
    for _ in 0..1000 {
        breaker.record_failure();
    }
    assert_eq!(breaker.status(), CircuitStatus::Closed);
}

#[test]
fn status_display_formatting() {
    assert_eq!(CircuitStatus::Closed.to_string(), "closed");
    assert_eq!(CircuitStatus::HalfOpen.to_string(), "half-open");
    assert_eq!(CircuitStatus::Open.to_string(), "open");
}
