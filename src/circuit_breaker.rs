//! # Circuit Breaker Module
//!
//! This module implements the circuit breaker pattern for generative model calls.
//! After repeated failures the breaker opens and calls fail fast until the reset
//! timeout has elapsed.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::RecoveryConfig;

#[derive(Debug, Default)]
struct BreakerState {
    failure_count: u32,
    last_failure: Option<Instant>,
}

/// Circuit breaker guarding the model endpoint
///
/// # State Machine
///
/// - **Closed**: normal operation, calls pass through
/// - **Open**: failure threshold reached, calls fail fast
/// - **Half-Open**: reset timeout elapsed, the next call is let through to probe recovery
///
/// # Configuration
///
/// Uses `RecoveryConfig` for:
/// - `circuit_breaker_threshold`: failures before opening
/// - `circuit_breaker_reset_secs`: time before a probe call is allowed
#[derive(Debug)]
pub struct CircuitBreaker {
    state: Mutex<BreakerState>,
    threshold: u32,
    reset_after: Duration,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given configuration
    ///
    /// # Examples
    ///
    /// ```rust
    /// use easycook::config::RecoveryConfig;
    /// use easycook::circuit_breaker::CircuitBreaker;
    ///
    /// let breaker = CircuitBreaker::new(&RecoveryConfig::default());
    /// assert!(!breaker.is_open());
    /// ```
    pub fn new(config: &RecoveryConfig) -> Self {
        Self {
            state: Mutex::new(BreakerState::default()),
            threshold: config.circuit_breaker_threshold.max(1),
            reset_after: Duration::from_secs(config.circuit_breaker_reset_secs),
        }
    }

    /// Check if the circuit is open and calls should be refused
    ///
    /// Once the reset timeout has elapsed the failure count is cleared, so the next
    /// call acts as a half-open probe.
    pub fn is_open(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if state.failure_count < self.threshold {
            return false;
        }

        match state.last_failure {
            Some(last) if last.elapsed() < self.reset_after => true,
            _ => {
                state.failure_count = 0;
                state.last_failure = None;
                false
            }
        }
    }

    /// Record a failed call
    pub fn record_failure(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.failure_count = state.failure_count.saturating_add(1);
        state.last_failure = Some(Instant::now());
    }

    /// Record a successful call, closing the circuit
    pub fn record_success(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.failure_count = 0;
        state.last_failure = None;
    }

    pub fn failure_count(&self) -> u32 {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .failure_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(threshold: u32, reset_secs: u64) -> RecoveryConfig {
        RecoveryConfig {
            circuit_breaker_threshold: threshold,
            circuit_breaker_reset_secs: reset_secs,
            ..Default::default()
        }
    }

    #[test]
    fn test_opens_after_threshold() {
        let breaker = CircuitBreaker::new(&config(2, 60));
        breaker.record_failure();
        assert!(!breaker.is_open());
        breaker.record_failure();
        assert!(breaker.is_open());
    }

    #[test]
    fn test_success_resets() {
        let breaker = CircuitBreaker::new(&config(1, 60));
        breaker.record_failure();
        assert!(breaker.is_open());
        breaker.record_success();
        assert!(!breaker.is_open());
        assert_eq!(breaker.failure_count(), 0);
    }

    #[test]
    fn test_half_open_after_reset_timeout() {
        let breaker = CircuitBreaker::new(&config(1, 0));
        breaker.record_failure();
        // A zero reset timeout lets the next call probe immediately
        assert!(!breaker.is_open());
        assert_eq!(breaker.failure_count(), 0);
    }
}
