//! Retry/backoff decisions and operational hook contracts.
//!
//! ```rust
//! use std::time::Duration;
//! use pprovider::{AbortReason, ProviderError, RetryDecision, RetryPolicy};
//!
//! let policy = RetryPolicy::default().without_jitter();
//! let transient = ProviderError::unavailable("throttled");
//!
//! assert_eq!(
//!     policy.decide(1, &transient),
//!     RetryDecision::Retry { delay: Duration::from_secs(1) }
//! );
//! assert!(matches!(
//!     policy.decide(5, &transient),
//!     RetryDecision::Abort(AbortReason::AttemptsExhausted { attempts: 5 })
//! ));
//! ```

use std::time::Duration;

use rand::Rng;

use crate::{ProviderError, ProviderId};

pub const MAX_RETRY_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
    /// Upper bound (exclusive) of the uniform jitter added to every delay.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRY_ATTEMPTS,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(32),
            backoff_multiplier: 2.0,
            max_jitter: Duration::from_secs(1),
        }
    }
}

/// Outcome of a failed attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryDecision {
    Retry { delay: Duration },
    Abort(AbortReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    InputTooLarge,
    AttemptsExhausted { attempts: u32 },
}

impl AbortReason {
    /// Terminal text shown to the user when the turn is abandoned.
    pub fn status_line(&self) -> &'static str {
        match self {
            Self::InputTooLarge => "The input is too long for the requested model. \n\n",
            Self::AttemptsExhausted { .. } => "Please try again later.\n\n",
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    pub fn with_max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    pub fn without_jitter(self) -> Self {
        self.with_max_jitter(Duration::ZERO)
    }

    /// Decides what to do after `attempt` (1-based) failed with `error`.
    ///
    /// The action class depends only on `attempt` and the error class; the
    /// delay carries fresh jitter on every call. The policy never sleeps.
    pub fn decide(&self, attempt: u32, error: &ProviderError) -> RetryDecision {
        if error.is_input_too_large() {
            return RetryDecision::Abort(AbortReason::InputTooLarge);
        }

        if !self.should_retry(attempt, error) {
            return RetryDecision::Abort(AbortReason::AttemptsExhausted { attempts: attempt });
        }

        RetryDecision::Retry {
            delay: self
                .backoff_for_attempt(attempt)
                .saturating_add(self.sample_jitter()),
        }
    }

    pub fn should_retry(&self, attempt: u32, error: &ProviderError) -> bool {
        !error.is_input_too_large() && attempt < self.max_attempts
    }

    /// Capped exponential delay before jitter: `min(initial * multiplier^(attempt-1), max)`.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let unbounded = self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::try_from_secs_f64(unbounded.min(self.max_backoff.as_secs_f64()))
            .unwrap_or(self.max_backoff)
    }

    pub fn retry_status_line(&self, attempt: u32) -> String {
        format!("Retrying... (Attempt {attempt}/{})\n\n", self.max_attempts)
    }

    fn sample_jitter(&self) -> Duration {
        if self.max_jitter.is_zero() {
            return Duration::ZERO;
        }

        let mut rng = rand::thread_rng();
        self.max_jitter.mul_f64(rng.gen_range(0.0..1.0))
    }
}

pub trait ProviderOperationHooks: Send + Sync {
    fn on_attempt_start(&self, _provider: ProviderId, _operation: &str, _attempt: u32) {}

    fn on_retry_scheduled(
        &self,
        _provider: ProviderId,
        _operation: &str,
        _attempt: u32,
        _delay: Duration,
        _error: &ProviderError,
    ) {
    }

    fn on_success(&self, _provider: ProviderId, _operation: &str, _attempts: u32) {}

    fn on_failure(
        &self,
        _provider: ProviderId,
        _operation: &str,
        _attempts: u32,
        _error: &ProviderError,
    ) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopOperationHooks;

impl ProviderOperationHooks for NoopOperationHooks {}
