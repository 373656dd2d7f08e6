//! Retry policy and the per-call attempt state machine

use rand::Rng;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::constants::retry;

/// How a failed attempt is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// 429
    RateLimited,
    /// 5xx, timeout or connection failure
    UpstreamFault,
    /// Any other 4xx
    Validation,
}

impl FailureClass {
    /// Classifies a non-success HTTP status. Returns `None` for 2xx/3xx.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            429 => Some(FailureClass::RateLimited),
            400..=499 => Some(FailureClass::Validation),
            500..=599 => Some(FailureClass::UpstreamFault),
            _ => None,
        }
    }

    pub fn is_retryable(self) -> bool {
        !matches!(self, FailureClass::Validation)
    }
}

/// Backoff parameters shared by every call of a client.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Fraction of each delay randomised in either direction
    pub jitter: f64,
    pub max_retry_after: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: retry::MAX_ATTEMPTS,
            base_delay: Duration::from_millis(retry::BASE_DELAY_MS),
            max_delay: Duration::from_millis(retry::MAX_DELAY_MS),
            jitter: retry::JITTER_FRACTION,
            max_retry_after: Duration::from_secs(retry::MAX_RETRY_AFTER_SECONDS),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms.max(config.base_delay_ms)),
            ..Self::default()
        }
    }

    /// Millisecond delays with no jitter, for tests against a mock upstream.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            jitter: 0.0,
            max_retry_after: Duration::from_millis(4),
        }
    }

    /// Delay before attempt `failed_attempt + 1`: base * 2^(failed_attempt - 1), capped.
    pub fn backoff(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(16);
        let raw = self.base_delay.saturating_mul(1u32 << exponent);
        let capped = raw.min(self.max_delay);
        if self.jitter <= 0.0 {
            return capped;
        }
        let factor = 1.0 + rand::rng().random_range(-self.jitter..=self.jitter);
        capped.mul_f64(factor.max(0.0))
    }

    /// Server-requested delay wins over computed backoff, within `max_retry_after`.
    pub fn delay_for(&self, failed_attempt: u32, retry_after: Option<Duration>) -> Duration {
        match retry_after {
            Some(requested) => requested.min(self.max_retry_after),
            None => self.backoff(failed_attempt),
        }
    }
}

/// Where a call currently is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttemptState {
    Idle,
    Attempting { attempt: u32 },
    Retrying {
        attempt: u32,
        class: FailureClass,
        delay: Duration,
    },
    Success { attempts: u32 },
    Failed {
        attempts: u32,
        class: FailureClass,
    },
}

/// Drives one call through Idle → Attempting → {Success, Retrying, Failed}.
#[derive(Debug)]
pub struct RetryMachine<'a> {
    policy: &'a RetryPolicy,
    state: AttemptState,
}

impl<'a> RetryMachine<'a> {
    pub fn new(policy: &'a RetryPolicy) -> Self {
        Self {
            policy,
            state: AttemptState::Idle,
        }
    }

    pub fn state(&self) -> AttemptState {
        self.state
    }

    /// Moves to the next attempt. Returns its 1-based number.
    pub fn begin_attempt(&mut self) -> u32 {
        let attempt = match self.state {
            AttemptState::Idle => 1,
            AttemptState::Retrying { attempt, .. } => attempt + 1,
            AttemptState::Attempting { attempt } => attempt,
            AttemptState::Success { attempts } | AttemptState::Failed { attempts, .. } => attempts,
        };
        self.state = AttemptState::Attempting { attempt };
        attempt
    }

    pub fn succeed(&mut self) -> AttemptState {
        let attempts = self.current_attempt();
        self.state = AttemptState::Success { attempts };
        self.state
    }

    /// Records a failed attempt and decides whether another one follows.
    pub fn fail(&mut self, class: FailureClass, retry_after: Option<Duration>) -> AttemptState {
        let attempt = self.current_attempt();
        self.state = if class.is_retryable() && attempt < self.policy.max_attempts {
            AttemptState::Retrying {
                attempt,
                class,
                delay: self.policy.delay_for(attempt, retry_after),
            }
        } else {
            AttemptState::Failed {
                attempts: attempt,
                class,
            }
        };
        self.state
    }

    fn current_attempt(&self) -> u32 {
        match self.state {
            AttemptState::Idle => 0,
            AttemptState::Attempting { attempt } | AttemptState::Retrying { attempt, .. } => {
                attempt
            }
            AttemptState::Success { attempts } | AttemptState::Failed { attempts, .. } => attempts,
        }
    }
}
