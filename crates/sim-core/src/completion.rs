//! Transmit-completion policies.
//!
//! A real transmitter takes wall-clock time to shift a frame out; the
//! simulator compresses that into a policy consulted on status polls while
//! a transmit is in flight. The default answers randomly so busy-wait
//! loops in firmware get exercised for more than one iteration.

use crate::config::DEFAULT_COMPLETION_PERCENT;

/// Decides whether the in-flight transmit finishes at this status poll.
pub trait TxCompletion: Send + Sync {
    /// Returns `true` when the pending transmit should be marked complete.
    fn should_complete(&self) -> bool;
}

/// Completes an in-flight transmit with a fixed percent chance per poll.
#[derive(Debug, Clone, Copy)]
pub struct RandomCompletion {
    percent: u8,
}

impl RandomCompletion {
    /// Creates a policy completing with `percent` chance per poll, clamped
    /// to 100.
    #[must_use]
    pub const fn new(percent: u8) -> Self {
        let percent = if percent > 100 { 100 } else { percent };
        Self { percent }
    }
}

impl Default for RandomCompletion {
    fn default() -> Self {
        Self::new(DEFAULT_COMPLETION_PERCENT)
    }
}

impl TxCompletion for RandomCompletion {
    fn should_complete(&self) -> bool {
        rand::random_range(0..100u8) < self.percent
    }
}

/// Deterministic policy for tests and scripted runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedCompletion(pub bool);

impl TxCompletion for FixedCompletion {
    fn should_complete(&self) -> bool {
        self.0
    }
}
