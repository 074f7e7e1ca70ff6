use serde::{Deserialize, Serialize};

/// Default number of upload attempts per batch
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Upload attempt budget, shared by both verification passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryState {
    pub attempts: u32,
    pub ceiling: u32,
}

impl RetryState {
    /// A ceiling of zero is treated as one attempt
    pub fn new(ceiling: u32) -> Self {
        Self {
            attempts: 0,
            ceiling: ceiling.max(1),
        }
    }

    /// Returns the state with one more attempt consumed
    pub fn record_attempt(self) -> Self {
        Self {
            attempts: self.attempts + 1,
            ..self
        }
    }

    pub fn remaining(&self) -> u32 {
        self.ceiling.saturating_sub(self.attempts)
    }

    pub fn can_retry(&self) -> bool {
        self.attempts < self.ceiling
    }

    pub fn exhausted(&self) -> bool {
        !self.can_retry()
    }
}

impl Default for RetryState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}
