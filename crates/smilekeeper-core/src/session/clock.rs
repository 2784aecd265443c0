//! Session countdown with asymmetric penalty/recovery.
//!
//! The countdown elapses while the user smiles and grows while they do
//! not, so time pressure compounds for failing to smile. Reaching zero
//! is a display-level terminal condition only; actuation logic keeps
//! running until the surrounding application ends the session.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClock {
    /// Seconds left; grows without ceiling, floored at zero.
    remaining: f64,
    total: f64,
    /// Growth multiplier while not smiling; never below 1.0.
    penalty_rate: f64,
}

impl SessionClock {
    pub fn new(total_secs: f64, penalty_rate: f64) -> Self {
        Self {
            remaining: total_secs,
            total: total_secs,
            penalty_rate: penalty_rate.max(1.0),
        }
    }

    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn expired(&self) -> bool {
        self.remaining <= 0.0
    }

    /// Advance by `dt` wall seconds. Smiling burns time down; not
    /// smiling grows it by `penalty_rate * dt`. Once at zero the clock
    /// stays there.
    pub fn advance(&mut self, dt: f64, smiling: bool) {
        if self.remaining <= 0.0 {
            return;
        }
        if smiling {
            self.remaining = (self.remaining - dt).max(0.0);
        } else {
            self.remaining += self.penalty_rate * dt;
        }
    }
}
