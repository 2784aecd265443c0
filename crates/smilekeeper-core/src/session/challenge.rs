//! Super-challenge escalation state machine.
//!
//! A cyclic three-phase machine layered on the smiling signal:
//!
//! ```text
//! Idle -> Warning -> Active -> Idle
//! ```
//!
//! Idle waits out a randomized cooldown, Warning is a fixed visual-only
//! window, Active demands a held smile for a randomized duration.
//! Dropping the smile mid-Active is the failure path: the controller
//! fires one super punishment and the machine snaps back to Idle with a
//! fresh cooldown. At most one cycle is ever in flight.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::ChallengeConfig;

/// Challenge phase with its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "lowercase")]
pub enum ChallengePhase {
    Idle { next_warning_at: f64 },
    Warning { until: f64 },
    Active { until: f64 },
}

/// What the scheduler decided this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChallengeStep {
    None,
    /// Warning window opened (visual only).
    WarningStarted { duration: f64 },
    /// Challenge window went live.
    ChallengeStarted { duration: f64 },
    /// Window elapsed with the smile held.
    Survived,
    /// Smile dropped mid-window; the caller owes one super punishment.
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeScheduler {
    cfg: ChallengeConfig,
    phase: ChallengePhase,
}

impl ChallengeScheduler {
    /// Start idle with the first warning a full cooldown away.
    pub fn new<R: Rng>(cfg: ChallengeConfig, now: f64, rng: &mut R) -> Self {
        let next_warning_at = now + cooldown(&cfg, rng);
        Self {
            cfg,
            phase: ChallengePhase::Idle { next_warning_at },
        }
    }

    pub fn phase(&self) -> ChallengePhase {
        self.phase
    }

    /// Whether the challenge window is live (gates ordinary punishment).
    pub fn is_active(&self) -> bool {
        matches!(self.phase, ChallengePhase::Active { .. })
    }

    /// Advance the machine one tick.
    ///
    /// `can_punish` reflects whether the actuator is reachable; without
    /// it the failure path is deferred, matching the retry policy for
    /// an unreachable transport (the window simply runs to expiry).
    pub fn advance<R: Rng>(
        &mut self,
        now: f64,
        smiling: bool,
        can_punish: bool,
        rng: &mut R,
    ) -> ChallengeStep {
        match self.phase {
            ChallengePhase::Warning { until } if now >= until => {
                let duration =
                    rng.gen_range(self.cfg.duration_min_secs..=self.cfg.duration_max_secs);
                self.phase = ChallengePhase::Active { until: now + duration };
                return ChallengeStep::ChallengeStarted { duration };
            }
            ChallengePhase::Idle { next_warning_at } if now >= next_warning_at => {
                self.phase = ChallengePhase::Warning {
                    until: now + self.cfg.warning_secs,
                };
                return ChallengeStep::WarningStarted {
                    duration: self.cfg.warning_secs,
                };
            }
            _ => {}
        }

        if let ChallengePhase::Active { until } = self.phase {
            if now >= until {
                self.go_idle(now, rng);
                return ChallengeStep::Survived;
            }
            if !smiling && can_punish {
                self.go_idle(now, rng);
                return ChallengeStep::Failed;
            }
        }

        ChallengeStep::None
    }

    fn go_idle<R: Rng>(&mut self, now: f64, rng: &mut R) {
        self.phase = ChallengePhase::Idle {
            next_warning_at: now + cooldown(&self.cfg, rng),
        };
    }
}

fn cooldown<R: Rng>(cfg: &ChallengeConfig, rng: &mut R) -> f64 {
    rng.gen_range(cfg.cooldown_min_secs..=cfg.cooldown_max_secs)
}
