//! Warm-up countdown between calibration and session start.
//!
//! A strictly timed phase sequence, a pure function of elapsed time
//! since calibration with no branching on smile state.

use serde::{Deserialize, Serialize};

/// Warm-up display phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarmupPhase {
    GetReady,
    Three,
    Two,
    One,
    Smile,
    Done,
}

impl WarmupPhase {
    /// HUD label for the phase.
    pub fn label(self) -> &'static str {
        match self {
            WarmupPhase::GetReady => "GET READY!",
            WarmupPhase::Three => "3",
            WarmupPhase::Two => "2",
            WarmupPhase::One => "1",
            WarmupPhase::Smile => "SMILE!",
            WarmupPhase::Done => "",
        }
    }
}

/// Warm-up sequence timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warmup {
    started_at: f64,
    duration: f64,
    hold: f64,
}

impl Warmup {
    pub fn start(now: f64, duration: f64, hold: f64) -> Self {
        Self {
            started_at: now,
            duration,
            hold,
        }
    }

    /// Phase boundaries: `[0,1)` get-ready, then one second per digit,
    /// then "SMILE!" until `duration + hold` has elapsed. The end bound
    /// wins over the digit cascade, so a short warm-up finishes on
    /// schedule whatever label would be showing.
    pub fn phase(&self, now: f64) -> WarmupPhase {
        let elapsed = now - self.started_at;
        if elapsed >= self.duration + self.hold {
            WarmupPhase::Done
        } else if elapsed < 1.0 {
            WarmupPhase::GetReady
        } else if elapsed < 2.0 {
            WarmupPhase::Three
        } else if elapsed < 3.0 {
            WarmupPhase::Two
        } else if elapsed < 4.0 {
            WarmupPhase::One
        } else {
            WarmupPhase::Smile
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_follow_elapsed_time() {
        let w = Warmup::start(100.0, 5.0, 1.0);
        assert_eq!(w.phase(100.0), WarmupPhase::GetReady);
        assert_eq!(w.phase(100.9), WarmupPhase::GetReady);
        assert_eq!(w.phase(101.0), WarmupPhase::Three);
        assert_eq!(w.phase(102.0), WarmupPhase::Two);
        assert_eq!(w.phase(103.0), WarmupPhase::One);
        assert_eq!(w.phase(104.0), WarmupPhase::Smile);
        assert_eq!(w.phase(105.9), WarmupPhase::Smile);
        assert_eq!(w.phase(106.0), WarmupPhase::Done);
    }

    #[test]
    fn hold_extends_the_smile_phase() {
        let w = Warmup::start(0.0, 5.0, 2.5);
        assert_eq!(w.phase(7.4), WarmupPhase::Smile);
        assert_eq!(w.phase(7.5), WarmupPhase::Done);
    }

    #[test]
    fn short_warmup_ends_on_schedule() {
        // duration + hold shorter than the digit cascade still finishes
        // at duration + hold.
        let w = Warmup::start(0.0, 2.0, 0.5);
        assert_eq!(w.phase(2.4), WarmupPhase::Two);
        assert_eq!(w.phase(2.5), WarmupPhase::Done);
    }
}
