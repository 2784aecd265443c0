use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{Channel, DisplayMode, PulseKind};

/// Every externally visible state change in a session produces an Event.
/// The presentation layer polls the per-tick event list; it never reaches
/// into the session aggregate itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Baseline calibrated from the current smoothed ratio.
    BaselineSet {
        baseline: f64,
        at: DateTime<Utc>,
    },
    /// Warm-up finished; countdown and actuation logic are live.
    SessionStarted {
        at: DateTime<Utc>,
    },
    /// An "on" command was written to the actuator.
    PulseIssued {
        channel: Channel,
        intensity: u32,
        kind: PulseKind,
        at: DateTime<Utc>,
    },
    /// The paired "off" (zero intensity) command was written.
    PulseCleared {
        channel: Channel,
        at: DateTime<Utc>,
    },
    /// A transport write failed; the pulse is treated as never issued.
    SendFailed {
        channel: Channel,
        message: String,
        at: DateTime<Utc>,
    },
    /// Challenge warning window opened (visual only, no actuation).
    ChallengeWarning {
        duration_secs: f64,
        at: DateTime<Utc>,
    },
    /// Challenge window is live; the user must hold the smile.
    ChallengeStarted {
        duration_secs: f64,
        at: DateTime<Utc>,
    },
    /// User stopped smiling mid-challenge; a super punishment fired.
    ChallengeFailed {
        at: DateTime<Utc>,
    },
    /// Challenge window elapsed with the smile held.
    ChallengeSurvived {
        at: DateTime<Utc>,
    },
    /// HUD display mode re-rolled.
    DisplayModeChanged {
        mode: DisplayMode,
        at: DateTime<Utc>,
    },
    /// Session ended; all active channels were flushed off.
    SessionEnded {
        at: DateTime<Utc>,
    },
}
