//! HUD display-mode roulette and command history.
//!
//! While the user smiles, the HUD alternates unpredictably between the
//! countdown, nothing at all, and a motivational message. The roulette
//! re-rolls on a randomized 3-8 s cadence with weights 0.6/0.2/0.2.
//! The command history is the small ring of recent wire commands shown
//! by the debug overlay.

use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};

const SWITCH_MIN_SECS: f64 = 3.0;
const SWITCH_MAX_SECS: f64 = 8.0;

/// What the smiling-state HUD is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Countdown,
    Hidden,
    Message,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayRoulette {
    mode: DisplayMode,
    messages: Vec<String>,
    current_message: String,
    next_switch_at: f64,
}

impl DisplayRoulette {
    pub fn new<R: Rng>(messages: Vec<String>, now: f64, rng: &mut R) -> Self {
        let current_message = pick_message(&messages, rng);
        Self {
            mode: DisplayMode::Countdown,
            messages,
            current_message,
            next_switch_at: now + rng.gen_range(SWITCH_MIN_SECS..SWITCH_MAX_SECS),
        }
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn current_message(&self) -> &str {
        &self.current_message
    }

    /// Re-roll the mode when due. Returns the new mode if it switched.
    pub fn advance<R: Rng>(&mut self, now: f64, rng: &mut R) -> Option<DisplayMode> {
        if now < self.next_switch_at {
            return None;
        }
        // Weights 0.6 countdown / 0.2 hidden / 0.2 message.
        let roll: f64 = rng.gen_range(0.0..1.0);
        self.mode = if roll < 0.6 {
            DisplayMode::Countdown
        } else if roll < 0.8 {
            DisplayMode::Hidden
        } else {
            DisplayMode::Message
        };
        if self.mode == DisplayMode::Message {
            self.current_message = pick_message(&self.messages, rng);
        }
        self.next_switch_at = now + rng.gen_range(SWITCH_MIN_SECS..SWITCH_MAX_SECS);
        Some(self.mode)
    }
}

fn pick_message<R: Rng>(messages: &[String], rng: &mut R) -> String {
    if messages.is_empty() {
        return String::new();
    }
    messages[rng.gen_range(0..messages.len())].clone()
}

/// Fixed-capacity ring of recent wire commands for the debug overlay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandHistory {
    entries: VecDeque<String>,
    capacity: usize,
}

impl CommandHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, label: String) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(label);
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|s| s.as_str())
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Mcg128Xsl64;

    #[test]
    fn roulette_waits_for_switch_time() {
        let mut rng = Mcg128Xsl64::seed_from_u64(5);
        let mut r = DisplayRoulette::new(vec!["hi".into()], 0.0, &mut rng);
        assert!(r.advance(0.0, &mut rng).is_none());
        assert!(r.advance(8.0, &mut rng).is_some());
    }

    #[test]
    fn roulette_only_emits_known_modes() {
        let mut rng = Mcg128Xsl64::seed_from_u64(5);
        let mut r = DisplayRoulette::new(vec!["a".into(), "b".into()], 0.0, &mut rng);
        let mut now = 0.0;
        for _ in 0..100 {
            now += 10.0;
            let mode = r.advance(now, &mut rng).unwrap();
            assert!(matches!(
                mode,
                DisplayMode::Countdown | DisplayMode::Hidden | DisplayMode::Message
            ));
        }
    }

    #[test]
    fn history_drops_oldest() {
        let mut h = CommandHistory::new(3);
        for label in ["A20", "B21", "A0", "B0"] {
            h.push(label.into());
        }
        let entries: Vec<_> = h.entries().collect();
        assert_eq!(entries, vec!["B21", "A0", "B0"]);
    }
}
