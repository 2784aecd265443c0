//! Tease pulse scheduler.
//!
//! Fires low-intensity pulses at randomized intervals, only while the
//! user is smiling. Teases never overlap a punishment pulse, and a
//! tease "off" never clears a channel a punishment pulse still owns.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::channel::Channel;
use crate::config::TeaseConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeaseScheduler {
    cfg: TeaseConfig,
    next_fire_at: f64,
    /// When the pending "off" is due; 0 when nothing is active.
    active_until: f64,
    channels: Vec<Channel>,
}

impl TeaseScheduler {
    pub fn new<R: Rng>(cfg: TeaseConfig, now: f64, rng: &mut R) -> Self {
        let next_fire_at = now + interval(&cfg, rng);
        Self {
            cfg,
            next_fire_at,
            active_until: 0.0,
            channels: Vec::new(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.cfg.enabled
    }

    pub fn is_active(&self, now: f64) -> bool {
        self.active_until > now
    }

    /// Ready to fire: due, and no tease pulse of its own still active.
    /// The caller additionally gates on smiling state and on no
    /// punishment pulse being active.
    pub fn ready(&self, now: f64) -> bool {
        self.active_until <= now && now >= self.next_fire_at
    }

    /// Record a successful tease "on" for the given channels. Channels
    /// from an earlier tease still owed their "off" (a wedged device at
    /// expiry) stay tracked under the new deadline.
    pub fn arm(&mut self, now: f64, channels: Vec<Channel>) {
        self.active_until = now + self.cfg.duration_secs;
        for channel in channels {
            if !self.channels.contains(&channel) {
                self.channels.push(channel);
            }
        }
    }

    /// Schedule the next fire time. Called after every fire attempt,
    /// successful or not, so a failed write waits a full interval too.
    pub fn reschedule<R: Rng>(&mut self, now: f64, rng: &mut R) {
        self.next_fire_at = now + interval(&self.cfg, rng);
    }

    pub fn off_due(&self, now: f64) -> bool {
        self.active_until > 0.0 && now >= self.active_until
    }

    pub fn pending(&self) -> &[Channel] {
        &self.channels
    }

    /// Mark one channel's "off" as delivered or superseded.
    pub fn clear_channel(&mut self, channel: Channel) {
        self.channels.retain(|&c| c != channel);
        if self.channels.is_empty() {
            self.active_until = 0.0;
        }
    }

    pub fn reset(&mut self) {
        self.active_until = 0.0;
        self.channels.clear();
    }
}

fn interval<R: Rng>(cfg: &TeaseConfig, rng: &mut R) -> f64 {
    rng.gen_range(cfg.interval_min_secs..=cfg.interval_max_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Mcg128Xsl64;

    fn cfg() -> TeaseConfig {
        TeaseConfig {
            enabled: true,
            interval_min_secs: 20.0,
            interval_max_secs: 45.0,
            duration_secs: 1.0,
        }
    }

    #[test]
    fn first_fire_waits_a_full_interval() {
        let mut rng = Mcg128Xsl64::seed_from_u64(3);
        let t = TeaseScheduler::new(cfg(), 0.0, &mut rng);
        assert!(!t.ready(19.9));
        assert!(t.ready(45.0));
        assert!((20.0..=45.0).contains(&t.next_fire_at));
    }

    #[test]
    fn not_ready_while_own_pulse_active() {
        let mut rng = Mcg128Xsl64::seed_from_u64(3);
        let mut t = TeaseScheduler::new(cfg(), 0.0, &mut rng);
        t.next_fire_at = 10.0;
        t.arm(10.0, vec![Channel::A]);
        assert!(!t.ready(10.5));
        assert!(t.off_due(11.0));
    }

    #[test]
    fn refire_keeps_prior_pending_channels() {
        // Offs never got through, the window expired, and a re-fire only
        // reached A: B's off must still be owed.
        let mut rng = Mcg128Xsl64::seed_from_u64(3);
        let mut t = TeaseScheduler::new(cfg(), 0.0, &mut rng);
        t.arm(10.0, vec![Channel::A, Channel::B]);
        t.arm(50.0, vec![Channel::A]);
        let mut pending = t.pending().to_vec();
        pending.sort();
        assert_eq!(pending, vec![Channel::A, Channel::B]);
    }

    #[test]
    fn clearing_last_channel_disarms() {
        let mut rng = Mcg128Xsl64::seed_from_u64(3);
        let mut t = TeaseScheduler::new(cfg(), 0.0, &mut rng);
        t.arm(10.0, vec![Channel::A, Channel::B]);
        t.clear_channel(Channel::A);
        assert!(t.off_due(11.5));
        t.clear_channel(Channel::B);
        assert!(!t.off_due(11.5));
    }
}
