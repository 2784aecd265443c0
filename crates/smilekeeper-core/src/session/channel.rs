//! Actuator channels and the escalating punishment policy.
//!
//! Two independent channels (A and B) share one policy shape: intensity
//! draws escalate with a per-channel failure counter, and every "on"
//! pulse is tracked until its paired "off" fires exactly once.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::ChannelConfig;

/// Physical actuator channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Channel {
    A,
    B,
}

impl Channel {
    /// Wire letter for the serial protocol.
    pub fn letter(self) -> char {
        match self {
            Channel::A => 'A',
            Channel::B => 'B',
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Why a pulse was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PulseKind {
    /// Ordinary not-smiling punishment.
    Punish,
    /// Challenge-failure punishment with the flat extra offset.
    Super,
    /// Low-intensity pulse issued while smiling.
    Tease,
}

/// One actuator command. Intensity 0 means "off".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PulseCommand {
    pub channel: Channel,
    pub intensity: u32,
}

impl PulseCommand {
    pub fn on(channel: Channel, intensity: u32) -> Self {
        Self { channel, intensity }
    }

    pub fn off(channel: Channel) -> Self {
        Self {
            channel,
            intensity: 0,
        }
    }

    pub fn is_off(&self) -> bool {
        self.intensity == 0
    }

    /// Newline-terminated wire form, e.g. `A37\n`.
    pub fn wire(&self) -> String {
        format!("{}{}\n", self.channel.letter(), self.intensity)
    }

    /// Wire form without the terminator, for logs and the HUD history.
    pub fn label(&self) -> String {
        format!("{}{}", self.channel.letter(), self.intensity)
    }
}

/// Escalating intensity policy for one channel.
///
/// `fail_count` is monotonic for the session: escalation is permanent
/// once started, driving draws upward to the configured ceiling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelPolicy {
    channel: Channel,
    cfg: ChannelConfig,
    fail_count: u32,
}

impl ChannelPolicy {
    pub fn new(channel: Channel, cfg: ChannelConfig) -> Self {
        Self {
            channel,
            cfg,
            fail_count: 0,
        }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn enabled(&self) -> bool {
        self.cfg.enabled
    }

    pub fn fail_count(&self) -> u32 {
        self.fail_count
    }

    /// Floor intensity for this channel (also the tease intensity).
    pub fn min_intensity(&self) -> u32 {
        self.cfg.min
    }

    /// Escalated base: `min(max, min + fail_count * step)`.
    pub fn base(&self) -> u32 {
        self.cfg
            .max
            .min(self.cfg.min.saturating_add(self.fail_count.saturating_mul(self.cfg.step)))
    }

    /// Upper bound of the random band: `min(max, base + window)`.
    pub fn high(&self) -> u32 {
        self.cfg.max.min(self.base().saturating_add(self.cfg.window))
    }

    /// Ordinary punishment draw, uniform in `[base, high]` inclusive.
    ///
    /// Does not touch the failure counter; the caller records the
    /// failure only once the command actually reached the device.
    pub fn draw<R: Rng>(&self, rng: &mut R) -> u32 {
        let (base, high) = (self.base(), self.high());
        if base >= high {
            base
        } else {
            rng.gen_range(base..=high)
        }
    }

    /// Super punishment intensity: `min(max, high + extra)`.
    pub fn super_intensity(&self, extra: u32) -> u32 {
        self.cfg.max.min(self.high().saturating_add(extra))
    }

    /// Count one punishment pulse against this channel.
    pub fn record_failure(&mut self) {
        self.fail_count += 1;
    }
}

/// Tracks an in-flight pulse so its paired "off" fires exactly once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PulseTracker {
    /// Wall time of the last successful "on"; None before the first,
    /// so an untouched tracker passes the cooldown gate immediately.
    last_send_time: Option<f64>,
    /// When the pending "off" is due; 0 when nothing is active.
    active_until: f64,
    /// Channels turned on and still owed an "off".
    channels: Vec<Channel>,
}

impl PulseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a pulse is currently holding its channels on.
    pub fn is_active(&self, now: f64) -> bool {
        self.active_until > now
    }

    /// Whether the given channel is held on by the active pulse.
    pub fn owns(&self, channel: Channel, now: f64) -> bool {
        self.is_active(now) && self.channels.contains(&channel)
    }

    /// Cooldown gate for a fresh pulse: enough quiet time since the last
    /// send and nothing currently active. A tracker that has never sent
    /// is eligible right away.
    pub fn can_fire(&self, now: f64, timeout: f64) -> bool {
        self.active_until <= now
            && self.last_send_time.map_or(true, |t| now - t >= timeout)
    }

    /// Restart the cooldown clock without arming anything. Used when a
    /// pulse attempt failed entirely, so the retry waits for the next
    /// eligible window instead of firing again next tick.
    pub fn touch(&mut self, now: f64) {
        self.last_send_time = Some(now);
    }

    /// Record a successful "on" for the given channels. Channels from an
    /// earlier pulse that are still owed their "off" stay tracked; the
    /// new deadline covers the whole set.
    pub fn arm(&mut self, now: f64, duration: f64, channels: Vec<Channel>) {
        self.last_send_time = Some(now);
        self.active_until = now + duration;
        for channel in channels {
            if !self.channels.contains(&channel) {
                self.channels.push(channel);
            }
        }
    }

    /// Whether the pending "off" is due this tick.
    pub fn off_due(&self, now: f64) -> bool {
        self.active_until > 0.0 && now >= self.active_until
    }

    /// Channels still waiting for their "off".
    pub fn pending(&self) -> &[Channel] {
        &self.channels
    }

    /// Mark one channel's "off" as delivered (or superseded). Once the
    /// set drains, the tracker resets so the expiry check cannot fire a
    /// second time.
    pub fn clear_channel(&mut self, channel: Channel) {
        self.channels.retain(|&c| c != channel);
        if self.channels.is_empty() {
            self.active_until = 0.0;
        }
    }

    /// Drop all tracking (session teardown after a flush).
    pub fn reset(&mut self) {
        self.active_until = 0.0;
        self.channels.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Mcg128Xsl64;

    fn cfg(min: u32, max: u32, step: u32, window: u32) -> ChannelConfig {
        ChannelConfig {
            enabled: true,
            min,
            max,
            step,
            window,
        }
    }

    #[test]
    fn escalation_scenario_from_fail_count() {
        // min=20 max=90 step=2 window=5, three failures: base 26, high 31.
        let mut policy = ChannelPolicy::new(Channel::A, cfg(20, 90, 2, 5));
        for _ in 0..3 {
            policy.record_failure();
        }
        assert_eq!(policy.base(), 26);
        assert_eq!(policy.high(), 31);

        let mut rng = Mcg128Xsl64::seed_from_u64(7);
        for _ in 0..200 {
            let i = policy.draw(&mut rng);
            assert!((26..=31).contains(&i), "draw {i} out of band");
        }
    }

    #[test]
    fn base_and_high_clamp_at_max() {
        let mut policy = ChannelPolicy::new(Channel::B, cfg(20, 30, 10, 50));
        for _ in 0..5 {
            policy.record_failure();
        }
        assert_eq!(policy.base(), 30);
        assert_eq!(policy.high(), 30);
        let mut rng = Mcg128Xsl64::seed_from_u64(1);
        assert_eq!(policy.draw(&mut rng), 30);
    }

    #[test]
    fn super_intensity_clamps_at_max() {
        let policy = ChannelPolicy::new(Channel::A, cfg(20, 90, 2, 5));
        assert_eq!(policy.super_intensity(10), 35); // high 25 + 10
        let policy = ChannelPolicy::new(Channel::A, cfg(80, 90, 2, 5));
        assert_eq!(policy.super_intensity(10), 90);
    }

    #[test]
    fn cooldown_gate_blocks_early_refire() {
        let mut t = PulseTracker::new();
        // Nothing ever sent: eligible immediately.
        assert!(t.can_fire(0.0, 15.0));
        t.arm(100.0, 2.0, vec![Channel::A]);
        // 10s later: past the pulse itself but inside the 15s timeout.
        assert!(!t.can_fire(110.0, 15.0));
        assert!(t.can_fire(115.0, 15.0));
    }

    #[test]
    fn rearm_keeps_prior_pending_channels() {
        // A long pulse on both channels, then a later re-fire that only
        // reached A: B still owes its off under the new deadline.
        let mut t = PulseTracker::new();
        t.arm(10.0, 300.0, vec![Channel::A, Channel::B]);
        t.arm(20.0, 2.0, vec![Channel::A]);
        let mut pending = t.pending().to_vec();
        pending.sort();
        assert_eq!(pending, vec![Channel::A, Channel::B]);
        assert!(t.off_due(22.0));
    }

    #[test]
    fn off_fires_exactly_once() {
        let mut t = PulseTracker::new();
        t.arm(10.0, 2.0, vec![Channel::A, Channel::B]);
        assert!(!t.off_due(11.0));
        assert!(t.off_due(12.0));
        t.clear_channel(Channel::A);
        assert!(t.off_due(12.0)); // B still pending
        t.clear_channel(Channel::B);
        assert!(!t.off_due(12.0));
        assert!(!t.off_due(1000.0));
    }

    #[test]
    fn wire_encoding() {
        assert_eq!(PulseCommand::on(Channel::A, 37).wire(), "A37\n");
        assert_eq!(PulseCommand::off(Channel::B).wire(), "B0\n");
        assert_eq!(PulseCommand::on(Channel::B, 5).label(), "B5");
    }
}
