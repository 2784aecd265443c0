//! Per-tick session orchestrator.
//!
//! The controller owns the whole session aggregate: smile filter,
//! warm-up, countdown clock, challenge and tease schedulers, channel
//! policies, and the pulse tracker. It does not keep time itself; the
//! caller is responsible for driving `tick()` once per captured frame
//! with a single shared `now` timestamp, which is what makes the five
//! timers race-free.
//!
//! ## Evaluation order (fixed, one pass per tick)
//!
//! 1. Smile filter (EMA + hysteresis)
//! 2. Warm-up progression / session start
//! 3. Challenge scheduler (super punishment on failure)
//! 4. Ordinary punishment check (cooldown gate)
//! 5. Tease scheduler
//! 6. Session clock
//! 7. Off-expiry checks, punishment before tease
//!
//! ## Transport failures
//!
//! Pulse bookkeeping (fail counters, active set, cooldown clock) commits
//! per channel only after the write succeeded, so a failed write leaves
//! the controller as if no pulse were issued; the cooldown clock is
//! still touched so the retry waits for the next eligible window
//! instead of spinning every tick.

use chrono::Utc;
use rand::{Rng, SeedableRng};
use rand_pcg::Mcg128Xsl64;
use serde::Serialize;

use super::challenge::{ChallengePhase, ChallengeScheduler, ChallengeStep};
use super::channel::{Channel, ChannelPolicy, PulseCommand, PulseKind, PulseTracker};
use super::clock::SessionClock;
use super::display::{CommandHistory, DisplayMode, DisplayRoulette};
use super::tease::TeaseScheduler;
use super::warmup::{Warmup, WarmupPhase};
use crate::config::Config;
use crate::events::Event;
use crate::signal::SmileFilter;
use crate::transport::Transport;

/// Commands written and events raised during one tick.
#[derive(Debug, Default)]
pub struct TickReport {
    pub commands: Vec<PulseCommand>,
    pub events: Vec<Event>,
}

/// Read-only state snapshot for the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub smiling: bool,
    pub ema: Option<f64>,
    pub baseline: Option<f64>,
    pub remaining_seconds: f64,
    pub session_started: bool,
    pub warmup_phase: Option<WarmupPhase>,
    pub challenge: Option<ChallengePhase>,
    pub display_mode: DisplayMode,
    pub current_message: String,
    /// No landmark sample seen for the configured horizon.
    pub degraded: bool,
    pub fail_count_a: u32,
    pub fail_count_b: u32,
    /// Wire labels of commands issued on the most recent tick.
    pub last_commands: Vec<String>,
    /// Recent wire command ring for the debug overlay.
    pub history: Vec<String>,
}

/// Session state machine, one instance per session.
///
/// Generic over the random source so every scenario is reproducible
/// under a fixed seed; production uses [`Mcg128Xsl64`].
#[derive(Debug)]
pub struct SessionController<R: Rng = Mcg128Xsl64> {
    config: Config,
    filter: SmileFilter,
    warmup: Option<Warmup>,
    warmup_phase: Option<WarmupPhase>,
    session_started: bool,
    session_started_at: f64,
    clock: SessionClock,
    challenge: Option<ChallengeScheduler>,
    tease: Option<TeaseScheduler>,
    display: Option<DisplayRoulette>,
    policy_a: ChannelPolicy,
    policy_b: ChannelPolicy,
    punish: PulseTracker,
    history: CommandHistory,
    last_sample_at: Option<f64>,
    degraded: bool,
    last_commands: Vec<PulseCommand>,
    rng: R,
}

impl SessionController<Mcg128Xsl64> {
    /// Build a controller seeded from the config, or from entropy when
    /// no seed is configured.
    pub fn new(config: Config) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        Self::with_rng(config, Mcg128Xsl64::seed_from_u64(seed))
    }
}

impl<R: Rng> SessionController<R> {
    /// Build a controller around an explicit random source.
    ///
    /// The config is normalized and then frozen: nothing re-reads the
    /// option surface after construction.
    pub fn with_rng(mut config: Config, rng: R) -> Self {
        config.normalize();
        let clock = SessionClock::new(config.session.length_secs, config.session.penalty_rate);
        let policy_a = ChannelPolicy::new(Channel::A, config.channel_a.clone());
        let policy_b = ChannelPolicy::new(Channel::B, config.channel_b.clone());
        let history = CommandHistory::new(config.display.history_len);
        Self {
            config,
            filter: SmileFilter::new(),
            warmup: None,
            warmup_phase: None,
            session_started: false,
            session_started_at: 0.0,
            clock,
            challenge: None,
            tease: None,
            display: None,
            policy_a,
            policy_b,
            punish: PulseTracker::new(),
            history,
            last_sample_at: None,
            degraded: false,
            last_commands: Vec::new(),
            rng,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn session_started(&self) -> bool {
        self.session_started
    }

    pub fn smiling(&self) -> bool {
        self.filter.smiling()
    }

    pub fn baseline(&self) -> Option<f64> {
        self.filter.baseline()
    }

    pub fn remaining_seconds(&self) -> f64 {
        self.clock.remaining()
    }

    pub fn fail_counts(&self) -> (u32, u32) {
        (self.policy_a.fail_count(), self.policy_b.fail_count())
    }

    /// Build a full state snapshot for rendering.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            smiling: self.filter.smiling(),
            ema: self.filter.ema(),
            baseline: self.filter.baseline(),
            remaining_seconds: self.clock.remaining(),
            session_started: self.session_started,
            warmup_phase: self.warmup_phase,
            challenge: self.challenge.as_ref().map(|c| c.phase()),
            display_mode: self
                .display
                .as_ref()
                .map_or(DisplayMode::Countdown, |d| d.mode()),
            current_message: self
                .display
                .as_ref()
                .map_or_else(String::new, |d| d.current_message().to_string()),
            degraded: self.degraded,
            fail_count_a: self.policy_a.fail_count(),
            fail_count_b: self.policy_b.fail_count(),
            last_commands: self.last_commands.iter().map(|c| c.label()).collect(),
            history: self.history.to_vec(),
        }
    }

    // ── User events ──────────────────────────────────────────────────

    /// Calibrate the baseline from the current estimate and begin the
    /// warm-up countdown. One-shot per session; returns None when no
    /// sample has been seen yet or a baseline already exists.
    pub fn set_baseline(&mut self, now: f64) -> Option<Event> {
        let baseline = self.filter.set_baseline()?;
        self.warmup = Some(Warmup::start(
            now,
            self.config.session.warmup_duration_secs,
            self.config.session.warmup_hold_secs,
        ));
        self.warmup_phase = Some(WarmupPhase::GetReady);
        Some(Event::BaselineSet {
            baseline,
            at: Utc::now(),
        })
    }

    /// End the session: flush the paired "off" for every channel still
    /// held on before the transport is released. Best effort; a write
    /// failure here cannot be retried because the session is over.
    pub fn end_session(&mut self, transport: &mut dyn Transport) -> TickReport {
        let mut report = TickReport::default();
        let mut channels: Vec<Channel> = self
            .punish
            .pending()
            .iter()
            .chain(self.tease.as_ref().map_or([].as_slice(), |t| t.pending()))
            .copied()
            .collect();
        channels.sort();
        channels.dedup();

        for channel in channels {
            let cmd = PulseCommand::off(channel);
            if transport.send(cmd).is_ok() {
                self.note_sent(cmd, &mut report);
                report.events.push(Event::PulseCleared {
                    channel,
                    at: Utc::now(),
                });
            }
        }
        self.punish.reset();
        if let Some(t) = self.tease.as_mut() {
            t.reset();
        }
        self.session_started = false;
        report.events.push(Event::SessionEnded { at: Utc::now() });
        report
    }

    // ── Tick ─────────────────────────────────────────────────────────

    /// Advance everything one frame.
    ///
    /// `now` is the shared tick timestamp in seconds, `dt` the elapsed
    /// seconds since the previous tick, and `sample` the smile ratio
    /// for this frame (None when no face was detected; state holds).
    pub fn tick(
        &mut self,
        now: f64,
        dt: f64,
        sample: Option<f64>,
        transport: &mut dyn Transport,
    ) -> TickReport {
        let mut report = TickReport::default();
        self.last_commands.clear();

        // 1. Signal filter. No-sample ticks leave the estimate alone.
        if let Some(ratio) = sample {
            self.filter.observe(ratio);
            self.last_sample_at = Some(now);
            self.filter.update_smiling(
                self.config.challenge.enabled,
                self.config.challenge.super_on_offset,
            );
        }
        let smiling = self.filter.smiling();

        if self.display.is_none() {
            self.display = Some(DisplayRoulette::new(
                self.config.display.messages.clone(),
                now,
                &mut self.rng,
            ));
        }

        // 2. Warm-up progression.
        if let Some(warmup) = &self.warmup {
            let phase = warmup.phase(now);
            self.warmup_phase = Some(phase);
            if phase == WarmupPhase::Done && !self.session_started {
                self.session_started = true;
                self.session_started_at = now;
                self.challenge = Some(ChallengeScheduler::new(
                    self.config.challenge.clone(),
                    now,
                    &mut self.rng,
                ));
                self.tease = Some(TeaseScheduler::new(
                    self.config.tease.clone(),
                    now,
                    &mut self.rng,
                ));
                report.events.push(Event::SessionStarted { at: Utc::now() });
            }
        }

        // 3. Challenge scheduler.
        let mut super_due = false;
        if self.session_started && self.config.challenge.enabled {
            if let Some(challenge) = self.challenge.as_mut() {
                let step = challenge.advance(now, smiling, transport.is_connected(), &mut self.rng);
                match step {
                    ChallengeStep::WarningStarted { duration } => {
                        report.events.push(Event::ChallengeWarning {
                            duration_secs: duration,
                            at: Utc::now(),
                        });
                    }
                    ChallengeStep::ChallengeStarted { duration } => {
                        report.events.push(Event::ChallengeStarted {
                            duration_secs: duration,
                            at: Utc::now(),
                        });
                    }
                    ChallengeStep::Survived => {
                        report.events.push(Event::ChallengeSurvived { at: Utc::now() });
                    }
                    ChallengeStep::Failed => {
                        report.events.push(Event::ChallengeFailed { at: Utc::now() });
                        super_due = true;
                    }
                    ChallengeStep::None => {}
                }
            }
        }
        if super_due {
            self.fire_punishment(now, PulseKind::Super, transport, &mut report);
        }

        // 4. Ordinary punishment.
        let challenge_active = self.challenge.as_ref().is_some_and(|c| c.is_active());
        if self.session_started
            && !smiling
            && transport.is_connected()
            && !challenge_active
            && self.punish.can_fire(now, self.config.pulse.timeout_secs)
        {
            self.fire_punishment(now, PulseKind::Punish, transport, &mut report);
        }

        // 5. Tease scheduler.
        self.run_tease(now, smiling, transport, &mut report);

        // 6. Session countdown.
        if self.session_started {
            self.clock.advance(dt, smiling);
        }

        // HUD roulette.
        if let Some(display) = self.display.as_mut() {
            if let Some(mode) = display.advance(now, &mut self.rng) {
                report.events.push(Event::DisplayModeChanged {
                    mode,
                    at: Utc::now(),
                });
            }
        }

        // 7. Off-expiry, punishment before tease.
        self.expire_punishment(now, transport, &mut report);
        self.expire_tease(now, transport, &mut report);

        // Degraded-signal indicator for the presentation layer.
        let horizon = self.config.display.degraded_after_secs;
        self.degraded = self.session_started
            && match self.last_sample_at {
                Some(t) => now - t >= horizon,
                None => now - self.session_started_at >= horizon,
            };

        report
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn note_sent(&mut self, cmd: PulseCommand, report: &mut TickReport) {
        self.history.push(cmd.label());
        self.last_commands.push(cmd);
        report.commands.push(cmd);
    }

    /// Channels an ordinary punishment targets: a uniform pick of A, B,
    /// or both when both are enabled, otherwise whichever is enabled.
    fn select_punish_channels(&mut self) -> Vec<Channel> {
        match (self.policy_a.enabled(), self.policy_b.enabled()) {
            (true, true) => match self.rng.gen_range(0..3u8) {
                0 => vec![Channel::A],
                1 => vec![Channel::B],
                _ => vec![Channel::A, Channel::B],
            },
            (true, false) => vec![Channel::A],
            (false, true) => vec![Channel::B],
            (false, false) => Vec::new(),
        }
    }

    fn fire_punishment(
        &mut self,
        now: f64,
        kind: PulseKind,
        transport: &mut dyn Transport,
        report: &mut TickReport,
    ) {
        if !transport.is_connected() {
            return;
        }
        // Super punishments hit every enabled channel; ordinary ones
        // use the random channel pick.
        let targets = match kind {
            PulseKind::Super => {
                let mut t = Vec::new();
                if self.policy_a.enabled() {
                    t.push(Channel::A);
                }
                if self.policy_b.enabled() {
                    t.push(Channel::B);
                }
                t
            }
            _ => self.select_punish_channels(),
        };
        if targets.is_empty() {
            return;
        }

        let mut sent = Vec::new();
        for channel in targets {
            let intensity = {
                let policy = match channel {
                    Channel::A => &self.policy_a,
                    Channel::B => &self.policy_b,
                };
                match kind {
                    PulseKind::Super => policy.super_intensity(self.config.challenge.super_extra),
                    _ => policy.draw(&mut self.rng),
                }
            };
            let cmd = PulseCommand::on(channel, intensity);
            match transport.send(cmd) {
                Ok(()) => {
                    match channel {
                        Channel::A => self.policy_a.record_failure(),
                        Channel::B => self.policy_b.record_failure(),
                    }
                    self.note_sent(cmd, report);
                    report.events.push(Event::PulseIssued {
                        channel,
                        intensity,
                        kind,
                        at: Utc::now(),
                    });
                    sent.push(channel);
                }
                Err(e) => {
                    report.events.push(Event::SendFailed {
                        channel,
                        message: e.to_string(),
                        at: Utc::now(),
                    });
                }
            }
        }

        if sent.is_empty() {
            // Nothing reached the device: no pulse was issued, but the
            // cooldown clock restarts so the retry waits for the next
            // eligible window.
            self.punish.touch(now);
        } else {
            self.punish.arm(now, self.config.pulse.duration_secs, sent);
        }
    }

    fn run_tease(
        &mut self,
        now: f64,
        smiling: bool,
        transport: &mut dyn Transport,
        report: &mut TickReport,
    ) {
        let due = self
            .tease
            .as_ref()
            .is_some_and(|t| t.enabled() && t.ready(now));
        if !(self.session_started
            && smiling
            && due
            && !self.punish.is_active(now)
            && transport.is_connected())
        {
            return;
        }

        let mut sent = Vec::new();
        for (policy, channel) in [(&self.policy_a, Channel::A), (&self.policy_b, Channel::B)] {
            if !policy.enabled() {
                continue;
            }
            let cmd = PulseCommand::on(channel, policy.min_intensity());
            match transport.send(cmd) {
                Ok(()) => sent.push((cmd, channel)),
                Err(e) => report.events.push(Event::SendFailed {
                    channel,
                    message: e.to_string(),
                    at: Utc::now(),
                }),
            }
        }
        for (cmd, channel) in &sent {
            self.note_sent(*cmd, report);
            report.events.push(Event::PulseIssued {
                channel: *channel,
                intensity: cmd.intensity,
                kind: PulseKind::Tease,
                at: Utc::now(),
            });
        }

        if let Some(tease) = self.tease.as_mut() {
            if !sent.is_empty() {
                tease.arm(now, sent.iter().map(|(_, c)| *c).collect());
            }
            // Reschedule even after a failed attempt, so a dead write
            // does not turn into a rapid-fire retry loop.
            tease.reschedule(now, &mut self.rng);
        }
    }

    fn expire_punishment(
        &mut self,
        now: f64,
        transport: &mut dyn Transport,
        report: &mut TickReport,
    ) {
        if !(self.session_started && self.punish.off_due(now) && transport.is_connected()) {
            return;
        }
        for channel in self.punish.pending().to_vec() {
            let cmd = PulseCommand::off(channel);
            match transport.send(cmd) {
                Ok(()) => {
                    self.punish.clear_channel(channel);
                    self.note_sent(cmd, report);
                    report.events.push(Event::PulseCleared {
                        channel,
                        at: Utc::now(),
                    });
                }
                // Keep the channel pending; the off retries next tick.
                Err(e) => report.events.push(Event::SendFailed {
                    channel,
                    message: e.to_string(),
                    at: Utc::now(),
                }),
            }
        }
    }

    fn expire_tease(&mut self, now: f64, transport: &mut dyn Transport, report: &mut TickReport) {
        let due = self.tease.as_ref().is_some_and(|t| t.off_due(now));
        if !(self.session_started && due && transport.is_connected()) {
            return;
        }
        let pending = self
            .tease
            .as_ref()
            .map_or_else(Vec::new, |t| t.pending().to_vec());
        for channel in pending {
            if self.punish.owns(channel, now) {
                // Punishment still holds this channel on; its own off
                // will clear it. The tease must not cut it short.
                if let Some(t) = self.tease.as_mut() {
                    t.clear_channel(channel);
                }
                continue;
            }
            let cmd = PulseCommand::off(channel);
            match transport.send(cmd) {
                Ok(()) => {
                    if let Some(t) = self.tease.as_mut() {
                        t.clear_channel(channel);
                    }
                    self.note_sent(cmd, report);
                    report.events.push(Event::PulseCleared {
                        channel,
                        at: Utc::now(),
                    });
                }
                Err(e) => report.events.push(Event::SendFailed {
                    channel,
                    message: e.to_string(),
                    at: Utc::now(),
                }),
            }
        }
    }
}
