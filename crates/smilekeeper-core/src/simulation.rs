//! Deterministic session replay.
//!
//! Replays a recorded (or synthesized) trace of smile-ratio samples
//! through a seeded controller at a fixed tick rate, capturing every
//! actuator command with its session timestamp. The same trace, seed,
//! and config always produce the same report, which makes scenario
//! regressions reproducible from the CLI as well as from tests.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::session::{Channel, SessionController, SessionSnapshot};
use crate::transport::RecordingTransport;

/// Default seed when neither config nor caller supplies one.
const DEFAULT_SEED: u64 = 42;

/// One actuator command with its session timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedCommand {
    /// Session time in seconds.
    pub t: f64,
    pub channel: Channel,
    pub intensity: u32,
}

/// Everything a replay produced.
#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub seed: u64,
    pub tick_hz: f64,
    pub ticks: usize,
    pub commands: Vec<TimedCommand>,
    pub events: Vec<crate::events::Event>,
    pub snapshot: SessionSnapshot,
}

/// Trace replay harness.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: Config,
    seed: u64,
    tick_hz: f64,
    /// Tick index at which the baseline is calibrated.
    calibrate_at: usize,
}

impl Simulation {
    pub fn new(config: Config) -> Self {
        let seed = config.seed.unwrap_or(DEFAULT_SEED);
        Self {
            config,
            seed,
            tick_hz: 30.0,
            calibrate_at: 0,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_tick_hz(mut self, tick_hz: f64) -> Self {
        self.tick_hz = tick_hz.max(1.0);
        self
    }

    /// Calibrate the baseline once this many ticks have elapsed (the
    /// trace up to that point is the neutral face).
    pub fn calibrate_at(mut self, tick: usize) -> Self {
        self.calibrate_at = tick;
        self
    }

    /// Replay the trace. `None` entries are no-face ticks.
    pub fn run(&self, trace: &[Option<f64>]) -> SimulationReport {
        use rand::SeedableRng;
        let mut config = self.config.clone();
        config.seed = Some(self.seed);
        let mut controller =
            SessionController::with_rng(config, rand_pcg::Mcg128Xsl64::seed_from_u64(self.seed));
        let mut transport = RecordingTransport::new();

        let dt = 1.0 / self.tick_hz;
        let mut events = Vec::new();
        let mut commands = Vec::new();
        let mut now = 0.0;

        for (i, sample) in trace.iter().enumerate() {
            now = i as f64 * dt;
            let report = controller.tick(now, dt, *sample, &mut transport);
            for cmd in &report.commands {
                commands.push(TimedCommand {
                    t: now,
                    channel: cmd.channel,
                    intensity: cmd.intensity,
                });
            }
            events.extend(report.events);

            if i == self.calibrate_at {
                if let Some(event) = controller.set_baseline(now) {
                    events.push(event);
                }
            }
        }

        let flush = controller.end_session(&mut transport);
        for cmd in &flush.commands {
            commands.push(TimedCommand {
                t: now,
                channel: cmd.channel,
                intensity: cmd.intensity,
            });
        }
        events.extend(flush.events);

        SimulationReport {
            seed: self.seed,
            tick_hz: self.tick_hz,
            ticks: trace.len(),
            commands,
            events,
            snapshot: controller.snapshot(),
        }
    }
}

/// Build a constant-ratio trace segment.
pub fn constant_trace(ratio: f64, ticks: usize) -> Vec<Option<f64>> {
    vec![Some(ratio); ticks]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> Config {
        let mut cfg = Config::default();
        cfg.challenge.enabled = false;
        cfg.tease.enabled = false;
        cfg
    }

    #[test]
    fn same_seed_same_commands() {
        let mut trace = constant_trace(0.50, 30);
        trace.extend(constant_trace(0.50, 600)); // never smiles after warmup
        let sim = Simulation::new(quiet_config()).with_seed(7).calibrate_at(29);

        let a = sim.run(&trace);
        let b = sim.run(&trace);
        let fmt = |r: &SimulationReport| {
            r.commands
                .iter()
                .map(|c| format!("{}:{}{}", c.t, c.channel, c.intensity))
                .collect::<Vec<_>>()
        };
        assert_eq!(fmt(&a), fmt(&b));
        assert!(!a.commands.is_empty());
    }

    #[test]
    fn different_seeds_may_diverge_but_stay_in_band() {
        let mut trace = constant_trace(0.50, 30);
        trace.extend(constant_trace(0.50, 600));
        for seed in [1, 2, 3] {
            let report = Simulation::new(quiet_config())
                .with_seed(seed)
                .calibrate_at(29)
                .run(&trace);
            for cmd in report.commands.iter().filter(|c| c.intensity > 0) {
                assert!((20..=80).contains(&cmd.intensity));
            }
        }
    }

    #[test]
    fn smiling_trace_issues_no_punishment() {
        // Neutral during calibration, then a clear smile for the rest.
        let mut trace = constant_trace(0.40, 30);
        trace.extend(constant_trace(0.90, 600));
        let report = Simulation::new(quiet_config()).calibrate_at(29).run(&trace);
        assert!(
            report.commands.is_empty(),
            "unexpected commands: {:?}",
            report.commands
        );
        assert!(report.snapshot.smiling);
    }
}
