//! # Smilekeeper Core Library
//!
//! Core session logic for Smilekeeper, a webcam-driven smile-or-else
//! session controller. A landmark detector outside this crate turns
//! each frame into a normalized smile ratio; everything downstream of
//! that sample lives here: smoothing and hysteresis, the warm-up and
//! countdown timers, the challenge and tease schedulers, and the
//! policy that converts smiling state into strictly paired actuator
//! on/off commands with escalating intensity.
//!
//! ## Architecture
//!
//! - **Session controller**: a wall-clock state machine driven by the
//!   caller invoking `tick()` once per captured frame; all timers share
//!   one `now` per tick, so there are no races between them
//! - **Transport**: trait boundary over the two-character serial line
//!   protocol (`A37\n`, intensity 0 = off)
//! - **Config**: TOML-based option surface, frozen into the session at
//!   calibration time
//! - **Simulation**: deterministic trace replay for regression tests
//!   and the CLI
//!
//! ## Key Components
//!
//! - [`SessionController`]: per-tick orchestrator owning the aggregate
//! - [`SmileFilter`]: EMA smoothing + hysteresis over the raw ratio
//! - [`Config`]: application configuration management
//! - [`Transport`]: trait for actuator byte sinks

pub mod config;
pub mod error;
pub mod events;
pub mod frame;
pub mod session;
pub mod signal;
pub mod simulation;
pub mod transport;

pub use config::Config;
pub use error::{ConfigError, CoreError, TransportError};
pub use events::Event;
pub use frame::{FrameSource, SampleBuffer, ScriptedSource};
pub use session::{
    Channel, ChallengePhase, DisplayMode, PulseCommand, PulseKind, SessionController,
    SessionSnapshot, TickReport, WarmupPhase,
};
pub use signal::SmileFilter;
pub use simulation::{Simulation, SimulationReport};
pub use transport::{LineTransport, NullTransport, RecordingTransport, Transport};
