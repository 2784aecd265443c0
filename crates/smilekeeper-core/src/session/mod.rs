mod challenge;
mod channel;
mod clock;
mod controller;
mod display;
mod tease;
mod warmup;

pub use challenge::{ChallengePhase, ChallengeScheduler, ChallengeStep};
pub use channel::{Channel, ChannelPolicy, PulseCommand, PulseKind, PulseTracker};
pub use clock::SessionClock;
pub use controller::{SessionController, SessionSnapshot, TickReport};
pub use display::{CommandHistory, DisplayMode, DisplayRoulette};
pub use tease::TeaseScheduler;
pub use warmup::{Warmup, WarmupPhase};
