//! dinopilot core library.
//!
//! Rule-based + self-tuning autopilot for the Chrome offline dinosaur game.
//! The decision engine (strategy, adaptive parameters, episode learning)
//! lives here; the binary (`src/main.rs`) is a thin harness that attaches
//! to a running Chrome over the DevTools protocol and drives the loop.

pub mod analytics;
pub mod config;
pub mod live;
pub mod logging;
pub mod params;
pub mod rl;
pub mod runner;
pub mod strategy;
pub mod types;

// --- Re-exports for ergonomic external use ---------------------------------

pub use analytics::{RoundStats, SessionAnalytics};

pub use config::{BrowserConfig, Config, ControlConfig, LearningConfig};

pub use live::{chrome::DinoGame, BoxFuture, GameInterface};

pub use logging::{EventSink, NoopSink, StdoutSink};

pub use params::{ParamRole, ParamSet, ParamStore, PARAM_COUNT};

pub use rl::episode::EpisodeRecorder;
pub use rl::learner::{Learner, SkipReason, TrainingOutcome};
pub use rl::model::{FunctionApproximator, MlpApproximator};
pub use rl::replay::{ReplayBuffer, TrajectorySample};

pub use runner::{ControlLoop, RunSummary};

pub use strategy::decide;

pub use types::{Decision, GameSnapshot, Observation, Obstacle, ObstacleKind, ReasonTag};
