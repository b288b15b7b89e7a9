// src/config.rs
//
// Central configuration for dinopilot.
// This is the single source of truth for every tunable that is not part of
// the adaptive parameter set (src/params.rs): browser attachment, control
// loop cadence, and the learning/replay hyperparameters.

#[derive(Debug, Clone)]
pub struct Config {
    /// Human-readable config / release version.
    pub version: &'static str,
    /// Browser attachment config.
    pub browser: BrowserConfig,
    /// Control-loop cadence config.
    pub control: ControlConfig,
    /// Learning loop / replay buffer config.
    pub learning: LearningConfig,
}

#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// DevTools HTTP endpoint of an already-running Chrome
    /// (started with --remote-debugging-port).
    pub devtools_url: String,
    /// Substring used to pick the game page among open targets.
    pub page_url_hint: String,
    /// Max time to wait for the websocket connect + protocol calls.
    pub call_timeout_ms: u64,
    /// Max time to wait for `Runner.instance_` to appear after attach.
    pub ready_timeout_ms: u64,
    /// Poll interval while waiting for readiness.
    pub ready_poll_ms: u64,
}

#[derive(Debug, Clone)]
pub struct ControlConfig {
    /// Fixed wait between ticks.
    pub tick_interval_ms: u64,
    /// Settle wait after issuing a jump, letting the input register before
    /// the next observation.
    pub jump_settle_ms: u64,
    /// Longer wait after a failed tick (observation unavailable etc.).
    pub error_backoff_ms: u64,
    /// Settle wait around the restart key press at an episode boundary.
    pub restart_settle_ms: u64,
    /// Score/speed polling cadence, in ticks.
    pub score_poll_ticks: u64,
    /// Optional tick bound; `None` runs until externally terminated.
    pub max_ticks: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct LearningConfig {
    /// Backward discount applied to the final score when labelling steps.
    pub discount: f64,
    /// Trajectories shorter than this are discarded (no training signal).
    pub min_episode_len: usize,
    /// Replay buffer capacity (FIFO eviction beyond this).
    pub replay_capacity: usize,
    /// Minimum buffered samples before any training step runs.
    pub min_buffer_for_training: usize,
    /// Training batch size (capped by buffer length).
    pub batch_size: usize,
    /// Number of synthetic probe feature vectors per parameter update.
    pub probe_batch: usize,
    /// Hidden layer widths of the in-tree approximator.
    pub hidden_dims: [usize; 2],
    /// SGD learning rate of the in-tree approximator.
    pub learning_rate: f64,
    /// Seed for all stochastic pieces (sampling, probes, weight init).
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "dinopilot-0.1.0",
            browser: BrowserConfig {
                devtools_url: "http://127.0.0.1:9222".to_string(),
                page_url_hint: "chrome://dino".to_string(),
                call_timeout_ms: 10_000,
                ready_timeout_ms: 15_000,
                ready_poll_ms: 250,
            },
            control: ControlConfig {
                tick_interval_ms: 10,
                jump_settle_ms: 100,
                error_backoff_ms: 500,
                restart_settle_ms: 1_000,
                score_poll_ticks: 100,
                max_ticks: None,
            },
            learning: LearningConfig {
                discount: 0.97,
                min_episode_len: 5,
                replay_capacity: 500,
                min_buffer_for_training: 100,
                batch_size: 64,
                probe_batch: 10,
                hidden_dims: [64, 32],
                learning_rate: 0.002,
                seed: 0,
            },
        }
    }
}
