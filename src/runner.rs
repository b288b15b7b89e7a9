// src/runner.rs
//
// Control loop: the single sequential tick cycle.
//
// Per tick: snapshot -> rule engine -> (maybe) jump -> fixed wait. Episode
// boundaries (the page's game-over flag) finalize the recorded trajectory,
// drive the learning loop, emit round statistics, and restart the game.
// A failed tick is logged and followed by a longer backoff wait; the loop
// only ends on an external signal or the configured tick bound.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Result;

use crate::analytics::SessionAnalytics;
use crate::config::Config;
use crate::live::GameInterface;
use crate::logging::EventSink;
use crate::params::ParamStore;
use crate::rl::episode::EpisodeRecorder;
use crate::rl::features::extract_features;
use crate::rl::learner::Learner;
use crate::strategy;
use crate::types::{GameSnapshot, TimestampMs};

fn now_ms() -> TimestampMs {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// What a single tick decided about loop flow.
enum TickFlow {
    /// Normal tick; wait the fixed interval.
    Continue,
    /// Host state not ready; skip this tick.
    Idle,
    /// Episode boundary handled; restart waits already elapsed.
    EpisodeRestarted,
}

/// Summary returned when a bounded run finishes.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub ticks: u64,
    pub episodes: u64,
    pub highest_score: u32,
}

/// Owns all mutable session state: the parameter store, learner, episode
/// recorder, and analytics. Passed a game interface to drive.
pub struct ControlLoop {
    cfg: Config,
    store: ParamStore,
    learner: Learner,
    recorder: EpisodeRecorder,
    analytics: SessionAnalytics,
    sink: Box<dyn EventSink>,
    iteration: u64,
    highest_score: u32,
    last_score: u32,
    tick: u64,
}

impl ControlLoop {
    pub fn new(cfg: &Config, sink: Box<dyn EventSink>) -> Self {
        Self {
            cfg: cfg.clone(),
            store: ParamStore::new(),
            learner: Learner::new(&cfg.learning),
            recorder: EpisodeRecorder::new(),
            analytics: SessionAnalytics::new(now_ms()),
            sink,
            iteration: 1,
            highest_score: 0,
            last_score: 0,
            tick: 0,
        }
    }

    /// Swap in a pre-built learner (tests inject stub approximators).
    pub fn with_learner(mut self, learner: Learner) -> Self {
        self.learner = learner;
        self
    }

    pub fn params(&self) -> &ParamStore {
        &self.store
    }

    pub fn learner(&self) -> &Learner {
        &self.learner
    }

    /// Drive the game until the tick bound is reached (if any) or the
    /// future is dropped by an external signal.
    pub async fn run(&mut self, game: &mut dyn GameInterface) -> Result<RunSummary> {
        self.sink.note("autopilot loop started");

        loop {
            if let Some(max) = self.cfg.control.max_ticks {
                if self.tick >= max {
                    break;
                }
            }
            self.tick += 1;

            match self.tick_once(game).await {
                Ok(TickFlow::Continue) | Ok(TickFlow::Idle) => {
                    tokio::time::sleep(Duration::from_millis(self.cfg.control.tick_interval_ms))
                        .await;
                }
                Ok(TickFlow::EpisodeRestarted) => {}
                Err(err) => {
                    self.sink.tick_error(&format!("{err:#}"));
                    tokio::time::sleep(Duration::from_millis(self.cfg.control.error_backoff_ms))
                        .await;
                }
            }
        }

        Ok(RunSummary {
            ticks: self.tick,
            episodes: self.iteration.saturating_sub(1),
            highest_score: self.highest_score,
        })
    }

    async fn tick_once(&mut self, game: &mut dyn GameInterface) -> Result<TickFlow> {
        let Some(snapshot) = game.snapshot().await? else {
            return Ok(TickFlow::Idle);
        };

        let poll_tick = self.tick % self.cfg.control.score_poll_ticks.max(1) == 0;
        if poll_tick && snapshot.score != self.last_score {
            self.last_score = snapshot.score;
            if snapshot.score > self.highest_score {
                self.highest_score = snapshot.score;
            }
            self.analytics.record_score(snapshot.score);
            self.analytics.record_speed(snapshot.observation.speed);
            self.sink
                .score_update(snapshot.score, snapshot.observation.speed);
        }

        if snapshot.game_over {
            self.finish_episode(game, &snapshot).await?;
            return Ok(TickFlow::EpisodeRestarted);
        }

        let decision = strategy::decide(&snapshot.observation, self.store.get());

        if let Some(nearest) = strategy::nearest_ahead(&snapshot.observation) {
            let now = now_ms();
            self.analytics.record_obstacle(nearest, now);

            let features = extract_features(&snapshot.observation, nearest);
            self.recorder.record_step(features, decision.should_jump);

            if decision.should_jump {
                self.analytics
                    .record_jump(&snapshot.observation, nearest, decision.distance, now);
            }
            if poll_tick {
                self.sink
                    .decision_report(&decision, snapshot.observation.speed);
            }
        }

        if decision.should_jump {
            game.press_jump().await?;
            tokio::time::sleep(Duration::from_millis(self.cfg.control.jump_settle_ms)).await;
        }

        Ok(TickFlow::Continue)
    }

    /// Episode boundary: finalize the trajectory, learn, report, restart.
    async fn finish_episode(
        &mut self,
        game: &mut dyn GameInterface,
        snapshot: &GameSnapshot,
    ) -> Result<()> {
        let final_score = snapshot.score.max(self.last_score);
        if final_score > self.highest_score {
            self.highest_score = final_score;
        }
        self.analytics.record_score(final_score);

        let trajectory = self.recorder.finalize(
            final_score,
            self.cfg.learning.discount,
            self.cfg.learning.min_episode_len,
        );
        let outcome = self.learner.on_episode_end(trajectory, &mut self.store);

        let stats = self.analytics.round_stats(now_ms());
        self.sink.episode_end(
            self.iteration,
            final_score,
            self.highest_score,
            &stats,
            &outcome,
        );

        let settle = Duration::from_millis(self.cfg.control.restart_settle_ms);
        tokio::time::sleep(settle).await;
        game.press_restart().await?;
        tokio::time::sleep(settle).await;

        self.iteration += 1;
        self.last_score = 0;
        Ok(())
    }
}
