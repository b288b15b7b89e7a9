// src/analytics.rs
//
// Session / round statistics.
// Intentionally simple + deterministic: all timestamps are passed in, so
// round durations are testable without touching the wall clock.

use crate::types::{Observation, Obstacle, ObstacleKind, TimestampMs};

/// Recent-window sizes used when deriving round statistics.
const SPEED_WINDOW: usize = 100;
const OBSTACLE_WINDOW: usize = 50;

/// A recorded obstacle encounter.
#[derive(Debug, Clone)]
pub struct ObstacleRecord {
    pub kind: ObstacleKind,
    pub height: f64,
    pub y: f64,
    pub time_ms: TimestampMs,
}

/// A recorded jump action.
#[derive(Debug, Clone)]
pub struct JumpRecord {
    pub kind: ObstacleKind,
    /// Relative flight height for aerial obstacles; None for ground.
    pub relative_height: Option<f64>,
    pub distance: f64,
    pub speed: f64,
    pub time_ms: TimestampMs,
}

/// Per-round counters, reset every time statistics are read.
#[derive(Debug, Clone)]
struct RoundCounters {
    start_ms: TimestampMs,
    obstacle_count: u32,
    jump_count: u32,
    max_speed: f64,
}

impl RoundCounters {
    fn new(now_ms: TimestampMs) -> Self {
        Self {
            start_ms: now_ms,
            obstacle_count: 0,
            jump_count: 0,
            max_speed: 0.0,
        }
    }
}

/// Derived statistics for one finished round.
#[derive(Debug, Clone)]
pub struct RoundStats {
    pub duration_ms: i64,
    pub obstacle_count: u32,
    pub jump_count: u32,
    pub score: u32,
    /// Mean over the most recent speed samples.
    pub avg_speed: f64,
    pub max_speed: f64,
    /// Share of aerial obstacles among recent encounters.
    pub bird_ratio: f64,
    /// Share of ground obstacles among recent encounters.
    pub cactus_ratio: f64,
}

/// Accumulates score / speed / obstacle / jump history across a session.
#[derive(Debug)]
pub struct SessionAnalytics {
    scores: Vec<u32>,
    speeds: Vec<f64>,
    obstacles: Vec<ObstacleRecord>,
    jumps: Vec<JumpRecord>,
    round: RoundCounters,
}

impl SessionAnalytics {
    pub fn new(now_ms: TimestampMs) -> Self {
        Self {
            scores: Vec::new(),
            speeds: Vec::new(),
            obstacles: Vec::new(),
            jumps: Vec::new(),
            round: RoundCounters::new(now_ms),
        }
    }

    pub fn record_score(&mut self, score: u32) {
        self.scores.push(score);
    }

    pub fn record_speed(&mut self, speed: f64) {
        if !speed.is_finite() {
            return;
        }
        self.speeds.push(speed);
        if speed > self.round.max_speed {
            self.round.max_speed = speed;
        }
    }

    pub fn record_obstacle(&mut self, obstacle: &Obstacle, now_ms: TimestampMs) {
        self.obstacles.push(ObstacleRecord {
            kind: obstacle.kind(),
            height: obstacle.height,
            y: obstacle.y,
            time_ms: now_ms,
        });
        self.round.obstacle_count += 1;
    }

    pub fn record_jump(
        &mut self,
        obs: &Observation,
        obstacle: &Obstacle,
        distance: f64,
        now_ms: TimestampMs,
    ) {
        let relative_height = match obstacle.kind() {
            ObstacleKind::Aerial => Some(obstacle.y / obs.canvas.height_or_default()),
            _ => None,
        };
        self.jumps.push(JumpRecord {
            kind: obstacle.kind(),
            relative_height,
            distance,
            speed: obs.speed,
            time_ms: now_ms,
        });
        self.round.jump_count += 1;
    }

    /// Last recorded score, 0 before any score arrived.
    pub fn last_score(&self) -> u32 {
        self.scores.last().copied().unwrap_or(0)
    }

    /// Derive statistics for the round ending now, then reset the per-round
    /// counters. Speed / obstacle histories are kept (they feed the recent
    /// windows of later rounds).
    pub fn round_stats(&mut self, now_ms: TimestampMs) -> RoundStats {
        let duration_ms = now_ms - self.round.start_ms;

        let recent_speeds = tail(&self.speeds, SPEED_WINDOW);
        let avg_speed = if recent_speeds.is_empty() {
            0.0
        } else {
            recent_speeds.iter().sum::<f64>() / recent_speeds.len() as f64
        };

        let recent_obstacles = tail(&self.obstacles, OBSTACLE_WINDOW);
        let bird_count = recent_obstacles
            .iter()
            .filter(|o| o.kind == ObstacleKind::Aerial)
            .count();
        let cactus_count = recent_obstacles
            .iter()
            .filter(|o| o.kind == ObstacleKind::Ground)
            .count();
        let (bird_ratio, cactus_ratio) = if recent_obstacles.is_empty() {
            (0.0, 0.0)
        } else {
            let total = recent_obstacles.len() as f64;
            (bird_count as f64 / total, cactus_count as f64 / total)
        };

        let stats = RoundStats {
            duration_ms,
            obstacle_count: self.round.obstacle_count,
            jump_count: self.round.jump_count,
            score: self.last_score(),
            avg_speed,
            max_speed: self.round.max_speed,
            bird_ratio,
            cactus_ratio,
        };

        self.round = RoundCounters::new(now_ms);
        stats
    }
}

fn tail<T>(items: &[T], window: usize) -> &[T] {
    &items[items.len().saturating_sub(window)..]
}
