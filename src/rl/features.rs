// src/rl/features.rs
//
// Fixed-length feature encoding of one (observation, obstacle) pair, plus
// the synthetic probe vectors the learner feeds to the approximator when
// deriving parameter adjustments.

use rand::Rng;

use crate::types::{Observation, Obstacle, ObstacleKind};

/// Feature vector length.
pub const FEATURE_DIM: usize = 8;

// Normalization constants. These put every feature roughly into [0, 1] for
// the value ranges the stock runner produces.
const DISTANCE_NORM: f64 = 200.0;
const SPEED_NORM: f64 = 15.0;
const HEIGHT_NORM: f64 = 100.0;
const WIDTH_NORM: f64 = 100.0;

/// Encode the decision context as a flat feature vector:
/// normalized distance, speed, obstacle height, aerial flag, relative
/// height, jumping flag, obstacle width, player y.
pub fn extract_features(obs: &Observation, obstacle: &Obstacle) -> [f64; FEATURE_DIM] {
    let distance = obstacle.x - (obs.player.x + obs.player.width);
    let is_aerial = obstacle.kind() == ObstacleKind::Aerial;

    let relative_height = if is_aerial {
        obstacle.y / obs.canvas.height_or_default()
    } else {
        0.0
    };

    [
        distance / DISTANCE_NORM,
        obs.speed / SPEED_NORM,
        obstacle.height / HEIGHT_NORM,
        if is_aerial { 1.0 } else { 0.0 },
        relative_height,
        if obs.player.jumping { 1.0 } else { 0.0 },
        obstacle.width / WIDTH_NORM,
        obs.player.y / obs.canvas.height_or_default(),
    ]
}

/// Random probe vectors within realistic feature ranges; the approximator's
/// outputs for these are averaged into one parameter-adjustment vector.
pub fn probe_features<R: Rng>(rng: &mut R, count: usize) -> Vec<Vec<f64>> {
    (0..count)
        .map(|_| {
            vec![
                rng.gen::<f64>(),             // distance
                rng.gen::<f64>() * 0.8,       // speed
                rng.gen::<f64>(),             // height
                f64::from(rng.gen::<bool>()), // aerial flag
                rng.gen::<f64>(),             // relative height
                0.0,                          // not jumping
                rng.gen::<f64>() * 0.5,       // width
                0.8 + rng.gen::<f64>() * 0.2, // player y near the ground
            ]
        })
        .collect()
}
