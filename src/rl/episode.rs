// src/rl/episode.rs
//
// Episode recorder: per-tick (features, action) pairs for the current play
// session, turned into a discounted-return-labelled trajectory at game over.

use super::features::FEATURE_DIM;
use super::replay::TrajectorySample;

/// One recorded decision point.
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub features: [f64; FEATURE_DIM],
    /// 1.0 = jump, 0.0 = hold.
    pub action: f64,
}

/// Accumulates the current episode's decision points.
///
/// Steps are only recorded while an obstacle is in view, so trajectory
/// length counts decisions, not raw ticks.
#[derive(Debug, Default)]
pub struct EpisodeRecorder {
    steps: Vec<StepRecord>,
}

impl EpisodeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_step(&mut self, features: [f64; FEATURE_DIM], jumped: bool) {
        self.steps.push(StepRecord {
            features,
            action: if jumped { 1.0 } else { 0.0 },
        });
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Convert the recorded episode into labelled samples and clear the
    /// recorder. Returns `None` when the episode is shorter than
    /// `min_len` (too few samples to be a meaningful update).
    ///
    /// Each step's return is the discounted final score,
    /// `discount^(N-1-i) * final_score / 100`: steps closer to the terminal
    /// receive returns closer to `final_score / 100`, earlier steps are
    /// exponentially discounted.
    pub fn finalize(
        &mut self,
        final_score: u32,
        discount: f64,
        min_len: usize,
    ) -> Option<Vec<TrajectorySample>> {
        let steps = std::mem::take(&mut self.steps);
        if steps.len() < min_len {
            return None;
        }

        let n = steps.len();
        let terminal_return = f64::from(final_score) / 100.0;
        let samples = steps
            .into_iter()
            .enumerate()
            .map(|(i, step)| TrajectorySample {
                features: step.features,
                action: step.action,
                ret: discount.powi((n - 1 - i) as i32) * terminal_return,
            })
            .collect();

        Some(samples)
    }
}
