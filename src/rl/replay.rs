// src/rl/replay.rs
//
// Bounded replay buffer shared across episodes, plus the reward-weighted
// batch sampler used by the learning loop.

use std::collections::VecDeque;

use rand::Rng;

use super::features::FEATURE_DIM;

/// One labelled transition: the unit of training data.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectorySample {
    pub features: [f64; FEATURE_DIM],
    /// 1.0 = jump, 0.0 = hold.
    pub action: f64,
    /// Discounted episode return assigned to this step.
    pub ret: f64,
}

/// FIFO buffer of past trajectory samples. Grows by extend-then-truncate:
/// new samples are always kept, the oldest are evicted past capacity.
#[derive(Debug)]
pub struct ReplayBuffer {
    samples: VecDeque<TrajectorySample>,
    capacity: usize,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Append a trajectory, then evict the oldest entries beyond capacity.
    pub fn extend(&mut self, trajectory: Vec<TrajectorySample>) {
        self.samples.extend(trajectory);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrajectorySample> {
        self.samples.iter()
    }

    /// Draw `batch` samples with probability proportional to each entry's
    /// return relative to the buffer total (cumulative-probability draw per
    /// sample; duplicates possible). Falls back to uniform draws when the
    /// total return carries no signal.
    pub fn sample_weighted<R: Rng>(&self, batch: usize, rng: &mut R) -> Vec<&TrajectorySample> {
        if self.samples.is_empty() || batch == 0 {
            return Vec::new();
        }

        let total: f64 = self.samples.iter().map(|s| s.ret).sum();
        if !(total > f64::EPSILON) {
            return (0..batch)
                .map(|_| &self.samples[rng.gen_range(0..self.samples.len())])
                .collect();
        }

        (0..batch)
            .map(|_| {
                let threshold: f64 = rng.gen();
                let mut cumulative = 0.0;
                for sample in &self.samples {
                    cumulative += sample.ret / total;
                    if cumulative >= threshold {
                        return sample;
                    }
                }
                // Floating-point shortfall at threshold ~= 1.0.
                self.samples.back().expect("buffer is non-empty")
            })
            .collect()
    }
}
