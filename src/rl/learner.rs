// src/rl/learner.rs
//
// Episode-boundary learning loop.
//
// Converts a finished episode's trajectory into replay data, periodically
// runs one training step on the function approximator, and re-derives the
// adaptive parameter table from averaged probe predictions. Everything here
// is fallible-but-not-fatal: an approximator failure skips this episode's
// update and leaves the replay buffer intact for the next attempt.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::LearningConfig;
use crate::params::{ParamSet, ParamStore, PARAM_COUNT};

use super::features::probe_features;
use super::model::{FunctionApproximator, MlpApproximator};
use super::replay::{ReplayBuffer, TrajectorySample};

/// Why an episode produced no parameter update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Trajectory shorter than the minimum length; discarded entirely.
    EpisodeTooShort,
    /// Replay buffer below the training floor; data kept, no fit run.
    BufferTooSmall,
}

/// Result of one `on_episode_end` call.
#[derive(Debug, Clone)]
pub enum TrainingOutcome {
    Trained {
        samples: usize,
        loss: f64,
        params: ParamSet,
    },
    Skipped {
        reason: SkipReason,
    },
    Failed {
        error: String,
    },
}

impl TrainingOutcome {
    pub fn trained(&self) -> bool {
        matches!(self, TrainingOutcome::Trained { .. })
    }
}

/// Owns the replay buffer, the approximator, and the sampling RNG.
pub struct Learner {
    cfg: LearningConfig,
    replay: ReplayBuffer,
    model: Box<dyn FunctionApproximator>,
    rng: ChaCha8Rng,
    episodes: u64,
}

impl Learner {
    /// Build a learner with the in-tree MLP approximator.
    pub fn new(cfg: &LearningConfig) -> Self {
        let mut init_rng = ChaCha8Rng::seed_from_u64(cfg.seed);
        let model = MlpApproximator::new(cfg.hidden_dims, cfg.learning_rate, &mut init_rng);
        Self::with_model(cfg, Box::new(model))
    }

    /// Build a learner around any approximator (tests inject stubs here).
    pub fn with_model(cfg: &LearningConfig, model: Box<dyn FunctionApproximator>) -> Self {
        Self {
            cfg: cfg.clone(),
            replay: ReplayBuffer::new(cfg.replay_capacity),
            model,
            // Offset so the sampler does not replay the init stream.
            rng: ChaCha8Rng::seed_from_u64(cfg.seed.wrapping_add(1)),
            episodes: 0,
        }
    }

    pub fn episodes(&self) -> u64 {
        self.episodes
    }

    pub fn buffered(&self) -> usize {
        self.replay.len()
    }

    /// Ingest a finished episode and, when enough data has accumulated,
    /// train and push a fresh parameter table into `store`.
    ///
    /// `trajectory` is `None` when the episode recorder discarded a
    /// too-short episode.
    pub fn on_episode_end(
        &mut self,
        trajectory: Option<Vec<TrajectorySample>>,
        store: &mut ParamStore,
    ) -> TrainingOutcome {
        self.episodes += 1;

        let Some(trajectory) = trajectory else {
            return TrainingOutcome::Skipped {
                reason: SkipReason::EpisodeTooShort,
            };
        };

        self.replay.extend(trajectory);

        if self.replay.len() < self.cfg.min_buffer_for_training {
            return TrainingOutcome::Skipped {
                reason: SkipReason::BufferTooSmall,
            };
        }

        match self.train_and_adjust(store) {
            Ok((samples, loss)) => TrainingOutcome::Trained {
                samples,
                loss,
                params: store.get().clone(),
            },
            Err(err) => TrainingOutcome::Failed {
                error: format!("{err:#}"),
            },
        }
    }

    fn train_and_adjust(&mut self, store: &mut ParamStore) -> anyhow::Result<(usize, f64)> {
        let batch_size = self.cfg.batch_size.min(self.replay.len());
        let batch = self.replay.sample_weighted(batch_size, &mut self.rng);

        let features: Vec<Vec<f64>> = batch.iter().map(|s| s.features.to_vec()).collect();
        let labels: Vec<f64> = batch.iter().map(|s| s.action).collect();

        let loss = self.model.fit(&features, &labels, 1)?;

        // Probe the trained model with synthetic contexts and average the
        // per-parameter adjustments across probes.
        let probes = probe_features(&mut self.rng, self.cfg.probe_batch);
        let predictions = self.model.predict(&probes)?;

        let mut adjustments = vec![0.0; PARAM_COUNT];
        for row in &predictions {
            for (acc, v) in adjustments.iter_mut().zip(row) {
                *acc += v;
            }
        }
        let count = predictions.len().max(1) as f64;
        for acc in &mut adjustments {
            *acc /= count;
        }

        store.apply_adjustments(&adjustments);

        Ok((batch_size, loss))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rl::features::FEATURE_DIM;
    use anyhow::bail;

    fn learning_cfg() -> LearningConfig {
        crate::config::Config::default().learning
    }

    fn trajectory(len: usize) -> Vec<TrajectorySample> {
        (0..len)
            .map(|i| TrajectorySample {
                features: [i as f64 / len as f64; FEATURE_DIM],
                action: (i % 2) as f64,
                ret: 1.0,
            })
            .collect()
    }

    /// Approximator stub returning a constant adjustment vector.
    struct ConstantModel {
        adjustment: f64,
    }

    impl FunctionApproximator for ConstantModel {
        fn fit(&mut self, _f: &[Vec<f64>], _l: &[f64], _e: usize) -> anyhow::Result<f64> {
            Ok(0.123)
        }
        fn predict(&self, features: &[Vec<f64>]) -> anyhow::Result<Vec<Vec<f64>>> {
            Ok(features
                .iter()
                .map(|_| vec![self.adjustment; PARAM_COUNT])
                .collect())
        }
        fn output_dim(&self) -> usize {
            PARAM_COUNT
        }
    }

    /// Approximator stub that always fails.
    struct BrokenModel;

    impl FunctionApproximator for BrokenModel {
        fn fit(&mut self, _f: &[Vec<f64>], _l: &[f64], _e: usize) -> anyhow::Result<f64> {
            bail!("backend unavailable")
        }
        fn predict(&self, _features: &[Vec<f64>]) -> anyhow::Result<Vec<Vec<f64>>> {
            bail!("backend unavailable")
        }
        fn output_dim(&self) -> usize {
            PARAM_COUNT
        }
    }

    #[test]
    fn short_episode_is_skipped_without_touching_the_buffer() {
        let cfg = learning_cfg();
        let mut learner = Learner::with_model(&cfg, Box::new(ConstantModel { adjustment: 0.5 }));
        let mut store = ParamStore::new();

        // The recorder hands the learner `None` for a 4-step episode.
        let outcome = learner.on_episode_end(None, &mut store);
        assert!(matches!(
            outcome,
            TrainingOutcome::Skipped {
                reason: SkipReason::EpisodeTooShort
            }
        ));
        assert_eq!(learner.buffered(), 0);
        assert_eq!(store.get(), &ParamSet::default());
    }

    #[test]
    fn minimum_episode_appends_but_does_not_train_below_floor() {
        let cfg = learning_cfg();
        let mut learner = Learner::with_model(&cfg, Box::new(ConstantModel { adjustment: 0.5 }));
        let mut store = ParamStore::new();

        let outcome = learner.on_episode_end(Some(trajectory(5)), &mut store);
        assert!(matches!(
            outcome,
            TrainingOutcome::Skipped {
                reason: SkipReason::BufferTooSmall
            }
        ));
        assert_eq!(learner.buffered(), 5);
        assert_eq!(store.get(), &ParamSet::default());
    }

    #[test]
    fn training_applies_averaged_adjustments_to_the_store() {
        let cfg = learning_cfg();
        let mut learner = Learner::with_model(&cfg, Box::new(ConstantModel { adjustment: 1.0 }));
        let mut store = ParamStore::new();

        let outcome = learner.on_episode_end(Some(trajectory(120)), &mut store);
        match outcome {
            TrainingOutcome::Trained { samples, loss, params } => {
                assert_eq!(samples, cfg.batch_size);
                assert!((loss - 0.123).abs() < 1e-12);
                // +1 adjustment on a Threshold-role param: 60 * 1.25.
                assert!((params.small_cactus_base - 75.0).abs() < 1e-9);
                assert_eq!(&params, store.get());
            }
            other => panic!("expected Trained, got {other:?}"),
        }
        assert_eq!(store.history().len(), 1);
    }

    #[test]
    fn batch_is_capped_by_buffer_when_floor_is_lowered() {
        let mut cfg = learning_cfg();
        cfg.min_buffer_for_training = 10;
        cfg.batch_size = 64;
        let mut learner = Learner::with_model(&cfg, Box::new(ConstantModel { adjustment: 0.0 }));
        let mut store = ParamStore::new();

        let outcome = learner.on_episode_end(Some(trajectory(12)), &mut store);
        match outcome {
            TrainingOutcome::Trained { samples, .. } => assert_eq!(samples, 12),
            other => panic!("expected Trained, got {other:?}"),
        }
    }

    #[test]
    fn approximator_failure_is_caught_and_buffer_retained() {
        let cfg = learning_cfg();
        let mut learner = Learner::with_model(&cfg, Box::new(BrokenModel));
        let mut store = ParamStore::new();

        let outcome = learner.on_episode_end(Some(trajectory(150)), &mut store);
        match outcome {
            TrainingOutcome::Failed { error } => assert!(error.contains("backend unavailable")),
            other => panic!("expected Failed, got {other:?}"),
        }
        // Data survives for the next attempt; parameters untouched.
        assert_eq!(learner.buffered(), 150);
        assert_eq!(store.get(), &ParamSet::default());
    }

    #[test]
    fn end_to_end_with_real_mlp_trains_and_clamps() {
        let mut cfg = learning_cfg();
        cfg.hidden_dims = [16, 8];
        let mut learner = Learner::new(&cfg);
        let mut store = ParamStore::new();

        let outcome = learner.on_episode_end(Some(trajectory(200)), &mut store);
        assert!(outcome.trained());

        let defaults = ParamSet::default().to_vec();
        for (value, default) in store.get().to_vec().iter().zip(&defaults) {
            assert!(*value >= default * 0.5 - 1e-12);
            assert!(*value <= default * 1.5 + 1e-12);
        }
    }
}
