// src/rl/model.rs
//
// Function-approximator seam for the learning loop.
//
// The learning protocol (batch construction, probe averaging, clamped
// parameter application) only depends on the trait below; any numerical
// backend with the same two operations is substitutable. The in-tree
// implementation is a small dense MLP matching the topology the adjustment
// protocol expects: FEATURE_DIM inputs, two hidden layers, PARAM_COUNT
// tanh outputs in [-1, 1].

use anyhow::{bail, Result};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::params::PARAM_COUNT;

use super::features::FEATURE_DIM;

/// Trainable mapping from feature vectors to per-parameter adjustments.
pub trait FunctionApproximator {
    /// One training pass over the batch against scalar action labels
    /// (broadcast across all outputs). Returns the final mean loss.
    fn fit(&mut self, features: &[Vec<f64>], labels: &[f64], epochs: usize) -> Result<f64>;

    /// Forward pass for a batch; each output row has `output_dim()` entries
    /// in [-1, 1].
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<Vec<f64>>>;

    fn output_dim(&self) -> usize;
}

/// One dense layer, weights stored row-major (out x in).
#[derive(Debug, Clone)]
struct DenseLayer {
    weights: Vec<f64>,
    biases: Vec<f64>,
    inputs: usize,
    outputs: usize,
}

impl DenseLayer {
    fn new(inputs: usize, outputs: usize, rng: &mut ChaCha8Rng) -> Self {
        // Uniform Xavier-style init keeps the tanh head in its linear range
        // at the start of training.
        let bound = (6.0 / (inputs + outputs) as f64).sqrt();
        let weights = (0..inputs * outputs)
            .map(|_| rng.gen_range(-bound..bound))
            .collect();
        Self {
            weights,
            biases: vec![0.0; outputs],
            inputs,
            outputs,
        }
    }

    fn forward(&self, input: &[f64]) -> Vec<f64> {
        let mut out = self.biases.clone();
        for (o, out_val) in out.iter_mut().enumerate() {
            let row = &self.weights[o * self.inputs..(o + 1) * self.inputs];
            *out_val += row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>();
        }
        out
    }
}

fn relu(z: &[f64]) -> Vec<f64> {
    z.iter().map(|v| v.max(0.0)).collect()
}

/// Small dense MLP trained with plain SGD on mean-squared error.
pub struct MlpApproximator {
    hidden1: DenseLayer,
    hidden2: DenseLayer,
    output: DenseLayer,
    learning_rate: f64,
}

impl MlpApproximator {
    pub fn new(hidden_dims: [usize; 2], learning_rate: f64, rng: &mut ChaCha8Rng) -> Self {
        let [h1, h2] = hidden_dims;
        Self {
            hidden1: DenseLayer::new(FEATURE_DIM, h1, rng),
            hidden2: DenseLayer::new(h1, h2, rng),
            output: DenseLayer::new(h2, PARAM_COUNT, rng),
            learning_rate,
        }
    }

    /// Forward pass keeping the intermediate activations for backprop.
    fn forward_cached(&self, input: &[f64]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let a1 = relu(&self.hidden1.forward(input));
        let a2 = relu(&self.hidden2.forward(&a1));
        let y = self
            .output
            .forward(&a2)
            .iter()
            .map(|z| z.tanh())
            .collect();
        (a1, a2, y)
    }

    fn check_batch(&self, features: &[Vec<f64>]) -> Result<()> {
        if features.is_empty() {
            bail!("empty feature batch");
        }
        for (i, row) in features.iter().enumerate() {
            if row.len() != FEATURE_DIM {
                bail!(
                    "feature row {i} has {} entries, expected {FEATURE_DIM}",
                    row.len()
                );
            }
            if row.iter().any(|v| !v.is_finite()) {
                bail!("feature row {i} contains non-finite values");
            }
        }
        Ok(())
    }
}

impl FunctionApproximator for MlpApproximator {
    fn fit(&mut self, features: &[Vec<f64>], labels: &[f64], epochs: usize) -> Result<f64> {
        self.check_batch(features)?;
        if labels.len() != features.len() {
            bail!(
                "{} labels for {} feature rows",
                labels.len(),
                features.len()
            );
        }

        let batch = features.len() as f64;
        let outputs = PARAM_COUNT as f64;
        let mut mean_loss = 0.0;

        for _ in 0..epochs.max(1) {
            // Accumulated gradients for the epoch (batch gradient descent).
            let mut gw1 = vec![0.0; self.hidden1.weights.len()];
            let mut gb1 = vec![0.0; self.hidden1.outputs];
            let mut gw2 = vec![0.0; self.hidden2.weights.len()];
            let mut gb2 = vec![0.0; self.hidden2.outputs];
            let mut gw3 = vec![0.0; self.output.weights.len()];
            let mut gb3 = vec![0.0; self.output.outputs];
            let mut loss_sum = 0.0;

            for (input, label) in features.iter().zip(labels) {
                let (a1, a2, y) = self.forward_cached(input);

                // MSE of every output against the broadcast scalar label.
                let mut delta3 = vec![0.0; self.output.outputs];
                for (k, y_k) in y.iter().enumerate() {
                    let err = y_k - label;
                    loss_sum += err * err / outputs;
                    // d(mse)/dy * dtanh: (1 - y^2).
                    delta3[k] = 2.0 * err / outputs * (1.0 - y_k * y_k);
                }

                // Output layer gradients + backprop into hidden 2.
                let mut delta2 = vec![0.0; self.hidden2.outputs];
                for (k, d3) in delta3.iter().enumerate() {
                    gb3[k] += d3;
                    let row = k * self.output.inputs;
                    for (j, a2_j) in a2.iter().enumerate() {
                        gw3[row + j] += d3 * a2_j;
                        delta2[j] += d3 * self.output.weights[row + j];
                    }
                }
                for (j, d2) in delta2.iter_mut().enumerate() {
                    if a2[j] <= 0.0 {
                        *d2 = 0.0;
                    }
                }

                // Hidden 2 gradients + backprop into hidden 1.
                let mut delta1 = vec![0.0; self.hidden1.outputs];
                for (j, d2) in delta2.iter().enumerate() {
                    gb2[j] += d2;
                    let row = j * self.hidden2.inputs;
                    for (i, a1_i) in a1.iter().enumerate() {
                        gw2[row + i] += d2 * a1_i;
                        delta1[i] += d2 * self.hidden2.weights[row + i];
                    }
                }
                for (i, d1) in delta1.iter_mut().enumerate() {
                    if a1[i] <= 0.0 {
                        *d1 = 0.0;
                    }
                }

                // Hidden 1 gradients.
                for (i, d1) in delta1.iter().enumerate() {
                    gb1[i] += d1;
                    let row = i * self.hidden1.inputs;
                    for (x_idx, x) in input.iter().enumerate() {
                        gw1[row + x_idx] += d1 * x;
                    }
                }
            }

            let step = self.learning_rate / batch;
            apply_gradients(&mut self.hidden1, &gw1, &gb1, step);
            apply_gradients(&mut self.hidden2, &gw2, &gb2, step);
            apply_gradients(&mut self.output, &gw3, &gb3, step);

            mean_loss = loss_sum / batch;
        }

        Ok(mean_loss)
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        self.check_batch(features)?;
        Ok(features
            .iter()
            .map(|input| self.forward_cached(input).2)
            .collect())
    }

    fn output_dim(&self) -> usize {
        PARAM_COUNT
    }
}

fn apply_gradients(layer: &mut DenseLayer, gw: &[f64], gb: &[f64], step: f64) {
    for (w, g) in layer.weights.iter_mut().zip(gw) {
        *w -= step * g;
    }
    for (b, g) in layer.biases.iter_mut().zip(gb) {
        *b -= step * g;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn approximator() -> MlpApproximator {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        MlpApproximator::new([16, 8], 0.05, &mut rng)
    }

    fn batch(n: usize) -> Vec<Vec<f64>> {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        (0..n)
            .map(|_| (0..FEATURE_DIM).map(|_| rng.gen::<f64>()).collect())
            .collect()
    }

    #[test]
    fn predict_shape_and_range() {
        let model = approximator();
        let outputs = model.predict(&batch(4)).unwrap();
        assert_eq!(outputs.len(), 4);
        for row in outputs {
            assert_eq!(row.len(), PARAM_COUNT);
            for v in row {
                assert!((-1.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn fit_reduces_loss_on_a_constant_target() {
        let mut model = approximator();
        let features = batch(16);
        let labels = vec![1.0; 16];

        let first = model.fit(&features, &labels, 1).unwrap();
        let mut last = first;
        for _ in 0..50 {
            last = model.fit(&features, &labels, 1).unwrap();
        }
        assert!(last < first, "loss did not decrease: {first} -> {last}");
    }

    #[test]
    fn malformed_batches_are_rejected() {
        let mut model = approximator();
        assert!(model.fit(&[], &[], 1).is_err());
        assert!(model.fit(&[vec![0.0; 3]], &[1.0], 1).is_err());
        assert!(model.fit(&batch(2), &[1.0], 1).is_err());
        assert!(model.predict(&[vec![f64::NAN; FEATURE_DIM]]).is_err());
    }

    #[test]
    fn same_seed_builds_identical_models() {
        let a = approximator();
        let b = approximator();
        let input = batch(1);
        assert_eq!(a.predict(&input).unwrap(), b.predict(&input).unwrap());
    }
}
