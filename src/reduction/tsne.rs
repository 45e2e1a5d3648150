//! Exact t-distributed stochastic neighbor embedding.
//!
//! Pairwise affinities are computed over all points (no space-partitioning approximation), so
//! this is intended for the small sets produced by word and document comparisons. `theta` is
//! carried in the parameters for configuration compatibility and logged, but the exact gradient
//! is always used.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const BETA_SEARCH_STEPS: usize = 50;
const ENTROPY_TOLERANCE: f64 = 1e-5;
const MIN_PROBABILITY: f64 = 1e-12;
const MIN_GAIN: f64 = 0.01;
const INITIAL_SPREAD: f64 = 1e-4;

/// Tuning knobs for [`neighbor_embedding`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborEmbeddingParams {
    pub perplexity: f64,
    pub theta: f64,
    pub learning_rate: f64,
    pub max_iterations: usize,
    pub seed: u64,
    pub early_exaggeration: f64,
    /// Iterations run with exaggerated affinities and low momentum.
    pub exaggeration_iterations: usize,
    pub initial_momentum: f64,
    pub final_momentum: f64,
}

impl Default for NeighborEmbeddingParams {
    fn default() -> Self {
        Self {
            perplexity: 0.65,
            theta: 0.5,
            learning_rate: 200.0,
            max_iterations: 1000,
            seed: 42,
            early_exaggeration: 12.0,
            exaggeration_iterations: 250,
            initial_momentum: 0.5,
            final_momentum: 0.8,
        }
    }
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("neighbor embedding needs at least 2 samples, got {0}")]
    TooFewSamples(usize),

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("embedding diverged at iteration {0}")]
    Diverged(usize),
}

/// Embed the rows of `data` into `target_dims` dimensions.
pub fn neighbor_embedding(
    data: &Array2<f64>,
    target_dims: usize,
    params: &NeighborEmbeddingParams,
) -> std::result::Result<Array2<f64>, TransformError> {
    let n = data.nrows();
    if n < 2 {
        return Err(TransformError::TooFewSamples(n));
    }
    if target_dims == 0 {
        return Err(TransformError::InvalidParameter {
            name: "target_dims",
            reason: "must be at least 1".to_string(),
        });
    }
    if !(params.perplexity > 0.0) || !params.perplexity.is_finite() {
        return Err(TransformError::InvalidParameter {
            name: "perplexity",
            reason: format!("must be a positive finite number, got {}", params.perplexity),
        });
    }
    if !(params.learning_rate > 0.0) {
        return Err(TransformError::InvalidParameter {
            name: "learning_rate",
            reason: format!("must be positive, got {}", params.learning_rate),
        });
    }

    tracing::debug!(
        samples = n,
        target_dims,
        perplexity = params.perplexity,
        theta = params.theta,
        iterations = params.max_iterations,
        "running neighbor embedding"
    );

    let distances = squared_distances(data);
    let p = joint_probabilities(&distances, params.perplexity);

    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut y = Array2::from_shape_fn((n, target_dims), |_| {
        rng.gen_range(-INITIAL_SPREAD..INITIAL_SPREAD)
    });
    let mut update = Array2::<f64>::zeros((n, target_dims));
    let mut gains = Array2::<f64>::ones((n, target_dims));
    let mut num = Array2::<f64>::zeros((n, n));

    for iteration in 0..params.max_iterations {
        let exaggerating = iteration < params.exaggeration_iterations;
        let exaggeration = if exaggerating {
            params.early_exaggeration
        } else {
            1.0
        };
        let momentum = if exaggerating {
            params.initial_momentum
        } else {
            params.final_momentum
        };

        // Student-t kernel over the current layout.
        let mut sum_num = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                let mut d2 = 0.0;
                for k in 0..target_dims {
                    let diff = y[[i, k]] - y[[j, k]];
                    d2 += diff * diff;
                }
                let q = 1.0 / (1.0 + d2);
                num[[i, j]] = q;
                num[[j, i]] = q;
                sum_num += 2.0 * q;
            }
        }
        if sum_num <= 0.0 || !sum_num.is_finite() {
            return Err(TransformError::Diverged(iteration));
        }

        for i in 0..n {
            for k in 0..target_dims {
                let mut grad = 0.0;
                for j in 0..n {
                    if i == j {
                        continue;
                    }
                    let q = (num[[i, j]] / sum_num).max(MIN_PROBABILITY);
                    grad += (exaggeration * p[[i, j]] - q) * num[[i, j]] * (y[[i, k]] - y[[j, k]]);
                }
                grad *= 4.0;

                let gain = &mut gains[[i, k]];
                *gain = if (grad > 0.0) != (update[[i, k]] > 0.0) {
                    *gain + 0.2
                } else {
                    (*gain * 0.8).max(MIN_GAIN)
                };
                update[[i, k]] = momentum * update[[i, k]] - params.learning_rate * *gain * grad;
            }
        }

        y += &update;
        for k in 0..target_dims {
            let mean = y.column(k).sum() / n as f64;
            y.column_mut(k).mapv_inplace(|v| v - mean);
        }

        if y.iter().any(|v| !v.is_finite()) {
            return Err(TransformError::Diverged(iteration));
        }
    }

    Ok(y)
}

fn squared_distances(data: &Array2<f64>) -> Array2<f64> {
    let n = data.nrows();
    let mut out = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in (i + 1)..n {
            let d2: f64 = data
                .row(i)
                .iter()
                .zip(data.row(j).iter())
                .map(|(a, b)| (a - b) * (a - b))
                .sum();
            out[[i, j]] = d2;
            out[[j, i]] = d2;
        }
    }
    out
}

/// Symmetrised input affinities. Each row's Gaussian bandwidth is searched so that the
/// conditional distribution's entropy matches `ln(perplexity)`.
///
/// Distances are shifted by the row minimum before exponentiating, which keeps the nearest
/// neighbor at weight 1. With perplexity below 1 the target entropy is unreachable and the
/// search saturates, concentrating each row on its nearest neighbors instead of producing NaN.
fn joint_probabilities(distances: &Array2<f64>, perplexity: f64) -> Array2<f64> {
    let n = distances.nrows();
    let target = perplexity.ln();
    let mut conditional = Array2::<f64>::zeros((n, n));
    let mut row = vec![0.0f64; n];

    for i in 0..n {
        let d_min = (0..n)
            .filter(|&j| j != i)
            .map(|j| distances[[i, j]])
            .fold(f64::INFINITY, f64::min);

        let mut beta = 1.0;
        let mut beta_min = f64::NEG_INFINITY;
        let mut beta_max = f64::INFINITY;

        for _ in 0..BETA_SEARCH_STEPS {
            let mut sum = 0.0;
            let mut weighted = 0.0;
            for j in 0..n {
                if j == i {
                    row[j] = 0.0;
                    continue;
                }
                let shifted = distances[[i, j]] - d_min;
                let w = (-shifted * beta).exp();
                row[j] = w;
                sum += w;
                weighted += shifted * w;
            }
            let entropy = sum.ln() + beta * weighted / sum;
            let diff = entropy - target;
            if diff.abs() < ENTROPY_TOLERANCE {
                break;
            }
            if diff > 0.0 {
                beta_min = beta;
                beta = if beta_max.is_infinite() {
                    beta * 2.0
                } else {
                    (beta + beta_max) / 2.0
                };
            } else {
                beta_max = beta;
                beta = if beta_min.is_infinite() {
                    beta / 2.0
                } else {
                    (beta + beta_min) / 2.0
                };
            }
        }

        let sum: f64 = row.iter().sum();
        for j in 0..n {
            conditional[[i, j]] = row[j] / sum;
        }
    }

    let scale = 2.0 * n as f64;
    let mut joint = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            if i != j {
                joint[[i, j]] =
                    ((conditional[[i, j]] + conditional[[j, i]]) / scale).max(MIN_PROBABILITY);
            }
        }
    }
    joint
}
