//! Exact t-SNE projection to two dimensions.
//!
//! Pairwise affinities are computed over every pair of rows, so the cost is
//! quadratic in the number of notes.

use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;
use tracing::debug;

use crate::config::{
    Number, DEFAULT_ITERATIONS, DEFAULT_LEARNING_RATE, DEFAULT_PERPLEXITY, DEFAULT_SEED,
};
use crate::error::{Error, Result};
use crate::note::Point2D;
use crate::vector_ops::squared_euclidean_simd;

const EARLY_EXAGGERATION: f64 = 12.0;
const EXPLORATION_ITERATIONS: usize = 250;
const MIN_ITERATIONS: usize = 250;
const ITERATION_CHECK: usize = 50;
const ITERATIONS_WITHOUT_PROGRESS: usize = 300;
const MIN_GRAD_NORM: f64 = 1e-7;
const MIN_GAIN: f64 = 0.01;
const PERPLEXITY_TOLERANCE: f64 = 1e-5;
const PERPLEXITY_STEPS: usize = 100;
const INIT_SCALE: f64 = 1e-4;
const MACHINE_EPSILON: f64 = f64::EPSILON;

/// Reduces high-dimensional rows to 2D points, one per row, in input order.
pub trait Projection {
    fn fit_transform(&self, data: &[Vec<Number>]) -> Result<Vec<Point2D>>;
}

#[derive(Debug, Clone)]
pub struct Tsne {
    perplexity: f64,
    iterations: usize,
    learning_rate: f64,
    seed: u64,
}

impl Default for Tsne {
    fn default() -> Self {
        Self::new(DEFAULT_PERPLEXITY, DEFAULT_ITERATIONS, DEFAULT_LEARNING_RATE)
    }
}

impl Tsne {
    pub fn new(perplexity: f64, iterations: usize, learning_rate: f64) -> Self {
        Self {
            perplexity,
            iterations,
            learning_rate,
            seed: DEFAULT_SEED,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Perplexity actually used for `n` points: never more than `n - 1`.
    pub fn effective_perplexity(&self, n: usize) -> f64 {
        self.perplexity.min(n.saturating_sub(1) as f64)
    }

    fn validate(&self, n: usize) -> Result<()> {
        if n < 2 {
            return Err(Error::InvalidParameter {
                name: "data",
                message: format!("need at least 2 points, got {}", n),
            });
        }
        if !(self.perplexity > 0.0) {
            return Err(Error::InvalidParameter {
                name: "perplexity",
                message: "must be positive".to_string(),
            });
        }
        if !(self.learning_rate > 0.0) {
            return Err(Error::InvalidParameter {
                name: "learning_rate",
                message: "must be positive".to_string(),
            });
        }
        if self.iterations < MIN_ITERATIONS {
            return Err(Error::InvalidParameter {
                name: "iterations",
                message: format!("should be at least {}", MIN_ITERATIONS),
            });
        }
        Ok(())
    }

    fn pairwise_distances(data: &[Vec<Number>]) -> Result<Vec<Vec<f64>>> {
        let width = data[0].len();
        data.par_iter()
            .map(|a| {
                data.iter()
                    .map(|b| {
                        squared_euclidean_simd(a, b)
                            .map(|d| d as f64)
                            .ok_or(Error::DimensionMismatch {
                                expected: width,
                                found: b.len(),
                            })
                    })
                    .collect::<Result<Vec<f64>>>()
            })
            .collect()
    }

    /// Symmetric joint probabilities from per-row conditional distributions
    /// whose entropy matches `ln(perplexity)`.
    fn joint_probabilities(distances: &[Vec<f64>], perplexity: f64) -> Vec<Vec<f64>> {
        let n = distances.len();
        let target_entropy = perplexity.ln();

        let conditional: Vec<Vec<f64>> = distances
            .par_iter()
            .enumerate()
            .map(|(i, row)| Self::conditional_row(i, row, target_entropy))
            .collect();

        let mut total = 0.0;
        let mut joint = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..n {
                let p = conditional[i][j] + conditional[j][i];
                joint[i][j] = p;
                total += p;
            }
        }
        let total = total.max(MACHINE_EPSILON);
        for i in 0..n {
            for j in 0..n {
                joint[i][j] = if i == j {
                    0.0
                } else {
                    (joint[i][j] / total).max(MACHINE_EPSILON)
                };
            }
        }
        joint
    }

    fn conditional_row(i: usize, distances: &[f64], target_entropy: f64) -> Vec<f64> {
        let n = distances.len();
        let mut beta = 1.0;
        let mut beta_min = f64::NEG_INFINITY;
        let mut beta_max = f64::INFINITY;
        let mut row = vec![0.0; n];

        for _ in 0..PERPLEXITY_STEPS {
            let mut sum = 0.0;
            for j in 0..n {
                row[j] = if j == i {
                    0.0
                } else {
                    (-distances[j] * beta).exp()
                };
                sum += row[j];
            }
            if sum == 0.0 {
                sum = MACHINE_EPSILON;
            }

            let mut weighted = 0.0;
            for j in 0..n {
                row[j] /= sum;
                weighted += distances[j] * row[j];
            }
            let entropy = sum.ln() + beta * weighted;
            let diff = entropy - target_entropy;

            if diff.abs() <= PERPLEXITY_TOLERANCE {
                break;
            }

            if diff > 0.0 {
                beta_min = beta;
                beta = if beta_max == f64::INFINITY {
                    beta * 2.0
                } else {
                    (beta + beta_max) / 2.0
                };
            } else {
                beta_max = beta;
                beta = if beta_min == f64::NEG_INFINITY {
                    beta / 2.0
                } else {
                    (beta + beta_min) / 2.0
                };
            }
        }
        row
    }

    fn initial_embedding(&self, n: usize) -> Result<Vec<[f64; 2]>> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let normal = Normal::new(0.0, 1.0).map_err(|e| Error::InvalidParameter {
            name: "init",
            message: e.to_string(),
        })?;
        Ok((0..n)
            .map(|_| {
                [
                    INIT_SCALE * normal.sample(&mut rng),
                    INIT_SCALE * normal.sample(&mut rng),
                ]
            })
            .collect())
    }

    /// KL divergence and its gradient for the current embedding.
    fn kl_gradient(p: &[Vec<f64>], y: &[[f64; 2]], exaggeration: f64) -> (f64, Vec<[f64; 2]>) {
        let n = y.len();

        // Student-t kernel, one degree of freedom.
        let kernel: Vec<Vec<f64>> = y
            .par_iter()
            .enumerate()
            .map(|(i, yi)| {
                y.iter()
                    .enumerate()
                    .map(|(j, yj)| {
                        if i == j {
                            0.0
                        } else {
                            let dx = yi[0] - yj[0];
                            let dy = yi[1] - yj[1];
                            1.0 / (1.0 + dx * dx + dy * dy)
                        }
                    })
                    .collect()
            })
            .collect();

        let kernel_sum: f64 = kernel.iter().map(|r| r.iter().sum::<f64>()).sum();
        let kernel_sum = kernel_sum.max(MACHINE_EPSILON);

        let (kl, grad): (Vec<f64>, Vec<[f64; 2]>) = (0..n)
            .into_par_iter()
            .map(|i| {
                let mut g = [0.0, 0.0];
                let mut kl = 0.0;
                for j in 0..n {
                    if i == j {
                        continue;
                    }
                    let pij = p[i][j] * exaggeration;
                    let qij = (kernel[i][j] / kernel_sum).max(MACHINE_EPSILON);
                    kl += pij * (pij.max(MACHINE_EPSILON) / qij).ln();
                    let mult = (pij - qij) * kernel[i][j];
                    g[0] += mult * (y[i][0] - y[j][0]);
                    g[1] += mult * (y[i][1] - y[j][1]);
                }
                (kl, [4.0 * g[0], 4.0 * g[1]])
            })
            .unzip();

        (kl.iter().sum(), grad)
    }

    #[allow(clippy::too_many_arguments)]
    fn gradient_descent(
        &self,
        p: &[Vec<f64>],
        y: &mut [[f64; 2]],
        update: &mut [[f64; 2]],
        gains: &mut [[f64; 2]],
        start: usize,
        stop: usize,
        momentum: f64,
        exaggeration: f64,
        without_progress: usize,
    ) -> usize {
        let mut best_error = f64::INFINITY;
        let mut best_iter = start;
        let mut iteration = start;

        while iteration < stop {
            let (error, grad) = Self::kl_gradient(p, y, exaggeration);

            let mut grad_norm = 0.0;
            for i in 0..y.len() {
                for d in 0..2 {
                    let g = grad[i][d];
                    if update[i][d] * g < 0.0 {
                        gains[i][d] += 0.2;
                    } else {
                        gains[i][d] *= 0.8;
                    }
                    gains[i][d] = gains[i][d].max(MIN_GAIN);
                    let g = g * gains[i][d];
                    update[i][d] = momentum * update[i][d] - self.learning_rate * g;
                    y[i][d] += update[i][d];
                    grad_norm += grad[i][d] * grad[i][d];
                }
            }
            let grad_norm = grad_norm.sqrt();
            iteration += 1;

            if (iteration - start) % ITERATION_CHECK == 0 || iteration == stop {
                debug!(iteration, error, grad_norm, "t-SNE progress");
                if error < best_error {
                    best_error = error;
                    best_iter = iteration;
                } else if iteration - best_iter > without_progress {
                    debug!(iteration, "t-SNE stopped: no progress");
                    break;
                }
                if grad_norm <= MIN_GRAD_NORM {
                    debug!(iteration, grad_norm, "t-SNE stopped: gradient converged");
                    break;
                }
            }
        }
        iteration
    }
}

impl Projection for Tsne {
    fn fit_transform(&self, data: &[Vec<Number>]) -> Result<Vec<Point2D>> {
        let n = data.len();
        self.validate(n)?;

        let perplexity = self.effective_perplexity(n);
        debug!(
            points = n,
            perplexity,
            iterations = self.iterations,
            learning_rate = self.learning_rate,
            "Running t-SNE"
        );

        let distances = Self::pairwise_distances(data)?;
        let p = Self::joint_probabilities(&distances, perplexity);

        let mut y = self.initial_embedding(n)?;
        let mut update = vec![[0.0, 0.0]; n];
        let mut gains = vec![[1.0, 1.0]; n];

        let explored = self.gradient_descent(
            &p,
            &mut y,
            &mut update,
            &mut gains,
            0,
            EXPLORATION_ITERATIONS,
            0.5,
            EARLY_EXAGGERATION,
            EXPLORATION_ITERATIONS,
        );

        if self.iterations > explored {
            self.gradient_descent(
                &p,
                &mut y,
                &mut update,
                &mut gains,
                explored,
                self.iterations,
                0.8,
                1.0,
                ITERATIONS_WITHOUT_PROGRESS,
            );
        }

        Ok(y
            .into_iter()
            .map(|[x, y]| Point2D::new(x as Number, y as Number))
            .collect())
    }
}
