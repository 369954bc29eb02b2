//! DBSCAN: Density-Based Spatial Clustering of Applications with Noise.
//!
//! Groups projected points by neighborhood density. The number of clusters is
//! discovered from the data and isolated points are labeled [`NOISE`].
//!
//! - **Core point**: has at least `min_samples` points (itself included)
//!   within `eps`.
//! - **Border point**: within `eps` of a core point but not core itself.
//! - **Noise point**: neither.
//!
//! Cluster ids are assigned in input order starting at 0.

use crate::config::{Number, DEFAULT_DBSCAN_EPS, DEFAULT_DBSCAN_MIN_SAMPLES};
use crate::error::{Error, Result};
use crate::note::Point2D;

/// Cluster label for points not assigned to any cluster.
pub const NOISE: i32 = -1;

const UNCLASSIFIED: i32 = -2;

/// Common interface for hard clustering of projected points (one label per point).
pub trait Clustering {
    fn fit_predict(&self, points: &[Point2D]) -> Result<Vec<i32>>;
}

#[derive(Debug, Clone)]
pub struct Dbscan {
    eps: Number,
    min_samples: usize,
}

impl Default for Dbscan {
    fn default() -> Self {
        Self::new(DEFAULT_DBSCAN_EPS, DEFAULT_DBSCAN_MIN_SAMPLES)
    }
}

impl Dbscan {
    pub fn new(eps: Number, min_samples: usize) -> Self {
        Self { eps, min_samples }
    }

    pub fn with_eps(mut self, eps: Number) -> Self {
        self.eps = eps;
        self
    }

    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    fn region_query(&self, points: &[Point2D], idx: usize) -> Vec<usize> {
        let point = &points[idx];
        points
            .iter()
            .enumerate()
            .filter(|(other_idx, other)| *other_idx != idx && point.distance(other) <= self.eps)
            .map(|(other_idx, _)| other_idx)
            .collect()
    }

    fn expand_cluster(
        &self,
        points: &[Point2D],
        idx: usize,
        neighbors: Vec<usize>,
        labels: &mut [i32],
        visited: &mut [bool],
        cluster_id: i32,
    ) {
        labels[idx] = cluster_id;
        let mut to_process = neighbors;

        while let Some(next) = to_process.pop() {
            // Points first seen as noise can still become border points.
            if labels[next] == UNCLASSIFIED || labels[next] == NOISE {
                labels[next] = cluster_id;
            }
            if visited[next] {
                continue;
            }
            visited[next] = true;

            // Every neighbor of a core point joins the cluster, including
            // points already visited and labeled noise.
            let next_neighbors = self.region_query(points, next);
            if next_neighbors.len() + 1 >= self.min_samples {
                to_process.extend(next_neighbors);
            }
        }
    }
}

impl Clustering for Dbscan {
    fn fit_predict(&self, points: &[Point2D]) -> Result<Vec<i32>> {
        let n = points.len();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if !(self.eps > 0.0) {
            return Err(Error::InvalidParameter {
                name: "eps",
                message: "must be positive".to_string(),
            });
        }
        if self.min_samples == 0 {
            return Err(Error::InvalidParameter {
                name: "min_samples",
                message: "must be at least 1".to_string(),
            });
        }

        let mut labels = vec![UNCLASSIFIED; n];
        let mut visited = vec![false; n];
        let mut cluster_id = 0;

        for idx in 0..n {
            if visited[idx] {
                continue;
            }
            visited[idx] = true;

            let neighbors = self.region_query(points, idx);
            if neighbors.len() + 1 < self.min_samples {
                labels[idx] = NOISE;
                continue;
            }

            self.expand_cluster(points, idx, neighbors, &mut labels, &mut visited, cluster_id);
            cluster_id += 1;
        }

        Ok(labels)
    }
}

/// Number of distinct non-noise labels.
pub fn cluster_count(labels: &[i32]) -> usize {
    let mut seen: Vec<i32> = labels.iter().copied().filter(|&l| l != NOISE).collect();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}
