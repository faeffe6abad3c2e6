//! Isolation Forest anomaly scores.
//!
//! Scores follow Liu et al.: `s(x) = 2^(-E[h(x)] / c(psi))` where `psi` is
//! the per-tree subsample size. Points near 1.0 are isolated quickly.

use rand::prelude::*;
use rand::seq::index;

/// Euler-Mascheroni constant used in the harmonic number approximation.
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Largest per-tree subsample.
const MAX_SAMPLES: usize = 256;

#[derive(Debug, Clone)]
pub struct IsolationForest {
    pub n_trees: usize,
    pub seed: u64,
}

enum Node {
    Split {
        feature: usize,
        value: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        size: usize,
    },
}

impl IsolationForest {
    pub fn new(n_trees: usize, seed: u64) -> Self {
        Self { n_trees, seed }
    }

    /// Anomaly score in (0, 1] for every row of `data`.
    ///
    /// Rows must all have the same number of finite features.
    pub fn score(&self, data: &[Vec<f64>]) -> Vec<f64> {
        let n = data.len();
        if n < 2 || self.n_trees == 0 || data[0].is_empty() {
            return vec![0.5; n];
        }

        let psi = n.min(MAX_SAMPLES);
        let max_depth = (psi as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let trees: Vec<Node> = (0..self.n_trees)
            .map(|_| {
                let sample: Vec<&[f64]> = index::sample(&mut rng, n, psi)
                    .into_iter()
                    .map(|i| data[i].as_slice())
                    .collect();
                build(&sample, max_depth, &mut rng)
            })
            .collect();

        let norm = average_path(psi);
        data.iter()
            .map(|row| {
                let mean_depth = trees.iter().map(|t| path_length(row, t, 0)).sum::<f64>()
                    / self.n_trees as f64;
                if norm > 0.0 {
                    2f64.powf(-mean_depth / norm)
                } else {
                    0.5
                }
            })
            .collect()
    }
}

fn build(rows: &[&[f64]], depth_left: usize, rng: &mut StdRng) -> Node {
    if rows.len() <= 1 || depth_left == 0 {
        return Node::Leaf { size: rows.len() };
    }

    let feature = rng.gen_range(0..rows[0].len());
    let (min, max) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| {
        (lo.min(r[feature]), hi.max(r[feature]))
    });
    if max - min <= f64::EPSILON {
        return Node::Leaf { size: rows.len() };
    }

    let value = rng.gen_range(min..max);
    let (left, right): (Vec<&[f64]>, Vec<&[f64]>) =
        rows.iter().copied().partition(|r| r[feature] < value);
    if left.is_empty() || right.is_empty() {
        return Node::Leaf { size: rows.len() };
    }

    Node::Split {
        feature,
        value,
        left: Box::new(build(&left, depth_left - 1, rng)),
        right: Box::new(build(&right, depth_left - 1, rng)),
    }
}

fn path_length(row: &[f64], node: &Node, depth: usize) -> f64 {
    match node {
        Node::Leaf { size } => depth as f64 + average_path(*size),
        Node::Split {
            feature,
            value,
            left,
            right,
        } => {
            let next = if row[*feature] < *value { left } else { right };
            path_length(row, next, depth + 1)
        }
    }
}

/// Average unsuccessful-search path length in a BST of `n` nodes, c(n).
fn average_path(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}
