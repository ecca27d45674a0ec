//! Markov clustering: alternate flow expansion and inflation on a
//! column-stochastic matrix until it stops changing, then read clusters off
//! the surviving non-zero pattern.

use super::{ClusteringError, WeightedGraph};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MclParams {
    /// Matrix power applied in each expansion step.
    pub expansion: u32,
    /// Element-wise exponent applied in each inflation step.
    pub inflation: f64,
    /// Weight of the self loop added to every node.
    pub loop_value: f64,
    pub iterations: usize,
    /// Entries below this are zeroed after inflation; `0` disables pruning.
    pub pruning_threshold: f64,
    /// Relative tolerance of the convergence check.
    pub tolerance: f64,
}

impl Default for MclParams {
    fn default() -> Self {
        Self {
            expansion: 2,
            inflation: 2.0,
            loop_value: 1.0,
            iterations: 100,
            pruning_threshold: 0.001,
            tolerance: 1e-5,
        }
    }
}

const ABSOLUTE_TOLERANCE: f64 = 1e-8;

impl MclParams {
    pub fn validate(&self) -> Result<(), ClusteringError> {
        let invalid = |name, reason: &str| {
            Err(ClusteringError::InvalidParameter {
                name,
                reason: reason.to_string(),
            })
        };
        if self.expansion < 1 {
            return invalid("expansion", "must be at least 1");
        }
        if !(self.inflation.is_finite() && self.inflation > 0.0) {
            return invalid("inflation", "must be a positive number");
        }
        if !(self.loop_value.is_finite() && self.loop_value >= 0.0) {
            return invalid("loop_value", "must be a non-negative number");
        }
        if self.iterations == 0 {
            return invalid("iterations", "must be at least 1");
        }
        if !(self.pruning_threshold.is_finite() && self.pruning_threshold >= 0.0) {
            return invalid("pruning_threshold", "must be a non-negative number");
        }
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return invalid("tolerance", "must be a non-negative number");
        }
        Ok(())
    }
}

pub(crate) fn cluster(graph: &WeightedGraph, params: &MclParams) -> Vec<usize> {
    let n = graph.node_count;
    if n == 0 {
        return Vec::new();
    }

    let mut matrix = DMatrix::<f64>::zeros(n, n);
    for &(u, v, w) in &graph.edges {
        matrix[(u, v)] = w;
        matrix[(v, u)] = w;
    }
    if params.loop_value > 0.0 {
        matrix.fill_diagonal(params.loop_value);
    }
    normalize_columns(&mut matrix);

    for iteration in 1..=params.iterations {
        let previous = matrix.clone();
        matrix = expand(&matrix, params.expansion);
        inflate(&mut matrix, params.inflation);
        if params.pruning_threshold > 0.0 {
            prune(&mut matrix, params.pruning_threshold);
        }
        if converged(&matrix, &previous, params.tolerance) {
            debug!(iteration, "Markov clustering converged.");
            break;
        }
        trace!(iteration, "Markov clustering iteration done.");
    }

    components(&matrix)
}

fn normalize_columns(matrix: &mut DMatrix<f64>) {
    for mut column in matrix.column_iter_mut() {
        let sum = column.sum();
        if sum > 0.0 {
            column /= sum;
        }
    }
}

fn expand(matrix: &DMatrix<f64>, power: u32) -> DMatrix<f64> {
    let mut result = matrix.clone();
    for _ in 1..power {
        result = &result * matrix;
    }
    result
}

fn inflate(matrix: &mut DMatrix<f64>, power: f64) {
    matrix.apply(|value| *value = value.powf(power));
    normalize_columns(matrix);
}

/// Zeroes small entries but always keeps the largest entry of each column.
fn prune(matrix: &mut DMatrix<f64>, threshold: f64) {
    for mut column in matrix.column_iter_mut() {
        let keep = column.imax();
        for (row, value) in column.iter_mut().enumerate() {
            if row != keep && *value < threshold {
                *value = 0.0;
            }
        }
    }
}

fn converged(current: &DMatrix<f64>, previous: &DMatrix<f64>, tolerance: f64) -> bool {
    current
        .iter()
        .zip(previous.iter())
        .all(|(a, b)| (a - b).abs() <= ABSOLUTE_TOLERANCE + tolerance * b.abs())
}

/// Connected components of the non-zero pattern, numbered by smallest member.
fn components(matrix: &DMatrix<f64>) -> Vec<usize> {
    let n = matrix.nrows();
    let mut parent: Vec<usize> = (0..n).collect();

    fn find(parent: &mut [usize], mut node: usize) -> usize {
        while parent[node] != node {
            parent[node] = parent[parent[node]];
            node = parent[node];
        }
        node
    }

    for col in 0..n {
        for row in 0..n {
            if row != col && matrix[(row, col)] > 0.0 {
                let (a, b) = (find(&mut parent, row), find(&mut parent, col));
                if a != b {
                    parent[a.max(b)] = a.min(b);
                }
            }
        }
    }

    let mut labels = vec![usize::MAX; n];
    let mut next = 0;
    (0..n)
        .map(|node| {
            let root = find(&mut parent, node);
            if labels[root] == usize::MAX {
                labels[root] = next;
                next += 1;
            }
            labels[root]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(node_count: usize, edges: &[(usize, usize)]) -> WeightedGraph {
        WeightedGraph {
            node_count,
            edges: edges.iter().map(|&(u, v)| (u, v, 1.0)).collect(),
        }
    }

    #[test]
    fn disconnected_triangles_form_separate_clusters() {
        let g = graph(6, &[(0, 1), (0, 2), (1, 2), (3, 4), (3, 5), (4, 5)]);
        let cluster = cluster(&g, &MclParams::default());

        assert_eq!(cluster, vec![0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn isolated_nodes_stay_alone() {
        let g = graph(4, &[(1, 2)]);
        let cluster = cluster(&g, &MclParams::default());

        assert_eq!(cluster[1], cluster[2]);
        assert_eq!(cluster[0], 0);
        assert_ne!(cluster[3], cluster[1]);
        assert_ne!(cluster[3], cluster[0]);
    }

    #[test]
    fn columns_are_stochastic_after_normalization() {
        let mut m = DMatrix::from_row_slice(2, 2, &[1.0, 3.0, 1.0, 0.0]);
        normalize_columns(&mut m);
        assert!((m.column(0).sum() - 1.0).abs() < 1e-12);
        assert!((m.column(1).sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pruning_keeps_each_column_maximum() {
        let mut m = DMatrix::from_column_slice(2, 2, &[0.0005, 0.0002, 0.9, 0.1]);
        prune(&mut m, 0.001);
        assert_eq!(m[(0, 0)], 0.0005);
        assert_eq!(m[(1, 0)], 0.0);
        assert_eq!(m[(1, 1)], 0.1);
    }

    #[test]
    fn components_are_numbered_by_smallest_member() {
        let m = DMatrix::from_row_slice(3, 3, &[0.0, 0.0, 0.0, 0.0, 0.5, 0.0, 1.0, 0.0, 1.0]);
        assert_eq!(components(&m), vec![0, 1, 0]);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let params = MclParams {
            inflation: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ClusteringError::InvalidParameter {
                name: "inflation",
                ..
            })
        ));
    }
}
