//! # Community Detection
//!
//! Partitions the nodes of a graph, or of every element of a packed batch,
//! into clusters with either Markov clustering ([`mcl`]) or greedy modularity
//! maximization ([`louvain`]).

use crate::core::graph::EdgeIndex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub mod louvain;
pub mod mcl;

pub use louvain::{LouvainParams, modularity};
pub use mcl::MclParams;

#[derive(Debug, Error, PartialEq)]
pub enum ClusteringError {
    #[error("Clustering method '{0}' is not supported (expected 'mcl' or 'louvain')")]
    UnsupportedMethod(String),
    #[error("Invalid clustering parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("Edge {edge} references node {index}, but the graph has {node_count} nodes")]
    NodeIndexOutOfRange {
        edge: usize,
        index: usize,
        node_count: usize,
    },
    #[error("Expected {expected} edge weights, got {found}")]
    WeightCountMismatch { expected: usize, found: usize },
    #[error("Edge weight {value} at edge {edge} must be finite and non-negative")]
    InvalidWeight { edge: usize, value: f64 },
    #[error("Batch assignment has {found} entries for {expected} nodes")]
    BatchLengthMismatch { expected: usize, found: usize },
    #[error("Edge {edge} connects nodes of different batch elements")]
    CrossBatchEdge { edge: usize },
}

/// Community detection algorithm together with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "kebab-case")]
pub enum ClusteringMethod {
    Mcl(MclParams),
    Louvain(LouvainParams),
}

impl Default for ClusteringMethod {
    fn default() -> Self {
        ClusteringMethod::Mcl(MclParams::default())
    }
}

impl ClusteringMethod {
    pub fn name(&self) -> &'static str {
        match self {
            ClusteringMethod::Mcl(_) => "mcl",
            ClusteringMethod::Louvain(_) => "louvain",
        }
    }

    pub fn validate(&self) -> Result<(), ClusteringError> {
        match self {
            ClusteringMethod::Mcl(params) => params.validate(),
            ClusteringMethod::Louvain(params) => params.validate(),
        }
    }

    /// The same method with the seed shifted for one batch element.
    fn for_batch_element(&self, element: usize) -> Self {
        match *self {
            ClusteringMethod::Louvain(params) => ClusteringMethod::Louvain(LouvainParams {
                seed: params.seed.map(|seed| seed.wrapping_add(element as u64)),
                ..params
            }),
            method => method,
        }
    }

    fn run(&self, graph: &WeightedGraph) -> Vec<usize> {
        match self {
            ClusteringMethod::Mcl(params) => mcl::cluster(graph, params),
            ClusteringMethod::Louvain(params) => louvain::cluster(graph, params),
        }
    }
}

impl FromStr for ClusteringMethod {
    type Err = ClusteringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mcl" | "markov" | "flow-based" => Ok(ClusteringMethod::Mcl(MclParams::default())),
            "louvain" | "modularity" => Ok(ClusteringMethod::Louvain(LouvainParams::default())),
            _ => Err(ClusteringError::UnsupportedMethod(s.to_string())),
        }
    }
}

impl fmt::Display for ClusteringMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Undirected weighted graph with deduplicated edges.
///
/// Each unordered node pair appears once; when the input lists the same pair
/// several times (for instance in both directions) the last weight wins.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WeightedGraph {
    pub(crate) node_count: usize,
    /// `(u, v, weight)` with `u <= v`, sorted.
    pub(crate) edges: Vec<(usize, usize, f64)>,
}

impl WeightedGraph {
    pub(crate) fn from_edge_index(
        edge_index: &EdgeIndex,
        node_count: usize,
        edge_weights: Option<&[f64]>,
    ) -> Result<Self, ClusteringError> {
        if let Some(weights) = edge_weights {
            if weights.len() != edge_index.len() {
                return Err(ClusteringError::WeightCountMismatch {
                    expected: edge_index.len(),
                    found: weights.len(),
                });
            }
        }

        let mut edges = BTreeMap::new();
        for (edge, (s, t)) in edge_index.iter().enumerate() {
            if let Some(index) = [s, t].into_iter().find(|&i| i >= node_count) {
                return Err(ClusteringError::NodeIndexOutOfRange {
                    edge,
                    index,
                    node_count,
                });
            }
            let weight = edge_weights.map_or(1.0, |w| w[edge]);
            if !(weight.is_finite() && weight >= 0.0) {
                return Err(ClusteringError::InvalidWeight {
                    edge,
                    value: weight,
                });
            }
            edges.insert((s.min(t), s.max(t)), weight);
        }

        Ok(Self {
            node_count,
            edges: edges.into_iter().map(|((u, v), w)| (u, v, w)).collect(),
        })
    }

    /// Induced subgraph on `nodes`, relabelled by position in `nodes`.
    fn subgraph(&self, nodes: &[usize], local: &[usize]) -> Self {
        let edges = self
            .edges
            .iter()
            .filter(|&&(u, _, _)| nodes.binary_search(&u).is_ok())
            .map(|&(u, v, w)| (local[u], local[v], w))
            .collect();
        Self {
            node_count: nodes.len(),
            edges,
        }
    }
}

/// Assigns every node a cluster id.
///
/// Without `batch` the whole graph is clustered once. With `batch`, nodes are
/// grouped by batch element and every element is clustered on its own; the
/// ids of element `k` then start at one past the largest id used by the
/// elements before it, so no cluster spans two elements.
#[instrument(skip_all, name = "community_detection", fields(method = %method, nodes = node_count))]
pub fn detect_communities(
    edge_index: &EdgeIndex,
    node_count: usize,
    edge_weights: Option<&[f64]>,
    method: &ClusteringMethod,
    batch: Option<&[usize]>,
) -> Result<Vec<usize>, ClusteringError> {
    method.validate()?;
    let graph = WeightedGraph::from_edge_index(edge_index, node_count, edge_weights)?;

    let Some(batch) = batch else {
        let cluster = method.run(&graph);
        debug!(clusters = cluster_count(&cluster), "Clustered graph.");
        return Ok(cluster);
    };

    if batch.len() != node_count {
        return Err(ClusteringError::BatchLengthMismatch {
            expected: node_count,
            found: batch.len(),
        });
    }
    if let Some(edge) = edge_index.iter().position(|(s, t)| batch[s] != batch[t]) {
        return Err(ClusteringError::CrossBatchEdge { edge });
    }

    let elements = batch.iter().max().map_or(0, |&max| max + 1);
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); elements];
    let mut local = vec![0; node_count];
    for (node, &element) in batch.iter().enumerate() {
        local[node] = members[element].len();
        members[element].push(node);
    }

    let cluster_element = |(element, nodes): (usize, &Vec<usize>)| {
        let subgraph = graph.subgraph(nodes, &local);
        method.for_batch_element(element).run(&subgraph)
    };

    #[cfg(feature = "parallel")]
    let local_clusters: Vec<Vec<usize>> = members.par_iter().enumerate().map(cluster_element).collect();
    #[cfg(not(feature = "parallel"))]
    let local_clusters: Vec<Vec<usize>> = members.iter().enumerate().map(cluster_element).collect();

    let mut cluster = vec![0; node_count];
    let mut offset = 0;
    for (nodes, labels) in members.iter().zip(&local_clusters) {
        for (&node, &label) in nodes.iter().zip(labels) {
            cluster[node] = label + offset;
        }
        if let Some(&max) = labels.iter().max() {
            offset += max + 1;
        }
    }

    debug!(
        elements,
        clusters = cluster_count(&cluster),
        "Clustered batch."
    );
    Ok(cluster)
}

/// Makes precomputed per-graph cluster ids globally distinct across a batch.
///
/// Ids of batch element `k` are shifted by one past the largest shifted id of
/// the elements before it.
pub fn offset_preloaded_clusters(
    cluster: &[usize],
    batch: &[usize],
) -> Result<Vec<usize>, ClusteringError> {
    if batch.len() != cluster.len() {
        return Err(ClusteringError::BatchLengthMismatch {
            expected: cluster.len(),
            found: batch.len(),
        });
    }
    let elements = batch.iter().max().map_or(0, |&max| max + 1);
    let mut element_max: Vec<Option<usize>> = vec![None; elements];
    for (&c, &b) in cluster.iter().zip(batch) {
        element_max[b] = Some(element_max[b].map_or(c, |m| m.max(c)));
    }

    let mut offsets = vec![0; elements];
    let mut offset = 0;
    for (b, max) in element_max.iter().enumerate() {
        offsets[b] = offset;
        if let Some(max) = max {
            offset += max + 1;
        }
    }

    Ok(cluster
        .iter()
        .zip(batch)
        .map(|(&c, &b)| c + offsets[b])
        .collect())
}

fn cluster_count(cluster: &[usize]) -> usize {
    cluster.iter().max().map_or(0, |&max| max + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Six-node ring made of two strongly linked halves joined by weak edges.
    fn weighted_ring(offset: usize) -> (Vec<(usize, usize)>, Vec<f64>) {
        let edges = vec![(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0)];
        let weights = vec![1.0, 1.0, 0.1, 1.0, 1.0, 0.1];
        (
            edges
                .into_iter()
                .map(|(a, b)| (a + offset, b + offset))
                .collect(),
            weights,
        )
    }

    fn two_ring_batch() -> (EdgeIndex, Vec<f64>, Vec<usize>) {
        let (mut edges, mut weights) = weighted_ring(0);
        let (edges2, weights2) = weighted_ring(6);
        edges.extend(edges2);
        weights.extend(weights2);
        let batch = [vec![0; 6], vec![1; 6]].concat();
        (EdgeIndex::from_pairs(edges), weights, batch)
    }

    fn louvain(seed: u64) -> ClusteringMethod {
        ClusteringMethod::Louvain(LouvainParams {
            seed: Some(seed),
            ..Default::default()
        })
    }

    #[test]
    fn method_names_parse_case_insensitively() {
        assert!(matches!("MCL".parse(), Ok(ClusteringMethod::Mcl(_))));
        assert!(matches!("flow-based".parse(), Ok(ClusteringMethod::Mcl(_))));
        assert!(matches!(
            "Louvain".parse(),
            Ok(ClusteringMethod::Louvain(_))
        ));
        assert_eq!(
            "spectral".parse::<ClusteringMethod>(),
            Err(ClusteringError::UnsupportedMethod("spectral".to_string()))
        );
    }

    #[test]
    fn batched_rings_get_globally_distinct_ids() {
        let (edge_index, weights, batch) = two_ring_batch();
        let cluster =
            detect_communities(&edge_index, 12, Some(&weights), &louvain(7), Some(&batch))
                .unwrap();

        let first: HashSet<_> = cluster[..6].iter().copied().collect();
        let second: HashSet<_> = cluster[6..].iter().copied().collect();
        assert_eq!(first, HashSet::from([0, 1]));
        assert_eq!(second, HashSet::from([2, 3]));
        assert_eq!(cluster[0], cluster[1]);
        assert_eq!(cluster[1], cluster[2]);
        assert_ne!(cluster[2], cluster[3]);
    }

    #[test]
    fn batched_mcl_never_merges_batch_elements() {
        let (edge_index, weights, batch) = two_ring_batch();
        let cluster = detect_communities(
            &edge_index,
            12,
            Some(&weights),
            &ClusteringMethod::default(),
            Some(&batch),
        )
        .unwrap();

        let first: HashSet<_> = cluster[..6].iter().collect();
        let second: HashSet<_> = cluster[6..].iter().collect();
        assert!(first.is_disjoint(&second));
        assert_eq!(*cluster[6..].iter().min().unwrap(), *cluster[..6].iter().max().unwrap() + 1);
    }

    #[test]
    fn mcl_is_deterministic() {
        let (edge_index, weights, batch) = two_ring_batch();
        let method = ClusteringMethod::default();
        let a = detect_communities(&edge_index, 12, Some(&weights), &method, Some(&batch)).unwrap();
        let b = detect_communities(&edge_index, 12, Some(&weights), &method, Some(&batch)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn seeded_louvain_is_reproducible() {
        let (edge_index, weights, _) = two_ring_batch();
        let a = detect_communities(&edge_index, 12, Some(&weights), &louvain(3), None).unwrap();
        let b = detect_communities(&edge_index, 12, Some(&weights), &louvain(3), None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn detection_rejects_out_of_range_edges() {
        let edge_index = EdgeIndex::from_pairs([(0, 1), (1, 5)]);
        assert_eq!(
            detect_communities(&edge_index, 3, None, &ClusteringMethod::default(), None),
            Err(ClusteringError::NodeIndexOutOfRange {
                edge: 1,
                index: 5,
                node_count: 3
            })
        );
    }

    #[test]
    fn detection_rejects_bad_weights_and_batches() {
        let edge_index = EdgeIndex::from_pairs([(0, 1), (1, 2)]);
        let method = ClusteringMethod::default();
        assert!(matches!(
            detect_communities(&edge_index, 3, Some(&[1.0]), &method, None),
            Err(ClusteringError::WeightCountMismatch { .. })
        ));
        assert!(matches!(
            detect_communities(&edge_index, 3, Some(&[1.0, -2.0]), &method, None),
            Err(ClusteringError::InvalidWeight { edge: 1, .. })
        ));
        assert!(matches!(
            detect_communities(&edge_index, 3, None, &method, Some(&[0, 0])),
            Err(ClusteringError::BatchLengthMismatch { .. })
        ));
        assert_eq!(
            detect_communities(&edge_index, 3, None, &method, Some(&[0, 0, 1])),
            Err(ClusteringError::CrossBatchEdge { edge: 1 })
        );
    }

    #[test]
    fn graph_without_edges_has_one_cluster_per_node() {
        let edge_index = EdgeIndex::new();
        for method in [ClusteringMethod::default(), louvain(1)] {
            let cluster = detect_communities(&edge_index, 3, None, &method, None).unwrap();
            assert_eq!(cluster, vec![0, 1, 2], "{method}");
        }
    }

    #[test]
    fn weighted_graph_deduplicates_reverse_edges() {
        let edge_index = EdgeIndex::from_pairs([(0, 1), (1, 0), (1, 2)]);
        let graph = WeightedGraph::from_edge_index(&edge_index, 3, Some(&[1.0, 2.0, 3.0])).unwrap();
        assert_eq!(graph.edges, vec![(0, 1, 2.0), (1, 2, 3.0)]);
    }

    #[test]
    fn preloaded_clusters_are_offset_per_batch_element() {
        let cluster = [0, 1, 1, 0, 0, 2];
        let batch = [0, 0, 0, 1, 1, 1];
        assert_eq!(
            offset_preloaded_clusters(&cluster, &batch).unwrap(),
            vec![0, 1, 1, 2, 2, 4]
        );
    }
}
