//! Multi-level greedy modularity maximization (Louvain method).
//!
//! Each level moves single nodes between neighbouring communities while that
//! raises modularity, then collapses every community into one node of a
//! smaller weighted graph. Levels repeat until modularity stops improving.

use super::{ClusteringError, WeightedGraph};
use crate::core::graph::EdgeIndex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Smallest modularity gain that still counts as an improvement.
const MIN_GAIN: f64 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LouvainParams {
    /// Values above 1 favour smaller communities.
    pub resolution: f64,
    /// Seed of the node visiting order; `None` draws one from entropy.
    pub seed: Option<u64>,
}

impl Default for LouvainParams {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            seed: None,
        }
    }
}

impl LouvainParams {
    pub fn validate(&self) -> Result<(), ClusteringError> {
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(ClusteringError::InvalidParameter {
                name: "resolution",
                reason: "must be a positive number".to_string(),
            });
        }
        Ok(())
    }
}

/// Weighted graph in the form the level passes work on.
struct Level {
    /// Neighbours of each node, self loops excluded.
    adjacency: Vec<Vec<(usize, f64)>>,
    /// Self-loop weight of each node.
    loops: Vec<f64>,
    /// Weighted degree, self loops counted twice.
    degrees: Vec<f64>,
    /// Sum of all edge weights, self loops counted once.
    total_weight: f64,
}

impl Level {
    fn from_edges(node_count: usize, edges: &[(usize, usize, f64)]) -> Self {
        let mut level = Self {
            adjacency: vec![Vec::new(); node_count],
            loops: vec![0.0; node_count],
            degrees: vec![0.0; node_count],
            total_weight: 0.0,
        };
        for &(u, v, w) in edges {
            if u == v {
                level.loops[u] += w;
                level.degrees[u] += 2.0 * w;
            } else {
                level.adjacency[u].push((v, w));
                level.adjacency[v].push((u, w));
                level.degrees[u] += w;
                level.degrees[v] += w;
            }
            level.total_weight += w;
        }
        level
    }

    fn len(&self) -> usize {
        self.adjacency.len()
    }

    /// Collapses each community of `partition` into a single node.
    fn induced(&self, partition: &[usize], communities: usize) -> Self {
        let mut weights: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        for (u, neighbours) in self.adjacency.iter().enumerate() {
            for &(v, w) in neighbours.iter().filter(|&&(v, _)| u < v) {
                let (a, b) = (partition[u], partition[v]);
                *weights.entry((a.min(b), a.max(b))).or_default() += w;
            }
        }
        for (u, &w) in self.loops.iter().enumerate() {
            if w > 0.0 {
                *weights.entry((partition[u], partition[u])).or_default() += w;
            }
        }
        let edges: Vec<_> = weights.into_iter().map(|((a, b), w)| (a, b, w)).collect();
        Self::from_edges(communities, &edges)
    }
}

/// Community bookkeeping for one level.
struct Status {
    node_to_community: Vec<usize>,
    /// Total degree of each community.
    community_degrees: Vec<f64>,
    /// Total internal edge weight of each community, self loops included.
    internals: Vec<f64>,
}

impl Status {
    fn singletons(level: &Level) -> Self {
        Self {
            node_to_community: (0..level.len()).collect(),
            community_degrees: level.degrees.clone(),
            internals: level.loops.clone(),
        }
    }

    fn modularity(&self, total_weight: f64, resolution: f64) -> f64 {
        if total_weight == 0.0 {
            return 0.0;
        }
        self.internals
            .iter()
            .zip(&self.community_degrees)
            .map(|(&internal, &degree)| {
                internal / total_weight - resolution * (degree / (2.0 * total_weight)).powi(2)
            })
            .sum()
    }

    fn remove(&mut self, level: &Level, node: usize, community: usize, links: f64) {
        self.community_degrees[community] -= level.degrees[node];
        self.internals[community] -= links + level.loops[node];
    }

    fn insert(&mut self, level: &Level, node: usize, community: usize, links: f64) {
        self.node_to_community[node] = community;
        self.community_degrees[community] += level.degrees[node];
        self.internals[community] += links + level.loops[node];
    }

    /// Edge weight from `node` into each neighbouring community.
    fn neighbour_communities(&self, level: &Level, node: usize) -> Vec<(usize, f64)> {
        let mut links: Vec<(usize, f64)> = Vec::new();
        for &(neighbour, w) in &level.adjacency[node] {
            let community = self.node_to_community[neighbour];
            match links.iter_mut().find(|(c, _)| *c == community) {
                Some(entry) => entry.1 += w,
                None => links.push((community, w)),
            }
        }
        links
    }

    /// Local moving phase. Returns once a full sweep gains less than
    /// [`MIN_GAIN`] modularity or moves no node.
    fn optimize(&mut self, level: &Level, resolution: f64, rng: &mut impl Rng) {
        let mut order: Vec<usize> = (0..level.len()).collect();
        let mut current = self.modularity(level.total_weight, resolution);

        loop {
            let mut moved = false;
            order.shuffle(rng);
            for &node in &order {
                let own = self.node_to_community[node];
                let degree_ratio = level.degrees[node] / (2.0 * level.total_weight);
                let mut links = self.neighbour_communities(level, node);
                let own_links = links
                    .iter()
                    .find(|(c, _)| *c == own)
                    .map_or(0.0, |&(_, w)| w);
                let remove_cost = -own_links
                    + resolution
                        * (self.community_degrees[own] - level.degrees[node])
                        * degree_ratio;
                self.remove(level, node, own, own_links);

                let mut best = (own, own_links);
                let mut best_gain = 0.0;
                links.shuffle(rng);
                for &(community, weight) in &links {
                    let gain = remove_cost + weight
                        - resolution * self.community_degrees[community] * degree_ratio;
                    if gain > best_gain {
                        best_gain = gain;
                        best = (community, weight);
                    }
                }

                self.insert(level, node, best.0, best.1);
                moved |= best.0 != own;
            }

            let next = self.modularity(level.total_weight, resolution);
            if !moved || next - current < MIN_GAIN {
                break;
            }
            current = next;
        }
    }
}

/// Maps community ids to `0..k` in order of first appearance.
fn renumber(assignment: &[usize]) -> (Vec<usize>, usize) {
    let mut mapping: BTreeMap<usize, usize> = BTreeMap::new();
    let renumbered = assignment
        .iter()
        .map(|&community| {
            let next = mapping.len();
            *mapping.entry(community).or_insert(next)
        })
        .collect();
    (renumbered, mapping.len())
}

pub(crate) fn cluster(graph: &WeightedGraph, params: &LouvainParams) -> Vec<usize> {
    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut level = Level::from_edges(graph.node_count, &graph.edges);
    if level.total_weight == 0.0 {
        return (0..graph.node_count).collect();
    }

    let mut assignment: Vec<usize> = (0..graph.node_count).collect();
    let mut best_modularity = f64::NEG_INFINITY;
    let mut depth = 0;

    loop {
        let mut status = Status::singletons(&level);
        status.optimize(&level, params.resolution, &mut rng);
        let modularity = status.modularity(level.total_weight, params.resolution);
        if depth > 0 && modularity - best_modularity < MIN_GAIN {
            break;
        }

        let (partition, communities) = renumber(&status.node_to_community);
        for community in assignment.iter_mut() {
            *community = partition[*community];
        }
        best_modularity = modularity;
        depth += 1;

        if communities == level.len() {
            break;
        }
        level = level.induced(&partition, communities);
    }

    debug!(
        levels = depth,
        modularity = best_modularity,
        "Louvain optimization finished."
    );
    renumber(&assignment).0
}

/// Newman modularity of `assignment` on an undirected weighted graph.
///
/// `Q = Σ_c [ L_c / m - γ (d_c / 2m)² ]` where `L_c` is the internal edge
/// weight of community `c`, `d_c` its total degree and `m` the total edge
/// weight. Reverse duplicates in `edge_index` count once. A graph without
/// edge weight has modularity 0.
pub fn modularity(
    edge_index: &EdgeIndex,
    node_count: usize,
    edge_weights: Option<&[f64]>,
    assignment: &[usize],
    resolution: f64,
) -> Result<f64, ClusteringError> {
    if assignment.len() != node_count {
        return Err(ClusteringError::BatchLengthMismatch {
            expected: node_count,
            found: assignment.len(),
        });
    }
    let graph = WeightedGraph::from_edge_index(edge_index, node_count, edge_weights)?;
    let level = Level::from_edges(node_count, &graph.edges);
    let (partition, communities) = renumber(assignment);

    let mut status = Status {
        node_to_community: partition.clone(),
        community_degrees: vec![0.0; communities],
        internals: vec![0.0; communities],
    };
    for (node, &community) in partition.iter().enumerate() {
        status.community_degrees[community] += level.degrees[node];
        status.internals[community] += level.loops[node];
    }
    for &(u, v, w) in graph.edges.iter().filter(|&&(u, v, _)| u != v) {
        if partition[u] == partition[v] {
            status.internals[partition[u]] += w;
        }
    }
    Ok(status.modularity(level.total_weight, resolution))
}
