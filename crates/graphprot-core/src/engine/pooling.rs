//! # Community Pooling
//!
//! Collapses every cluster of a [`GraphData`] into one node: node features are
//! max-pooled, positions averaged and edges between clusters coalesced.

use super::config::{EdgeAggregation, PoolingConfig};
use crate::core::graph::{EdgeIndex, GraphData, GraphError};
use nalgebra::DMatrix;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, instrument, warn};

#[derive(Debug, Error, PartialEq)]
pub enum PoolingError {
    #[error("Cluster assignment has {found} entries for {expected} nodes")]
    ClusterLengthMismatch { expected: usize, found: usize },
    #[error("Cluster {cluster} spans batch elements {first} and {second}")]
    MixedBatchCluster {
        cluster: usize,
        first: usize,
        second: usize,
    },
    #[error("Invalid input graph: {0}")]
    Graph(#[from] GraphError),
}

/// Non-fatal conditions met while pooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolingWarning {
    /// The input carried an `internal_edge_index`, which pooling no longer uses.
    DeprecatedInternalEdges,
}

impl fmt::Display for PoolingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolingWarning::DeprecatedInternalEdges => {
                f.write_str("internal_edge_index is deprecated and was ignored")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PooledGraph {
    pub graph: GraphData,
    /// Pooled node of every input node.
    pub cluster: Vec<usize>,
    pub warnings: Vec<PoolingWarning>,
}

/// Renumbers cluster ids to `0..k` in order of first appearance.
///
/// Returns the renumbered assignment and, for every new id `c`, the index of
/// the first node assigned to it.
pub fn consecutive_clusters(cluster: &[usize]) -> (Vec<usize>, Vec<usize>) {
    let mut mapping: BTreeMap<usize, usize> = BTreeMap::new();
    let mut perm = Vec::new();
    let dense = cluster
        .iter()
        .enumerate()
        .map(|(node, &c)| {
            *mapping.entry(c).or_insert_with(|| {
                perm.push(node);
                perm.len() - 1
            })
        })
        .collect();
    (dense, perm)
}

/// Pools `data` according to `cluster`, one entry per node.
///
/// Ids, batch membership and `pos`/`pos2d` of the pooled nodes come from the
/// clusters' members; pooled ids are the ids of each cluster's first member.
/// Edges inside a cluster disappear and parallel edges between two clusters
/// merge into one, ordered by `(source, target)`.
#[instrument(skip_all, name = "community_pooling", fields(nodes = data.node_count()))]
pub fn community_pooling(
    cluster: &[usize],
    data: &GraphData,
    config: &PoolingConfig,
) -> Result<PooledGraph, PoolingError> {
    data.validate()?;
    let (dense, perm) = check_clusters(cluster, &data.batch)?;
    let cluster_count = perm.len();

    let mut warnings = Vec::new();
    if data.internal_edge_index.is_some() {
        warn!("Ignoring deprecated internal_edge_index; it will not be carried to the pooled graph.");
        warnings.push(PoolingWarning::DeprecatedInternalEdges);
    }

    let (edge_index, edge_attr) = coalesce_edges(
        &data.edge_index,
        &data.edge_attr,
        &dense,
        config.edge_aggregation,
    );

    let graph = GraphData {
        ids: perm.iter().map(|&node| data.ids[node].clone()).collect(),
        x: max_pool_rows(&data.x, &dense, cluster_count),
        edge_index,
        edge_attr,
        pos: data
            .pos
            .as_ref()
            .map(|pos| mean_pool_rows(pos, &dense, cluster_count)),
        pos2d: data
            .pos2d
            .as_ref()
            .map(|pos| mean_pool_rows(pos, &dense, cluster_count)),
        batch: perm.iter().map(|&node| data.batch[node]).collect(),
        graph_count: data.num_graphs(),
        internal_edge_index: None,
        preloaded_clusters: data.preloaded_clusters.clone(),
        targets: data.targets.clone(),
    };

    debug!(
        clusters = cluster_count,
        edges = graph.edge_count(),
        "Pooled graph."
    );
    Ok(PooledGraph {
        graph,
        cluster: dense,
        warnings,
    })
}

/// Max-pools node features per cluster.
///
/// Returns the pooled features and the batch element of every pooled node.
pub fn max_pool_x(
    cluster: &[usize],
    x: &DMatrix<f64>,
    batch: &[usize],
) -> Result<(DMatrix<f64>, Vec<usize>), PoolingError> {
    if x.nrows() != batch.len() {
        return Err(GraphError::ShapeMismatch {
            field: "batch",
            expected: x.nrows(),
            found: batch.len(),
        }
        .into());
    }
    let (dense, perm) = check_clusters(cluster, batch)?;
    let pooled = max_pool_rows(x, &dense, perm.len());
    Ok((pooled, perm.iter().map(|&node| batch[node]).collect()))
}

/// Averages node features over each batch element, one row per element.
///
/// Elements without nodes get a zero row.
pub fn global_mean_pool(x: &DMatrix<f64>, batch: &[usize]) -> Result<DMatrix<f64>, PoolingError> {
    if x.nrows() != batch.len() {
        return Err(GraphError::ShapeMismatch {
            field: "batch",
            expected: x.nrows(),
            found: batch.len(),
        }
        .into());
    }
    let elements = batch.iter().max().map_or(0, |&max| max + 1);
    Ok(mean_pool_rows(x, batch, elements))
}

fn check_clusters(
    cluster: &[usize],
    batch: &[usize],
) -> Result<(Vec<usize>, Vec<usize>), PoolingError> {
    if cluster.len() != batch.len() {
        return Err(PoolingError::ClusterLengthMismatch {
            expected: batch.len(),
            found: cluster.len(),
        });
    }
    let (dense, perm) = consecutive_clusters(cluster);
    for (node, &c) in dense.iter().enumerate() {
        let first = batch[perm[c]];
        if batch[node] != first {
            return Err(PoolingError::MixedBatchCluster {
                cluster: cluster[node],
                first,
                second: batch[node],
            });
        }
    }
    Ok((dense, perm))
}

fn max_pool_rows(x: &DMatrix<f64>, cluster: &[usize], cluster_count: usize) -> DMatrix<f64> {
    let mut pooled = DMatrix::from_element(cluster_count, x.ncols(), f64::NEG_INFINITY);
    for (row, &c) in cluster.iter().enumerate() {
        for col in 0..x.ncols() {
            pooled[(c, col)] = pooled[(c, col)].max(x[(row, col)]);
        }
    }
    pooled
}

fn mean_pool_rows(x: &DMatrix<f64>, cluster: &[usize], cluster_count: usize) -> DMatrix<f64> {
    let mut sums = DMatrix::zeros(cluster_count, x.ncols());
    let mut counts = vec![0usize; cluster_count];
    for (row, &c) in cluster.iter().enumerate() {
        let mut target = sums.row_mut(c);
        target += x.row(row);
        counts[c] += 1;
    }
    for (c, &count) in counts.iter().enumerate() {
        if count > 0 {
            let mut row = sums.row_mut(c);
            row /= count as f64;
        }
    }
    sums
}

fn coalesce_edges(
    edge_index: &EdgeIndex,
    edge_attr: &DMatrix<f64>,
    cluster: &[usize],
    aggregation: EdgeAggregation,
) -> (EdgeIndex, DMatrix<f64>) {
    let width = edge_attr.ncols();
    let mut merged: BTreeMap<(usize, usize), (Vec<f64>, usize)> = BTreeMap::new();
    for (e, (s, t)) in edge_index.iter().enumerate() {
        let (s, t) = (cluster[s], cluster[t]);
        if s == t {
            continue;
        }
        let (sum, count) = merged
            .entry((s, t))
            .or_insert_with(|| (vec![0.0; width], 0));
        for (acc, value) in sum.iter_mut().zip(edge_attr.row(e).iter()) {
            *acc += value;
        }
        *count += 1;
    }

    let mut pooled_attr = DMatrix::zeros(merged.len(), width);
    let mut pooled_index = EdgeIndex::new();
    for (row, ((s, t), (sum, count))) in merged.into_iter().enumerate() {
        pooled_index.push(s, t);
        for (col, value) in sum.into_iter().enumerate() {
            pooled_attr[(row, col)] = match aggregation {
                EdgeAggregation::Sum => value,
                EdgeAggregation::Mean => value / count as f64,
            };
        }
    }
    (pooled_index, pooled_attr)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Path 0-1-2-3 with a two-column edge attribute and 2D features.
    fn path_graph() -> GraphData {
        let x = DMatrix::from_row_slice(4, 2, &[1.0, 8.0, 4.0, 2.0, 3.0, 5.0, 7.0, 6.0]);
        let edge_index = EdgeIndex::from_pairs([(0, 1), (1, 2), (2, 3), (3, 0)]);
        let edge_attr =
            DMatrix::from_row_slice(4, 2, &[1.0, 10.0, 2.0, 20.0, 3.0, 30.0, 4.0, 40.0]);
        let pos = DMatrix::from_row_slice(
            4,
            3,
            &[0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 4.0, 0.0, 0.0, 0.0, 6.0],
        );
        GraphData::new(x, edge_index, edge_attr)
            .with_pos(pos)
            .with_target("binding", 0.5)
    }

    fn sum_config() -> PoolingConfig {
        PoolingConfig::default()
    }

    #[test]
    fn consecutive_clusters_follow_first_appearance() {
        let (dense, perm) = consecutive_clusters(&[5, 2, 5, 7]);
        assert_eq!(dense, vec![0, 1, 0, 2]);
        assert_eq!(perm, vec![0, 1, 3]);
    }

    #[test]
    fn pooling_everything_into_one_cluster_leaves_a_single_node() {
        let data = path_graph();
        let pooled = community_pooling(&[3, 3, 3, 3], &data, &sum_config()).unwrap();

        assert_eq!(pooled.graph.node_count(), 1);
        assert_eq!(pooled.graph.edge_count(), 0);
        assert_eq!(pooled.graph.edge_attr.nrows(), 0);
        assert_eq!(pooled.graph.x.row(0).iter().copied().collect::<Vec<_>>(), vec![7.0, 8.0]);
        assert_eq!(pooled.graph.batch, vec![0]);
        assert_eq!(pooled.graph.targets["binding"], vec![0.5]);
        assert!(pooled.warnings.is_empty());
    }

    #[test]
    fn identity_pooling_is_idempotent() {
        let data = path_graph();
        let identity = [0, 1, 2, 3];
        let once = community_pooling(&identity, &data, &sum_config()).unwrap();
        let twice = community_pooling(&identity, &once.graph, &sum_config()).unwrap();

        assert_eq!(once.graph.x, data.x);
        assert_eq!(once.graph.pos, data.pos);
        assert_eq!(once.graph.ids, data.ids);
        assert_eq!(twice.graph, once.graph);
    }

    #[test]
    fn positions_are_averaged_and_features_max_pooled() {
        let data = path_graph();
        let pooled = community_pooling(&[0, 0, 1, 1], &data, &sum_config()).unwrap();

        let pos = pooled.graph.pos.unwrap();
        assert_eq!(pos.row(0).iter().copied().collect::<Vec<_>>(), vec![1.0, 0.0, 0.0]);
        assert_eq!(pos.row(1).iter().copied().collect::<Vec<_>>(), vec![0.0, 2.0, 3.0]);
        assert_eq!(pooled.graph.x.row(1).iter().copied().collect::<Vec<_>>(), vec![7.0, 6.0]);
        assert_eq!(pooled.graph.ids, vec!["0".to_string(), "2".to_string()]);
    }

    #[test]
    fn parallel_edges_are_coalesced_in_sorted_order() {
        let data = path_graph();
        // Edges 1->2 and 3->0 become 0->1 and 1->0; 0->1 and 2->3 are internal.
        let pooled = community_pooling(&[0, 0, 1, 1], &data, &sum_config()).unwrap();
        assert_eq!(
            pooled.graph.edge_index,
            EdgeIndex::from_pairs([(0, 1), (1, 0)])
        );
        assert_eq!(pooled.graph.edge_attr[(0, 0)], 2.0);
        assert_eq!(pooled.graph.edge_attr[(1, 1)], 40.0);

        let mut data = path_graph();
        data.edge_index = EdgeIndex::from_pairs([(0, 2), (1, 3), (2, 3), (1, 2)]);
        let summed = community_pooling(&[0, 0, 1, 1], &data, &sum_config()).unwrap();
        let mean_config = PoolingConfig {
            edge_aggregation: EdgeAggregation::Mean,
        };
        let averaged = community_pooling(&[0, 0, 1, 1], &data, &mean_config).unwrap();

        assert_eq!(summed.graph.edge_index, EdgeIndex::from_pairs([(0, 1)]));
        assert_eq!(summed.graph.edge_attr[(0, 0)], 1.0 + 2.0 + 4.0);
        assert_eq!(averaged.graph.edge_attr[(0, 1)], (10.0 + 20.0 + 40.0) / 3.0);
    }

    #[test]
    fn clusters_spanning_batch_elements_are_rejected() {
        let data = path_graph().with_batch(vec![0, 0, 1, 1]);
        assert_eq!(
            community_pooling(&[0, 1, 1, 2], &data, &sum_config()),
            Err(PoolingError::MixedBatchCluster {
                cluster: 1,
                first: 0,
                second: 1
            })
        );
    }

    #[test]
    fn cluster_length_must_match_node_count() {
        let data = path_graph();
        assert_eq!(
            community_pooling(&[0, 1], &data, &sum_config()),
            Err(PoolingError::ClusterLengthMismatch {
                expected: 4,
                found: 2
            })
        );
    }

    #[test]
    fn internal_edges_are_dropped_with_a_warning() {
        let mut data = path_graph();
        data.internal_edge_index = Some(EdgeIndex::from_pairs([(0, 1)]));
        let pooled = community_pooling(&[0, 0, 1, 1], &data, &sum_config()).unwrap();

        assert_eq!(pooled.warnings, vec![PoolingWarning::DeprecatedInternalEdges]);
        assert!(pooled.graph.internal_edge_index.is_none());
    }

    #[test]
    fn readout_helpers_pool_per_cluster_and_per_graph() {
        let x = DMatrix::from_row_slice(4, 1, &[1.0, 3.0, 5.0, 9.0]);
        let batch = [0, 0, 1, 1];

        let (pooled, pooled_batch) = max_pool_x(&[0, 0, 1, 2], &x, &batch).unwrap();
        assert_eq!(pooled.as_slice(), &[3.0, 5.0, 9.0]);
        assert_eq!(pooled_batch, vec![0, 1, 1]);

        let readout = global_mean_pool(&x, &batch).unwrap();
        assert_eq!(readout.as_slice(), &[2.0, 7.0]);
    }
}
