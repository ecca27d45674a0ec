use crate::core::graph::GraphData;
use crate::engine::clustering::{detect_communities, offset_preloaded_clusters};
use crate::engine::config::CoarseningConfig;
use crate::engine::error::EngineError;
use crate::engine::pooling::{PoolingError, PoolingWarning, community_pooling};
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{debug, info, instrument};

/// One level of the pooling hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct CoarseningLevel {
    pub graph: GraphData,
    /// Node of this level that each node of the previous level was pooled into.
    pub cluster: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoarseningResult {
    /// Levels from the first pooling round to the last.
    pub levels: Vec<CoarseningLevel>,
    pub warnings: Vec<PoolingWarning>,
}

impl CoarseningResult {
    /// The graph produced by the last round.
    pub fn coarsest(&self) -> Option<&GraphData> {
        self.levels.last().map(|level| &level.graph)
    }
}

/// Repeatedly clusters and pools a (possibly batched) graph.
///
/// Each round clusters the current topology, per batch element, and pools
/// the result. When `use_preloaded` is set and the graph carries precomputed
/// assignments, the next stored level is used instead of running community
/// detection; the stored ids of each graph are made batch-unique first.
#[instrument(skip_all, name = "coarsening_workflow", fields(rounds = config.rounds, method = %config.clustering))]
pub fn run(
    data: &GraphData,
    config: &CoarseningConfig,
    reporter: &ProgressReporter,
) -> Result<CoarseningResult, EngineError> {
    data.validate()?;
    info!(
        nodes = data.node_count(),
        edges = data.edge_count(),
        graphs = data.num_graphs(),
        "Starting coarsening."
    );

    reporter.report(Progress::TaskStart {
        total_steps: config.rounds as u64,
    });

    let mut current = data.clone();
    let mut levels = Vec::with_capacity(config.rounds);
    let mut warnings = Vec::new();

    for round in 1..=config.rounds {
        let cluster = reporter.phase("Clustering", || round_clusters(&mut current, config))?;
        let pooled = reporter.phase("Pooling", || {
            community_pooling(&cluster, &current, &config.pooling)
        })?;

        debug!(
            round,
            nodes = pooled.graph.node_count(),
            edges = pooled.graph.edge_count(),
            "Finished coarsening round."
        );
        reporter.report(Progress::LevelFinished {
            level: round,
            nodes: pooled.graph.node_count(),
            edges: pooled.graph.edge_count(),
        });
        reporter.report(Progress::TaskIncrement);

        warnings.extend(pooled.warnings);
        current = pooled.graph.clone();
        levels.push(CoarseningLevel {
            graph: pooled.graph,
            cluster: pooled.cluster,
        });
    }

    reporter.report(Progress::TaskFinish);
    info!(
        levels = levels.len(),
        warnings = warnings.len(),
        "Coarsening complete."
    );
    Ok(CoarseningResult { levels, warnings })
}

/// Cluster assignment for the next round.
///
/// Consumes the first stored assignment of `current` when it is used.
fn round_clusters(
    current: &mut GraphData,
    config: &CoarseningConfig,
) -> Result<Vec<usize>, EngineError> {
    if config.use_preloaded && !current.preloaded_clusters.is_empty() {
        let stored = current.preloaded_clusters.remove(0);
        if stored.len() != current.node_count() {
            return Err(PoolingError::ClusterLengthMismatch {
                expected: current.node_count(),
                found: stored.len(),
            }
            .into());
        }
        debug!("Using precomputed cluster assignment.");
        return Ok(offset_preloaded_clusters(&stored, &current.batch)?);
    }

    let weights = config
        .weight_column
        .map(|column| current.edge_weights(column))
        .transpose()?;
    Ok(detect_communities(
        &current.edge_index,
        current.node_count(),
        weights.as_deref(),
        &config.clustering,
        Some(&current.batch),
    )?)
}
