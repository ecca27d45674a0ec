use super::GraphError;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Directed edge list as two aligned index vectors.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EdgeIndex {
    pub sources: Vec<usize>,
    pub targets: Vec<usize>,
}

impl EdgeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let (sources, targets) = pairs.into_iter().unzip();
        Self { sources, targets }
    }

    pub fn push(&mut self, source: usize, target: usize) {
        self.sources.push(source);
        self.targets.push(target);
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.sources.iter().copied().zip(self.targets.iter().copied())
    }

    fn offset(&self, by: usize) -> Self {
        Self::from_pairs(self.iter().map(|(s, t)| (s + by, t + by)))
    }

    fn validate(&self, field: &'static str, node_count: usize) -> Result<(), GraphError> {
        if self.sources.len() != self.targets.len() {
            return Err(GraphError::ShapeMismatch {
                field,
                expected: self.sources.len(),
                found: self.targets.len(),
            });
        }
        match self.iter().flat_map(|(s, t)| [s, t]).find(|&i| i >= node_count) {
            Some(index) => Err(GraphError::NodeIndexOutOfRange { index, node_count }),
            None => Ok(()),
        }
    }
}

/// Tensor view of one graph or of several graphs packed into a batch.
///
/// `batch` always holds one batch-element index per node; a single graph is
/// all zeros. Targets hold one value per batch element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    pub ids: Vec<String>,
    pub x: DMatrix<f64>,
    pub edge_index: EdgeIndex,
    pub edge_attr: DMatrix<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<DMatrix<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos2d: Option<DMatrix<f64>>,
    pub batch: Vec<usize>,
    /// Number of batch elements, counting those without any node.
    #[serde(default)]
    pub graph_count: usize,
    /// Legacy field kept readable for old artifacts; pooling ignores it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_edge_index: Option<EdgeIndex>,
    /// Precomputed per-graph cluster assignments, one entry per coarsening level.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preloaded_clusters: Vec<Vec<usize>>,
    #[serde(default)]
    pub targets: BTreeMap<String, Vec<f64>>,
}

impl GraphData {
    /// Creates a single-graph batch with index-based ids.
    pub fn new(x: DMatrix<f64>, edge_index: EdgeIndex, edge_attr: DMatrix<f64>) -> Self {
        let node_count = x.nrows();
        Self {
            ids: (0..node_count).map(|i| i.to_string()).collect(),
            x,
            edge_index,
            edge_attr,
            pos: None,
            pos2d: None,
            batch: vec![0; node_count],
            graph_count: 1,
            internal_edge_index: None,
            preloaded_clusters: Vec::new(),
            targets: BTreeMap::new(),
        }
    }

    pub fn with_pos(mut self, pos: DMatrix<f64>) -> Self {
        self.pos = Some(pos);
        self
    }

    pub fn with_pos2d(mut self, pos2d: DMatrix<f64>) -> Self {
        self.pos2d = Some(pos2d);
        self
    }

    pub fn with_batch(mut self, batch: Vec<usize>) -> Self {
        self.graph_count = batch.iter().max().map_or(self.graph_count, |&max| max + 1);
        self.batch = batch;
        self
    }

    pub fn with_target(mut self, name: &str, value: f64) -> Self {
        self.targets.insert(name.to_string(), vec![value]);
        self
    }

    pub fn node_count(&self) -> usize {
        self.x.nrows()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_index.len()
    }

    /// Number of batch elements referenced by `batch`.
    pub fn num_graphs(&self) -> usize {
        self.batch
            .iter()
            .max()
            .map_or(self.graph_count, |&max| self.graph_count.max(max + 1))
    }

    /// Checks that every field is consistent with the node and edge counts.
    pub fn validate(&self) -> Result<(), GraphError> {
        let n = self.node_count();
        check_len("ids", n, self.ids.len())?;
        check_len("batch", n, self.batch.len())?;
        if let Some(pos) = &self.pos {
            check_len("pos", n, pos.nrows())?;
        }
        if let Some(pos2d) = &self.pos2d {
            check_len("pos2d", n, pos2d.nrows())?;
        }
        self.edge_index.validate("edge_index", n)?;
        check_len("edge_attr", self.edge_count(), self.edge_attr.nrows())?;
        if let Some(internal) = &self.internal_edge_index {
            internal.validate("internal_edge_index", n)?;
        }
        Ok(())
    }

    /// Extracts one edge-attribute column, e.g. for use as clustering weights.
    pub fn edge_weights(&self, column: usize) -> Result<Vec<f64>, GraphError> {
        let width = self.edge_attr.ncols();
        if column >= width {
            return Err(GraphError::ColumnOutOfRange { column, width });
        }
        Ok(self.edge_attr.column(column).iter().copied().collect())
    }

    /// Packs several graphs into one batch.
    ///
    /// Node rows are concatenated, edge indices are shifted by the number of
    /// nodes that precede each graph and batch indices by the number of batch
    /// elements that precede it. Preloaded clusters are concatenated as-is;
    /// use `offset_preloaded_clusters` to make them globally distinct.
    pub fn collate(graphs: &[GraphData]) -> Result<GraphData, GraphError> {
        for graph in graphs {
            graph.validate()?;
        }

        let x = vstack(graphs.iter().map(|g| &g.x), "x")?;
        let edge_attr = vstack(graphs.iter().map(|g| &g.edge_attr), "edge_attr")?;
        let pos = stack_optional(graphs, |g| g.pos.as_ref(), "pos")?;
        let pos2d = stack_optional(graphs, |g| g.pos2d.as_ref(), "pos2d")?;

        let mut ids = Vec::with_capacity(x.nrows());
        let mut edge_index = EdgeIndex::new();
        let mut batch = Vec::with_capacity(x.nrows());
        let mut internal: Option<EdgeIndex> = None;
        let mut node_offset = 0;
        let mut graph_offset = 0;

        for graph in graphs {
            ids.extend(graph.ids.iter().cloned());
            let shifted = graph.edge_index.offset(node_offset);
            edge_index.sources.extend(shifted.sources);
            edge_index.targets.extend(shifted.targets);
            batch.extend(graph.batch.iter().map(|b| b + graph_offset));
            if let Some(graph_internal) = &graph.internal_edge_index {
                let shifted = graph_internal.offset(node_offset);
                let merged = internal.get_or_insert_with(EdgeIndex::new);
                merged.sources.extend(shifted.sources);
                merged.targets.extend(shifted.targets);
            }
            node_offset += graph.node_count();
            graph_offset += graph.num_graphs().max(1);
        }

        Ok(GraphData {
            ids,
            x,
            edge_index,
            edge_attr,
            pos,
            pos2d,
            batch,
            graph_count: graph_offset,
            internal_edge_index: internal,
            preloaded_clusters: collate_preloaded(graphs),
            targets: collate_targets(graphs),
        })
    }

    /// Splits a batch back into one graph per batch element.
    ///
    /// Preloaded clusters are not carried over.
    pub fn split(&self) -> Result<Vec<GraphData>, GraphError> {
        self.validate()?;
        let num_graphs = self.num_graphs();

        let mut members: Vec<Vec<usize>> = vec![Vec::new(); num_graphs];
        let mut local = vec![0; self.node_count()];
        for (node, &b) in self.batch.iter().enumerate() {
            local[node] = members[b].len();
            members[b].push(node);
        }

        let mut edges: Vec<Vec<usize>> = vec![Vec::new(); num_graphs];
        for (e, (s, t)) in self.edge_index.iter().enumerate() {
            if self.batch[s] != self.batch[t] {
                return Err(GraphError::CrossBatchEdge { edge: e });
            }
            edges[self.batch[s]].push(e);
        }

        let graphs = members
            .iter()
            .zip(&edges)
            .enumerate()
            .map(|(b, (nodes, edge_ids))| GraphData {
                ids: nodes.iter().map(|&i| self.ids[i].clone()).collect(),
                x: self.x.select_rows(nodes),
                edge_index: EdgeIndex::from_pairs(edge_ids.iter().map(|&e| {
                    (
                        local[self.edge_index.sources[e]],
                        local[self.edge_index.targets[e]],
                    )
                })),
                edge_attr: self.edge_attr.select_rows(edge_ids),
                pos: self.pos.as_ref().map(|p| p.select_rows(nodes)),
                pos2d: self.pos2d.as_ref().map(|p| p.select_rows(nodes)),
                batch: vec![0; nodes.len()],
                graph_count: 1,
                internal_edge_index: None,
                preloaded_clusters: Vec::new(),
                targets: self
                    .targets
                    .iter()
                    .filter_map(|(name, values)| {
                        values.get(b).map(|&v| (name.clone(), vec![v]))
                    })
                    .collect(),
            })
            .collect();
        Ok(graphs)
    }
}

fn check_len(field: &'static str, expected: usize, found: usize) -> Result<(), GraphError> {
    if expected == found {
        Ok(())
    } else {
        Err(GraphError::ShapeMismatch {
            field,
            expected,
            found,
        })
    }
}

fn vstack<'a>(
    blocks: impl Iterator<Item = &'a DMatrix<f64>> + Clone,
    field: &'static str,
) -> Result<DMatrix<f64>, GraphError> {
    let width = blocks
        .clone()
        .find(|m| m.nrows() > 0)
        .map_or(0, |m| m.ncols());
    let mut rows = 0;
    for block in blocks.clone().filter(|m| m.nrows() > 0) {
        check_len(field, width, block.ncols())?;
        rows += block.nrows();
    }

    let mut out = DMatrix::zeros(rows, width);
    let mut offset = 0;
    for block in blocks.filter(|m| m.nrows() > 0) {
        out.rows_mut(offset, block.nrows()).copy_from(block);
        offset += block.nrows();
    }
    Ok(out)
}

fn stack_optional<'a, F>(
    graphs: &'a [GraphData],
    field_of: F,
    field: &'static str,
) -> Result<Option<DMatrix<f64>>, GraphError>
where
    F: Fn(&'a GraphData) -> Option<&'a DMatrix<f64>>,
{
    let present = graphs.iter().filter(|&g| field_of(g).is_some()).count();
    if present == 0 {
        return Ok(None);
    }
    if present != graphs.len() {
        return Err(GraphError::ShapeMismatch {
            field,
            expected: graphs.len(),
            found: present,
        });
    }
    let blocks: Vec<&DMatrix<f64>> = graphs.iter().filter_map(&field_of).collect();
    vstack(blocks.into_iter(), field).map(Some)
}

fn collate_preloaded(graphs: &[GraphData]) -> Vec<Vec<usize>> {
    let levels = graphs
        .iter()
        .map(|g| g.preloaded_clusters.len())
        .min()
        .unwrap_or(0);
    (0..levels)
        .map(|level| {
            graphs
                .iter()
                .flat_map(|g| g.preloaded_clusters[level].iter().copied())
                .collect()
        })
        .collect()
}

fn collate_targets(graphs: &[GraphData]) -> BTreeMap<String, Vec<f64>> {
    let mut targets: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for graph in graphs {
        for (name, values) in &graph.targets {
            targets
                .entry(name.clone())
                .or_default()
                .extend(values.iter().copied());
        }
    }
    targets
}
