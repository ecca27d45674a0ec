use super::GraphError;
use super::data::{EdgeIndex, GraphData};
use super::node::{Edge, FeatureMap, FeatureValue, Node, NodeId};
use crate::core::contacts::pair::Contact;
use crate::core::features::names;
use nalgebra::DMatrix;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Mutable accumulator for nodes, edges and targets of one graph.
///
/// Feature passes receive the builder by `&mut`. Adding a node or edge that
/// already exists merges the new feature map into the stored one, with later
/// values overwriting earlier values for the same key.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    id: String,
    nodes: Vec<Node>,
    node_index: HashMap<NodeId, usize>,
    edges: Vec<Edge>,
    edge_index: HashMap<Contact, usize>,
    targets: BTreeMap<String, f64>,
}

impl GraphBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn add_node(&mut self, node: Node) -> &mut Node {
        if let Some(&index) = self.node_index.get(&node.id) {
            let existing = &mut self.nodes[index];
            existing.features.extend(node.features);
            if existing.label.is_empty() {
                existing.label = node.label;
            }
            return existing;
        }
        let index = self.nodes.len();
        self.node_index.insert(node.id, index);
        self.nodes.push(node);
        &mut self.nodes[index]
    }

    pub fn add_edge(&mut self, edge: Edge) -> &mut Edge {
        if let Some(&index) = self.edge_index.get(&edge.id) {
            let existing = &mut self.edges[index];
            existing.features.extend(edge.features);
            return existing;
        }
        let index = self.edges.len();
        self.edge_index.insert(edge.id, index);
        self.edges.push(edge);
        &mut self.edges[index]
    }

    pub fn has_node(&self, id: &NodeId) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.node_index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.node_index.get(id).map(|&i| &mut self.nodes[i])
    }

    pub fn edge_mut(&mut self, id: &Contact) -> Option<&mut Edge> {
        self.edge_index.get(id).map(|&i| &mut self.edges[i])
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edges_mut(&mut self) -> &mut [Edge] {
        &mut self.edges
    }

    pub fn set_target(&mut self, name: &str, value: f64) {
        self.targets.insert(name.to_string(), value);
    }

    /// Verifies that both endpoints of every edge are nodes of this graph.
    pub fn check_endpoints(&self) -> Result<(), GraphError> {
        check_endpoints(&self.edges, &self.node_index)
    }

    /// Freezes the builder into a read-only [`Graph`].
    pub fn finalize(self) -> Result<Graph, GraphError> {
        self.check_endpoints()?;
        debug!(
            graph = %self.id,
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "Finalized graph."
        );
        Ok(Graph {
            id: self.id,
            nodes: self.nodes,
            node_index: self.node_index,
            edges: self.edges,
            targets: self.targets,
        })
    }
}

/// A finalized graph whose edges are known to reference existing nodes.
#[derive(Debug, Clone)]
pub struct Graph {
    id: String,
    nodes: Vec<Node>,
    node_index: HashMap<NodeId, usize>,
    edges: Vec<Edge>,
    targets: BTreeMap<String, f64>,
}

impl Graph {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.node_index.get(id).map(|&i| &self.nodes[i])
    }

    /// Row of the node in the exported node matrix.
    pub fn node_position(&self, id: &NodeId) -> Option<usize> {
        self.node_index.get(id).copied()
    }

    pub fn targets(&self) -> &BTreeMap<String, f64> {
        &self.targets
    }

    /// Stacks the requested features into aligned node and edge tensors.
    ///
    /// Columns follow the order of the requested names with vector features
    /// flattened in place. Each undirected edge is exported once, from the
    /// first to the second member of its contact. `pos` is filled from the
    /// `_position` node feature when nodes carry it.
    pub fn to_graph_data(
        &self,
        node_features: &[&str],
        edge_features: &[&str],
    ) -> Result<GraphData, GraphError> {
        check_endpoints(&self.edges, &self.node_index)?;

        let x = stack_features(&self.nodes, node_features, |n| &n.features, |n| {
            format!("node '{}'", n.label)
        })?;
        let edge_attr = stack_features(&self.edges, edge_features, |e| &e.features, |e| {
            format!("edge '{}'", e.id)
        })?;

        let edge_index = EdgeIndex::from_pairs(self.edges.iter().map(|edge| {
            let (a, b) = edge.id.endpoints();
            (self.node_index[&a], self.node_index[&b])
        }));

        let pos = if self
            .nodes
            .iter()
            .any(|n| n.features.contains_key(names::POSITION))
        {
            Some(stack_features(&self.nodes, &[names::POSITION], |n| &n.features, |n| {
                format!("node '{}'", n.label)
            })?)
        } else {
            None
        };

        let mut data = GraphData::new(x, edge_index, edge_attr);
        data.ids = self.nodes.iter().map(|n| n.label.clone()).collect();
        data.pos = pos;
        data.targets = self
            .targets
            .iter()
            .map(|(name, &value)| (name.clone(), vec![value]))
            .collect();
        Ok(data)
    }
}

fn check_endpoints(edges: &[Edge], node_index: &HashMap<NodeId, usize>) -> Result<(), GraphError> {
    for edge in edges {
        let (a, b) = edge.id.endpoints();
        for node in [a, b] {
            if !node_index.contains_key(&node) {
                return Err(GraphError::MissingEndpoint {
                    edge: edge.id,
                    node,
                });
            }
        }
    }
    Ok(())
}

fn stack_features<T>(
    items: &[T],
    names: &[&str],
    features_of: impl Fn(&T) -> &FeatureMap,
    describe: impl Fn(&T) -> String,
) -> Result<DMatrix<f64>, GraphError> {
    let mut widths: Vec<Option<usize>> = vec![None; names.len()];
    let mut values = Vec::new();

    for item in items {
        let features = features_of(item);
        for (k, &name) in names.iter().enumerate() {
            let value: &FeatureValue =
                features
                    .get(name)
                    .ok_or_else(|| GraphError::MissingFeature {
                        feature: name.to_string(),
                        element: describe(item),
                    })?;
            match widths[k] {
                Some(expected) if expected != value.width() => {
                    return Err(GraphError::FeatureWidthMismatch {
                        feature: name.to_string(),
                        element: describe(item),
                        expected,
                        found: value.width(),
                    });
                }
                Some(_) => {}
                None => widths[k] = Some(value.width()),
            }
            values.extend_from_slice(value.as_slice());
        }
    }

    let width = widths.iter().flatten().sum();
    Ok(DMatrix::from_row_slice(items.len(), width, &values))
}
