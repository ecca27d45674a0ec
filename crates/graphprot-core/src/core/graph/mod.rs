//! # Graph Module
//!
//! Nodes and edges accumulated by the feature passes, frozen into a [`builder::Graph`]
//! and exported as the aligned tensors of [`data::GraphData`].

use crate::core::contacts::pair::Contact;
use thiserror::Error;

pub mod builder;
pub mod data;
pub mod node;

pub use builder::{Graph, GraphBuilder};
pub use data::{EdgeIndex, GraphData};
pub use node::{Edge, FeatureValue, GraphLevel, Node, NodeId};

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Edge '{edge}' references node {node:?} which is not in the graph")]
    MissingEndpoint { edge: Contact, node: NodeId },
    #[error("Feature '{feature}' is missing on {element}")]
    MissingFeature { feature: String, element: String },
    #[error("Feature '{feature}' has width {found} on {element}, expected {expected}")]
    FeatureWidthMismatch {
        feature: String,
        element: String,
        expected: usize,
        found: usize,
    },
    #[error("Node index {index} is out of range for a graph with {node_count} nodes")]
    NodeIndexOutOfRange { index: usize, node_count: usize },
    #[error("Field '{field}' has {found} entries, expected {expected}")]
    ShapeMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Edge {edge} connects nodes of different batch elements")]
    CrossBatchEdge { edge: usize },
    #[error("Column {column} is out of range for a matrix with {width} columns")]
    ColumnOutOfRange { column: usize, width: usize },
}
