//! # Features Module
//!
//! Passes that decorate the nodes and edges of a [`GraphBuilder`](crate::core::graph::GraphBuilder)
//! with descriptors computed from a [`MolecularSystem`](crate::core::models::system::MolecularSystem).
//!
//! - [`names`] - Registry of feature names shared by the passes and the tensor export
//! - [`contact`] - Edge descriptors: distance, energies and relationship flags
//! - [`residue`] - Node descriptors: position, residue properties and variant differences

use crate::core::contacts::ContactError;
use crate::core::graph::GraphError;
use thiserror::Error;

pub mod contact;
pub mod names;
pub mod residue;

#[derive(Debug, Error, PartialEq)]
pub enum FeatureError {
    #[error(transparent)]
    Contact(#[from] ContactError),
    #[error(transparent)]
    Graph(#[from] GraphError),
}
