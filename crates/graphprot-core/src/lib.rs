//! # GraphProt Core Library
//!
//! Builds molecular contact graphs of protein structures, decorates them with
//! physics-based node and edge descriptors, and coarsens them hierarchically
//! by community detection and pooling for graph neural networks.
//!
//! ## Architecture
//!
//! The library follows a strict three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`MolecularSystem`),
//!   force-field math (`potentials`, `energy`), contact identity and
//!   enumeration, feature passes, the graph container with its tensor export,
//!   and the JSON graph archive.
//!
//! - **[`engine`]: Graph Computation.** Community detection (Markov clustering
//!   and Louvain), community pooling, and the configuration, error and progress
//!   types shared by the workflows.
//!
//! - **[`workflows`]: The Public API.** Complete procedures: building feature
//!   graphs for a set of queries and coarsening a packed graph batch over
//!   several rounds.

pub mod core;
pub mod engine;
pub mod workflows;
