//! # Workflows Module
//!
//! End-to-end procedures built from the `core` and `engine` layers.
//!
//! - **Graph construction** ([`build`]) - Turns structure queries into feature graphs
//!   and graph archives
//! - **Coarsening** ([`coarsen`]) - Hierarchical clustering and pooling of a graph batch

pub mod build;
pub mod coarsen;
