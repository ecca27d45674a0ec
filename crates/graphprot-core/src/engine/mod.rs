//! # Engine Module
//!
//! Graph-level computation on top of the `core` data structures: community
//! detection, community pooling and the configuration, error and progress
//! types the workflows share.
//!
//! - **Clustering** ([`clustering`]) - Markov clustering and Louvain modularity
//!   optimization, run per batch element with globally distinct cluster ids
//! - **Pooling** ([`pooling`]) - Collapses clusters into single nodes with
//!   max-pooled features, averaged positions and coalesced edges
//! - **Configuration** ([`config`]) - Typed settings and their builders
//! - **Error Handling** ([`error`]) - [`error::EngineError`] and its [`error::ErrorKind`]
//! - **Progress Monitoring** ([`progress`]) - Optional progress callbacks

pub mod clustering;
pub mod config;
pub mod error;
pub mod pooling;
pub mod progress;
