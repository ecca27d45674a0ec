//! Persistence of exported graph tensors.
//!
//! Graphs are stored in a [`archive::GraphArchive`], one named group per
//! processed query. Workers write independent archives which can be combined
//! afterwards with [`archive::merge_archives`].

pub mod archive;
