//! # Core Module
//!
//! The data structures and per-element computations everything else builds on.
//!
//! - **Molecular Representation** ([`models`]) - Atoms, residues, chains, bonds and the
//!   [`models::system::MolecularSystem`] that owns them
//! - **Energy Calculations** ([`forcefield`]) - Lennard-Jones and screened Coulomb
//!   potentials, parameter files and system parameterization
//! - **Contacts** ([`contacts`]) - Unordered pairs of atoms or residues and their
//!   enumeration within a distance cutoff
//! - **Features** ([`features`]) - Node and edge descriptor passes and their column names
//! - **Graphs** ([`graph`]) - Graph construction and export to aligned tensors
//! - **File I/O** ([`io`]) - Graph archives and merging of worker outputs

pub mod contacts;
pub mod features;
pub mod forcefield;
pub mod graph;
pub mod io;
pub mod models;
