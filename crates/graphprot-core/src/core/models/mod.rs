//! # Core Models Module
//!
//! Read-only representation of the molecular structure handed to the graph
//! engine by the structure collaborator.
//!
//! ## Key Components
//!
//! - [`atom`] - Individual atom with optional coordinates, charge and cached parameters
//! - [`residue`] - Residue container and the standard amino acid table
//! - [`chain`] - Chain organization and metadata
//! - [`system`] - Complete molecular system with stable IDs and bond connectivity
//! - [`topology`] - Explicit bonds
//! - [`ids`] - Unique identifier types for atoms, residues, and chains
//!
//! ## Usage
//!
//! ```ignore
//! use graphprot::core::models::{atom::Atom, chain::ChainType, system::MolecularSystem};
//!
//! let mut system = MolecularSystem::new();
//! let chain_id = system.add_chain('A', ChainType::Protein);
//! let residue_id = system.add_residue(chain_id, 1, None, "ALA").unwrap();
//! system.add_atom_to_residue(residue_id, Atom::new(1, "CA", residue_id, Point3::origin()));
//! ```

pub mod atom;
pub mod chain;
pub mod ids;
pub mod residue;
pub mod system;
pub mod topology;
