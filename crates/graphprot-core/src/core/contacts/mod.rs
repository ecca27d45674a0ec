//! # Contacts Module
//!
//! Identity of interactions between structural entities and their discovery
//! in a molecular system.
//!
//! - [`pair`] - Unordered pairs and the [`pair::Contact`] sum type used as edge identity
//! - [`enumeration`] - Brute-force search for atom and residue pairs within a cutoff

use crate::core::forcefield::energy::EnergyError;
use crate::core::models::ids::{AtomId, ResidueId};
use thiserror::Error;

pub mod enumeration;
pub mod pair;

#[derive(Debug, Error, PartialEq)]
pub enum ContactError {
    #[error("A contact cannot pair an entity with itself")]
    SelfContact,
    #[error("Atom {0:?} does not exist in the system")]
    UnknownAtom(AtomId),
    #[error("Residue {0:?} does not exist in the system")]
    UnknownResidue(ResidueId),
    #[error("Residue {0:?} has no atoms")]
    EmptyResidue(ResidueId),
    #[error("Contact cutoff must be positive and finite, got {0}")]
    InvalidCutoff(f64),
    #[error(transparent)]
    Energy(#[from] EnergyError),
}
