//! # Force Field Module
//!
//! Classical molecular mechanics terms used to describe contacts: the
//! Lennard-Jones van der Waals term and a screened Coulomb electrostatic term.
//!
//! ## Key Components
//!
//! - [`potentials`] - Pure functional forms of the pair potentials
//! - [`energy`] - Pair evaluation on atoms, with validation of the required atom data
//! - [`params`] - Force field parameter files (TOML non-bonded table and CSV atom typing)
//! - [`parameterization`] - Assignment of types, charges and VDW parameters to atoms
//! - [`term`] - Energy term aggregation
//!
//! ```ignore
//! use graphprot::core::forcefield::energy::{ElectrostaticsConfig, EnergyCalculator};
//!
//! let vdw = EnergyCalculator::calculate_vdw(atom1, atom2)?;
//! let elec = EnergyCalculator::calculate_coulomb(atom1, atom2, &ElectrostaticsConfig::default())?;
//! ```

pub mod energy;
pub mod parameterization;
pub mod params;
pub mod potentials;
pub mod term;
