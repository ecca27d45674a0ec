use super::params::Forcefield;
use super::potentials::{self, Screening};
use crate::core::models::atom::{Atom, CachedVdwParam};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EnergyError {
    #[error("Atom with serial {0} has no coordinates")]
    MissingPosition(usize),
    #[error("Atom with serial {0} has non-finite coordinates")]
    NonFinitePosition(usize),
    #[error("Atom with serial {0} is not parameterized for VDW calculation")]
    UnparameterizedAtom(usize),
    #[error("Atom with serial {0} has no partial charge")]
    MissingCharge(usize),
    #[error("Dielectric constant must be positive and finite, got {0}")]
    InvalidDielectric(f64),
    #[error("Screening cutoff must be positive and finite, got {0}")]
    InvalidScreeningCutoff(f64),
}

/// Electrostatics settings used by [`EnergyCalculator::calculate_coulomb`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ElectrostaticsConfig {
    pub dielectric: f64,
    pub screening: Screening,
}

impl ElectrostaticsConfig {
    /// Default screening with the dielectric constant of a loaded force field.
    pub fn from_forcefield(forcefield: &Forcefield) -> Self {
        Self {
            dielectric: forcefield.non_bonded.globals.dielectric_constant,
            ..Self::default()
        }
    }

    /// Checks that the dielectric and any screening cutoff are positive and finite.
    pub fn validate(&self) -> Result<(), EnergyError> {
        if !(self.dielectric.is_finite() && self.dielectric > 0.0) {
            return Err(EnergyError::InvalidDielectric(self.dielectric));
        }
        if let Screening::Shifted { cutoff } = self.screening {
            if !(cutoff.is_finite() && cutoff > 0.0) {
                return Err(EnergyError::InvalidScreeningCutoff(cutoff));
            }
        }
        Ok(())
    }
}

impl Default for ElectrostaticsConfig {
    fn default() -> Self {
        Self {
            dielectric: 1.0,
            screening: Screening::default(),
        }
    }
}

pub struct EnergyCalculator;

impl EnergyCalculator {
    pub fn distance(atom1: &Atom, atom2: &Atom) -> Result<f64, EnergyError> {
        let p1 = Self::position(atom1)?;
        let p2 = Self::position(atom2)?;
        Ok((p1 - p2).norm())
    }

    pub fn calculate_vdw(atom1: &Atom, atom2: &Atom) -> Result<f64, EnergyError> {
        let (r_min1, well_depth1) = Self::lennard_jones(atom1)?;
        let (r_min2, well_depth2) = Self::lennard_jones(atom2)?;
        let dist = Self::distance(atom1, atom2)?;

        let r_min_combined = (r_min1 + r_min2) / 2.0;
        let well_depth_combined = (well_depth1 * well_depth2).sqrt();

        Ok(potentials::lennard_jones_12_6(
            dist,
            r_min_combined,
            well_depth_combined,
        ))
    }

    pub fn calculate_coulomb(
        atom1: &Atom,
        atom2: &Atom,
        config: &ElectrostaticsConfig,
    ) -> Result<f64, EnergyError> {
        config.validate()?;
        let q1 = atom1
            .partial_charge
            .ok_or(EnergyError::MissingCharge(atom1.serial))?;
        let q2 = atom2
            .partial_charge
            .ok_or(EnergyError::MissingCharge(atom2.serial))?;
        let dist = Self::distance(atom1, atom2)?;

        Ok(potentials::screened_coulomb(
            dist,
            q1,
            q2,
            config.dielectric,
            config.screening,
        ))
    }

    /// Returns the coordinates of an atom, rejecting missing or non-finite values.
    pub fn position(atom: &Atom) -> Result<nalgebra::Point3<f64>, EnergyError> {
        let position = atom
            .position
            .ok_or(EnergyError::MissingPosition(atom.serial))?;
        if position.iter().all(|c| c.is_finite()) {
            Ok(position)
        } else {
            Err(EnergyError::NonFinitePosition(atom.serial))
        }
    }

    fn lennard_jones(atom: &Atom) -> Result<(f64, f64), EnergyError> {
        match atom.vdw_param {
            CachedVdwParam::LennardJones { radius, well_depth } => Ok((radius, well_depth)),
            CachedVdwParam::None => Err(EnergyError::UnparameterizedAtom(atom.serial)),
        }
    }
}
