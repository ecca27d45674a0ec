use super::params::Forcefield;
use crate::core::models::{atom::CachedVdwParam, ids::AtomId, system::MolecularSystem};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParameterizationError {
    #[error(
        "Missing VDW parameter for force field type: '{ff_type}' in atom '{atom_name}' of residue {residue_name}"
    )]
    MissingVdwParams {
        ff_type: String,
        atom_name: String,
        residue_name: String,
    },
}

/// Counts of atoms handled by [`Parameterizer::parameterize_system`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParameterizationSummary {
    pub parameterized: usize,
    pub unknown: usize,
}

/// Assigns force field types, partial charges and Lennard-Jones parameters to atoms.
///
/// Atoms without a typing record keep their previous (usually empty) values, so
/// descriptor evaluation later reports them as missing data.
pub struct Parameterizer<'a> {
    forcefield: &'a Forcefield,
}

impl<'a> Parameterizer<'a> {
    pub fn new(forcefield: &'a Forcefield) -> Self {
        Self { forcefield }
    }

    pub fn parameterize_system(
        &self,
        system: &mut MolecularSystem,
    ) -> Result<ParameterizationSummary, ParameterizationError> {
        let targets: Vec<(AtomId, String)> = system
            .atoms_iter()
            .filter_map(|(atom_id, atom)| {
                system
                    .residue(atom.residue_id)
                    .map(|residue| (atom_id, residue.name.clone()))
            })
            .collect();

        let mut summary = ParameterizationSummary::default();
        for (atom_id, residue_name) in targets {
            let Some(atom) = system.atom_mut(atom_id) else {
                continue;
            };

            let Some(record) = self.forcefield.atom_type(&residue_name, &atom.name) else {
                warn!(
                    "No atom type for atom '{}' (serial {}) in residue '{}'; leaving it unparameterized.",
                    atom.name, atom.serial, residue_name
                );
                summary.unknown += 1;
                continue;
            };

            let vdw = self.forcefield.vdw(&record.ff_type).ok_or_else(|| {
                ParameterizationError::MissingVdwParams {
                    ff_type: record.ff_type.clone(),
                    atom_name: atom.name.clone(),
                    residue_name: residue_name.clone(),
                }
            })?;

            atom.force_field_type = record.ff_type.clone();
            atom.partial_charge = Some(record.charge);
            atom.vdw_param = CachedVdwParam::LennardJones {
                radius: vdw.radius,
                well_depth: vdw.well_depth,
            };
            summary.parameterized += 1;
        }

        debug!(
            parameterized = summary.parameterized,
            unknown = summary.unknown,
            "Parameterized molecular system."
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::params::{AtomTypeRecord, GlobalParams, NonBondedParams, VdwParam};
    use crate::core::models::{atom::Atom, chain::ChainType};
    use nalgebra::Point3;
    use std::collections::HashMap;

    fn record(residue: &str, atom: &str, ff_type: &str, charge: f64) -> AtomTypeRecord {
        AtomTypeRecord {
            residue: residue.to_string(),
            atom: atom.to_string(),
            ff_type: ff_type.to_string(),
            charge,
        }
    }

    fn test_forcefield() -> Forcefield {
        let mut vdw = HashMap::new();
        vdw.insert(
            "C".to_string(),
            VdwParam {
                radius: 3.8,
                well_depth: 0.1,
            },
        );
        vdw.insert(
            "N".to_string(),
            VdwParam {
                radius: 3.3,
                well_depth: 0.08,
            },
        );
        let mut atom_types = HashMap::new();
        for r in [
            record("*", "N", "N", -0.47),
            record("*", "CA", "C", 0.07),
            record("LYS", "NZ", "N", -0.3),
            record("ALA", "CB", "X", 0.0),
        ] {
            atom_types.insert((r.residue.clone(), r.atom.clone()), r);
        }
        Forcefield {
            non_bonded: NonBondedParams {
                globals: GlobalParams {
                    dielectric_constant: 1.0,
                },
                vdw,
            },
            atom_types,
        }
    }

    fn system_with_atoms(residue: &str, atom_names: &[&str]) -> (MolecularSystem, Vec<AtomId>) {
        let mut system = MolecularSystem::new();
        let chain_id = system.add_chain('A', ChainType::Protein);
        let residue_id = system.add_residue(chain_id, 1, None, residue).unwrap();
        let ids = atom_names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let atom = Atom::new(i + 1, name, residue_id, Point3::new(i as f64, 0.0, 0.0));
                system.add_atom_to_residue(residue_id, atom).unwrap()
            })
            .collect();
        (system, ids)
    }

    #[test]
    fn parameterize_assigns_type_charge_and_lennard_jones() {
        let ff = test_forcefield();
        let (mut system, ids) = system_with_atoms("LYS", &["N", "CA", "NZ"]);

        let summary = Parameterizer::new(&ff)
            .parameterize_system(&mut system)
            .unwrap();

        assert_eq!(summary.parameterized, 3);
        assert_eq!(summary.unknown, 0);
        let nz = system.atom(ids[2]).unwrap();
        assert_eq!(nz.force_field_type, "N");
        assert_eq!(nz.partial_charge, Some(-0.3));
        assert_eq!(
            nz.vdw_param,
            CachedVdwParam::LennardJones {
                radius: 3.3,
                well_depth: 0.08
            }
        );
        assert_eq!(system.atom(ids[1]).unwrap().partial_charge, Some(0.07));
    }

    #[test]
    fn parameterize_leaves_unknown_atoms_untouched() {
        let ff = test_forcefield();
        let (mut system, ids) = system_with_atoms("GLY", &["CA", "OXT"]);

        let summary = Parameterizer::new(&ff)
            .parameterize_system(&mut system)
            .unwrap();

        assert_eq!(summary.unknown, 1);
        let oxt = system.atom(ids[1]).unwrap();
        assert_eq!(oxt.partial_charge, None);
        assert_eq!(oxt.vdw_param, CachedVdwParam::None);
    }

    #[test]
    fn parameterize_fails_for_type_without_vdw_entry() {
        let ff = test_forcefield();
        let (mut system, _) = system_with_atoms("ALA", &["CB"]);

        let result = Parameterizer::new(&ff).parameterize_system(&mut system);
        assert_eq!(
            result,
            Err(ParameterizationError::MissingVdwParams {
                ff_type: "X".to_string(),
                atom_name: "CB".to_string(),
                residue_name: "ALA".to_string(),
            })
        );
    }
}
