use super::ids::ResidueId;
use nalgebra::Point3;

/// Van der Waals parameters cached on an atom after parameterization.
///
/// Only the Lennard-Jones 12-6 form is supported: its repulsive wall keeps the
/// energy strictly positive at sub-angstrom separations, which the descriptors
/// rely on to flag steric clashes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CachedVdwParam {
    /// Lennard-Jones potential parameters.
    LennardJones {
        /// The van der Waals radius (position of the well minimum) in Angstroms.
        radius: f64,
        /// The well depth parameter (epsilon) in kcal/mol.
        well_depth: f64,
    },
    /// The atom has not been parameterized.
    #[default]
    None,
}

/// An atom as delivered by the structure collaborator.
///
/// Coordinates and partial charge are optional because structure files can
/// lack them; the energy evaluator refuses to compute descriptors for an atom
/// whose required data is missing instead of producing `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Serial number from the source structure, used in diagnostics.
    pub serial: usize,
    /// The name of the atom (e.g., "CA", "N", "OE1").
    pub name: String,
    /// The chemical element symbol (e.g., "C", "N").
    pub element: String,
    /// The ID of the parent residue this atom belongs to.
    pub residue_id: ResidueId,
    /// The 3D coordinates of the atom in Angstroms, if known.
    pub position: Option<Point3<f64>>,
    /// The partial atomic charge in elementary charge units, if known.
    pub partial_charge: Option<f64>,
    /// The force field atom type assigned during parameterization.
    pub force_field_type: String,
    /// Cached van der Waals parameters.
    pub vdw_param: CachedVdwParam,
}

impl Atom {
    /// Creates a new `Atom` at the given position.
    ///
    /// The element is guessed from the first alphabetic character of the atom
    /// name; charge and van der Waals parameters start unset.
    pub fn new(serial: usize, name: &str, residue_id: ResidueId, position: Point3<f64>) -> Self {
        Self {
            serial,
            name: name.to_string(),
            element: guess_element(name),
            residue_id,
            position: Some(position),
            partial_charge: None,
            force_field_type: String::new(),
            vdw_param: CachedVdwParam::None,
        }
    }

    /// Creates an atom whose coordinates were not resolved in the source structure.
    pub fn without_position(serial: usize, name: &str, residue_id: ResidueId) -> Self {
        Self {
            position: None,
            ..Self::new(serial, name, residue_id, Point3::origin())
        }
    }

    pub fn with_charge(mut self, charge: f64) -> Self {
        self.partial_charge = Some(charge);
        self
    }

    pub fn with_lennard_jones(mut self, radius: f64, well_depth: f64) -> Self {
        self.vdw_param = CachedVdwParam::LennardJones { radius, well_depth };
        self
    }

    pub fn is_hydrogen(&self) -> bool {
        matches!(self.element.as_str(), "H" | "D")
    }
}

fn guess_element(name: &str) -> String {
    name.trim()
        .chars()
        .find(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase().to_string())
        .unwrap_or_default()
}
