use super::ids::{AtomId, ChainId};
use phf::{Map, phf_map};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResidueType {
    Alanine,
    Arginine,
    Asparagine,
    AsparticAcid,
    Cysteine,
    Glutamine,
    GlutamicAcid,
    Glycine,
    Histidine,
    Isoleucine,
    Leucine,
    Lysine,
    Methionine,
    Phenylalanine,
    Proline,
    Serine,
    Threonine,
    Tryptophan,
    Tyrosine,
    Valine,
}

/// Side-chain polarity class used for the one-hot `polarity` node feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    Nonpolar,
    Polar,
    NegativeCharge,
    PositiveCharge,
}

impl Polarity {
    pub const ALL: [Polarity; 4] = [
        Polarity::Nonpolar,
        Polarity::Polar,
        Polarity::NegativeCharge,
        Polarity::PositiveCharge,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Physicochemical properties of a standard amino acid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidueProperties {
    pub one_letter_code: char,
    pub polarity: Polarity,
    /// Formal side-chain charge at neutral pH.
    pub charge: f64,
    /// Number of heavy side-chain atoms.
    pub size: usize,
    pub hbond_donors: usize,
    pub hbond_acceptors: usize,
}

#[rustfmt::skip]
static RESIDUE_NAMES: Map<&'static str, ResidueType> = phf_map! {
    "ALA" => ResidueType::Alanine,
    "ARG" => ResidueType::Arginine,
    "ASN" => ResidueType::Asparagine,
    "ASP" => ResidueType::AsparticAcid,
    "CYS" => ResidueType::Cysteine, "CYX" => ResidueType::Cysteine,
    "GLN" => ResidueType::Glutamine,
    "GLU" => ResidueType::GlutamicAcid,
    "GLY" => ResidueType::Glycine,
    "HIS" => ResidueType::Histidine, "HSE" => ResidueType::Histidine, "HSD" => ResidueType::Histidine,
    "HSP" => ResidueType::Histidine, "HIE" => ResidueType::Histidine, "HID" => ResidueType::Histidine,
    "HIP" => ResidueType::Histidine,
    "ILE" => ResidueType::Isoleucine,
    "LEU" => ResidueType::Leucine,
    "LYS" => ResidueType::Lysine,
    "MET" => ResidueType::Methionine, "MSE" => ResidueType::Methionine,
    "PHE" => ResidueType::Phenylalanine,
    "PRO" => ResidueType::Proline,
    "SER" => ResidueType::Serine,
    "THR" => ResidueType::Threonine,
    "TRP" => ResidueType::Tryptophan,
    "TYR" => ResidueType::Tyrosine,
    "VAL" => ResidueType::Valine,
};

impl ResidueType {
    /// All standard residue types in one-hot column order.
    pub const ALL: [ResidueType; 20] = [
        ResidueType::Alanine,
        ResidueType::Arginine,
        ResidueType::Asparagine,
        ResidueType::AsparticAcid,
        ResidueType::Cysteine,
        ResidueType::Glutamine,
        ResidueType::GlutamicAcid,
        ResidueType::Glycine,
        ResidueType::Histidine,
        ResidueType::Isoleucine,
        ResidueType::Leucine,
        ResidueType::Lysine,
        ResidueType::Methionine,
        ResidueType::Phenylalanine,
        ResidueType::Proline,
        ResidueType::Serine,
        ResidueType::Threonine,
        ResidueType::Tryptophan,
        ResidueType::Tyrosine,
        ResidueType::Valine,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn to_three_letter(self) -> &'static str {
        match self {
            ResidueType::Alanine => "ALA",
            ResidueType::Arginine => "ARG",
            ResidueType::Asparagine => "ASN",
            ResidueType::AsparticAcid => "ASP",
            ResidueType::Cysteine => "CYS",
            ResidueType::Glutamine => "GLN",
            ResidueType::GlutamicAcid => "GLU",
            ResidueType::Glycine => "GLY",
            ResidueType::Histidine => "HIS",
            ResidueType::Isoleucine => "ILE",
            ResidueType::Leucine => "LEU",
            ResidueType::Lysine => "LYS",
            ResidueType::Methionine => "MET",
            ResidueType::Phenylalanine => "PHE",
            ResidueType::Proline => "PRO",
            ResidueType::Serine => "SER",
            ResidueType::Threonine => "THR",
            ResidueType::Tryptophan => "TRP",
            ResidueType::Tyrosine => "TYR",
            ResidueType::Valine => "VAL",
        }
    }

    #[rustfmt::skip]
    pub fn properties(self) -> ResidueProperties {
        use Polarity::*;
        let (one_letter_code, polarity, charge, size, hbond_donors, hbond_acceptors) = match self {
            ResidueType::Alanine       => ('A', Nonpolar,        0.0,  1, 0, 0),
            ResidueType::Arginine      => ('R', PositiveCharge,  1.0,  7, 5, 0),
            ResidueType::Asparagine    => ('N', Polar,           0.0,  4, 2, 2),
            ResidueType::AsparticAcid  => ('D', NegativeCharge, -1.0,  4, 0, 4),
            ResidueType::Cysteine      => ('C', Polar,           0.0,  2, 0, 0),
            ResidueType::Glutamine     => ('Q', Polar,           0.0,  5, 2, 2),
            ResidueType::GlutamicAcid  => ('E', NegativeCharge, -1.0,  5, 0, 4),
            ResidueType::Glycine       => ('G', Nonpolar,        0.0,  0, 0, 0),
            ResidueType::Histidine     => ('H', PositiveCharge,  0.0,  6, 2, 2),
            ResidueType::Isoleucine    => ('I', Nonpolar,        0.0,  4, 0, 0),
            ResidueType::Leucine       => ('L', Nonpolar,        0.0,  4, 0, 0),
            ResidueType::Lysine        => ('K', PositiveCharge,  1.0,  5, 3, 0),
            ResidueType::Methionine    => ('M', Nonpolar,        0.0,  4, 0, 0),
            ResidueType::Phenylalanine => ('F', Nonpolar,        0.0,  7, 0, 0),
            ResidueType::Proline       => ('P', Nonpolar,        0.0,  3, 0, 0),
            ResidueType::Serine        => ('S', Polar,           0.0,  2, 1, 2),
            ResidueType::Threonine     => ('T', Polar,           0.0,  3, 1, 2),
            ResidueType::Tryptophan    => ('W', Nonpolar,        0.0, 10, 1, 0),
            ResidueType::Tyrosine      => ('Y', Polar,           0.0,  8, 1, 1),
            ResidueType::Valine        => ('V', Nonpolar,        0.0,  3, 0, 0),
        };
        ResidueProperties {
            one_letter_code,
            polarity,
            charge,
            size,
            hbond_donors,
            hbond_acceptors,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown residue name '{0}'")]
pub struct ParseResidueTypeError(pub String);

impl FromStr for ResidueType {
    type Err = ParseResidueTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RESIDUE_NAMES
            .get(s.trim().to_ascii_uppercase().as_str())
            .copied()
            .ok_or_else(|| ParseResidueTypeError(s.to_string()))
    }
}

impl fmt::Display for ResidueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_three_letter())
    }
}

impl Serialize for ResidueType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.to_three_letter())
    }
}

impl<'de> Deserialize<'de> for ResidueType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    pub residue_number: isize,              // Residue sequence number from source file
    pub insertion_code: Option<char>,       // PDB insertion code, if any
    pub name: String,                       // Name of the residue (e.g., "ALA", "GLY")
    pub residue_type: Option<ResidueType>,  // Standard type, `None` for ligands and unknowns
    pub chain_id: ChainId,                  // ID of the parent chain
    pub(crate) atoms: Vec<AtomId>,          // Atoms belonging to this residue, in insertion order
    atom_name_map: HashMap<String, AtomId>, // Map from atom name to its stable ID
}

impl Residue {
    pub(crate) fn new(
        residue_number: isize,
        name: &str,
        residue_type: Option<ResidueType>,
        chain_id: ChainId,
    ) -> Self {
        Self {
            residue_number,
            insertion_code: None,
            name: name.to_string(),
            residue_type,
            chain_id,
            atoms: Vec::new(),
            atom_name_map: HashMap::new(),
        }
    }

    pub(crate) fn add_atom(&mut self, atom_name: &str, atom_id: AtomId) {
        self.atoms.push(atom_id);
        self.atom_name_map
            .entry(atom_name.to_string())
            .or_insert(atom_id);
    }

    pub fn atoms(&self) -> &[AtomId] {
        &self.atoms
    }

    /// Returns the first atom registered under `name`.
    pub fn get_first_atom_id_by_name(&self, name: &str) -> Option<AtomId> {
        self.atom_name_map.get(name).copied()
    }
}
