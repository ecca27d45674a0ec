use super::ids::ResidueId;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChainType {
    #[default]
    Protein,
    NucleicAcid,
    Ligand,
    Water,
    Other,
}

impl FromStr for ChainType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "protein" => ChainType::Protein,
            "dna" | "rna" | "nucleic-acid" => ChainType::NucleicAcid,
            "ligand" => ChainType::Ligand,
            "water" => ChainType::Water,
            _ => ChainType::Other,
        })
    }
}

impl fmt::Display for ChainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChainType::Protein => "Protein",
            ChainType::NucleicAcid => "NucleicAcid",
            ChainType::Ligand => "Ligand",
            ChainType::Water => "Water",
            ChainType::Other => "Other",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub id: char,                        // Chain identifier (e.g., 'A', 'B')
    pub chain_type: ChainType,           // Type of the chain
    pub(crate) residues: Vec<ResidueId>, // Ordered list of residue IDs belonging to this chain
}

impl Chain {
    pub(crate) fn new(id: char, chain_type: ChainType) -> Self {
        Self {
            id,
            chain_type,
            residues: Vec::new(),
        }
    }

    pub fn residues(&self) -> &[ResidueId] {
        &self.residues
    }
}
