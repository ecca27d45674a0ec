use super::atom::Atom;
use super::chain::{Chain, ChainType};
use super::ids::{AtomId, ChainId, ResidueId};
use super::residue::{Residue, ResidueType};
use super::topology::Bond;
use slotmap::{SecondaryMap, SlotMap};
use std::collections::HashMap;

/// Represents a complete molecular structure with atoms, residues, chains, and bonds.
///
/// This is the read-only view the graph engine receives from the structure
/// collaborator. It provides stable IDs for every entity, which the contact
/// model uses as identity keys.
#[derive(Debug, Clone, Default)]
pub struct MolecularSystem {
    /// Primary storage for atoms.
    atoms: SlotMap<AtomId, Atom>,
    /// Primary storage for residues.
    residues: SlotMap<ResidueId, Residue>,
    /// Primary storage for chains.
    chains: SlotMap<ChainId, Chain>,
    /// List of all explicit bonds in the system.
    bonds: Vec<Bond>,
    /// Lookup map for finding residues by chain, residue number and insertion code.
    residue_id_map: HashMap<(ChainId, isize, Option<char>), ResidueId>,
    /// Lookup map for finding chains by their single-character identifier.
    chain_id_map: HashMap<char, ChainId>,
    /// Cached adjacency list for bond connectivity, indexed by atom ID.
    bond_adjacency: SecondaryMap<AtomId, Vec<AtomId>>,
}

impl MolecularSystem {
    /// Creates a new, empty molecular system.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    pub fn atom_mut(&mut self, id: AtomId) -> Option<&mut Atom> {
        self.atoms.get_mut(id)
    }

    /// Returns an iterator over all atoms in insertion order.
    pub fn atoms_iter(&self) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.atoms.iter()
    }

    pub fn atoms_iter_mut(&mut self) -> impl Iterator<Item = (AtomId, &mut Atom)> {
        self.atoms.iter_mut()
    }

    pub fn residue(&self, id: ResidueId) -> Option<&Residue> {
        self.residues.get(id)
    }

    /// Returns an iterator over all residues in insertion order.
    pub fn residues_iter(&self) -> impl Iterator<Item = (ResidueId, &Residue)> {
        self.residues.iter()
    }

    pub fn chain(&self, id: ChainId) -> Option<&Chain> {
        self.chains.get(id)
    }

    pub fn chains_iter(&self) -> impl Iterator<Item = (ChainId, &Chain)> {
        self.chains.iter()
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// Finds a chain ID by its single-character identifier.
    pub fn find_chain_by_id(&self, id: char) -> Option<ChainId> {
        self.chain_id_map.get(&id).copied()
    }

    /// Finds a residue by chain, sequence number and insertion code.
    pub fn find_residue(
        &self,
        chain_id: ChainId,
        residue_number: isize,
        insertion_code: Option<char>,
    ) -> Option<ResidueId> {
        self.residue_id_map
            .get(&(chain_id, residue_number, insertion_code))
            .copied()
    }

    /// Adds a new chain to the system or returns the existing one.
    ///
    /// This method is idempotent; if a chain with the given ID already exists,
    /// it returns the existing chain ID without creating a duplicate.
    pub fn add_chain(&mut self, id: char, chain_type: ChainType) -> ChainId {
        *self.chain_id_map.entry(id).or_insert_with(|| {
            let chain = Chain::new(id, chain_type);
            self.chains.insert(chain)
        })
    }

    /// Adds a new residue to a chain or returns the existing one.
    ///
    /// The residue type is derived from `name` when it is a standard amino acid.
    ///
    /// # Return
    ///
    /// Returns `None` if the chain does not exist.
    pub fn add_residue(
        &mut self,
        chain_id: ChainId,
        residue_number: isize,
        insertion_code: Option<char>,
        name: &str,
    ) -> Option<ResidueId> {
        let chain = self.chains.get_mut(chain_id)?;
        let key = (chain_id, residue_number, insertion_code);

        let residue_id = *self.residue_id_map.entry(key).or_insert_with(|| {
            let residue_type = name.parse::<ResidueType>().ok();
            let mut residue = Residue::new(residue_number, name, residue_type, chain_id);
            residue.insertion_code = insertion_code;
            self.residues.insert(residue)
        });

        if !chain.residues.contains(&residue_id) {
            chain.residues.push(residue_id);
        }

        Some(residue_id)
    }

    /// Adds an atom to a specific residue.
    ///
    /// # Return
    ///
    /// Returns `None` if the residue does not exist.
    pub fn add_atom_to_residue(&mut self, residue_id: ResidueId, mut atom: Atom) -> Option<AtomId> {
        let residue = self.residues.get_mut(residue_id)?;
        atom.residue_id = residue_id;
        let name = atom.name.clone();

        let atom_id = self.atoms.insert(atom);
        self.bond_adjacency.insert(atom_id, Vec::new());
        residue.add_atom(&name, atom_id);

        Some(atom_id)
    }

    /// Adds a bond between two atoms.
    ///
    /// Adding an existing bond succeeds without creating duplicates.
    ///
    /// # Return
    ///
    /// Returns `None` if either atom does not exist or both IDs are the same.
    pub fn add_bond(&mut self, atom1_id: AtomId, atom2_id: AtomId) -> Option<()> {
        if atom1_id == atom2_id
            || !self.atoms.contains_key(atom1_id)
            || !self.atoms.contains_key(atom2_id)
        {
            return None;
        }

        if self.are_bonded(atom1_id, atom2_id) {
            return Some(());
        }

        self.bonds.push(Bond::new(atom1_id, atom2_id));
        self.bond_adjacency[atom1_id].push(atom2_id);
        self.bond_adjacency[atom2_id].push(atom1_id);
        Some(())
    }

    /// Retrieves the bonded neighbors of an atom.
    pub fn get_bonded_neighbors(&self, atom_id: AtomId) -> Option<&[AtomId]> {
        self.bond_adjacency.get(atom_id).map(|v| v.as_slice())
    }

    /// Returns `true` if an explicit bond connects the two atoms.
    pub fn are_bonded(&self, atom1_id: AtomId, atom2_id: AtomId) -> bool {
        self.get_bonded_neighbors(atom1_id)
            .is_some_and(|neighbors| neighbors.contains(&atom2_id))
    }

    pub fn chain_of_residue(&self, residue_id: ResidueId) -> Option<ChainId> {
        self.residue(residue_id).map(|residue| residue.chain_id)
    }

    pub fn chain_of_atom(&self, atom_id: AtomId) -> Option<ChainId> {
        self.atom(atom_id)
            .and_then(|atom| self.chain_of_residue(atom.residue_id))
    }
}
