use super::ContactError;
use super::pair::{AtomicContact, ResidueContact};
use crate::core::forcefield::energy::EnergyCalculator;
use crate::core::models::ids::{AtomId, ResidueId};
use crate::core::models::system::MolecularSystem;
use itertools::Itertools;
use kiddo::{KdTree, SquaredEuclidean};
use nalgebra::Point3;
use std::collections::BTreeSet;
use tracing::debug;

/// Relative widening of the squared query radius so points on the cutoff
/// boundary reach the exact distance check.
const RADIUS_SLACK: f64 = 1e-9;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Finds all unordered pairs among `atoms` whose distance is at most `cutoff`.
///
/// Duplicate IDs in the input are ignored. Pairs are ordered by the input
/// position of their first member, then of their second member.
pub fn atomic_contacts(
    system: &MolecularSystem,
    atoms: &[AtomId],
    cutoff: f64,
) -> Result<Vec<AtomicContact>, ContactError> {
    validate_cutoff(cutoff)?;
    let atoms: Vec<AtomId> = atoms.iter().copied().unique().collect();

    let positions = atoms
        .iter()
        .map(|&atom_id| atom_position(system, atom_id))
        .collect::<Result<Vec<_>, _>>()?;
    let index = PositionIndex::new(&positions);

    let contacts = for_each_index(atoms.len(), |i| {
        index
            .within(&positions[i], cutoff)
            .into_iter()
            .filter(|&j| j > i)
            .map(|j| (i, j))
            .collect()
    })
    .into_iter()
    .map(|(i, j)| AtomicContact::new(atoms[i], atoms[j]))
    .collect::<Result<Vec<_>, _>>()?;

    debug!(
        atoms = atoms.len(),
        contacts = contacts.len(),
        cutoff,
        "Enumerated atomic contacts."
    );
    Ok(contacts)
}

/// Finds all unordered residue pairs whose closest atoms are at most `cutoff` apart.
pub fn residue_contacts(
    system: &MolecularSystem,
    residues: &[ResidueId],
    cutoff: f64,
) -> Result<Vec<ResidueContact>, ContactError> {
    validate_cutoff(cutoff)?;
    let residues: Vec<ResidueId> = residues.iter().copied().unique().collect();

    let positions = residues
        .iter()
        .map(|&residue_id| residue_positions(system, residue_id))
        .collect::<Result<Vec<_>, _>>()?;

    // Residue index of every atom in the flattened position list.
    let owners: Vec<usize> = positions
        .iter()
        .enumerate()
        .flat_map(|(i, atoms)| std::iter::repeat_n(i, atoms.len()))
        .collect();
    let flat: Vec<Point3<f64>> = positions.iter().flatten().copied().collect();
    let index = PositionIndex::new(&flat);

    let contacts = for_each_index(residues.len(), |i| {
        let partners: BTreeSet<usize> = positions[i]
            .iter()
            .flat_map(|position| index.within(position, cutoff))
            .map(|atom| owners[atom])
            .filter(|&j| j > i)
            .collect();
        partners.into_iter().map(|j| (i, j)).collect()
    })
    .into_iter()
    .map(|(i, j)| ResidueContact::new(residues[i], residues[j]))
    .collect::<Result<Vec<_>, _>>()?;

    debug!(
        residues = residues.len(),
        contacts = contacts.len(),
        cutoff,
        "Enumerated residue contacts."
    );
    Ok(contacts)
}

/// Returns the residues, other than `center`, with any atom within `cutoff` of an atom of `center`.
///
/// Residues without atoms are never near anything and are skipped. The result
/// follows the system's residue order.
pub fn residues_near(
    system: &MolecularSystem,
    center: ResidueId,
    cutoff: f64,
) -> Result<Vec<ResidueId>, ContactError> {
    validate_cutoff(cutoff)?;
    let center_positions = residue_positions(system, center)?;
    let index = PositionIndex::new(&center_positions);

    let mut near = Vec::new();
    for (residue_id, residue) in system.residues_iter() {
        if residue_id == center || residue.atoms().is_empty() {
            continue;
        }
        let positions = residue_positions(system, residue_id)?;
        if positions
            .iter()
            .any(|position| index.nearest_distance(position) <= cutoff)
        {
            near.push(residue_id);
        }
    }
    Ok(near)
}

/// k-d tree over a fixed list of positions, answering radius queries by list index.
struct PositionIndex<'a> {
    positions: &'a [Point3<f64>],
    tree: KdTree<f64, 3>,
}

impl<'a> PositionIndex<'a> {
    fn new(positions: &'a [Point3<f64>]) -> Self {
        let points: Vec<[f64; 3]> = positions.iter().map(|p| [p.x, p.y, p.z]).collect();
        let tree: KdTree<f64, 3> = (&points).into();
        Self { positions, tree }
    }

    /// Indices of the positions at most `cutoff` from `query`, in ascending order.
    fn within(&self, query: &Point3<f64>, cutoff: f64) -> Vec<usize> {
        // The tree is only a prefilter; the inclusive test below is exact.
        let radius_sq = cutoff * cutoff * (1.0 + RADIUS_SLACK);
        let mut found: Vec<usize> = self
            .tree
            .within_unsorted::<SquaredEuclidean>(&[query.x, query.y, query.z], radius_sq)
            .into_iter()
            .map(|neighbour| neighbour.item as usize)
            .filter(|&i| (self.positions[i] - query).norm() <= cutoff)
            .collect();
        found.sort_unstable();
        found
    }

    fn nearest_distance(&self, query: &Point3<f64>) -> f64 {
        if self.positions.is_empty() {
            return f64::INFINITY;
        }
        let nearest = self
            .tree
            .nearest_one::<SquaredEuclidean>(&[query.x, query.y, query.z]);
        (self.positions[nearest.item as usize] - query).norm()
    }
}

pub(crate) fn atom_position(
    system: &MolecularSystem,
    atom_id: AtomId,
) -> Result<Point3<f64>, ContactError> {
    let atom = system
        .atom(atom_id)
        .ok_or(ContactError::UnknownAtom(atom_id))?;
    Ok(EnergyCalculator::position(atom)?)
}

pub(crate) fn residue_positions(
    system: &MolecularSystem,
    residue_id: ResidueId,
) -> Result<Vec<Point3<f64>>, ContactError> {
    let residue = system
        .residue(residue_id)
        .ok_or(ContactError::UnknownResidue(residue_id))?;
    if residue.atoms().is_empty() {
        return Err(ContactError::EmptyResidue(residue_id));
    }
    residue
        .atoms()
        .iter()
        .map(|&atom_id| atom_position(system, atom_id))
        .collect()
}

fn validate_cutoff(cutoff: f64) -> Result<(), ContactError> {
    if cutoff.is_finite() && cutoff > 0.0 {
        Ok(())
    } else {
        Err(ContactError::InvalidCutoff(cutoff))
    }
}

fn for_each_index<F>(n: usize, pairs_of: F) -> Vec<(usize, usize)>
where
    F: Fn(usize) -> Vec<(usize, usize)> + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        (0..n).into_par_iter().flat_map_iter(pairs_of).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        (0..n).flat_map(pairs_of).collect()
    }
}
