use super::{FeatureError, names};
use crate::core::contacts::ContactError;
use crate::core::contacts::pair::Contact;
use crate::core::forcefield::energy::{ElectrostaticsConfig, EnergyCalculator};
use crate::core::forcefield::term::EnergyTerm;
use crate::core::graph::{Edge, GraphBuilder};
use crate::core::models::ids::{AtomId, ResidueId};
use crate::core::models::system::MolecularSystem;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Settings of the edge descriptor pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContactFeatureOptions {
    pub electrostatics: ElectrostaticsConfig,
    /// Atoms closer than this distance (in Angstroms) count as covalently bonded.
    pub covalent_cutoff: f64,
}

impl Default for ContactFeatureOptions {
    fn default() -> Self {
        Self {
            electrostatics: ElectrostaticsConfig::default(),
            covalent_cutoff: 2.1,
        }
    }
}

/// Descriptors of one contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactFeatures {
    pub distance: f64,
    pub energy: EnergyTerm,
    pub same_chain: bool,
    /// Only defined for atomic contacts.
    pub same_residue: Option<bool>,
    pub covalent: bool,
}

impl ContactFeatures {
    pub fn evaluate(
        contact: &Contact,
        system: &MolecularSystem,
        options: &ContactFeatureOptions,
    ) -> Result<Self, ContactError> {
        match contact {
            Contact::Atomic(c) => Self::atomic(c.atom1(), c.atom2(), system, options),
            Contact::Residue(c) => Self::residue(c.residue1(), c.residue2(), system, options),
        }
    }

    fn atomic(
        atom1_id: AtomId,
        atom2_id: AtomId,
        system: &MolecularSystem,
        options: &ContactFeatureOptions,
    ) -> Result<Self, ContactError> {
        let pair = AtomPair::evaluate(atom1_id, atom2_id, system, options)?;
        let residue_of = |id| system.atom(id).map(|atom| atom.residue_id);

        Ok(Self {
            distance: pair.distance,
            energy: pair.energy,
            same_chain: same_chain(system.chain_of_atom(atom1_id), system.chain_of_atom(atom2_id)),
            same_residue: Some(residue_of(atom1_id) == residue_of(atom2_id)),
            covalent: pair.covalent,
        })
    }

    fn residue(
        residue1_id: ResidueId,
        residue2_id: ResidueId,
        system: &MolecularSystem,
        options: &ContactFeatureOptions,
    ) -> Result<Self, ContactError> {
        let atoms1 = residue_atoms(system, residue1_id)?;
        let atoms2 = residue_atoms(system, residue2_id)?;

        let mut distance = f64::INFINITY;
        let mut energy = EnergyTerm::default();
        let mut covalent = false;
        for &a in atoms1 {
            for &b in atoms2 {
                let pair = AtomPair::evaluate(a, b, system, options)?;
                distance = distance.min(pair.distance);
                energy += pair.energy;
                covalent |= pair.covalent;
            }
        }

        Ok(Self {
            distance,
            energy,
            same_chain: same_chain(
                system.chain_of_residue(residue1_id),
                system.chain_of_residue(residue2_id),
            ),
            same_residue: None,
            covalent,
        })
    }

    /// Writes the descriptors into the edge feature map.
    pub fn write_to(&self, edge: &mut Edge) {
        edge.set_feature(names::DISTANCE, self.distance);
        edge.set_feature(names::VANDERWAALS, self.energy.vdw);
        edge.set_feature(names::ELECTROSTATIC, self.energy.electrostatic);
        edge.set_feature(names::SAME_CHAIN, self.same_chain);
        if let Some(same_residue) = self.same_residue {
            edge.set_feature(names::SAME_RES, same_residue);
        }
        edge.set_feature(names::COVALENT, self.covalent);
    }
}

struct AtomPair {
    distance: f64,
    energy: EnergyTerm,
    covalent: bool,
}

impl AtomPair {
    fn evaluate(
        atom1_id: AtomId,
        atom2_id: AtomId,
        system: &MolecularSystem,
        options: &ContactFeatureOptions,
    ) -> Result<Self, ContactError> {
        let atom1 = system
            .atom(atom1_id)
            .ok_or(ContactError::UnknownAtom(atom1_id))?;
        let atom2 = system
            .atom(atom2_id)
            .ok_or(ContactError::UnknownAtom(atom2_id))?;

        let distance = EnergyCalculator::distance(atom1, atom2)?;
        let vdw = EnergyCalculator::calculate_vdw(atom1, atom2)?;
        let electrostatic =
            EnergyCalculator::calculate_coulomb(atom1, atom2, &options.electrostatics)?;
        let covalent =
            system.are_bonded(atom1_id, atom2_id) || distance < options.covalent_cutoff;

        Ok(Self {
            distance,
            energy: EnergyTerm::new(vdw, electrostatic),
            covalent,
        })
    }
}

fn residue_atoms(system: &MolecularSystem, residue_id: ResidueId) -> Result<&[AtomId], ContactError> {
    let residue = system
        .residue(residue_id)
        .ok_or(ContactError::UnknownResidue(residue_id))?;
    if residue.atoms().is_empty() {
        return Err(ContactError::EmptyResidue(residue_id));
    }
    Ok(residue.atoms())
}

fn same_chain<T: PartialEq>(a: Option<T>, b: Option<T>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}

/// Evaluates the descriptors of every edge of the builder.
///
/// Both endpoints of every edge must already be nodes of the graph. No edge
/// is modified unless all edges evaluate successfully.
#[instrument(skip_all, name = "contact_features", fields(graph = builder.id()))]
pub fn add_contact_features(
    builder: &mut GraphBuilder,
    system: &MolecularSystem,
    options: &ContactFeatureOptions,
) -> Result<(), FeatureError> {
    builder.check_endpoints()?;

    let evaluate = |edge: &Edge| ContactFeatures::evaluate(&edge.id, system, options);

    #[cfg(feature = "parallel")]
    let features = builder
        .edges()
        .par_iter()
        .map(evaluate)
        .collect::<Result<Vec<_>, _>>()?;
    #[cfg(not(feature = "parallel"))]
    let features = builder
        .edges()
        .iter()
        .map(evaluate)
        .collect::<Result<Vec<_>, _>>()?;

    for (edge, contact_features) in builder.edges_mut().iter_mut().zip(&features) {
        contact_features.write_to(edge);
    }

    debug!(edges = features.len(), "Computed contact features.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::contacts::pair::{AtomicContact, ResidueContact};
    use crate::core::forcefield::energy::EnergyError;
    use crate::core::graph::{FeatureValue, GraphError, Node, NodeId};
    use crate::core::models::atom::Atom;
    use crate::core::models::chain::ChainType;
    use nalgebra::Point3;

    struct Fixture {
        system: MolecularSystem,
        lys: ResidueId,
        asp: ResidueId,
        other_chain: ResidueId,
        lys_n: AtomId,
        lys_ca: AtomId,
        lys_nz: AtomId,
        asp_od1: AtomId,
        other_c: AtomId,
    }

    fn add_atom(
        system: &mut MolecularSystem,
        residue: ResidueId,
        serial: usize,
        name: &str,
        x: f64,
        charge: f64,
    ) -> AtomId {
        let atom = Atom::new(serial, name, residue, Point3::new(x, 0.0, 0.0))
            .with_charge(charge)
            .with_lennard_jones(3.6, 0.1);
        system.add_atom_to_residue(residue, atom).unwrap()
    }

    fn fixture() -> Fixture {
        let mut system = MolecularSystem::new();
        let chain_a = system.add_chain('A', ChainType::Protein);
        let chain_b = system.add_chain('B', ChainType::Protein);

        let lys = system.add_residue(chain_a, 1, None, "LYS").unwrap();
        let lys_n = add_atom(&mut system, lys, 1, "N", 0.0, -0.3);
        let lys_ca = add_atom(&mut system, lys, 2, "CA", 1.46, 0.1);
        let lys_nz = add_atom(&mut system, lys, 3, "NZ", 6.0, 1.0);
        system.add_bond(lys_n, lys_ca).unwrap();

        let asp = system.add_residue(chain_a, 2, None, "ASP").unwrap();
        let asp_od1 = add_atom(&mut system, asp, 4, "OD1", 10.0, -1.0);

        let other_chain = system.add_residue(chain_b, 1, None, "GLY").unwrap();
        let other_c = add_atom(&mut system, other_chain, 5, "C", 14.0, 0.5);

        Fixture {
            system,
            lys,
            asp,
            other_chain,
            lys_n,
            lys_ca,
            lys_nz,
            asp_od1,
            other_c,
        }
    }

    fn atomic(a: AtomId, b: AtomId) -> Contact {
        AtomicContact::new(a, b).unwrap().into()
    }

    #[test]
    fn bonded_atoms_are_covalent_and_clash() {
        let f = fixture();
        let features = ContactFeatures::evaluate(
            &atomic(f.lys_n, f.lys_ca),
            &f.system,
            &ContactFeatureOptions::default(),
        )
        .unwrap();

        assert!((features.distance - 1.46).abs() < 1e-12);
        assert!(features.energy.vdw > 0.0);
        assert!(features.covalent);
        assert!(features.same_chain);
        assert_eq!(features.same_residue, Some(true));
    }

    #[test]
    fn opposite_charges_attract_across_residues() {
        let f = fixture();
        let features = ContactFeatures::evaluate(
            &atomic(f.lys_nz, f.asp_od1),
            &f.system,
            &ContactFeatureOptions::default(),
        )
        .unwrap();

        assert!(features.energy.electrostatic < 0.0);
        assert!(features.energy.vdw < 0.0);
        assert!(!features.covalent);
        assert_eq!(features.same_residue, Some(false));
    }

    #[test]
    fn atoms_in_different_chains_are_not_same_chain() {
        let f = fixture();
        let features = ContactFeatures::evaluate(
            &atomic(f.asp_od1, f.other_c),
            &f.system,
            &ContactFeatureOptions::default(),
        )
        .unwrap();
        assert!(!features.same_chain);
        assert!(features.energy.electrostatic < 0.0);
    }

    #[test]
    fn residue_contact_uses_minimum_distance_and_summed_energies() {
        let f = fixture();
        let options = ContactFeatureOptions::default();
        let residue_contact: Contact = ResidueContact::new(f.lys, f.asp).unwrap().into();
        let features = ContactFeatures::evaluate(&residue_contact, &f.system, &options).unwrap();

        let expected: EnergyTerm = [f.lys_n, f.lys_ca, f.lys_nz]
            .into_iter()
            .map(|a| {
                ContactFeatures::evaluate(&atomic(a, f.asp_od1), &f.system, &options)
                    .unwrap()
                    .energy
            })
            .sum();

        assert!((features.distance - 4.0).abs() < 1e-12);
        assert!((features.energy.vdw - expected.vdw).abs() < 1e-12);
        assert!((features.energy.electrostatic - expected.electrostatic).abs() < 1e-12);
        assert_ne!(features.energy.electrostatic, 0.0);
        assert_eq!(features.same_residue, None);
        assert!(!features.covalent);
    }

    #[test]
    fn empty_residue_contact_is_rejected() {
        let mut f = fixture();
        let chain_a = f.system.find_chain_by_id('A').unwrap();
        let empty = f.system.add_residue(chain_a, 3, None, "SER").unwrap();
        let contact: Contact = ResidueContact::new(f.lys, empty).unwrap().into();
        assert_eq!(
            ContactFeatures::evaluate(&contact, &f.system, &ContactFeatureOptions::default()),
            Err(ContactError::EmptyResidue(empty))
        );
    }

    #[test]
    fn missing_charge_is_a_data_error() {
        let mut f = fixture();
        f.system.atom_mut(f.asp_od1).unwrap().partial_charge = None;
        assert_eq!(
            ContactFeatures::evaluate(
                &atomic(f.lys_nz, f.asp_od1),
                &f.system,
                &ContactFeatureOptions::default()
            ),
            Err(ContactError::Energy(EnergyError::MissingCharge(4)))
        );
    }

    #[test]
    fn add_contact_features_writes_every_edge() {
        let f = fixture();
        let mut builder = GraphBuilder::new("g");
        for residue in [f.lys, f.asp, f.other_chain] {
            builder.add_node(Node::new(NodeId::Residue(residue), ""));
        }
        builder.add_edge(Edge::new(ResidueContact::new(f.lys, f.asp).unwrap().into()));
        builder.add_edge(Edge::new(
            ResidueContact::new(f.asp, f.other_chain).unwrap().into(),
        ));

        add_contact_features(&mut builder, &f.system, &ContactFeatureOptions::default()).unwrap();

        for edge in builder.edges() {
            assert_eq!(edge.features.len(), 5);
            assert!(edge.features.values().all(FeatureValue::is_finite));
        }
        assert_eq!(
            builder.edges()[1].feature(names::SAME_CHAIN),
            Some(&FeatureValue::Scalar(0.0))
        );
    }

    #[test]
    fn add_contact_features_requires_endpoint_nodes() {
        let f = fixture();
        let mut builder = GraphBuilder::new("g");
        builder.add_node(Node::new(NodeId::Residue(f.lys), ""));
        let contact: Contact = ResidueContact::new(f.lys, f.asp).unwrap().into();
        builder.add_edge(Edge::new(contact));

        let result =
            add_contact_features(&mut builder, &f.system, &ContactFeatureOptions::default());
        assert_eq!(
            result,
            Err(FeatureError::Graph(GraphError::MissingEndpoint {
                edge: contact,
                node: NodeId::Residue(f.asp),
            }))
        );
        assert!(builder.edges()[0].features.is_empty());
    }
}
