use super::{FeatureError, names};
use crate::core::contacts::ContactError;
use crate::core::contacts::enumeration::{atom_position, residue_positions};
use crate::core::forcefield::energy::EnergyError;
use crate::core::graph::{GraphBuilder, Node, NodeId};
use crate::core::models::ids::ResidueId;
use crate::core::models::residue::{Polarity, ResidueType};
use crate::core::models::system::MolecularSystem;
use nalgebra::{Point3, Vector3};
use tracing::{debug, instrument};

/// A single-residue substitution: the residue at `residue` replaced by `variant_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variant {
    pub residue: ResidueId,
    pub variant_type: ResidueType,
}

/// Adds position, residue property and (optionally) variant features to every node.
#[instrument(skip_all, name = "node_features", fields(graph = builder.id()))]
pub fn add_node_features(
    builder: &mut GraphBuilder,
    system: &MolecularSystem,
    variant: Option<&Variant>,
) -> Result<(), FeatureError> {
    if let Some(variant) = variant {
        if system.residue(variant.residue).is_none() {
            return Err(ContactError::UnknownResidue(variant.residue).into());
        }
    }

    for node in builder.nodes_mut() {
        write_node_features(node, system, variant)?;
    }

    debug!(nodes = builder.nodes().len(), "Computed node features.");
    Ok(())
}

fn write_node_features(
    node: &mut Node,
    system: &MolecularSystem,
    variant: Option<&Variant>,
) -> Result<(), ContactError> {
    let residue_id = match node.id {
        NodeId::Residue(residue_id) => {
            let positions = residue_positions(system, residue_id)?;
            node.set_feature(names::POSITION, point_to_vec(&centroid(&positions)));
            residue_id
        }
        NodeId::Atom(atom_id) => {
            let position = atom_position(system, atom_id)?;
            let atom = system
                .atom(atom_id)
                .ok_or(ContactError::UnknownAtom(atom_id))?;
            let charge = atom
                .partial_charge
                .ok_or(EnergyError::MissingCharge(atom.serial))?;
            node.set_feature(names::POSITION, point_to_vec(&position));
            node.set_feature(names::ATOM_CHARGE, charge);
            atom.residue_id
        }
    };

    let residue = system
        .residue(residue_id)
        .ok_or(ContactError::UnknownResidue(residue_id))?;
    let wild_type = residue.residue_type;

    node.set_feature(names::RES_TYPE, residue_type_one_hot(wild_type));
    node.set_feature(names::POLARITY, polarity_one_hot(wild_type));
    let (charge, size, donors, acceptors) = scalar_properties(wild_type);
    node.set_feature(names::RES_CHARGE, charge);
    node.set_feature(names::RES_SIZE, size);
    node.set_feature(names::HB_DONORS, donors);
    node.set_feature(names::HB_ACCEPTORS, acceptors);

    if let Some(variant) = variant {
        let substituted = (variant.residue == residue_id).then_some(variant.variant_type);
        let (variant_charge, variant_size, ..) = scalar_properties(substituted);
        let diff_polarity = match substituted {
            Some(_) => polarity_one_hot(substituted)
                .iter()
                .zip(polarity_one_hot(wild_type))
                .map(|(v, w)| v - w)
                .collect(),
            None => vec![0.0; Polarity::ALL.len()],
        };
        let (diff_charge, diff_size) = match substituted {
            Some(_) => (variant_charge - charge, variant_size - size),
            None => (0.0, 0.0),
        };

        node.set_feature(names::VARIANT_RES, residue_type_one_hot(substituted));
        node.set_feature(names::DIFF_CHARGE, diff_charge);
        node.set_feature(names::DIFF_POLARITY, diff_polarity);
        node.set_feature(names::DIFF_SIZE, diff_size);
    }
    Ok(())
}

fn residue_type_one_hot(residue_type: Option<ResidueType>) -> Vec<f64> {
    let mut one_hot = vec![0.0; ResidueType::ALL.len()];
    if let Some(residue_type) = residue_type {
        one_hot[residue_type.index()] = 1.0;
    }
    one_hot
}

fn polarity_one_hot(residue_type: Option<ResidueType>) -> Vec<f64> {
    let mut one_hot = vec![0.0; Polarity::ALL.len()];
    if let Some(residue_type) = residue_type {
        one_hot[residue_type.properties().polarity.index()] = 1.0;
    }
    one_hot
}

/// Charge, size, donor count and acceptor count; zeros for non-standard residues.
fn scalar_properties(residue_type: Option<ResidueType>) -> (f64, f64, f64, f64) {
    residue_type.map_or((0.0, 0.0, 0.0, 0.0), |t| {
        let p = t.properties();
        (
            p.charge,
            p.size as f64,
            p.hbond_donors as f64,
            p.hbond_acceptors as f64,
        )
    })
}

fn centroid(points: &[Point3<f64>]) -> Point3<f64> {
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Point3::from(sum / points.len() as f64)
}

fn point_to_vec(point: &Point3<f64>) -> Vec<f64> {
    vec![point.x, point.y, point.z]
}
