use crate::core::graph::GraphLevel;

// Node features.
pub const POSITION: &str = "_position";
pub const RES_TYPE: &str = "res_type";
pub const POLARITY: &str = "polarity";
pub const RES_CHARGE: &str = "res_charge";
pub const RES_SIZE: &str = "res_size";
pub const HB_DONORS: &str = "hb_donors";
pub const HB_ACCEPTORS: &str = "hb_acceptors";
pub const ATOM_CHARGE: &str = "atom_charge";
pub const VARIANT_RES: &str = "variant_res";
pub const DIFF_CHARGE: &str = "diff_charge";
pub const DIFF_POLARITY: &str = "diff_polarity";
pub const DIFF_SIZE: &str = "diff_size";

// Edge features.
pub const DISTANCE: &str = "distance";
pub const VANDERWAALS: &str = "vanderwaals";
pub const ELECTROSTATIC: &str = "electrostatic";
pub const SAME_CHAIN: &str = "same_chain";
pub const SAME_RES: &str = "same_res";
pub const COVALENT: &str = "covalent";

const RESIDUE_NODE_FEATURES: &[&str] = &[
    RES_TYPE,
    POLARITY,
    RES_CHARGE,
    RES_SIZE,
    HB_DONORS,
    HB_ACCEPTORS,
];

const VARIANT_NODE_FEATURES: &[&str] = &[VARIANT_RES, DIFF_CHARGE, DIFF_POLARITY, DIFF_SIZE];

/// Node feature columns written by the node pass, in export order.
///
/// `_position` is excluded; it is exported separately as `pos`.
pub fn node_features(level: GraphLevel, with_variant: bool) -> Vec<&'static str> {
    let mut names = RESIDUE_NODE_FEATURES.to_vec();
    if level == GraphLevel::Atomic {
        names.push(ATOM_CHARGE);
    }
    if with_variant {
        names.extend_from_slice(VARIANT_NODE_FEATURES);
    }
    names
}

/// Edge feature columns written by the contact pass, in export order.
pub fn edge_features(level: GraphLevel) -> Vec<&'static str> {
    let mut names = vec![DISTANCE, VANDERWAALS, ELECTROSTATIC, SAME_CHAIN];
    if level == GraphLevel::Atomic {
        names.push(SAME_RES);
    }
    names.push(COVALENT);
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_res_is_only_exported_for_atomic_graphs() {
        assert!(edge_features(GraphLevel::Atomic).contains(&SAME_RES));
        assert!(!edge_features(GraphLevel::Residue).contains(&SAME_RES));
    }

    #[test]
    fn variant_columns_are_appended_after_base_columns() {
        let names = node_features(GraphLevel::Residue, true);
        assert_eq!(names.first(), Some(&RES_TYPE));
        assert_eq!(names.last(), Some(&DIFF_SIZE));
        assert!(!names.contains(&ATOM_CHARGE));
        assert!(!names.contains(&POSITION));
    }
}
