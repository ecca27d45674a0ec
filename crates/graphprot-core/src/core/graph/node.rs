use crate::core::contacts::pair::Contact;
use crate::core::models::ids::{AtomId, ResidueId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Granularity of the entities that become graph nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GraphLevel {
    Atomic,
    #[default]
    Residue,
}

/// Identity of a graph node: the atom or residue it stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeId {
    Atom(AtomId),
    Residue(ResidueId),
}

impl Contact {
    /// The two node identities joined by this contact, in construction order.
    pub fn endpoints(&self) -> (NodeId, NodeId) {
        match self {
            Contact::Residue(contact) => (
                NodeId::Residue(contact.residue1()),
                NodeId::Residue(contact.residue2()),
            ),
            Contact::Atomic(contact) => (
                NodeId::Atom(contact.atom1()),
                NodeId::Atom(contact.atom2()),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl FeatureValue {
    /// Number of columns this value occupies once flattened.
    pub fn width(&self) -> usize {
        match self {
            FeatureValue::Scalar(_) => 1,
            FeatureValue::Vector(values) => values.len(),
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        match self {
            FeatureValue::Scalar(value) => std::slice::from_ref(value),
            FeatureValue::Vector(values) => values,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.as_slice().iter().all(|v| v.is_finite())
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        FeatureValue::Scalar(value)
    }
}

impl From<bool> for FeatureValue {
    fn from(value: bool) -> Self {
        FeatureValue::Scalar(if value { 1.0 } else { 0.0 })
    }
}

impl From<Vec<f64>> for FeatureValue {
    fn from(values: Vec<f64>) -> Self {
        FeatureValue::Vector(values)
    }
}

pub type FeatureMap = BTreeMap<String, FeatureValue>;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    /// Human-readable identifier exported alongside the tensors.
    pub label: String,
    pub features: FeatureMap,
}

impl Node {
    pub fn new(id: NodeId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            features: FeatureMap::new(),
        }
    }

    pub fn with_feature(mut self, name: &str, value: impl Into<FeatureValue>) -> Self {
        self.set_feature(name, value);
        self
    }

    pub fn set_feature(&mut self, name: &str, value: impl Into<FeatureValue>) {
        self.features.insert(name.to_string(), value.into());
    }

    pub fn feature(&self, name: &str) -> Option<&FeatureValue> {
        self.features.get(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: Contact,
    pub features: FeatureMap,
}

impl Edge {
    pub fn new(id: Contact) -> Self {
        Self {
            id,
            features: FeatureMap::new(),
        }
    }

    pub fn with_feature(mut self, name: &str, value: impl Into<FeatureValue>) -> Self {
        self.set_feature(name, value);
        self
    }

    pub fn set_feature(&mut self, name: &str, value: impl Into<FeatureValue>) {
        self.features.insert(name.to_string(), value.into());
    }

    pub fn feature(&self, name: &str) -> Option<&FeatureValue> {
        self.features.get(name)
    }
}
