use super::ContactError;
use crate::core::models::ids::{AtomId, ResidueId};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// An unordered pair of two distinct entities.
///
/// Members are stored in canonical order so that equality, hashing and
/// ordering do not depend on the order of construction. The construction
/// order is kept only for [`Pair::iter`] and [`fmt::Display`].
#[derive(Debug, Clone, Copy)]
pub struct Pair<T> {
    low: T,
    high: T,
    swapped: bool,
}

impl<T: Ord + Copy> Pair<T> {
    pub fn new(first: T, second: T) -> Result<Self, ContactError> {
        match first.cmp(&second) {
            Ordering::Less => Ok(Self {
                low: first,
                high: second,
                swapped: false,
            }),
            Ordering::Greater => Ok(Self {
                low: second,
                high: first,
                swapped: true,
            }),
            Ordering::Equal => Err(ContactError::SelfContact),
        }
    }

    /// The first member as passed to [`Pair::new`].
    pub fn first(&self) -> T {
        if self.swapped { self.high } else { self.low }
    }

    /// The second member as passed to [`Pair::new`].
    pub fn second(&self) -> T {
        if self.swapped { self.low } else { self.high }
    }

    /// Both members in canonical order.
    pub fn canonical(&self) -> (T, T) {
        (self.low, self.high)
    }

    pub fn iter(&self) -> impl Iterator<Item = T> {
        [self.first(), self.second()].into_iter()
    }

    pub fn contains(&self, item: T) -> bool {
        self.low == item || self.high == item
    }

    /// Returns the member that is not `item`, or `None` if `item` is not in the pair.
    pub fn other(&self, item: T) -> Option<T> {
        if item == self.low {
            Some(self.high)
        } else if item == self.high {
            Some(self.low)
        } else {
            None
        }
    }
}

impl<T: PartialEq> PartialEq for Pair<T> {
    fn eq(&self, other: &Self) -> bool {
        self.low == other.low && self.high == other.high
    }
}

impl<T: Eq> Eq for Pair<T> {}

impl<T: Hash> Hash for Pair<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.low.hash(state);
        self.high.hash(state);
    }
}

impl<T: Ord> PartialOrd for Pair<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Ord> Ord for Pair<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.low, &self.high).cmp(&(&other.low, &other.high))
    }
}

impl<T: Ord + Copy + fmt::Debug> fmt::Display for Pair<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} - {:?}", self.first(), self.second())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResidueContact(Pair<ResidueId>);

impl ResidueContact {
    pub fn new(residue1: ResidueId, residue2: ResidueId) -> Result<Self, ContactError> {
        Pair::new(residue1, residue2).map(Self)
    }

    pub fn residue1(&self) -> ResidueId {
        self.0.first()
    }

    pub fn residue2(&self) -> ResidueId {
        self.0.second()
    }

    pub fn pair(&self) -> &Pair<ResidueId> {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomicContact(Pair<AtomId>);

impl AtomicContact {
    pub fn new(atom1: AtomId, atom2: AtomId) -> Result<Self, ContactError> {
        Pair::new(atom1, atom2).map(Self)
    }

    pub fn atom1(&self) -> AtomId {
        self.0.first()
    }

    pub fn atom2(&self) -> AtomId {
        self.0.second()
    }

    pub fn pair(&self) -> &Pair<AtomId> {
        &self.0
    }
}

/// Identity of a graph edge: an interaction between two residues or two atoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Contact {
    Residue(ResidueContact),
    Atomic(AtomicContact),
}

impl From<ResidueContact> for Contact {
    fn from(contact: ResidueContact) -> Self {
        Contact::Residue(contact)
    }
}

impl From<AtomicContact> for Contact {
    fn from(contact: AtomicContact) -> Self {
        Contact::Atomic(contact)
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Contact::Residue(contact) => write!(f, "residue contact {}", contact.pair()),
            Contact::Atomic(contact) => write!(f, "atomic contact {}", contact.pair()),
        }
    }
}
