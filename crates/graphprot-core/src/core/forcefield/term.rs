use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Pairwise interaction energy split into its two descriptor components.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnergyTerm {
    pub vdw: f64,
    pub electrostatic: f64,
}

impl EnergyTerm {
    pub fn new(vdw: f64, electrostatic: f64) -> Self {
        Self { vdw, electrostatic }
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.vdw + self.electrostatic
    }
}

impl Add for EnergyTerm {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            vdw: self.vdw + rhs.vdw,
            electrostatic: self.electrostatic + rhs.electrostatic,
        }
    }
}

impl AddAssign for EnergyTerm {
    fn add_assign(&mut self, rhs: Self) {
        self.vdw += rhs.vdw;
        self.electrostatic += rhs.electrostatic;
    }
}

impl Sum for EnergyTerm {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_returns_sum_of_both_terms() {
        let term = EnergyTerm::new(1.5, -2.0);
        assert_eq!(term.total(), -0.5);
    }

    #[test]
    fn add_and_add_assign_combine_componentwise() {
        let a = EnergyTerm::new(1.0, 2.0);
        let b = EnergyTerm::new(0.5, -1.0);
        let mut c = a;
        c += b;
        assert_eq!(a + b, EnergyTerm::new(1.5, 1.0));
        assert_eq!(c, a + b);
    }

    #[test]
    fn sum_of_empty_iterator_is_zero() {
        let total: EnergyTerm = std::iter::empty().sum();
        assert_eq!(total, EnergyTerm::default());
    }
}
