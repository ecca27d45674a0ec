use serde::{Deserialize, Serialize};

const COULOMB_CONSTANT: f64 = 332.0637; // In kcal·Å/(mol·e²)

/// Screening applied to the bare Coulomb interaction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Screening {
    /// Plain Coulomb with a constant dielectric.
    None,
    /// Distance-dependent dielectric `ε·r`.
    DistanceDependent,
    /// Coulomb multiplied by `(1 - (r/rc)²)²` inside the cutoff and zero beyond it.
    Shifted { cutoff: f64 },
}

impl Default for Screening {
    fn default() -> Self {
        Screening::Shifted { cutoff: 30.0 }
    }
}

#[inline]
pub fn lennard_jones_12_6(dist: f64, r_min: f64, well_depth: f64) -> f64 {
    if dist < 1e-6 {
        return 1e10;
    }
    let rho = r_min / dist;
    let rho6 = rho.powi(6);
    let rho12 = rho6 * rho6;
    well_depth * (rho12 - 2.0 * rho6)
}

#[inline]
pub fn coulomb(dist: f64, q1: f64, q2: f64, dielectric: f64) -> f64 {
    if dist < 1e-6 {
        let product = q1 * q2;
        if product == 0.0 {
            return 0.0;
        }
        return product.signum() * 1e10;
    }
    COULOMB_CONSTANT * q1 * q2 / (dielectric * dist)
}

#[inline]
pub fn screened_coulomb(dist: f64, q1: f64, q2: f64, dielectric: f64, screening: Screening) -> f64 {
    match screening {
        Screening::None => coulomb(dist, q1, q2, dielectric),
        Screening::DistanceDependent => {
            if dist < 1e-6 {
                return coulomb(dist, q1, q2, dielectric);
            }
            coulomb(dist, q1, q2, dielectric * dist)
        }
        Screening::Shifted { cutoff } => {
            if dist >= cutoff {
                return 0.0;
            }
            let ratio = dist / cutoff;
            let shift = (1.0 - ratio * ratio).powi(2);
            coulomb(dist, q1, q2, dielectric) * shift
        }
    }
}
