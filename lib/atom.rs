//! Initial state of the two-level atom.

use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::error::{ Error, Result };

/// Tolerance on the normalization of the initial amplitudes.
pub const THR_NORM: f64 = 0.01;

/// Real ground/excited-state amplitudes of a two-level atom.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Atom {
    cg: f64,
    ce: f64,
}

impl Default for Atom {
    /// The ground state.
    fn default() -> Self { Self { cg: 1.0, ce: 0.0 } }
}

impl Atom {
    /// Create a new `Atom` from ground- and excited-state amplitudes.
    ///
    /// Fails if either amplitude lies outside `[0, 1]` or if `cg² + ce²`
    /// differs from 1 by [`THR_NORM`] or more.
    pub fn new(cg: f64, ce: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&cg) {
            return Err(Error::InvalidAtomState(format!(
                "ground state coefficient (Cg) must be within [0, 1], got {}",
                cg,
            )));
        }
        if !(0.0..=1.0).contains(&ce) {
            return Err(Error::InvalidAtomState(format!(
                "excited state coefficient (Ce) must be within [0, 1], got {}",
                ce,
            )));
        }
        let norm = cg * cg + ce * ce;
        if (norm - 1.0).abs() >= THR_NORM {
            return Err(Error::InvalidAtomState(format!(
                "coefficients are not normalized: Cg² + Ce² = {}",
                norm,
            )));
        }
        Ok(Self { cg, ce })
    }

    /// Ground-state amplitude.
    pub fn cg(&self) -> f64 { self.cg }

    /// Excited-state amplitude.
    pub fn ce(&self) -> f64 { self.ce }

    /// The state as the complex vector `[Cg, Ce]`.
    pub fn state(&self) -> nd::Array1<C64> {
        nd::array![C64::from(self.cg), C64::from(self.ce)]
    }

    /// Initial atomic inversion `Ce² - Cg²`.
    pub fn inversion(&self) -> f64 { self.ce * self.ce - self.cg * self.cg }
}
