//! The atom-cavity system and its Jaynes-Cummings equations of motion.
//!
//! Within the subspace of fixed excitation number, a cavity holding `n`
//! photons couples the atomic ground and excited states with strength
//! `Ω √n`, giving
//! ```text
//! dCg/dt = -i (Ω/2 √n Ce - Δ/2 Cg)
//! dCe/dt = -i (Ω/2 √n Cg + Δ/2 Ce)
//! ```
//! where Ω is the coupling and Δ the atom-cavity detuning.

use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::{
    atom::Atom,
    error::{ Error, Result },
    field::Field,
};

/// Atom-cavity coupling Ω and detuning Δ, in units of angular frequency.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Interaction {
    omega: f64,
    delta: f64,
}

impl Interaction {
    /// Create a new `Interaction`.
    ///
    /// Fails if `omega` is negative or either parameter is not finite.
    pub fn new(omega: f64, delta: f64) -> Result<Self> {
        if !omega.is_finite() || omega < 0.0 {
            return Err(Error::InvalidInteraction(format!(
                "coupling (omega) must be finite and non-negative, got {}",
                omega,
            )));
        }
        if !delta.is_finite() {
            return Err(Error::InvalidInteraction(format!(
                "detuning (delta) must be finite, got {}",
                delta,
            )));
        }
        Ok(Self { omega, delta })
    }

    /// Coupling Ω.
    pub fn omega(&self) -> f64 { self.omega }

    /// Detuning Δ.
    pub fn delta(&self) -> f64 { self.delta }

    /// Time derivative of the atomic amplitudes `z = [Cg, Ce]` with `n`
    /// photons in the cavity.
    ///
    /// `t` is unused (the equations are autonomous) and only present to match
    /// the integrator interface.
    pub fn rabi_model(&self, z: &nd::Array1<C64>, _t: f64, n: usize)
        -> nd::Array1<C64>
    {
        let g = self.omega / 2.0 * (n as f64).sqrt();
        let d = self.delta / 2.0;
        let dgdt = -C64::i() * (g * z[1] - d * z[0]);
        let dedt = -C64::i() * (g * z[0] + d * z[1]);
        nd::array![dgdt, dedt]
    }

    /// Generalized Rabi frequency `√(Δ² + n Ω²)` for `n` photons.
    pub fn rabi_freq(&self, n: usize) -> f64 {
        (self.delta.powi(2) + n as f64 * self.omega.powi(2)).sqrt()
    }
}

/// A cavity field, an atom, and their interaction.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct System {
    pub field: Field,
    pub atom: Atom,
    pub interaction: Interaction,
}

impl System {
    /// Create a new `System`.
    ///
    /// Fails if the interaction parameters are invalid.
    pub fn new(field: Field, atom: Atom, omega: f64, delta: f64) -> Result<Self> {
        let interaction = Interaction::new(omega, delta)?;
        Ok(Self { field, atom, interaction })
    }

    /// See [`Interaction::rabi_model`].
    pub fn rabi_model(&self, z: &nd::Array1<C64>, t: f64, n: usize)
        -> nd::Array1<C64>
    {
        self.interaction.rabi_model(z, t, n)
    }
}
