//! Time evolution of the atomic inversion W(t) = P_e(t) - P_g(t).
//!
//! For each Fock state `n` below the photon cutoff, the Jaynes-Cummings
//! equations are integrated from the initial atomic state over the full time
//! grid, giving an inversion curve Wn(t). The result is the sum of these
//! curves weighted by the photon-number distribution of the field:
//! ```text
//! W(t) = Σ_{n < cut_n} P(n) Wn(t)
//! ```
//! The sum is not renormalized; the field's cutoff check guarantees that the
//! omitted tail is negligible.

use std::time::Instant;
use ndarray as nd;
use rayon::prelude::*;
use tracing::{ debug, info, warn };
use crate::{
    error::{ Error, Result },
    integrate::{ odeintz_with, OdeOptions, SolverOpt, Solution, Stats },
    system::System,
};

/// Largest allowed ratio of time step to duration.
pub const THR_STEP: f64 = 0.01;

/// Largest deviation from 1 of the truncated photon-number distribution
/// before a warning is logged.
pub const THR_MASS: f64 = 0.01;

/// Uniform grid of time samples `k * tstep` covering `[0, duration)`.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeGrid {
    duration: f64,
    tstep: f64,
    time: nd::Array1<f64>,
}

impl TimeGrid {
    /// Create a new `TimeGrid`.
    ///
    /// Fails if `duration` or `tstep` is not positive and finite, or if
    /// `tstep / duration` exceeds [`THR_STEP`].
    pub fn new(duration: f64, tstep: f64) -> Result<Self> {
        if !(duration.is_finite() && duration > 0.0) {
            return Err(Error::InvalidTimeGrid(format!(
                "simulation duration (time) must be positive, got {}",
                duration,
            )));
        }
        if !(tstep.is_finite() && tstep > 0.0) {
            return Err(Error::InvalidTimeGrid(format!(
                "simulation time step (step) must be positive, got {}",
                tstep,
            )));
        }
        if tstep / duration > THR_STEP {
            return Err(Error::InvalidTimeGrid(format!(
                "simulation time step (step = {}) is too large for duration \
                {}; increase the duration or decrease the step",
                tstep, duration,
            )));
        }
        let n = (duration / tstep).ceil() as usize;
        let time: nd::Array1<f64> = (0..n).map(|k| k as f64 * tstep).collect();
        Ok(Self { duration, tstep, time })
    }

    pub fn duration(&self) -> f64 { self.duration }

    pub fn tstep(&self) -> f64 { self.tstep }

    /// Time samples.
    pub fn time(&self) -> &nd::Array1<f64> { &self.time }

    /// Number of samples.
    pub fn len(&self) -> usize { self.time.len() }

    pub fn is_empty(&self) -> bool { self.time.is_empty() }
}

/// Atomic inversion sampled on a time grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Inversion {
    time: nd::Array1<f64>,
    w: nd::Array1<f64>,
}

impl Inversion {
    /// Pair time samples with inversion values.
    ///
    /// *Panics* if the arrays have unequal lengths.
    pub fn new(time: nd::Array1<f64>, w: nd::Array1<f64>) -> Self {
        if time.len() != w.len() {
            panic!("Inversion::new: unequal array lengths");
        }
        Self { time, w }
    }

    /// Time samples.
    pub fn time(&self) -> &nd::Array1<f64> { &self.time }

    /// Inversion values, index-aligned with [`Self::time`].
    pub fn values(&self) -> &nd::Array1<f64> { &self.w }

    pub fn len(&self) -> usize { self.w.len() }

    pub fn is_empty(&self) -> bool { self.w.is_empty() }

    /// Iterate over `(time, inversion)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.time.iter().copied().zip(self.w.iter().copied())
    }

    /// Largest absolute difference from another inversion.
    ///
    /// *Panics* if the two have unequal lengths.
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        if self.len() != other.len() {
            panic!("Inversion::max_abs_diff: unequal lengths");
        }
        self.w.iter().zip(other.w.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }

    pub fn into_parts(self) -> (nd::Array1<f64>, nd::Array1<f64>) {
        (self.time, self.w)
    }
}

/// A [`System`] together with the time grid it is evolved over.
#[derive(Clone, Debug)]
pub struct Simulation {
    pub system: System,
    grid: TimeGrid,
    options: OdeOptions,
}

impl Simulation {
    /// Create a new `Simulation` with default solver settings.
    ///
    /// Fails if the time grid is invalid; see [`TimeGrid::new`].
    pub fn new(system: System, duration: f64, tstep: f64) -> Result<Self> {
        let grid = TimeGrid::new(duration, tstep)?;
        Ok(Self { system, grid, options: OdeOptions::default() })
    }

    /// Override solver settings.
    ///
    /// Fails on unsupported or invalid options.
    pub fn with_solver_opts(mut self, opts: &[SolverOpt<'_>]) -> Result<Self> {
        self.options = OdeOptions::from_opts(opts)?;
        Ok(self)
    }

    pub fn grid(&self) -> &TimeGrid { &self.grid }

    /// Time samples.
    pub fn time(&self) -> &nd::Array1<f64> { self.grid.time() }

    pub fn options(&self) -> &OdeOptions { &self.options }

    fn solve_n(&self, n: usize) -> Result<(nd::Array1<f64>, Stats)> {
        let interaction = self.system.interaction;
        let z0 = self.system.atom.state();
        let Solution { y, stats }
            = odeintz_with(
                |z, t| interaction.rabi_model(z, t, n),
                &z0,
                self.grid.time(),
                &self.options,
            )
            .map_err(|source| Error::Solve { n, source })?;
        let p_g = y.row(0).mapv(|a| a.norm_sqr());
        let p_e = y.row(1).mapv(|a| a.norm_sqr());
        Ok((p_e - p_g, stats))
    }

    /// Inversion Wn(t) of the atom with exactly `n` photons in the cavity.
    pub fn inversion_n(&self, n: usize) -> Result<nd::Array1<f64>> {
        self.solve_n(n).map(|(wn, _)| wn)
    }

    fn check_mass(&self) {
        let mass = self.system.field.truncated_mass();
        if (mass - 1.0).abs() > THR_MASS {
            warn!(
                mass,
                cut_n = self.system.field.cut_n(),
                "photon-number distribution is poorly normalized below cutoff"
            );
        }
    }

    /// Compute the atomic inversion, solving one Fock state at a time.
    ///
    /// Fails on the first photon number whose integration fails.
    pub fn run(&self) -> Result<Inversion> {
        let field = &self.system.field;
        info!(
            pdf_n = %field.pdf_n(),
            avg_n = field.avg_n(),
            cut_n = field.cut_n(),
            samples = self.grid.len(),
            "computing atomic inversion"
        );
        self.check_mass();
        let start = Instant::now();
        let mut w: nd::Array1<f64> = nd::Array1::zeros(self.grid.len());
        let mut p: f64;
        for n in 0..field.cut_n() {
            p = field.pdf(n);
            let (wn, stats) = self.solve_n(n)?;
            debug!(
                n,
                p,
                steps = stats.steps,
                rejected = stats.rejected,
                nfev = stats.nfev,
                "solved Fock state"
            );
            w.scaled_add(p, &wn);
        }
        info!(elapsed = ?start.elapsed(), "done");
        Ok(Inversion::new(self.grid.time().clone(), w))
    }

    /// Like [`Self::run`], but with the Fock states solved in parallel.
    ///
    /// Per-state curves are accumulated in order of increasing `n` after all
    /// solves have finished, so the result is identical to that of
    /// [`Self::run`].
    pub fn run_par(&self) -> Result<Inversion> {
        let field = &self.system.field;
        info!(
            pdf_n = %field.pdf_n(),
            avg_n = field.avg_n(),
            cut_n = field.cut_n(),
            samples = self.grid.len(),
            threads = rayon::current_num_threads(),
            "computing atomic inversion in parallel"
        );
        self.check_mass();
        let start = Instant::now();
        let terms: Vec<(f64, nd::Array1<f64>)>
            = (0..field.cut_n()).into_par_iter()
            .map(|n| {
                let p = field.pdf(n);
                let (wn, stats) = self.solve_n(n)?;
                debug!(
                    n,
                    p,
                    steps = stats.steps,
                    rejected = stats.rejected,
                    nfev = stats.nfev,
                    "solved Fock state"
                );
                Ok((p, wn))
            })
            .collect::<Result<Vec<_>>>()?;
        let mut w: nd::Array1<f64> = nd::Array1::zeros(self.grid.len());
        for (p, wn) in terms.iter() {
            w.scaled_add(*p, wn);
        }
        info!(elapsed = ?start.elapsed(), "done");
        Ok(Inversion::new(self.grid.time().clone(), w))
    }

    /// Closed-form inversion over this simulation's time grid; see
    /// [`analytical_inversion`].
    pub fn run_analytical(&self) -> Inversion {
        Inversion::new(
            self.grid.time().clone(),
            analytical_inversion(&self.system, self.grid.time()),
        )
    }
}

/// Closed-form atomic inversion for an atom starting in the ground state.
///
/// With `Ω_R = √(Δ² + n Ω²)`,
/// ```text
/// W(t) = -P(0) - Σ_{n=1}^{cut_n - 1} P(n) [Δ²/Ω_R² + (n Ω²/Ω_R²) cos(Ω_R t)]
/// ```
/// Terms with `Ω_R = 0` contribute `-P(n)`. The initial atomic state of
/// `system` is ignored.
pub fn analytical_inversion(system: &System, time: &nd::Array1<f64>)
    -> nd::Array1<f64>
{
    let field = &system.field;
    let interaction = &system.interaction;
    let omega2 = interaction.omega().powi(2);
    let delta2 = interaction.delta().powi(2);
    let mut w: nd::Array1<f64> = nd::Array1::from_elem(time.len(), -field.pdf(0));
    let mut p: f64;
    let mut omega_r: f64;
    let mut omega_r2: f64;
    for n in 1..field.cut_n() {
        p = field.pdf(n);
        omega_r = interaction.rabi_freq(n);
        if omega_r == 0.0 {
            w -= p;
            continue;
        }
        omega_r2 = omega_r * omega_r;
        let (a, b) = (delta2 / omega_r2, n as f64 * omega2 / omega_r2);
        w.zip_mut_with(time, |wk, tk| {
            *wk -= p * (a + b * (*tk * omega_r).cos());
        });
    }
    w
}
