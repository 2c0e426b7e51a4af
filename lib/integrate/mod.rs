//! Adaptive-step numerical integration of first-order ODE systems.
//!
//! The solver is the explicit Dormand-Prince 5(4) Runge-Kutta pair with local
//! error control. The caller only chooses the times at which the solution is
//! reported; step sizes are picked internally and clipped so that every
//! requested time is hit exactly. See [`complex`] for complex-valued systems.
//!
//! Where unspecified, the last index of a 2D array corresponds to time.

use std::{ fmt, rc::Rc };
use ndarray as nd;
use thiserror::Error;

pub mod complex;

pub use complex::{ odeintz, odeintz_with };

/// Default relative tolerance.
pub const DEF_RTOL: f64 = 1.49012e-8;
/// Default absolute tolerance.
pub const DEF_ATOL: f64 = 1.49012e-8;
/// Default maximum number of steps taken between two output times.
pub const DEF_MAXSTEPS: usize = 500;

#[derive(Debug, Error)]
pub enum OdeError {
    /// The requested solver feature is not implemented by this integrator.
    #[error("unsupported solver option: {0}")]
    UnsupportedSolverOption(&'static str),

    #[error("invalid solver option: {0}")]
    InvalidOption(String),

    #[error("invalid output times: {0}")]
    InvalidTimes(String),

    #[error("initial state is empty")]
    EmptyState,

    #[error("step size underflow at t = {t} (h = {h:e})")]
    StepSizeUnderflow { t: f64, h: f64 },

    #[error("exceeded {max_steps} steps before reaching t = {target} (stopped at t = {t})")]
    TooManySteps { t: f64, target: f64, max_steps: usize },

    #[error("non-finite derivative at t = {0}")]
    NonFinite(f64),

    #[error("derivative has length {got}, expected {expected}")]
    DimensionMismatch { expected: usize, got: usize },
}

pub type OdeResult<T> = Result<T, OdeError>;

/// Heap-allocated [`Fn`] trait object computing the Jacobian of a real-valued
/// system at a given state and time.
pub type JacobianFn<'a> = Rc<dyn Fn(&nd::Array1<f64>, f64) -> nd::Array2<f64> + 'a>;

/// Keyword-style options accepted by the integrators.
///
/// Only the tolerance and step-size options are implemented; the remaining
/// variants name features of stiff (LSODA-family) solvers and are rejected
/// with [`OdeError::UnsupportedSolverOption`] rather than ignored.
#[derive(Clone)]
pub enum SolverOpt<'a> {
    /// Relative error tolerance.
    RelTol(f64),
    /// Absolute error tolerance.
    AbsTol(f64),
    /// Size of the first step attempted.
    FirstStep(f64),
    /// Upper bound on the step size.
    MaxStep(f64),
    /// Lower bound on the step size before the solve is declared a failure.
    MinStep(f64),
    /// Maximum number of steps allowed between two output times.
    MaxSteps(usize),
    /// User-supplied Jacobian. Unsupported.
    Jacobian(JacobianFn<'a>),
    /// Jacobian given in column-major order. Unsupported.
    ColumnDerivative,
    /// Banded Jacobian with the given lower and upper bandwidths. Unsupported.
    Banded { lower: usize, upper: usize },
    /// Per-step diagnostic output. Unsupported.
    FullOutput,
}

impl<'a> fmt::Debug for SolverOpt<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RelTol(x) => write!(f, "RelTol({:?})", x),
            Self::AbsTol(x) => write!(f, "AbsTol({:?})", x),
            Self::FirstStep(x) => write!(f, "FirstStep({:?})", x),
            Self::MaxStep(x) => write!(f, "MaxStep({:?})", x),
            Self::MinStep(x) => write!(f, "MinStep({:?})", x),
            Self::MaxSteps(n) => write!(f, "MaxSteps({:?})", n),
            Self::Jacobian(_) => write!(f, "Jacobian(...)"),
            Self::ColumnDerivative => write!(f, "ColumnDerivative"),
            Self::Banded { lower, upper } => {
                write!(f, "Banded {{ lower: {:?}, upper: {:?} }}", lower, upper)
            },
            Self::FullOutput => write!(f, "FullOutput"),
        }
    }
}

impl<'a> SolverOpt<'a> {
    /// Short name of the option, as used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RelTol(_) => "rtol",
            Self::AbsTol(_) => "atol",
            Self::FirstStep(_) => "first_step",
            Self::MaxStep(_) => "max_step",
            Self::MinStep(_) => "min_step",
            Self::MaxSteps(_) => "max_steps",
            Self::Jacobian(_) => "jacobian",
            Self::ColumnDerivative => "col_deriv",
            Self::Banded { .. } => "banded",
            Self::FullOutput => "full_output",
        }
    }
}

/// Resolved solver settings.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OdeOptions {
    pub rtol: f64,
    pub atol: f64,
    pub first_step: Option<f64>,
    pub max_step: f64,
    pub min_step: f64,
    pub max_steps: usize,
}

impl Default for OdeOptions {
    fn default() -> Self {
        Self {
            rtol: DEF_RTOL,
            atol: DEF_ATOL,
            first_step: None,
            max_step: f64::INFINITY,
            min_step: 0.0,
            max_steps: DEF_MAXSTEPS,
        }
    }
}

impl OdeOptions {
    /// Fold a list of options over the defaults.
    ///
    /// Fails on any unsupported option, or if the result is invalid. Later
    /// options override earlier ones.
    pub fn from_opts(opts: &[SolverOpt<'_>]) -> OdeResult<Self> {
        let mut options = Self::default();
        for opt in opts.iter() {
            match opt {
                SolverOpt::RelTol(x) => { options.rtol = *x; },
                SolverOpt::AbsTol(x) => { options.atol = *x; },
                SolverOpt::FirstStep(x) => { options.first_step = Some(*x); },
                SolverOpt::MaxStep(x) => { options.max_step = *x; },
                SolverOpt::MinStep(x) => { options.min_step = *x; },
                SolverOpt::MaxSteps(n) => { options.max_steps = *n; },
                SolverOpt::Jacobian(_)
                | SolverOpt::ColumnDerivative
                | SolverOpt::Banded { .. }
                | SolverOpt::FullOutput
                    => { return Err(OdeError::UnsupportedSolverOption(opt.name())); },
            }
        }
        options.validate()?;
        Ok(options)
    }

    /// Check that all settings are usable.
    pub fn validate(&self) -> OdeResult<()> {
        if !(self.rtol.is_finite() && self.rtol >= 0.0) {
            return Err(OdeError::InvalidOption(
                format!("rtol must be finite and non-negative, got {}", self.rtol)));
        }
        if !(self.atol.is_finite() && self.atol > 0.0) {
            return Err(OdeError::InvalidOption(
                format!("atol must be finite and positive, got {}", self.atol)));
        }
        if let Some(h0) = self.first_step {
            if !(h0.is_finite() && h0 > 0.0) {
                return Err(OdeError::InvalidOption(
                    format!("first_step must be finite and positive, got {}", h0)));
            }
        }
        if self.max_step.is_nan() || self.max_step <= 0.0 {
            return Err(OdeError::InvalidOption(
                format!("max_step must be positive, got {}", self.max_step)));
        }
        if !(self.min_step.is_finite() && self.min_step >= 0.0)
            || self.min_step > self.max_step
        {
            return Err(OdeError::InvalidOption(
                format!(
                    "min_step must be non-negative and at most max_step, got {}",
                    self.min_step,
                )));
        }
        if self.max_steps == 0 {
            return Err(OdeError::InvalidOption("max_steps must be non-zero".into()));
        }
        Ok(())
    }
}

/// Counters accumulated over a single solve.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    /// Accepted steps.
    pub steps: usize,
    /// Rejected step attempts.
    pub rejected: usize,
    /// Derivative evaluations.
    pub nfev: usize,
}

/// Output of a solve: the state at each requested time (last axis) and the
/// solver counters.
#[derive(Clone, Debug)]
pub struct Solution<T> {
    pub y: nd::Array2<T>,
    pub stats: Stats,
}

// Dormand-Prince 5(4) tableau
const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;
const A71: f64 = 35.0 / 384.0;
const A73: f64 = 500.0 / 1113.0;
const A74: f64 = 125.0 / 192.0;
const A75: f64 = -2187.0 / 6784.0;
const A76: f64 = 11.0 / 84.0;

// difference between the fifth- and fourth-order weights
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

const SAFETY: f64 = 0.9;
const FAC_MIN: f64 = 0.2;
const FAC_MAX: f64 = 10.0;

// derivative evaluation with shape/finiteness checks and call counting
struct Rhs<F> {
    f: F,
    dim: usize,
    nfev: usize,
}

impl<F> Rhs<F>
where F: Fn(&nd::Array1<f64>, f64) -> nd::Array1<f64>
{
    fn eval(&mut self, y: &nd::Array1<f64>, t: f64) -> OdeResult<nd::Array1<f64>> {
        self.nfev += 1;
        let dy = (self.f)(y, t);
        if dy.len() != self.dim {
            return Err(OdeError::DimensionMismatch {
                expected: self.dim,
                got: dy.len(),
            });
        }
        if dy.iter().any(|x| !x.is_finite()) {
            return Err(OdeError::NonFinite(t));
        }
        Ok(dy)
    }
}

// root-mean-square of `v` weighted by the per-component tolerance scale
fn rms_norm(v: &nd::Array1<f64>, scale: &nd::Array1<f64>) -> f64 {
    let n = v.len() as f64;
    let acc: f64
        = v.iter().zip(scale)
        .map(|(vk, sk)| (*vk / *sk).powi(2))
        .sum();
    (acc / n).sqrt()
}

// pick a first step size from the local behavior of the solution
fn initial_step<F>(
    rhs: &mut Rhs<F>,
    t0: f64,
    y0: &nd::Array1<f64>,
    f0: &nd::Array1<f64>,
    opts: &OdeOptions,
) -> OdeResult<f64>
where F: Fn(&nd::Array1<f64>, f64) -> nd::Array1<f64>
{
    let scale = y0.mapv(|yk| opts.atol + opts.rtol * yk.abs());
    let d0 = rms_norm(y0, &scale);
    let d1 = rms_norm(f0, &scale);
    let h0 = if d0 < 1e-5 || d1 < 1e-5 { 1e-6 } else { 0.01 * d0 / d1 };
    let y1 = y0 + &(f0 * h0);
    let f1 = rhs.eval(&y1, t0 + h0)?;
    let d2 = rms_norm(&(&f1 - f0), &scale) / h0;
    let dmax = d1.max(d2);
    let h1
        = if dmax <= 1e-15 {
            (h0 * 1e-3).max(1e-6)
        } else {
            (0.01 / dmax).powf(1.0 / 5.0)
        };
    Ok((100.0 * h0).min(h1).min(opts.max_step))
}

struct Step {
    y: nd::Array1<f64>,
    f: nd::Array1<f64>,
    err: f64,
}

// one Dormand-Prince step of size `h` from `(t, y)`, with `k1 = f(y, t)`
// already known
fn dp_step<F>(
    rhs: &mut Rhs<F>,
    t: f64,
    y: &nd::Array1<f64>,
    k1: &nd::Array1<f64>,
    h: f64,
    opts: &OdeOptions,
) -> OdeResult<Step>
where F: Fn(&nd::Array1<f64>, f64) -> nd::Array1<f64>
{
    let k2 = rhs.eval(&(y + &(k1 * (h * A21))), t + C2 * h)?;
    let k3 = rhs.eval(
        &(y + &((k1 * A31 + &k2 * A32) * h)),
        t + C3 * h,
    )?;
    let k4 = rhs.eval(
        &(y + &((k1 * A41 + &k2 * A42 + &k3 * A43) * h)),
        t + C4 * h,
    )?;
    let k5 = rhs.eval(
        &(y + &((k1 * A51 + &k2 * A52 + &k3 * A53 + &k4 * A54) * h)),
        t + C5 * h,
    )?;
    let k6 = rhs.eval(
        &(y + &((k1 * A61 + &k2 * A62 + &k3 * A63 + &k4 * A64 + &k5 * A65) * h)),
        t + h,
    )?;
    let y_new: nd::Array1<f64>
        = y + &((k1 * A71 + &k3 * A73 + &k4 * A74 + &k5 * A75 + &k6 * A76) * h);
    let k7 = rhs.eval(&y_new, t + h)?;
    let err_vec: nd::Array1<f64>
        = (k1 * E1 + &k3 * E3 + &k4 * E4 + &k5 * E5 + &k6 * E6 + &k7 * E7) * h;
    let scale: nd::Array1<f64>
        = y.iter().zip(y_new.iter())
        .map(|(a, b)| opts.atol + opts.rtol * a.abs().max(b.abs()))
        .collect();
    let err = rms_norm(&err_vec, &scale);
    Ok(Step { y: y_new, f: k7, err })
}

// step size multiplier for a given scaled error
fn step_factor(err: f64) -> f64 {
    if err == 0.0 {
        FAC_MAX
    } else if !err.is_finite() {
        FAC_MIN
    } else {
        (SAFETY * err.powf(-1.0 / 5.0)).clamp(FAC_MIN, FAC_MAX)
    }
}

fn check_times(t: &nd::Array1<f64>) -> OdeResult<()> {
    if t.is_empty() {
        return Err(OdeError::InvalidTimes("no output times given".into()));
    }
    if let Some(k) = t.iter().position(|tk| !tk.is_finite()) {
        return Err(OdeError::InvalidTimes(
            format!("non-finite time at index {}", k)));
    }
    if let Some(k) = t.iter().zip(t.iter().skip(1)).position(|(a, b)| b < a) {
        return Err(OdeError::InvalidTimes(
            format!("times must be non-decreasing (index {})", k + 1)));
    }
    Ok(())
}

/// Numerically integrate the real system `dy/dt = f(y, t)` from `y0` at
/// `t[0]`, reporting the solution at every element of `t`.
///
/// The returned array has shape `(y0.len(), t.len())` and its first column is
/// `y0` exactly. `t` must be non-empty, finite, and non-decreasing.
pub fn odeint<F>(
    f: F,
    y0: &nd::Array1<f64>,
    t: &nd::Array1<f64>,
    opts: &OdeOptions,
) -> OdeResult<Solution<f64>>
where F: Fn(&nd::Array1<f64>, f64) -> nd::Array1<f64>
{
    opts.validate()?;
    check_times(t)?;
    if y0.is_empty() { return Err(OdeError::EmptyState); }

    let dim = y0.len();
    let mut rhs = Rhs { f, dim, nfev: 0 };
    let mut y: nd::Array2<f64> = nd::Array2::zeros((dim, t.len()));
    y.column_mut(0).assign(y0);

    let mut stats = Stats::default();
    let mut tk: f64 = t[0];
    let mut yk: nd::Array1<f64> = y0.clone();
    let mut fk: nd::Array1<f64> = rhs.eval(&yk, tk)?;
    let mut h: Option<f64> = opts.first_step.map(|h0| h0.min(opts.max_step));
    let mut attempts: usize;
    let mut h_try: f64;
    let mut clipped: bool;
    let mut step: Step;
    let mut factor: f64;
    for (k, &target) in t.iter().enumerate().skip(1) {
        attempts = 0;
        while tk < target {
            if attempts >= opts.max_steps {
                return Err(OdeError::TooManySteps {
                    t: tk,
                    target,
                    max_steps: opts.max_steps,
                });
            }
            let h_cur = match h {
                Some(hh) => hh,
                None => initial_step(&mut rhs, tk, &yk, &fk, opts)?,
            };
            h_try = h_cur.min(opts.max_step);
            clipped = h_try >= target - tk;
            if clipped {
                h_try = target - tk;
            } else if h_try < opts.min_step || tk + h_try == tk {
                return Err(OdeError::StepSizeUnderflow { t: tk, h: h_try });
            }

            step = dp_step(&mut rhs, tk, &yk, &fk, h_try, opts)?;
            attempts += 1;
            factor = step_factor(step.err);
            if step.err <= 1.0 {
                tk = if clipped { target } else { tk + h_try };
                yk = step.y;
                fk = step.f;
                stats.steps += 1;
                h = Some(
                    if clipped { h_cur.max(h_try * factor) } else { h_try * factor }
                );
            } else {
                stats.rejected += 1;
                h = Some(h_try * factor.min(1.0));
            }
        }
        y.column_mut(k).assign(&yk);
    }
    stats.nfev = rhs.nfev;
    Ok(Solution { y, stats })
}
