//! Error types for the construction and simulation of atom-cavity systems.

use thiserror::Error;
use crate::integrate::OdeError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Initial amplitudes out of range or not normalized.
    #[error("invalid atom state: {0}")]
    InvalidAtomState(String),

    /// Bad photon-number parameters or distribution tag.
    #[error("invalid field: {0}")]
    InvalidFieldSpec(String),

    /// Negative or non-finite coupling/detuning.
    #[error("invalid interaction: {0}")]
    InvalidInteraction(String),

    /// Bad simulation duration or time step.
    #[error("invalid time grid: {0}")]
    InvalidTimeGrid(String),

    /// The ODE solve for a single Fock state failed; the whole run is
    /// abandoned.
    #[error("integration failed for photon number n = {n}: {source}")]
    Solve {
        n: usize,
        #[source]
        source: OdeError,
    },

    /// Solver settings were rejected before any integration took place.
    #[error("solver error: {0}")]
    Solver(#[from] OdeError),

    /// The inversion plot could not be rendered or written.
    #[error("plot error: {0}")]
    Plot(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
