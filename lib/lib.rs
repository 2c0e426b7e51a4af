//! Atomic inversion of a two-level atom coupled to a single quantized cavity
//! mode (Jaynes-Cummings model), averaged over the photon-number distribution
//! of the field.

pub mod error;
pub mod field;
pub mod atom;
pub mod system;
pub mod integrate;
pub mod simulation;
pub mod config;
pub mod output;
pub mod plot;

pub use error::{ Error, Result };
pub use field::{ Field, PhotonDist };
pub use atom::Atom;
pub use system::{ Interaction, System };
pub use simulation::{ analytical_inversion, Inversion, Simulation, TimeGrid };
pub use config::Config;
