//! TOML input files.
//!
//! An input file has one table per part of the simulation:
//! ```toml
//! [field]
//! avg_n = 5
//! pdf_n = "Poisson"
//! cut_n = 50
//!
//! [atom]
//! Cg = 1.0
//! Ce = 0.0
//!
//! [interaction]
//! int_coupling = 1.0
//! int_detuning = 0.0
//!
//! [simulation]
//! time = 100.0
//! step = 0.01
//!
//! [output]
//! save_txt = true
//! save_png = false
//! out_label = "output"
//! ```
//! Parsing only checks types; physical validation happens in [`Config::build`].

use std::{
    fs,
    path::{ Path, PathBuf },
    str::FromStr,
};
use serde::Deserialize;
use crate::{
    atom::Atom,
    error::{ Error, Result },
    field::{ Field, PhotonDist },
    simulation::Simulation,
    system::System,
};

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct FieldConfig {
    pub avg_n: i64,
    pub pdf_n: PhotonDist,
    pub cut_n: i64,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AtomConfig {
    #[serde(rename = "Cg")]
    pub cg: f64,
    #[serde(rename = "Ce")]
    pub ce: f64,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct InteractionConfig {
    pub int_coupling: f64,
    pub int_detuning: f64,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SimulationConfig {
    pub time: f64,
    pub step: f64,
    /// Solve Fock states on the rayon thread pool.
    #[serde(default)]
    pub parallel: bool,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct OutputConfig {
    pub save_txt: bool,
    /// Render the inversion to a PNG next to the text dump.
    #[serde(default)]
    pub save_png: bool,
    pub out_label: String,
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
}

fn default_out_dir() -> PathBuf { PathBuf::from("output") }

/// Parsed input file, along with its raw text.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Config {
    pub field: FieldConfig,
    pub atom: AtomConfig,
    pub interaction: InteractionConfig,
    pub simulation: SimulationConfig,
    pub output: OutputConfig,
    #[serde(skip)]
    raw: String,
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(s)?;
        config.raw = s.to_string();
        Ok(config)
    }
}

impl Config {
    /// Read and parse an input file.
    pub fn load<P>(path: P) -> Result<Self>
    where P: AsRef<Path>
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|err| {
                Error::Config(format!("could not read {}: {}", path.display(), err))
            })?;
        text.parse()
    }

    /// Text of the input file, exactly as read.
    pub fn raw(&self) -> &str { &self.raw }

    /// Build the validated simulation described by this file.
    ///
    /// Fails if any parameter is rejected by its constructor, or if the output
    /// label cannot be used as a file name.
    pub fn build(&self) -> Result<Simulation> {
        let field = Field::new(
            self.field.avg_n, self.field.pdf_n, self.field.cut_n)?;
        let atom = Atom::new(self.atom.cg, self.atom.ce)?;
        let system = System::new(
            field,
            atom,
            self.interaction.int_coupling,
            self.interaction.int_detuning,
        )?;
        self.check_output()?;
        Simulation::new(system, self.simulation.time, self.simulation.step)
    }

    fn check_output(&self) -> Result<()> {
        let label = &self.output.out_label;
        if label.is_empty() {
            return Err(Error::Config("output label (out_label) is empty".into()));
        }
        if label.contains(['/', '\\']) || label == "." || label == ".." {
            return Err(Error::Config(format!(
                "output label (out_label) must be a plain file name, got {:?}",
                label,
            )));
        }
        Ok(())
    }

    /// Path of the text dump, `out_dir/out_label.txt`.
    pub fn output_path(&self) -> PathBuf {
        self.output.out_dir.join(format!("{}.txt", self.output.out_label))
    }

    /// Path of the plot, `out_dir/out_label.png`.
    pub fn plot_path(&self) -> PathBuf {
        self.output.out_dir.join(format!("{}.png", self.output.out_label))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const INPUT: &str = include_str!("../input.toml");

    fn with(from: &str, to: &str) -> String {
        assert!(INPUT.contains(from));
        INPUT.replacen(from, to, 1)
    }

    #[test]
    fn parse_default_input() {
        let config: Config = INPUT.parse().unwrap();
        assert_eq!(config.field,
            FieldConfig { avg_n: 5, pdf_n: PhotonDist::Poisson, cut_n: 50 });
        assert_eq!(config.atom, AtomConfig { cg: 1.0, ce: 0.0 });
        assert_eq!(config.interaction.int_coupling, 1.0);
        assert_eq!(config.interaction.int_detuning, 0.0);
        assert_eq!(config.simulation.time, 100.0);
        assert_eq!(config.simulation.step, 0.01);
        assert!(!config.simulation.parallel);
        assert!(config.output.save_txt);
        assert!(!config.output.save_png);
        assert_eq!(config.raw(), INPUT);
        assert_eq!(config.output_path(), PathBuf::from("output/output.txt"));
        assert_eq!(config.plot_path(), PathBuf::from("output/output.png"));

        let sim = config.build().unwrap();
        assert_eq!(sim.grid().len(), 10000);
        assert_eq!(sim.system.field.cut_n(), 50);
    }

    #[test]
    fn optional_keys() {
        let text = with("parallel = false\n", "")
            .replace("out_dir = \"output\"\n", "")
            .replace("save_png = false\n", "");
        let config: Config = text.parse().unwrap();
        assert!(!config.simulation.parallel);
        assert!(!config.output.save_png);
        assert_eq!(config.output.out_dir, PathBuf::from("output"));
    }

    #[test]
    fn png_flag() {
        let config: Config
            = with("save_png = false", "save_png = true").parse().unwrap();
        assert!(config.output.save_png);
        assert!(config.build().is_ok());
    }

    #[test]
    fn integer_time() {
        let config: Config = with("time = 100.0", "time = 100").parse().unwrap();
        assert_eq!(config.simulation.time, 100.0);
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(
            with("\"Poisson\"", "\"Gaussian\"").parse::<Config>(),
            Err(Error::Toml(_)),
        ));
        assert!(matches!(
            with("[atom]\nCg = 1.0\nCe = 0.0\n", "").parse::<Config>(),
            Err(Error::Toml(_)),
        ));
        assert!(matches!(
            with("cut_n = 50", "cut_n = \"50\"").parse::<Config>(),
            Err(Error::Toml(_)),
        ));
    }

    #[test]
    fn build_errors() {
        let build = |text: String| text.parse::<Config>().unwrap().build();
        assert!(matches!(
            build(with("Ce = 0.0", "Ce = 1.0")),
            Err(Error::InvalidAtomState(_)),
        ));
        assert!(matches!(
            build(with("cut_n = 50", "cut_n = 5")),
            Err(Error::InvalidFieldSpec(_)),
        ));
        assert!(matches!(
            build(with("int_coupling = 1.0", "int_coupling = -1.0")),
            Err(Error::InvalidInteraction(_)),
        ));
        assert!(matches!(
            build(with("step = 0.01", "step = 10.0")),
            Err(Error::InvalidTimeGrid(_)),
        ));
        assert!(matches!(
            build(with("out_label = \"output\"", "out_label = \"a/b\"")),
            Err(Error::Config(_)),
        ));
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            Config::load("this/file/does/not/exist.toml"),
            Err(Error::Config(_)),
        ));
    }
}
