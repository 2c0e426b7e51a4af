//! Compute the atomic inversion described by a TOML input file and dump it as
//! text.
//!
//! ```bash
//! rabi-sim                      # reads ./input.toml
//! rabi-sim runs/thermal.toml --parallel
//! RUST_LOG=rabi_sim=debug rabi-sim
//! ```

use std::path::PathBuf;
use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{ fmt, prelude::*, EnvFilter };
use rabi_sim::{ output, plot, Config };

/// Jaynes-Cummings atomic inversion simulator
#[derive(Parser)]
#[command(name = "rabi-sim")]
#[command(version)]
#[command(about = "Atomic inversion of a two-level atom in a quantized cavity")]
struct Cli {
    /// Path to the input file
    #[arg(default_value = "input.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Solve Fock states in parallel regardless of the input file
    #[arg(long)]
    parallel: bool,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = Config::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let sim = config.build()
        .with_context(|| format!("invalid parameters in {}", cli.config.display()))?;

    let inversion
        = if cli.parallel || config.simulation.parallel {
            sim.run_par()
        } else {
            sim.run()
        }
        .context("simulation failed")?;

    let w = inversion.values();
    let (w_min, w_max)
        = w.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), wk| {
            (lo.min(*wk), hi.max(*wk))
        });
    info!(
        samples = inversion.len(),
        mean = w.mean().unwrap_or(f64::NAN),
        min = w_min,
        max = w_max,
        "atomic inversion computed"
    );

    if config.output.save_txt {
        let path = output::save_txt_file(
            &config.output.out_dir,
            &config.output.out_label,
            config.raw(),
            &inversion,
        )
        .context("writing text output")?;
        info!(path = %path.display(), "saved");
    }
    if config.output.save_png {
        let path = plot::save_png_file(
            &config.output.out_dir,
            &config.output.out_label,
            &inversion,
        )
        .context("writing plot")?;
        info!(path = %path.display(), "saved");
    }
    Ok(())
}
