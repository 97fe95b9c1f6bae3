use std::path::PathBuf;

use clap::Parser;
use off_lattice_cell_mc::{Engine, SimulationConfig};

/// Run an off-lattice cell population simulation from a YAML configuration.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Config {
    /// Path to a YAML simulation configuration file.
    #[arg(short, long)]
    config: PathBuf,

    /// Print each recorded snapshot's cell count as the run progresses.
    #[clap(short, long)]
    verbose: bool,
}

fn main() {
    let config = Config::parse();

    let sim_config = SimulationConfig::load(
        config
            .config
            .to_str()
            .expect("configuration path must be valid UTF-8"),
    )
    .expect("failed to load simulation configuration");

    let engine = Engine::new(&sim_config).expect("failed to construct engine");
    let outcome = engine.run(&|| false).expect("simulation aborted");

    if outcome.was_cancelled() {
        println!("run was cancelled");
    }

    if config.verbose {
        for (i, snapshot) in outcome.snapshots().iter().enumerate() {
            println!(
                "snapshot {i}: t={:.2}, {} cells",
                snapshot.time,
                snapshot.cells.len()
            );
        }
    }

    println!(
        "completed with {} recorded snapshots, final population {}",
        outcome.snapshots().len(),
        outcome.snapshots().last().map_or(0, |s| s.cells.len())
    );
}
