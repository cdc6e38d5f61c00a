//! Print reweighted feature importances as JSON
//!
//! Always exits 0; failures are reported as `{"error": "..."}`.

use anyhow::Result;
use clap::Parser;
use demand_cli::commands::importance;
use demand_lib::{artifact::DEFAULT_MODEL_PATH, observability::init_stderr_tracing};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "feature-importance")]
#[command(author, version, about = "Report model feature importances", long_about = None)]
struct Cli {
    /// Path to the model artifact
    #[arg(long, env = "DEMAND_MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    model: PathBuf,
}

fn main() -> Result<()> {
    init_stderr_tracing("warn");
    let cli = Cli::parse();

    importance::run(&cli.model, &mut io::stdout())?;
    Ok(())
}
