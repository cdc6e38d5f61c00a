//! Convert a legacy preprocessing bundle into one pipeline artifact

use anyhow::Result;
use clap::Parser;
use demand_cli::{commands::repackage, output};
use demand_lib::{artifact::DEFAULT_MODEL_PATH, observability::init_stderr_tracing};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "repackage-model")]
#[command(author, version, about = "Repackage a model bundle into a single pipeline", long_about = None)]
struct Cli {
    /// Legacy bundle to read
    #[arg(long, default_value = DEFAULT_MODEL_PATH)]
    input: PathBuf,

    /// Where to write the pipeline artifact
    #[arg(long, default_value = "ml/demand_model_pipeline.json")]
    output: PathBuf,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_stderr_tracing(if cli.verbose { "debug" } else { "warn" });

    match repackage::run(&cli.input, &cli.output) {
        Ok(_) => {
            output::print_success(&format!("Saved pipeline to {}", cli.output.display()));
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            Ok(ExitCode::FAILURE)
        }
    }
}
