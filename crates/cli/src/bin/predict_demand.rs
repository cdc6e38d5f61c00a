//! Predict demand for a single product
//!
//! Prints the adjusted model output, or a rule-based fallback estimate when
//! the model cannot be used. Exits 0 either way unless `--strict-exit` is set.

use anyhow::Result;
use clap::Parser;
use demand_cli::{commands::predict, output};
use demand_lib::{
    artifact::DEFAULT_MODEL_PATH, observability::init_stderr_tracing, predictor::Forecast,
    PredictionRequest,
};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit code used by `--strict-exit` when the fallback was substituted
const FALLBACK_EXIT_CODE: u8 = 2;

#[derive(Parser)]
#[command(name = "predict-demand")]
#[command(author, version, about = "Predict product demand from stock and price", long_about = None)]
struct Cli {
    /// Product identifier
    product_id: i64,

    /// Units currently in stock
    #[arg(allow_negative_numbers = true)]
    current_stock: f64,

    /// Unit price
    #[arg(allow_negative_numbers = true)]
    price: f64,

    /// Path to the model artifact
    #[arg(long, env = "DEMAND_MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    model: PathBuf,

    /// Exit with code 2 when the fallback estimate was used
    #[arg(long)]
    strict_exit: bool,
}

fn main() -> Result<ExitCode> {
    init_stderr_tracing("warn");
    let cli = Cli::parse();

    let request = PredictionRequest::new(cli.product_id, cli.current_stock, cli.price);
    let forecast = predict::run(&cli.model, &request, &mut io::stdout(), &mut io::stderr())?;

    if let (true, Forecast::Fallback { estimate, .. }) = (cli.strict_exit, &forecast) {
        output::print_warning(&output::describe_fallback(*estimate));
        return Ok(ExitCode::from(FALLBACK_EXIT_CODE));
    }
    Ok(ExitCode::SUCCESS)
}
