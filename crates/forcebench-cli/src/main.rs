mod cli;
mod config;
mod error;
mod logging;
mod progress;

use crate::cli::Cli;
use crate::error::Result;
use crate::progress::CliProgressHandler;
use clap::Parser;
use forcebench::engine::progress::ProgressReporter;
use forcebench::workflows::evaluate;
use tracing::{debug, info};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    info!("🚀 ForceBench v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let config = config::load(&cli)?;
    info!(
        models = config.models.len(),
        dataset = %config.dataset_path.display(),
        "Run configuration assembled."
    );

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting model evaluation...");
    let report = evaluate::run(&config, &reporter)?;

    println!(
        "✓ Reference table and {} model table(s) written to: {}",
        report.tables.len(),
        report.output_dir.display()
    );
    for table in &report.tables {
        println!(
            "  {} ({} rows) -> {}",
            table.model,
            table.rows,
            table.path.display()
        );
    }
    info!("✅ Evaluation completed successfully.");

    Ok(())
}
