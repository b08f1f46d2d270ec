// worldsim - rolling LLM-narrated world simulation
// Main entry point

use clap::Parser;
use std::process::ExitCode;

use worldsim::cli::{execute, Cli};
use worldsim::logging::init_tracing;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    match execute(cli).await {
        Ok(output) => {
            println!("{}", output.snapshot_path.display());
            println!("{}", output.report_path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Simulation failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}
