use clap::Parser;
use itag_ingest::cli::{args::Args, commands};
use std::process;

fn main() {
    let args = Args::parse();

    // Create async runtime and run the command with signal handling
    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        // Never resolves if the handler cannot be installed
        let shutdown_signal = async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        };

        // Dropping the command future drops the sink, rolling back any
        // in-flight batch
        tokio::select! {
            result = commands::run(args) => result,
            _ = shutdown_signal => {
                eprintln!("\nReceived CTRL+C, aborting ingestion...");
                Err(itag_ingest::Error::processing_interrupted(
                    "Ingestion interrupted by user",
                )
                .into())
            }
        }
    });

    match result {
        Ok(status) => process::exit(status.exit_code()),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}
