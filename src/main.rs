use clap::Parser;
use std::process;
use timeseries_ingest::cli::{args::Args, commands};
use tokio_util::sync::CancellationToken;

fn main() {
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        // Create cancellation token for coordinating graceful shutdown
        let cancellation_token = CancellationToken::new();

        // Ctrl+C cancels in-flight ingestions; the command finishes their rollbacks
        let signal_token = cancellation_token.clone();
        let shutdown_signal = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    eprintln!("\nReceived CTRL+C, rolling back in-flight ingestions...");
                    signal_token.cancel();
                }
                Err(e) => eprintln!("Failed to install CTRL+C signal handler: {}", e),
            }
        });

        let result = commands::run(args, cancellation_token).await;
        shutdown_signal.abort();
        result
    });

    match result {
        Ok(stats) if stats.has_failures() => process::exit(2),
        Ok(_stats) => process::exit(0),
        Err(error) => {
            // Error occurred - print it with its causes and exit with error code
            eprintln!("Error: {:#}", anyhow::Error::new(error));
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("timeseries-ingest - Time-series CSV ingestion");
    println!("=============================================");
    println!();
    println!("Parse semicolon-separated time-series CSV files, validate their rows,");
    println!("and store one aggregate per file together with its rows.");
    println!();
    println!("USAGE:");
    println!("    timeseries-ingest <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    ingest      Ingest CSV files, replacing earlier results for the same file name");
    println!("    results     List stored aggregates with optional filters");
    println!("    values      Show the latest stored rows of one file");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("EXAMPLES:");
    println!("    # Ingest every CSV file in a directory with four workers:");
    println!("    timeseries-ingest ingest ./uploads -j 4");
    println!();
    println!("    # List results whose average value lies between 100 and 200:");
    println!("    timeseries-ingest results --avg-value-from 100 --avg-value-to 200");
    println!();
    println!("    # Show the ten latest rows of one file as JSON:");
    println!("    timeseries-ingest values metrics.csv --output-format json");
    println!();
    println!("For detailed help on any command, use:");
    println!("    timeseries-ingest <COMMAND> --help");
}
