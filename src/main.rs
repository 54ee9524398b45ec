use clap::Parser;
use std::process;
use wx_pipeline::cli::{args::Args, commands};

fn main() {
    // Parse command line arguments
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
        tokio::select! {
            result = commands::run(args) => result,
            signal = tokio::signal::ctrl_c() => {
                eprintln!("\nReceived CTRL+C, shutting down...");
                match signal {
                    Ok(()) => Err(anyhow::anyhow!("Interrupted by user")),
                    Err(e) => Err(anyhow::anyhow!("Failed to listen for CTRL+C: {}", e)),
                }
            }
        }
    });

    match result {
        Ok(()) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("wx-pipeline - Station Weather Ingestion and Aggregation");
    println!("=======================================================");
    println!();
    println!("Ingest daily station weather files into a SQLite store and compute");
    println!("yearly average temperatures and total precipitation per station.");
    println!();
    println!("USAGE:");
    println!("    wx-pipeline <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    ingest      Ingest station files, then aggregate if anything new was stored");
    println!("    aggregate   Aggregate every stored reading into yearly results");
    println!("    report      Print the latest aggregate report as JSON");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("EXAMPLES:");
    println!("    # Ingest every *.txt file in ./wx_data:");
    println!("    wx-pipeline ingest");
    println!();
    println!("    # Ingest specific files into a database elsewhere:");
    println!("    wx-pipeline ingest wx_data/USC00110072.txt --database /var/lib/wx/database.db");
    println!();
    println!("    # Show the latest report:");
    println!("    wx-pipeline report --root /srv/wx");
    println!();
    println!("For detailed help on any command, use:");
    println!("    wx-pipeline <COMMAND> --help");
}
