use clap::Parser;
use colored::*;
use std::process;
use treebench::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    // Initialize logging with TREEBENCH_LOG environment variable support
    let log_level = std::env::var("TREEBENCH_LOG").unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);

        // Use appropriate exit codes based on error type
        let exit_code = match e.downcast_ref::<treebench::TreebenchError>() {
            Some(treebench::TreebenchError::Config(_)) => 2,
            Some(treebench::TreebenchError::Io(_)) => 3,
            Some(treebench::TreebenchError::TreeParse { .. })
            | Some(treebench::TreebenchError::MissingMarker { .. }) => 4,
            Some(treebench::TreebenchError::Tool(_)) => 5,
            _ => 1,
        };
        process::exit(exit_code);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let threads = if cli.threads == 0 {
        num_cpus::get()
    } else {
        cli.threads
    };

    if cli.verbose > 0 {
        eprintln!("External tools will be asked for {} threads", threads);
    }

    match cli.command {
        Commands::Compare(args) => treebench::cli::commands::compare::run(args),
        Commands::Run(args) => treebench::cli::commands::run::run(args, threads),
        Commands::Versus(args) => treebench::cli::commands::versus::run(args, threads),
        Commands::Script(args) => treebench::cli::commands::script::run(args),
        Commands::Analyze(args) => treebench::cli::commands::analyze::run(args),
        Commands::Correlate(args) => treebench::cli::commands::correlate::run(args, threads),
        Commands::Dataset(args) => treebench::cli::commands::dataset::run(args),
    }
}
