//! unireport CLI - narrative reports over university data.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Unified {
            mode,
            kind,
            output,
            no_cache,
        } => commands::unified::run(mode, kind, output, no_cache, cli.verbose),

        Commands::Single { file, kind, output } => {
            commands::single::run(file, kind, output, cli.verbose)
        }

        Commands::List { output } => commands::list::run(output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr, honoring `RUST_LOG` unless `--verbose` is given.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
