use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    build::{self, BuildArgs},
    diag::{self, CoolingArgs, SpeciesArgs},
    inspect::{self, ShowArgs, TimesArgs},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "coef-sim", about = "Basis coefficient series and diagnostics CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Project every snapshot group of a manifest and store the series.
    Build(BuildArgs),
    /// Print the times of a stored series.
    Times(TimesArgs),
    /// Print the entry nearest to a time as JSON.
    Show(ShowArgs),
    /// Summarise a species diagnostic file.
    Species(SpeciesArgs),
    /// Fit a field of a species file against time and print the table as CSV.
    Cooling(CoolingArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Build(args) => build::run(&args),
        Command::Times(args) => inspect::run_times(&args),
        Command::Show(args) => inspect::run_show(&args),
        Command::Species(args) => diag::run_species(&args),
        Command::Cooling(args) => diag::run_cooling(&args),
    }
}

// COEF_LOG_FORMAT=json switches to machine-readable logs on stderr.
fn init_tracing() {
    let log_format = std::env::var("COEF_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "coef=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
