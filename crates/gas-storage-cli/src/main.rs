mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::contract::PriceContractArgs;
use commands::forecasting::{EstimateArgs, FitModelArgs};
use commands::scenarios::SensitivityArgs;
use output::OutputFormat;

/// Natural-gas storage contract valuation
#[derive(Parser)]
#[command(
    name = "gsv",
    version,
    about = "Natural-gas storage contract valuation",
    long_about = "A CLI for valuing natural-gas storage contracts with decimal precision. \
                  Fits a trend + yearly seasonality price model to historical prices, \
                  estimates prices for any date, and values injection/withdrawal \
                  schedules net of fees and carrying cost."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log to stderr (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the seasonal trend price model to a price history
    FitModel(FitModelArgs),
    /// Estimate prices on one or more dates
    Estimate(EstimateArgs),
    /// Value a storage contract's injection/withdrawal schedule.
    /// Prices come from --history or a price_schedule in the JSON request
    PriceContract(PriceContractArgs),
    /// Sweep contract terms and report net value
    Sensitivity(SensitivityArgs),
    /// Print version information
    Version,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::FitModel(args) => commands::forecasting::run_fit_model(args),
        Commands::Estimate(args) => commands::forecasting::run_estimate(args),
        Commands::PriceContract(args) => commands::contract::run_price_contract(args),
        Commands::Sensitivity(args) => commands::scenarios::run_sensitivity(args),
        Commands::Version => {
            println!("gsv {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            cli.output.render(&value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
