mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::reports::{PortfolioReportArgs, PropertyReportArgs};
use commands::tax::TaxExportArgs;

/// Rental property investment analytics
#[derive(Parser)]
#[command(
    name = "rpa",
    version,
    about = "Rental property investment analytics",
    long_about = "Computes NOI, cash flow, occupancy, cap rate, cash-on-cash and IRR \
                  for rental properties from a household JSON export, aggregates them \
                  into portfolio totals, and writes a year-end tax CSV."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Monthly, YTD, quarterly, annual and lifetime metrics for one property
    PropertyReport(PropertyReportArgs),
    /// Every property in a household plus portfolio totals
    PortfolioReport(PortfolioReportArgs),
    /// Year-end CSV for an accountant (always CSV)
    TaxExport(TaxExportArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn fail(e: Box<dyn std::error::Error>) -> ! {
    eprintln!("{}: {}", "error".red().bold(), e);
    process::exit(1);
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::PropertyReport(args) => commands::reports::run_property_report(args),
        Commands::PortfolioReport(args) => commands::reports::run_portfolio_report(args),
        Commands::TaxExport(args) => {
            if let Err(e) = commands::tax::run_tax_export(args) {
                fail(e);
            }
            return;
        }
        Commands::Version => {
            println!(
                "rpa {} (tax export v{})",
                env!("CARGO_PKG_VERSION"),
                rental_analytics_core::tax_export::TAX_EXPORT_VERSION
            );
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => fail(e),
    }
}
