use chrono::{Datelike, NaiveDate};
use clap::Args;
use serde_json::Value;
use uuid::Uuid;

use rental_analytics_core::portfolio::portfolio_report_output;
use rental_analytics_core::report::property_report_output;
use rental_analytics_core::{MemoryStore, ReportConfig};

use crate::input;

/// Where the household records come from and which date counts as today.
#[derive(Args)]
pub struct SourceArgs {
    /// Path to a household JSON export (otherwise read from stdin)
    #[arg(long)]
    pub input: Option<String>,

    /// Date treated as today for IRR and lifetime figures (YYYY-MM-DD)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

impl SourceArgs {
    pub fn config(&self) -> ReportConfig {
        self.as_of.map(ReportConfig::as_of).unwrap_or_default()
    }

    pub fn store(&self) -> Result<MemoryStore, Box<dyn std::error::Error>> {
        input::load_store(self.input.as_deref())
    }
}

/// Report year and month. Both default to the as-of date.
#[derive(Args)]
pub struct AnchorArgs {
    /// Report year (e.g. 2025)
    #[arg(long)]
    pub year: Option<i32>,

    /// Report month, 1-12
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,
}

impl AnchorArgs {
    fn resolve(&self, config: &ReportConfig) -> (i32, u32) {
        (
            self.year.unwrap_or(config.as_of.year()),
            self.month.unwrap_or(config.as_of.month()),
        )
    }
}

/// Arguments for a single-property report
#[derive(Args)]
pub struct PropertyReportArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub anchor: AnchorArgs,

    /// Property to report on
    #[arg(long)]
    pub property_id: Uuid,

    /// Include the since-acquisition block
    #[arg(long)]
    pub lifetime: bool,
}

pub fn run_property_report(args: PropertyReportArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = args.source.config();
    let (year, month) = args.anchor.resolve(&config);
    let store = args.source.store()?;

    let output =
        property_report_output(&store, args.property_id, year, month, args.lifetime, &config)?;
    Ok(serde_json::to_value(output)?)
}

/// Arguments for a household portfolio report
#[derive(Args)]
pub struct PortfolioReportArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub anchor: AnchorArgs,

    /// Household to aggregate (defaults to the only household in the input)
    #[arg(long)]
    pub household_id: Option<Uuid>,
}

pub fn run_portfolio_report(
    args: PortfolioReportArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let config = args.source.config();
    let (year, month) = args.anchor.resolve(&config);
    let store = args.source.store()?;
    let household_id = household_or_sole(args.household_id, &store)?;

    let output = portfolio_report_output(&store, household_id, year, month, &config)?;
    Ok(serde_json::to_value(output)?)
}

pub fn household_or_sole(
    explicit: Option<Uuid>,
    store: &MemoryStore,
) -> Result<Uuid, Box<dyn std::error::Error>> {
    explicit
        .or_else(|| store.sole_household())
        .ok_or_else(|| "--household-id is required when the input holds several households".into())
}
