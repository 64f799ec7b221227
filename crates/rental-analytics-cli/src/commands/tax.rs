use std::fs;
use std::io::{self, Write};

use clap::Args;
use uuid::Uuid;

use rental_analytics_core::tax_export::{export_filename, tax_export};

use super::reports::household_or_sole;
use crate::input;

/// Arguments for the year-end tax CSV
#[derive(Args)]
pub struct TaxExportArgs {
    /// Path to a household JSON export (otherwise read from stdin)
    #[arg(long)]
    pub input: Option<String>,

    /// Household to export (defaults to the only household in the input)
    #[arg(long)]
    pub household_id: Option<Uuid>,

    /// Tax year (e.g. 2025)
    #[arg(long)]
    pub year: i32,

    /// Write to this directory as rental_tax_report_<year>.csv instead of stdout
    #[arg(long)]
    pub out_dir: Option<String>,
}

/// Writes CSV bytes as-is; the global output format does not apply.
pub fn run_tax_export(args: TaxExportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = input::load_store(args.input.as_deref())?;
    let household_id = household_or_sole(args.household_id, &store)?;
    let bytes = tax_export(&store, household_id, args.year)?;

    match args.out_dir {
        Some(dir) => {
            let path = std::path::Path::new(&dir).join(export_filename(args.year));
            fs::write(&path, &bytes)
                .map_err(|e| format!("Failed to write '{}': {}", path.display(), e))?;
            tracing::info!(path = %path.display(), bytes = bytes.len(), "tax export written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
