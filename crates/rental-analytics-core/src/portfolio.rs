use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::config::ReportConfig;
use crate::metrics::{cash_on_cash, noi_yoy_pct, Occupancy, PeriodMetrics};
use crate::report::{property_report, MonthlyBlock, PropertyReport, YtdBlock};
use crate::snapshot::DataSource;
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::RentalAnalyticsResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A property left out of the totals, with the reason it failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedProperty {
    pub property_id: Uuid,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAnnual {
    #[serde(flatten)]
    pub metrics: PeriodMetrics,
    pub noi_prior_year: Money,
    pub noi_yoy_pct: Option<Percent>,
    pub total_equity_invested: Money,
    pub current_equity: Money,
}

/// Quarterly sums. Turnover counts add up; vacancy-day averages do not, so
/// they are left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioQuarterly {
    #[serde(flatten)]
    pub metrics: PeriodMetrics,
    pub turnover_count: u32,
}

/// Household-wide sums over every property that computed cleanly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioTotal {
    pub property_count: u32,
    pub monthly: MonthlyBlock,
    pub ytd: YtdBlock,
    pub quarterly: PortfolioQuarterly,
    pub annual: PortfolioAnnual,
}

impl PortfolioTotal {
    fn add(&mut self, report: &PropertyReport) {
        self.property_count += 1;
        self.monthly.metrics += &report.monthly.metrics;
        self.ytd.metrics += &report.ytd.metrics;
        self.quarterly.metrics += &report.quarterly.metrics;
        self.quarterly.turnover_count += report.quarterly.turnover.turnover_count;
        self.annual.metrics += &report.annual.metrics;
        self.annual.noi_prior_year += report.annual.noi_prior_year;
        self.annual.total_equity_invested += report.annual.total_equity_invested;
        self.annual.current_equity += report.annual.current_equity;

        let occ = &report.monthly.occupancy;
        self.monthly.occupancy = Occupancy::from_counts(
            self.monthly.occupancy.rentable_units + occ.rentable_units,
            self.monthly.occupancy.occupied_units + occ.occupied_units,
        );
    }

    /// Ratios recomputed from the summed figures; they are never averaged.
    fn finish(mut self) -> Self {
        self.ytd.occupancy = self.monthly.occupancy.clone();
        self.ytd.cash_on_cash =
            cash_on_cash(self.ytd.metrics.cash_flow, self.annual.total_equity_invested);
        self.annual.noi_yoy_pct = noi_yoy_pct(self.annual.metrics.noi, self.annual.noi_prior_year);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReport {
    pub household_id: Uuid,
    pub year: i32,
    pub month: u32,
    pub properties: Vec<PropertyReport>,
    pub skipped: Vec<SkippedProperty>,
    pub portfolio_total: PortfolioTotal,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Report on every property in a household and sum them.
///
/// A property whose report fails is logged and listed in `skipped`; it never
/// aborts the others. An unknown household is `NotFound`.
pub fn portfolio_report(
    source: &dyn DataSource,
    household_id: Uuid,
    year: i32,
    month: u32,
    config: &ReportConfig,
) -> RentalAnalyticsResult<PortfolioReport> {
    let ids = source.household_property_ids(household_id)?;

    let results: Vec<(Uuid, RentalAnalyticsResult<PropertyReport>)> = ids
        .into_iter()
        .map(|id| (id, property_report(source, id, year, month, false, config)))
        .collect();

    let mut properties = Vec::new();
    let mut skipped = Vec::new();
    for (property_id, result) in results {
        match result {
            Ok(report) => properties.push(report),
            Err(e) => {
                warn!(%household_id, %property_id, "Skipping property in portfolio: {e}");
                skipped.push(SkippedProperty {
                    property_id,
                    error: e.to_string(),
                });
            }
        }
    }

    let mut total = PortfolioTotal::default();
    for report in &properties {
        total.add(report);
    }

    Ok(PortfolioReport {
        household_id,
        year,
        month,
        properties,
        skipped,
        portfolio_total: total.finish(),
    })
}

/// [`portfolio_report`] wrapped in the standard output envelope, with one
/// warning per skipped property.
pub fn portfolio_report_output(
    source: &dyn DataSource,
    household_id: Uuid,
    year: i32,
    month: u32,
    config: &ReportConfig,
) -> RentalAnalyticsResult<ComputationOutput<PortfolioReport>> {
    let start = Instant::now();
    let report = portfolio_report(source, household_id, year, month, config)?;
    let warnings: Vec<String> = report
        .skipped
        .iter()
        .map(|s| format!("property {} skipped: {}", s.property_id, s.error))
        .collect();
    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Per-property reports summed per period; ratios recomputed from totals",
        &json!({
            "household_id": household_id,
            "year": year,
            "month": month,
            "as_of": config.as_of,
        }),
        warnings,
        elapsed,
        report,
    ))
}
