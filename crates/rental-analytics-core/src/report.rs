use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::cash_flow::{CashFlowAggregator, CategoryTotal};
use crate::config::ReportConfig;
use crate::irr::property_irr;
use crate::metrics::{
    annualized_cost, cap_rate, cash_on_cash, current_equity, noi_yoy_pct, occupancy,
    period_metrics, total_equity_invested, turnover, Occupancy, PeriodMetrics, TurnoverStats,
};
use crate::period::{lifetime_range, ReportPeriods};
use crate::snapshot::{CostCategory, DataSource, PropertySnapshot};
use crate::types::{round_money, with_metadata, ComputationOutput, Money, Percent};
use crate::RentalAnalyticsResult;

// ---------------------------------------------------------------------------
// Report blocks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBlock {
    #[serde(flatten)]
    pub metrics: PeriodMetrics,
    #[serde(flatten)]
    pub occupancy: Occupancy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YtdBlock {
    #[serde(flatten)]
    pub metrics: PeriodMetrics,
    #[serde(flatten)]
    pub occupancy: Occupancy,
    pub cash_on_cash: Option<Percent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuarterlyBlock {
    #[serde(flatten)]
    pub metrics: PeriodMetrics,
    pub cash_on_cash_ytd: Option<Percent>,
    pub expense_by_category: Vec<CategoryTotal>,
    #[serde(flatten)]
    pub turnover: TurnoverStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnualBlock {
    #[serde(flatten)]
    pub metrics: PeriodMetrics,
    pub cap_rate: Option<Percent>,
    pub irr: Option<Percent>,
    pub noi_prior_year: Money,
    pub noi_yoy_pct: Option<Percent>,
    pub property_tax_annual: Money,
    pub insurance_annual: Money,
    pub total_equity_invested: Money,
    pub current_equity: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifetimeBlock {
    pub start_date: NaiveDate,
    #[serde(flatten)]
    pub metrics: PeriodMetrics,
    pub avg_monthly_noi: Money,
    pub avg_monthly_cash_flow: Money,
    pub cap_rate: Option<Percent>,
    pub irr: Option<Percent>,
    pub current_equity: Money,
    pub total_equity_invested: Money,
}

/// Every metric block for one property at one (year, month) anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyReport {
    pub property_id: Uuid,
    pub property_address: String,
    pub year: i32,
    /// `YYYY-MM`
    pub month: String,
    /// `YYYY-Qn`
    pub quarter: String,
    pub as_of: NaiveDate,
    pub monthly: MonthlyBlock,
    pub ytd: YtdBlock,
    pub quarterly: QuarterlyBlock,
    pub annual: AnnualBlock,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifetime: Option<LifetimeBlock>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Fetch one property and compute its report. An unknown property surfaces
/// as `NotFound`.
pub fn property_report(
    source: &dyn DataSource,
    property_id: Uuid,
    year: i32,
    month: u32,
    include_lifetime: bool,
    config: &ReportConfig,
) -> RentalAnalyticsResult<PropertyReport> {
    let snapshot = source.property_snapshot(property_id)?;
    build_property_report(&snapshot, year, month, include_lifetime, config)
}

/// [`property_report`] wrapped in the standard output envelope.
pub fn property_report_output(
    source: &dyn DataSource,
    property_id: Uuid,
    year: i32,
    month: u32,
    include_lifetime: bool,
    config: &ReportConfig,
) -> RentalAnalyticsResult<ComputationOutput<PropertyReport>> {
    let start = Instant::now();
    let report = property_report(source, property_id, year, month, include_lifetime, config)?;
    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Cash-basis NOI and cash flow per period; XIRR on dated equity flows",
        &json!({
            "year": year,
            "month": month,
            "as_of": config.as_of,
            "lifetime": include_lifetime,
        }),
        Vec::new(),
        elapsed,
        report,
    ))
}

/// Compute a report from a snapshot already in hand.
pub fn build_property_report(
    snapshot: &PropertySnapshot,
    year: i32,
    month: u32,
    include_lifetime: bool,
    config: &ReportConfig,
) -> RentalAnalyticsResult<PropertyReport> {
    snapshot.validate()?;

    let prop = &snapshot.property;
    let periods = ReportPeriods::resolve(year, month, prop.purchase_date)?;
    let agg = CashFlowAggregator::new(snapshot);

    let occ = occupancy(snapshot, &periods.month);
    let equity_invested = round_money(total_equity_invested(snapshot));
    let equity_now = round_money(current_equity(snapshot));

    // --- Monthly / YTD ---
    let monthly = MonthlyBlock {
        metrics: period_metrics(&agg, &periods.month),
        occupancy: occ.clone(),
    };

    let ytd_metrics = period_metrics(&agg, &periods.ytd);
    let coc_ytd = cash_on_cash(ytd_metrics.cash_flow, equity_invested);
    let ytd = YtdBlock {
        metrics: ytd_metrics,
        occupancy: occ,
        cash_on_cash: coc_ytd,
    };

    // --- Quarterly ---
    let quarterly = QuarterlyBlock {
        metrics: period_metrics(&agg, &periods.quarter),
        cash_on_cash_ytd: coc_ytd,
        expense_by_category: agg.expense_by_category(&periods.quarter),
        turnover: turnover(snapshot, &periods.quarter),
    };

    // --- Annual ---
    let annual_metrics = period_metrics(&agg, &periods.year_range);
    let noi_prior_year = period_metrics(&agg, &periods.prior_year).noi;
    let annual_cap_rate = cap_rate(annual_metrics.noi, prop.current_value);
    let irr = property_irr(&agg, year, config.as_of)?.irr;

    let annual = AnnualBlock {
        noi_yoy_pct: noi_yoy_pct(annual_metrics.noi, noi_prior_year),
        metrics: annual_metrics,
        cap_rate: annual_cap_rate,
        irr,
        noi_prior_year,
        property_tax_annual: annualized_cost(&agg, CostCategory::PropertyTax),
        insurance_annual: annualized_cost(&agg, CostCategory::Insurance),
        total_equity_invested: equity_invested,
        current_equity: equity_now,
    };

    // --- Lifetime ---
    let lifetime = if include_lifetime {
        let range = lifetime_range(
            prop.purchase_date,
            agg.earliest_payment_date(),
            agg.earliest_charge_date(),
            year,
            config.as_of,
        )?;
        let metrics = period_metrics(&agg, &range);
        let months = Decimal::from(metrics.months.max(1));
        Some(LifetimeBlock {
            start_date: range.start,
            avg_monthly_noi: round_money(metrics.noi / months),
            avg_monthly_cash_flow: round_money(metrics.cash_flow / months),
            metrics,
            cap_rate: annual_cap_rate,
            irr,
            current_equity: equity_now,
            total_equity_invested: equity_invested,
        })
    } else {
        None
    };

    Ok(PropertyReport {
        property_id: prop.id,
        property_address: prop.address.clone(),
        year,
        month: periods.month_label(),
        quarter: periods.quarter_label(),
        as_of: config.as_of,
        monthly,
        ytd,
        quarterly,
        annual,
        lifetime,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Lease, LeaseStatus, MemoryStore, Payment, Property, Unit};
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn snapshot(purchase: NaiveDate) -> PropertySnapshot {
        let property = Property {
            id: Uuid::new_v4(),
            household_id: Uuid::new_v4(),
            address: "44 Bay St".into(),
            purchase_date: Some(purchase),
            purchase_price: Some(dec!(250000)),
            closing_costs: Some(dec!(5000)),
            current_value: Some(dec!(300000)),
            is_property_managed: false,
            management_fee_pct: None,
        };
        let pid = property.id;
        let mut snap = PropertySnapshot::new(property);
        let unit = Unit {
            id: Uuid::new_v4(),
            property_id: pid,
            is_rentable: true,
        };
        let lease = Lease {
            id: Uuid::new_v4(),
            unit_id: unit.id,
            tenant_id: None,
            lease_start: purchase,
            lease_end: None,
            monthly_rent: dec!(2000),
            status: LeaseStatus::Active,
            move_out_date: None,
        };
        snap.payments.push(Payment {
            id: Uuid::new_v4(),
            lease_id: lease.id,
            payment_date: d(2025, 7, 1),
            amount: dec!(2000),
        });
        snap.units.push(unit);
        snap.leases.push(lease);
        snap
    }

    #[test]
    fn test_pre_purchase_month_is_all_zero() {
        let snap = snapshot(d(2025, 6, 15));
        let config = ReportConfig::as_of(d(2025, 12, 31));
        let report = build_property_report(&snap, 2025, 5, false, &config).unwrap();

        assert_eq!(report.monthly.metrics, PeriodMetrics::default());
        assert_eq!(report.monthly.occupancy.occupied_units, 0);
        assert_eq!(report.monthly.occupancy.occupancy_pct, Decimal::ZERO);
        assert_eq!(report.ytd.metrics.months, 0);
        assert_eq!(report.ytd.metrics.noi, Decimal::ZERO);
    }

    #[test]
    fn test_report_labels_and_lifetime() {
        let snap = snapshot(d(2025, 6, 15));
        let config = ReportConfig::as_of(d(2025, 12, 31));
        let report = build_property_report(&snap, 2025, 7, true, &config).unwrap();

        assert_eq!(report.month, "2025-07");
        assert_eq!(report.quarter, "2025-Q3");
        assert_eq!(report.monthly.metrics.rent_collected, dec!(2000));
        assert_eq!(report.annual.metrics.months, 7);
        assert_eq!(report.annual.total_equity_invested, dec!(255000));

        let lifetime = report.lifetime.unwrap();
        assert_eq!(lifetime.start_date, d(2025, 6, 15));
        assert_eq!(lifetime.metrics.months, 7);
    }

    #[test]
    fn test_unknown_property_is_not_found() {
        let store = MemoryStore::default();
        let err = property_report(
            &store,
            Uuid::new_v4(),
            2025,
            1,
            false,
            &ReportConfig::as_of(d(2025, 1, 31)),
        )
        .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_report_output_envelope() {
        let snap = snapshot(d(2025, 1, 1));
        let pid = snap.id();
        let mut store = MemoryStore::default();
        store.insert(snap);
        let config = ReportConfig::as_of(d(2025, 12, 31));

        let out = property_report_output(&store, pid, 2025, 7, true, &config).unwrap();
        assert_eq!(out.result.property_id, pid);
        assert!(out.warnings.is_empty());
        assert_eq!(out.assumptions["lifetime"], serde_json::Value::Bool(true));
        assert_eq!(out.assumptions["as_of"], "2025-12-31");
    }

    #[test]
    fn test_report_serializes_flat_blocks() {
        let snap = snapshot(d(2025, 1, 1));
        let config = ReportConfig::as_of(d(2025, 12, 31));
        let report = build_property_report(&snap, 2025, 7, false, &config).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["monthly"]["noi"].is_string());
        assert!(json["monthly"]["occupancy_pct"].is_string());
        assert!(json["quarterly"]["turnover_count"].is_number());
        assert!(json.get("lifetime").is_none());
    }
}
