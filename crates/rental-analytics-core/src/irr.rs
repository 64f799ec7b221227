use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cash_flow::CashFlowAggregator;
use crate::fallback::{first_success, Resolved, Strategy};
use crate::metrics::{current_equity, total_equity_invested};
use crate::period::{year_range, DateRange};
use crate::snapshot::CapitalEventType;
use crate::time_value::{xirr, IrrOutcome};
use crate::types::{CashFlow, Percent};
use crate::RentalAnalyticsResult;

/// The dated series a property's IRR was solved from, and the result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrAnalysis {
    pub cash_flows: Vec<CashFlow>,
    pub outcome: IrrOutcome,
    /// Annual IRR as a percentage rounded to 2 places
    pub irr: Option<Percent>,
}

/// When the equity went in: the recorded purchase date, else the first
/// rent payment ever received.
pub fn acquisition_date(agg: &CashFlowAggregator<'_>) -> Option<Resolved<NaiveDate>> {
    first_success(vec![
        Strategy::new("purchase_date", || agg.snapshot().property.purchase_date),
        Strategy::new("earliest_payment", || agg.earliest_payment_date()),
    ])
}

/// Signed, dated equity cash flows for a property through `target_year`.
///
/// Order of assembly: synthetic acquisition outflow (only when no acquisition
/// event was recorded), recorded capital events, one net operating flow per
/// calendar year, and current equity as a terminal inflow dated `as_of`.
/// Returns an empty series when there is nothing to value.
pub fn build_cash_flows(
    agg: &CashFlowAggregator<'_>,
    target_year: i32,
    as_of: NaiveDate,
) -> RentalAnalyticsResult<Vec<CashFlow>> {
    let snapshot = agg.snapshot();
    let mut events: Vec<_> = snapshot.capital_events.iter().collect();
    events.sort_by_key(|e| e.event_date);

    let equity = total_equity_invested(snapshot);
    let acquired = acquisition_date(agg);

    if events.is_empty() && (equity.is_zero() || acquired.is_none()) {
        return Ok(Vec::new());
    }

    let mut flows: Vec<CashFlow> = Vec::new();

    let has_acquisition = events
        .iter()
        .any(|e| e.event_type == CapitalEventType::Acquisition);
    if let Some(acq) = &acquired {
        if !has_acquisition && equity > Decimal::ZERO {
            flows.push(CashFlow::new(acq.value, -equity, "acquisition"));
        }
    }

    flows.extend(
        events
            .iter()
            .map(|e| CashFlow::new(e.event_date, e.amount, "capital_event")),
    );

    let Some(earliest) = flows.iter().map(|cf| cf.date).min() else {
        return Ok(flows);
    };

    let purchase_date = snapshot.property.purchase_date;
    for yr in earliest.year()..=target_year {
        let full = year_range(yr)?.clip_to(purchase_date);
        let range = if yr < target_year {
            full
        } else if full.is_empty() || as_of < full.start {
            DateRange::empty_at(full.end.min(as_of))
        } else {
            DateRange::new(full.start, full.end.min(as_of))?
        };
        if range.is_empty() {
            continue;
        }
        let period = agg.summarize(&range);
        let net = period.rent_collected - period.opex - period.debt_service;
        flows.push(CashFlow::new(range.end, net, "operating"));
    }

    let terminal = current_equity(snapshot);
    if terminal > Decimal::ZERO {
        flows.push(CashFlow::new(as_of, terminal, "terminal_equity"));
    }

    Ok(flows)
}

/// Build the series and solve it. Undefined or non-convergent IRRs come back
/// as `irr: None`, never as an error.
pub fn property_irr(
    agg: &CashFlowAggregator<'_>,
    target_year: i32,
    as_of: NaiveDate,
) -> RentalAnalyticsResult<IrrAnalysis> {
    let cash_flows = build_cash_flows(agg, target_year, as_of)?;
    let outcome = xirr(&cash_flows);
    debug!(
        property_id = %agg.snapshot().id(),
        flows = cash_flows.len(),
        outcome = ?outcome,
        "irr solved"
    );
    let irr = outcome.percent();
    Ok(IrrAnalysis {
        cash_flows,
        outcome,
        irr,
    })
}
