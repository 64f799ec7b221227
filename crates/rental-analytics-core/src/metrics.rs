use std::ops::AddAssign;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cash_flow::{CashFlowAggregator, PeriodFlows};
use crate::period::DateRange;
use crate::snapshot::{CostCategory, Lease, LeaseStatus, Property, PropertySnapshot};
use crate::types::{round_money, round_to, Money, Percent};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Per-category expense split for one period. The key set is fixed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseBreakdown {
    pub loan_payment: Money,
    pub property_tax: Money,
    pub insurance: Money,
    pub hoa: Money,
    pub other_fixed: Money,
    pub repairs: Money,
    pub management_fee: Money,
}

impl AddAssign<&ExpenseBreakdown> for ExpenseBreakdown {
    fn add_assign(&mut self, rhs: &ExpenseBreakdown) {
        self.loan_payment += rhs.loan_payment;
        self.property_tax += rhs.property_tax;
        self.insurance += rhs.insurance;
        self.hoa += rhs.hoa;
        self.other_fixed += rhs.other_fixed;
        self.repairs += rhs.repairs;
        self.management_fee += rhs.management_fee;
    }
}

/// Core figures shared by every report block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodMetrics {
    pub months: u32,
    /// Rent roll: formal charges, else lease-implied rent
    pub rent_charged: Money,
    pub rent_collected: Money,
    /// rent_charged − rent_collected; negative when tenants prepay
    pub delinquency: Money,
    pub opex: Money,
    pub capex: Money,
    pub noi: Money,
    pub debt_service: Money,
    pub cash_flow: Money,
    pub expense_breakdown: ExpenseBreakdown,
}

impl PeriodMetrics {
    pub fn from_flows(flows: &PeriodFlows, expense_breakdown: ExpenseBreakdown) -> Self {
        let noi = flows.rent_collected - flows.opex;
        PeriodMetrics {
            months: flows.months,
            rent_charged: flows.rent_roll,
            rent_collected: flows.rent_collected,
            delinquency: flows.rent_roll - flows.rent_collected,
            opex: flows.opex,
            capex: flows.capex,
            noi,
            debt_service: flows.debt_service,
            cash_flow: noi - flows.debt_service,
            expense_breakdown,
        }
    }
}

/// Sums every money field; `months` keeps the longest span.
impl AddAssign<&PeriodMetrics> for PeriodMetrics {
    fn add_assign(&mut self, rhs: &PeriodMetrics) {
        self.months = self.months.max(rhs.months);
        self.rent_charged += rhs.rent_charged;
        self.rent_collected += rhs.rent_collected;
        self.delinquency += rhs.delinquency;
        self.opex += rhs.opex;
        self.capex += rhs.capex;
        self.noi += rhs.noi;
        self.debt_service += rhs.debt_service;
        self.cash_flow += rhs.cash_flow;
        self.expense_breakdown += &rhs.expense_breakdown;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Occupancy {
    pub occupancy_pct: Percent,
    pub rentable_units: u32,
    pub occupied_units: u32,
}

impl Occupancy {
    pub fn from_counts(rentable_units: u32, occupied_units: u32) -> Self {
        let occupancy_pct = if rentable_units == 0 {
            Decimal::ZERO
        } else {
            round_to(
                Decimal::from(occupied_units) / Decimal::from(rentable_units) * dec!(100),
                1,
            )
        };
        Occupancy {
            occupancy_pct,
            rentable_units,
            occupied_units,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnoverStats {
    pub turnover_count: u32,
    pub avg_vacancy_days: Decimal,
}

// ---------------------------------------------------------------------------
// Period metrics
// ---------------------------------------------------------------------------

/// Summarize `range` and derive its metrics and expense breakdown.
pub fn period_metrics(agg: &CashFlowAggregator<'_>, range: &DateRange) -> PeriodMetrics {
    let flows = agg.summarize(range);
    let breakdown = expense_breakdown(agg, &flows);
    PeriodMetrics::from_flows(&flows, breakdown)
}

/// Split a period's expenses into the fixed category set. Fixed costs are
/// monthly equivalents × months; the management fee is charged on billed
/// rent, not collected rent.
pub fn expense_breakdown(agg: &CashFlowAggregator<'_>, flows: &PeriodFlows) -> ExpenseBreakdown {
    let months = Decimal::from(flows.months);
    let tax = agg.category_monthly_equivalent(CostCategory::PropertyTax);
    let insurance = agg.category_monthly_equivalent(CostCategory::Insurance);
    let hoa = agg.category_monthly_equivalent(CostCategory::Hoa);
    let other = agg.fixed_monthly_equivalent() - tax - insurance - hoa;

    ExpenseBreakdown {
        loan_payment: round_money(agg.monthly_debt_service() * months),
        property_tax: round_money(tax * months),
        insurance: round_money(insurance * months),
        hoa: round_money(hoa * months),
        other_fixed: round_money(other * months),
        repairs: flows.maintenance_opex,
        management_fee: management_fee(&agg.snapshot().property, flows.rent_roll),
    }
}

/// Manager's cut of billed rent; zero for self-managed properties.
pub fn management_fee(property: &Property, rent_charged: Money) -> Money {
    match property.management_fee_pct {
        Some(pct) if property.is_property_managed => round_money(rent_charged * pct / dec!(100)),
        _ => Decimal::ZERO,
    }
}

// ---------------------------------------------------------------------------
// Ratios
// ---------------------------------------------------------------------------

/// Active leases on rentable units that had started by the end of `month`.
pub fn occupancy(snapshot: &PropertySnapshot, month: &DateRange) -> Occupancy {
    let rentable = snapshot.rentable_units().count() as u32;
    let occupied = if month.is_empty() {
        0
    } else {
        snapshot
            .rentable_leases()
            .filter(|l| l.is_active() && l.lease_start <= month.end)
            .count() as u32
    };
    Occupancy::from_counts(rentable, occupied)
}

/// Annual NOI over current market value, as a percentage.
pub fn cap_rate(annual_noi: Money, current_value: Option<Money>) -> Option<Percent> {
    let value = current_value.filter(|v| *v > Decimal::ZERO)?;
    percent_of(annual_noi, value, 2)
}

/// Cash put in at acquisition: price + closing costs − original loan principal.
pub fn total_equity_invested(snapshot: &PropertySnapshot) -> Money {
    let prop = &snapshot.property;
    let borrowed: Money = snapshot.loans.iter().filter_map(|l| l.original_amount).sum();
    prop.purchase_price.unwrap_or_default() + prop.closing_costs.unwrap_or_default() - borrowed
}

/// Market value less outstanding loan balances.
pub fn current_equity(snapshot: &PropertySnapshot) -> Money {
    let owed: Money = snapshot.loans.iter().filter_map(|l| l.current_balance).sum();
    snapshot.property.current_value.unwrap_or_default() - owed
}

pub fn cash_on_cash(cash_flow: Money, equity_invested: Money) -> Option<Percent> {
    if equity_invested <= Decimal::ZERO {
        return None;
    }
    percent_of(cash_flow, equity_invested, 2)
}

/// Year-over-year NOI change relative to the magnitude of the prior year.
pub fn noi_yoy_pct(current: Money, prior: Money) -> Option<Percent> {
    if prior.is_zero() {
        return None;
    }
    percent_of(current.checked_sub(prior)?, prior.abs(), 1)
}

/// numerator / denominator as a percentage; `None` when out of range.
fn percent_of(numerator: Decimal, denominator: Decimal, dp: u32) -> Option<Percent> {
    let ratio = numerator.checked_div(denominator)?;
    Some(round_to(ratio.checked_mul(dec!(100))?, dp))
}

/// Monthly-equivalent cost of one category × 12.
pub fn annualized_cost(agg: &CashFlowAggregator<'_>, category: CostCategory) -> Money {
    round_money(agg.category_monthly_equivalent(category) * dec!(12))
}

// ---------------------------------------------------------------------------
// Turnover
// ---------------------------------------------------------------------------

/// Leases that ended with a move-out inside `quarter`, and the mean gap in
/// days until the same unit's next lease started.
pub fn turnover(snapshot: &PropertySnapshot, quarter: &DateRange) -> TurnoverStats {
    let leases: Vec<&Lease> = snapshot.rentable_leases().collect();

    let ended: Vec<(Uuid, NaiveDate)> = leases
        .iter()
        .filter(|l| l.status == LeaseStatus::Ended)
        .filter_map(|l| l.move_out_date.map(|out| (l.unit_id, out)))
        .filter(|(_, out)| quarter.contains(*out))
        .collect();

    let gaps: Vec<i64> = ended
        .iter()
        .filter_map(|(unit_id, out)| {
            leases
                .iter()
                .filter(|next| next.unit_id == *unit_id && next.lease_start > *out)
                .map(|next| next.lease_start)
                .min()
                .map(|start| (start - *out).num_days())
        })
        .collect();

    let avg_vacancy_days = if gaps.is_empty() {
        Decimal::ZERO
    } else {
        let total: i64 = gaps.iter().sum();
        round_to(Decimal::from(total) / Decimal::from(gaps.len() as i64), 1)
    };

    TurnoverStats {
        turnover_count: ended.len() as u32,
        avg_vacancy_days,
    }
}
