use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::fallback::{first_success, Strategy};
use crate::period::DateRange;
use crate::snapshot::{CostCategory, CostFrequency, PropertyCost, PropertySnapshot};
use crate::types::{round_money, Money};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Raw cash-flow totals for one property over one bounded range, in cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodFlows {
    pub range: DateRange,
    pub months: u32,
    /// Formal rent charges only
    pub rent_charged: Money,
    /// Rent charges, else lease-implied rent
    pub rent_roll: Money,
    pub rent_collected: Money,
    /// Non-capex maintenance
    pub maintenance_opex: Money,
    /// Monthly-equivalent fixed costs × months
    pub fixed_costs: Money,
    pub opex: Money,
    pub capex: Money,
    pub debt_service: Money,
}

/// Maintenance spend (opex and capex) for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Money,
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Range queries over one property's snapshot. Every query is pure; an empty
/// range yields zero for every figure.
pub struct CashFlowAggregator<'a> {
    snapshot: &'a PropertySnapshot,
    lease_ids: HashSet<Uuid>,
}

impl<'a> CashFlowAggregator<'a> {
    pub fn new(snapshot: &'a PropertySnapshot) -> Self {
        CashFlowAggregator {
            snapshot,
            lease_ids: snapshot.rentable_lease_ids(),
        }
    }

    /// Counts rent on every unit, rentable or not. Used where cash actually
    /// received matters more than the rentable stock.
    pub fn all_units(snapshot: &'a PropertySnapshot) -> Self {
        CashFlowAggregator {
            snapshot,
            lease_ids: snapshot.all_lease_ids(),
        }
    }

    pub fn snapshot(&self) -> &PropertySnapshot {
        self.snapshot
    }

    /// Formal rent charges dated in `range` on rentable units.
    pub fn rent_charged(&self, range: &DateRange) -> Money {
        self.snapshot
            .rent_charges
            .iter()
            .filter(|c| self.lease_ids.contains(&c.lease_id) && range.contains(c.charge_date))
            .map(|c| c.amount)
            .sum()
    }

    /// Rent implied by active leases overlapping `range`: monthly rent × months.
    pub fn lease_implied_rent(&self, range: &DateRange) -> Option<Money> {
        if range.is_empty() {
            return None;
        }
        let mut leases = self
            .snapshot
            .rentable_leases()
            .filter(|l| {
                l.is_active()
                    && l.lease_start <= range.end
                    && l.lease_end.is_none_or(|end| end >= range.start)
            })
            .peekable();
        leases.peek()?;
        let monthly: Money = leases.map(|l| l.monthly_rent).sum();
        Some(monthly * Decimal::from(range.months()))
    }

    /// Scheduled rent: billed charges when any exist, else lease terms.
    pub fn rent_roll(&self, range: &DateRange) -> Money {
        let resolved = first_success(vec![
            Strategy::new("rent_charges", || {
                Some(self.rent_charged(range)).filter(|c| *c > Decimal::ZERO)
            }),
            Strategy::new("active_leases", || self.lease_implied_rent(range)),
        ]);
        match resolved {
            Some(r) => {
                debug!(
                    property_id = %self.snapshot.id(),
                    source = r.source,
                    start = %range.start,
                    end = %range.end,
                    "rent roll resolved"
                );
                r.value
            }
            None => Decimal::ZERO,
        }
    }

    pub fn rent_collected(&self, range: &DateRange) -> Money {
        self.snapshot
            .payments
            .iter()
            .filter(|p| self.lease_ids.contains(&p.lease_id) && range.contains(p.payment_date))
            .map(|p| p.amount)
            .sum()
    }

    fn maintenance_sum(&self, range: &DateRange, capex: bool) -> Money {
        self.snapshot
            .maintenance
            .iter()
            .filter(|m| m.is_capex == capex && range.contains(m.expense_date))
            .map(|m| m.amount)
            .sum()
    }

    pub fn maintenance_opex(&self, range: &DateRange) -> Money {
        self.maintenance_sum(range, false)
    }

    pub fn capex(&self, range: &DateRange) -> Money {
        self.maintenance_sum(range, true)
    }

    /// Sum of active recurring costs normalized to a monthly rate.
    pub fn fixed_monthly_equivalent(&self) -> Money {
        self.active_costs().map(monthly_equivalent).sum()
    }

    pub fn category_monthly_equivalent(&self, category: CostCategory) -> Money {
        self.active_costs()
            .filter(|c| c.category == category)
            .map(monthly_equivalent)
            .sum()
    }

    fn active_costs(&self) -> impl Iterator<Item = &PropertyCost> {
        self.snapshot.costs.iter().filter(|c| c.is_active)
    }

    pub fn fixed_costs(&self, range: &DateRange) -> Money {
        self.fixed_monthly_equivalent() * Decimal::from(range.months())
    }

    pub fn opex(&self, range: &DateRange) -> Money {
        self.maintenance_opex(range) + self.fixed_costs(range)
    }

    pub fn monthly_debt_service(&self) -> Money {
        self.snapshot
            .loans
            .iter()
            .filter_map(|l| l.monthly_payment)
            .sum()
    }

    /// Flat monthly payment × months; no amortization schedule.
    pub fn debt_service(&self, range: &DateRange) -> Money {
        self.monthly_debt_service() * Decimal::from(range.months())
    }

    /// Maintenance spend in `range` grouped by category, largest first.
    pub fn expense_by_category(&self, range: &DateRange) -> Vec<CategoryTotal> {
        let mut totals: BTreeMap<&str, Money> = BTreeMap::new();
        for m in self
            .snapshot
            .maintenance
            .iter()
            .filter(|m| range.contains(m.expense_date))
        {
            *totals.entry(m.category.as_str()).or_default() += m.amount;
        }
        let mut out: Vec<CategoryTotal> = totals
            .into_iter()
            .map(|(category, total)| CategoryTotal {
                category: category.to_string(),
                total: round_money(total),
            })
            .collect();
        out.sort_by(|a, b| b.total.cmp(&a.total));
        out
    }

    pub fn earliest_payment_date(&self) -> Option<NaiveDate> {
        self.snapshot
            .payments
            .iter()
            .filter(|p| self.lease_ids.contains(&p.lease_id))
            .map(|p| p.payment_date)
            .min()
    }

    pub fn earliest_charge_date(&self) -> Option<NaiveDate> {
        self.snapshot
            .rent_charges
            .iter()
            .filter(|c| self.lease_ids.contains(&c.lease_id))
            .map(|c| c.charge_date)
            .min()
    }

    /// Every figure for `range`, rounded to cents.
    pub fn summarize(&self, range: &DateRange) -> PeriodFlows {
        let maintenance_opex = round_money(self.maintenance_opex(range));
        let fixed_costs = round_money(self.fixed_costs(range));
        PeriodFlows {
            range: *range,
            months: range.months(),
            rent_charged: round_money(self.rent_charged(range)),
            rent_roll: round_money(self.rent_roll(range)),
            rent_collected: round_money(self.rent_collected(range)),
            maintenance_opex,
            fixed_costs,
            opex: maintenance_opex + fixed_costs,
            capex: round_money(self.capex(range)),
            debt_service: round_money(self.debt_service(range)),
        }
    }
}

/// Monthly rate of a recurring cost. One-time costs are not recurring and
/// contribute nothing.
pub fn monthly_equivalent(cost: &PropertyCost) -> Money {
    match cost.frequency {
        CostFrequency::Monthly => cost.amount,
        CostFrequency::Quarterly => cost.amount / dec!(3),
        CostFrequency::Annual => cost.amount / dec!(12),
        CostFrequency::OneTime => Decimal::ZERO,
    }
}
