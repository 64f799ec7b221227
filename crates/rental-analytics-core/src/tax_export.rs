use std::ops::AddAssign;

use csv::{Terminator, WriterBuilder};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::cash_flow::CashFlowAggregator;
use crate::error::RentalAnalyticsError;
use crate::metrics::management_fee;
use crate::period::{year_range, DateRange};
use crate::snapshot::{CostCategory, CostFrequency, DataSource, PropertyCost, PropertySnapshot};
use crate::types::{round_money, Money};
use crate::RentalAnalyticsResult;

/// Bumped whenever the column set or order changes.
pub const TAX_EXPORT_VERSION: u32 = 1;

pub const HEADER: [&str; 13] = [
    "Property Address",
    "Gross Rents Received",
    "Management Fees",
    "Insurance",
    "Property Taxes",
    "HOA Fees",
    "Repairs & Maintenance",
    "Other Fixed Costs",
    "Total Operating Expenses",
    "Net Operating Income",
    "Capital Expenditures",
    "Loan Balance (End of Year)",
    "Notes",
];

pub const TOTAL_LABEL: &str = "PORTFOLIO TOTAL";

const ROW_NOTE: &str = "See loan statements for mortgage interest breakdown";

const CPA_NOTES: [&str; 7] = [
    "IMPORTANT NOTES FOR CPA:",
    "1. Gross Rents = Actual payments received (cash basis)",
    "2. Repairs & Maintenance = Operating expenses (deductible in current year)",
    "3. Capital Expenditures = Must be depreciated over time (NOT deductible in current year)",
    "4. Mortgage Interest: See loan statements - only INTEREST is deductible, not principal",
    "5. Management Fees = Based on gross rents charged (before manager takes cut)",
    "6. This report does NOT include: Depreciation, Mortgage Interest breakdown, or Prior year carryover losses",
];

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// One Schedule E style line. Every money column is rounded to cents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxRow {
    pub property_address: String,
    pub gross_rents: Money,
    pub management_fees: Money,
    pub insurance: Money,
    pub property_taxes: Money,
    pub hoa_fees: Money,
    pub repairs: Money,
    pub other_fixed: Money,
    pub total_opex: Money,
    pub noi: Money,
    pub capex: Money,
    /// Blank on the total row.
    pub loan_balance: Option<Money>,
    pub notes: String,
}

impl TaxRow {
    fn record(&self) -> Vec<String> {
        let money = |m: Money| format!("{m:.2}");
        vec![
            self.property_address.clone(),
            money(self.gross_rents),
            money(self.management_fees),
            money(self.insurance),
            money(self.property_taxes),
            money(self.hoa_fees),
            money(self.repairs),
            money(self.other_fixed),
            money(self.total_opex),
            money(self.noi),
            money(self.capex),
            self.loan_balance.map(money).unwrap_or_default(),
            self.notes.clone(),
        ]
    }
}

/// Sums the numeric columns. Loan balance and notes are not summed.
impl AddAssign<&TaxRow> for TaxRow {
    fn add_assign(&mut self, rhs: &TaxRow) {
        self.gross_rents += rhs.gross_rents;
        self.management_fees += rhs.management_fees;
        self.insurance += rhs.insurance;
        self.property_taxes += rhs.property_taxes;
        self.hoa_fees += rhs.hoa_fees;
        self.repairs += rhs.repairs;
        self.other_fixed += rhs.other_fixed;
        self.total_opex += rhs.total_opex;
        self.noi += rhs.noi;
        self.capex += rhs.capex;
    }
}

/// What a cost adds to one tax year. A one-time cost counts in full when it
/// has no effective date or falls inside the year.
pub fn annual_amount(cost: &PropertyCost, tax_year: &DateRange) -> Money {
    match cost.frequency {
        CostFrequency::Monthly => cost.amount * dec!(12),
        CostFrequency::Quarterly => cost.amount * dec!(4),
        CostFrequency::Annual => cost.amount,
        CostFrequency::OneTime => match cost.effective_date {
            Some(d) if !tax_year.contains(d) => Decimal::ZERO,
            _ => cost.amount,
        },
    }
}

/// The tax-year line for one property.
pub fn tax_row(snapshot: &PropertySnapshot, year: i32) -> RentalAnalyticsResult<TaxRow> {
    snapshot.validate()?;
    let range = year_range(year)?;
    let agg = CashFlowAggregator::all_units(snapshot);

    let category_total = |wanted: fn(&CostCategory) -> bool| -> Money {
        round_money(
            snapshot
                .costs
                .iter()
                .filter(|c| c.is_active && wanted(&c.category))
                .map(|c| annual_amount(c, &range))
                .sum(),
        )
    };
    let insurance = category_total(|c| *c == CostCategory::Insurance);
    let property_taxes = category_total(|c| *c == CostCategory::PropertyTax);
    let hoa_fees = category_total(|c| *c == CostCategory::Hoa);
    let other_fixed = category_total(|c| *c == CostCategory::Other);

    let gross_rents = round_money(agg.rent_collected(&range));
    let management_fees = management_fee(&snapshot.property, agg.rent_charged(&range));
    let repairs = round_money(agg.maintenance_opex(&range));
    let capex = round_money(agg.capex(&range));
    let loan_balance = round_money(
        snapshot
            .loans
            .iter()
            .filter_map(|l| l.current_balance)
            .sum(),
    );

    let total_opex = management_fees + insurance + property_taxes + hoa_fees + repairs + other_fixed;

    Ok(TaxRow {
        property_address: snapshot.property.address.clone(),
        gross_rents,
        management_fees,
        insurance,
        property_taxes,
        hoa_fees,
        repairs,
        other_fixed,
        total_opex,
        noi: gross_rents - total_opex,
        capex,
        loan_balance: Some(loan_balance),
        notes: ROW_NOTE.to_string(),
    })
}

/// Property rows followed by the `PORTFOLIO TOTAL` row.
pub fn tax_rows(
    source: &dyn DataSource,
    household_id: Uuid,
    year: i32,
) -> RentalAnalyticsResult<Vec<TaxRow>> {
    let ids = source.household_property_ids(household_id)?;
    if ids.is_empty() {
        return Err(RentalAnalyticsError::not_found("Properties for household", household_id));
    }

    let mut rows = ids
        .into_iter()
        .map(|id| tax_row(&source.property_snapshot(id)?, year))
        .collect::<RentalAnalyticsResult<Vec<_>>>()?;

    let mut total = TaxRow {
        property_address: TOTAL_LABEL.to_string(),
        ..TaxRow::default()
    };
    for row in &rows {
        total += row;
    }
    rows.push(total);
    Ok(rows)
}

/// CSV export of a household's tax year for an accountant: header, one row
/// per property, the total row, a blank line, then the notes block.
pub fn tax_export(
    source: &dyn DataSource,
    household_id: Uuid,
    year: i32,
) -> RentalAnalyticsResult<Vec<u8>> {
    let rows = tax_rows(source, household_id, year)?;
    debug!(%household_id, year, rows = rows.len(), "writing tax export");

    let mut wtr = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    wtr.write_record(HEADER)?;
    for row in &rows {
        wtr.write_record(row.record())?;
    }
    let mut buf = wtr
        .into_inner()
        .map_err(|e| RentalAnalyticsError::ExportError(e.to_string()))?;

    buf.push(b'\n');

    let mut notes = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(buf);
    for line in CPA_NOTES {
        notes.write_record([line])?;
    }
    notes
        .into_inner()
        .map_err(|e| RentalAnalyticsError::ExportError(e.to_string()))
}

/// Suggested download name for the export.
pub fn export_filename(year: i32) -> String {
    format!("rental_tax_report_{year}.csv")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Property;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn cost(frequency: CostFrequency, amount: Money, effective: Option<NaiveDate>) -> PropertyCost {
        PropertyCost {
            id: Uuid::new_v4(),
            property_id: Uuid::nil(),
            category: CostCategory::Other,
            amount,
            frequency,
            is_active: true,
            effective_date: effective,
        }
    }

    #[test]
    fn test_annual_amount_by_frequency() {
        let year = year_range(2025).unwrap();
        assert_eq!(annual_amount(&cost(CostFrequency::Monthly, dec!(100), None), &year), dec!(1200));
        assert_eq!(annual_amount(&cost(CostFrequency::Quarterly, dec!(100), None), &year), dec!(400));
        assert_eq!(annual_amount(&cost(CostFrequency::Annual, dec!(100), None), &year), dec!(100));
    }

    #[test]
    fn test_one_time_cost_only_in_its_year() {
        let year = year_range(2025).unwrap();
        let undated = cost(CostFrequency::OneTime, dec!(900), None);
        let inside = cost(CostFrequency::OneTime, dec!(900), Some(d(2025, 3, 1)));
        let outside = cost(CostFrequency::OneTime, dec!(900), Some(d(2024, 3, 1)));
        assert_eq!(annual_amount(&undated, &year), dec!(900));
        assert_eq!(annual_amount(&inside, &year), dec!(900));
        assert_eq!(annual_amount(&outside, &year), Decimal::ZERO);
    }

    #[test]
    fn test_total_row_leaves_balance_blank() {
        let total = TaxRow {
            property_address: TOTAL_LABEL.into(),
            ..TaxRow::default()
        };
        let record = total.record();
        assert_eq!(record.len(), HEADER.len());
        assert_eq!(record[11], "");
        assert_eq!(record[12], "");
        assert_eq!(record[1], "0.00");
    }

    #[test]
    fn test_row_formats_two_decimals() {
        let mut snap = PropertySnapshot::new(Property {
            id: Uuid::new_v4(),
            household_id: Uuid::new_v4(),
            address: "9 Oak Ave".into(),
            purchase_date: None,
            purchase_price: None,
            closing_costs: None,
            current_value: None,
            is_property_managed: false,
            management_fee_pct: None,
        });
        let pid = snap.id();
        snap.costs.push(PropertyCost {
            property_id: pid,
            category: CostCategory::Insurance,
            ..cost(CostFrequency::Monthly, dec!(100.5), None)
        });
        let row = tax_row(&snap, 2025).unwrap();
        assert_eq!(row.insurance, dec!(1206.00));
        assert_eq!(row.noi, dec!(-1206.00));
        assert_eq!(row.record()[3], "1206.00");
        assert_eq!(row.record()[11], "0.00");
    }
}
