#![allow(dead_code)]

use chrono::NaiveDate;
use rental_analytics_core::snapshot::{
    CostCategory, CostFrequency, Lease, LeaseStatus, Loan, MaintenanceExpense, Payment, Property,
    PropertyCost, PropertySnapshot, RentCharge, Unit,
};
use rental_analytics_core::{HouseholdData, MemoryStore, ReportConfig};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

pub fn config() -> ReportConfig {
    ReportConfig::as_of(d(2025, 6, 30))
}

pub fn household() -> Uuid {
    Uuid::parse_str("0b6c1c55-2f14-4a31-8b1c-3d38b9c2f2a1").unwrap()
}

fn property(address: &str, purchase: NaiveDate) -> Property {
    Property {
        id: Uuid::new_v4(),
        household_id: household(),
        address: address.into(),
        purchase_date: Some(purchase),
        purchase_price: None,
        closing_costs: None,
        current_value: None,
        is_property_managed: false,
        management_fee_pct: None,
    }
}

fn let_unit(snap: &mut PropertySnapshot, start: NaiveDate, rent: Decimal) -> Uuid {
    let unit = Unit {
        id: Uuid::new_v4(),
        property_id: snap.id(),
        is_rentable: true,
    };
    let lease = Lease {
        id: Uuid::new_v4(),
        unit_id: unit.id,
        tenant_id: None,
        lease_start: start,
        lease_end: None,
        monthly_rent: rent,
        status: LeaseStatus::Active,
        move_out_date: None,
    };
    let lease_id = lease.id;
    snap.units.push(unit);
    snap.leases.push(lease);
    lease_id
}

fn cost(snap: &PropertySnapshot, category: CostCategory, frequency: CostFrequency, amount: Decimal) -> PropertyCost {
    PropertyCost {
        id: Uuid::new_v4(),
        property_id: snap.id(),
        category,
        amount,
        frequency,
        is_active: true,
        effective_date: None,
    }
}

/// Levered duplex bought 2024-01-01; rent 2,500 paid every month through
/// June 2025 and billed for each 2025 month through June.
pub fn elm_street() -> PropertySnapshot {
    let mut snap = PropertySnapshot::new(Property {
        purchase_price: Some(dec!(300000)),
        closing_costs: Some(dec!(6000)),
        current_value: Some(dec!(350000)),
        is_property_managed: true,
        management_fee_pct: Some(dec!(8)),
        ..property("12 Elm St", d(2024, 1, 1))
    });
    let lease_id = let_unit(&mut snap, d(2024, 1, 1), dec!(2500));

    for (y, last_month) in [(2024, 12), (2025, 6)] {
        for m in 1..=last_month {
            snap.payments.push(Payment {
                id: Uuid::new_v4(),
                lease_id,
                payment_date: d(y, m, 3),
                amount: dec!(2500),
            });
        }
    }
    for m in 1..=6 {
        snap.rent_charges.push(RentCharge {
            id: Uuid::new_v4(),
            lease_id,
            charge_date: d(2025, m, 1),
            amount: dec!(2500),
        });
    }

    snap.loans.push(Loan {
        id: Uuid::new_v4(),
        property_id: snap.id(),
        monthly_payment: Some(dec!(1500)),
        original_amount: Some(dec!(240000)),
        current_balance: Some(dec!(230000)),
    });

    let costs = vec![
        cost(&snap, CostCategory::PropertyTax, CostFrequency::Annual, dec!(3600)),
        cost(&snap, CostCategory::Insurance, CostFrequency::Monthly, dec!(100)),
        cost(&snap, CostCategory::Hoa, CostFrequency::Quarterly, dec!(150)),
    ];
    snap.costs.extend(costs);

    let pid = snap.id();
    snap.maintenance.push(MaintenanceExpense {
        id: Uuid::new_v4(),
        property_id: pid,
        expense_date: d(2025, 3, 10),
        amount: dec!(400),
        category: "plumbing".into(),
        is_capex: false,
    });
    snap.maintenance.push(MaintenanceExpense {
        id: Uuid::new_v4(),
        property_id: pid,
        expense_date: d(2025, 4, 2),
        amount: dec!(5000),
        category: "roof".into(),
        is_capex: true,
    });
    snap
}

/// Bought mid-June 2025 with a lease starting the same day and nothing paid.
pub fn oak_avenue() -> PropertySnapshot {
    let mut snap = PropertySnapshot::new(Property {
        purchase_price: Some(dec!(180000)),
        current_value: Some(dec!(180000)),
        ..property("9 Oak Ave", d(2025, 6, 15))
    });
    let_unit(&mut snap, d(2025, 6, 15), dec!(1800));
    snap
}

/// A record set the engine must refuse: a negative payment.
pub fn corrupt() -> PropertySnapshot {
    let mut snap = PropertySnapshot::new(property("0 Broken Rd", d(2020, 1, 1)));
    let lease_id = let_unit(&mut snap, d(2020, 1, 1), dec!(1000));
    snap.payments.push(Payment {
        id: Uuid::new_v4(),
        lease_id,
        payment_date: d(2025, 1, 5),
        amount: dec!(-1000),
    });
    snap
}

/// A loan payment so large that a year of it would not fit in a Decimal.
pub fn oversized() -> PropertySnapshot {
    let mut snap = PropertySnapshot::new(property("1 Overflow Ct", d(2024, 1, 1)));
    let_unit(&mut snap, d(2024, 1, 1), dec!(1000));
    snap.loans.push(Loan {
        id: Uuid::new_v4(),
        property_id: snap.id(),
        monthly_payment: Some(dec!(10000000000000000000000000000)),
        original_amount: None,
        current_balance: None,
    });
    snap
}

pub fn store(properties: Vec<PropertySnapshot>) -> MemoryStore {
    MemoryStore::new(HouseholdData {
        households: vec![household()],
        properties,
    })
}
