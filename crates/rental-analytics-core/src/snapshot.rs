use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RentalAnalyticsError;
use crate::types::Money;
use crate::RentalAnalyticsResult;

/// Largest magnitude accepted for any stored amount. Sums over a lifetime of
/// records stay well inside Decimal's range below this.
pub const MAX_AMOUNT: Money = dec!(1000000000000000);

// ---------------------------------------------------------------------------
// Entities (read-only copies of store records)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: Uuid,
    pub household_id: Uuid,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub purchase_price: Option<Money>,
    #[serde(default)]
    pub closing_costs: Option<Money>,
    #[serde(default)]
    pub current_value: Option<Money>,
    #[serde(default)]
    pub is_property_managed: bool,
    /// Percent of billed rent (8 = 8%)
    #[serde(default)]
    pub management_fee_pct: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: Uuid,
    pub property_id: Uuid,
    #[serde(default = "default_true")]
    pub is_rentable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaseStatus {
    Active,
    Ended,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lease {
    pub id: Uuid,
    pub unit_id: Uuid,
    #[serde(default)]
    pub tenant_id: Option<Uuid>,
    pub lease_start: NaiveDate,
    #[serde(default)]
    pub lease_end: Option<NaiveDate>,
    pub monthly_rent: Money,
    pub status: LeaseStatus,
    #[serde(default)]
    pub move_out_date: Option<NaiveDate>,
}

impl Lease {
    pub fn is_active(&self) -> bool {
        self.status == LeaseStatus::Active
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentCharge {
    pub id: Uuid,
    pub lease_id: Uuid,
    pub charge_date: NaiveDate,
    pub amount: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub lease_id: Uuid,
    pub payment_date: NaiveDate,
    pub amount: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub id: Uuid,
    pub property_id: Uuid,
    #[serde(default)]
    pub monthly_payment: Option<Money>,
    #[serde(default)]
    pub original_amount: Option<Money>,
    #[serde(default)]
    pub current_balance: Option<Money>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostCategory {
    PropertyTax,
    Insurance,
    Hoa,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostFrequency {
    Monthly,
    Quarterly,
    Annual,
    OneTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyCost {
    pub id: Uuid,
    pub property_id: Uuid,
    pub category: CostCategory,
    pub amount: Money,
    pub frequency: CostFrequency,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// When the cost took effect; scopes one-time costs to a tax year.
    #[serde(default)]
    pub effective_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceExpense {
    pub id: Uuid,
    pub property_id: Uuid,
    pub expense_date: NaiveDate,
    pub amount: Money,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub is_capex: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapitalEventType {
    Acquisition,
    AdditionalInvestment,
    RefiProceeds,
    Sale,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapitalEvent {
    pub id: Uuid,
    pub property_id: Uuid,
    pub event_date: NaiveDate,
    pub event_type: CapitalEventType,
    /// Signed: negative = cash out, positive = cash in
    pub amount: Money,
}

fn default_true() -> bool {
    true
}

fn default_category() -> String {
    "other".to_string()
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Everything the engine reads for one property, fetched once up front.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySnapshot {
    pub property: Property,
    #[serde(default)]
    pub units: Vec<Unit>,
    #[serde(default)]
    pub leases: Vec<Lease>,
    #[serde(default)]
    pub tenants: Vec<Tenant>,
    #[serde(default)]
    pub rent_charges: Vec<RentCharge>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub loans: Vec<Loan>,
    #[serde(default)]
    pub costs: Vec<PropertyCost>,
    #[serde(default)]
    pub maintenance: Vec<MaintenanceExpense>,
    #[serde(default)]
    pub capital_events: Vec<CapitalEvent>,
}

impl PropertySnapshot {
    pub fn new(property: Property) -> Self {
        PropertySnapshot {
            property,
            units: Vec::new(),
            leases: Vec::new(),
            tenants: Vec::new(),
            rent_charges: Vec::new(),
            payments: Vec::new(),
            loans: Vec::new(),
            costs: Vec::new(),
            maintenance: Vec::new(),
            capital_events: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.property.id
    }

    pub fn rentable_units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|u| u.is_rentable)
    }

    /// Leases on the property's rentable units.
    pub fn rentable_leases(&self) -> impl Iterator<Item = &Lease> {
        let unit_ids: HashSet<Uuid> = self.rentable_units().map(|u| u.id).collect();
        self.leases
            .iter()
            .filter(move |l| unit_ids.contains(&l.unit_id))
    }

    pub fn rentable_lease_ids(&self) -> HashSet<Uuid> {
        self.rentable_leases().map(|l| l.id).collect()
    }

    /// Leases on any of the property's units, rentable or not.
    pub fn all_lease_ids(&self) -> HashSet<Uuid> {
        let unit_ids: HashSet<Uuid> = self.units.iter().map(|u| u.id).collect();
        self.leases
            .iter()
            .filter(|l| unit_ids.contains(&l.unit_id))
            .map(|l| l.id)
            .collect()
    }

    /// Reject snapshots that break the data-model invariants: children of
    /// another property, or negative amounts anywhere except capital events.
    pub fn validate(&self) -> RentalAnalyticsResult<()> {
        let pid = self.property.id;

        let foreign = self
            .units
            .iter()
            .map(|u| ("units", u.property_id))
            .chain(self.loans.iter().map(|l| ("loans", l.property_id)))
            .chain(self.costs.iter().map(|c| ("costs", c.property_id)))
            .chain(self.maintenance.iter().map(|m| ("maintenance", m.property_id)))
            .chain(self.capital_events.iter().map(|e| ("capital_events", e.property_id)))
            .find(|(_, owner)| *owner != pid);
        if let Some((field, owner)) = foreign {
            return Err(RentalAnalyticsError::InvalidInput {
                field: field.into(),
                reason: format!("record belongs to property {owner}, expected {pid}"),
            });
        }

        let prop = &self.property;
        let mut amounts: Vec<(&str, Option<Money>)> = vec![
            ("purchase_price", prop.purchase_price),
            ("closing_costs", prop.closing_costs),
            ("current_value", prop.current_value),
            ("management_fee_pct", prop.management_fee_pct),
        ];
        amounts.extend(self.leases.iter().map(|l| ("lease.monthly_rent", Some(l.monthly_rent))));
        amounts.extend(self.rent_charges.iter().map(|c| ("rent_charge.amount", Some(c.amount))));
        amounts.extend(self.payments.iter().map(|p| ("payment.amount", Some(p.amount))));
        amounts.extend(self.costs.iter().map(|c| ("property_cost.amount", Some(c.amount))));
        amounts.extend(self.maintenance.iter().map(|m| ("maintenance.amount", Some(m.amount))));
        for loan in &self.loans {
            amounts.push(("loan.monthly_payment", loan.monthly_payment));
            amounts.push(("loan.original_amount", loan.original_amount));
            amounts.push(("loan.current_balance", loan.current_balance));
        }

        if let Some((field, value)) = amounts
            .iter()
            .find_map(|(f, v)| v.filter(|v| v.is_sign_negative() && !v.is_zero()).map(|v| (*f, v)))
        {
            return Err(RentalAnalyticsError::InvalidInput {
                field: field.into(),
                reason: format!("must be non-negative, got {value}"),
            });
        }

        amounts.extend(self.capital_events.iter().map(|e| ("capital_event.amount", Some(e.amount))));
        if let Some((field, value)) = amounts
            .into_iter()
            .find_map(|(f, v)| v.filter(|v| v.abs() > MAX_AMOUNT).map(|v| (f, v)))
        {
            return Err(RentalAnalyticsError::InvalidInput {
                field: field.into(),
                reason: format!("magnitude exceeds {MAX_AMOUNT}, got {value}"),
            });
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Data source
// ---------------------------------------------------------------------------

/// Read-only query service backed by the external store.
pub trait DataSource {
    /// Full snapshot for one property, or `NotFound`.
    fn property_snapshot(&self, property_id: Uuid) -> RentalAnalyticsResult<PropertySnapshot>;

    /// Ids of every property in the household, or `NotFound` for an unknown
    /// household.
    fn household_property_ids(&self, household_id: Uuid) -> RentalAnalyticsResult<Vec<Uuid>>;
}

/// Serialized form of a household's records, as exported by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HouseholdData {
    /// Households known to exist even when they own no properties.
    #[serde(default)]
    pub households: Vec<Uuid>,
    #[serde(default)]
    pub properties: Vec<PropertySnapshot>,
}

/// A `DataSource` over snapshots already held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: HouseholdData,
}

impl MemoryStore {
    pub fn new(data: HouseholdData) -> Self {
        MemoryStore { data }
    }

    pub fn from_json(json: &str) -> RentalAnalyticsResult<Self> {
        Ok(MemoryStore::new(serde_json::from_str(json)?))
    }

    pub fn insert(&mut self, snapshot: PropertySnapshot) {
        self.data.properties.retain(|s| s.id() != snapshot.id());
        self.data.properties.push(snapshot);
    }

    /// The only household in the store, if there is exactly one.
    pub fn sole_household(&self) -> Option<Uuid> {
        let ids: HashSet<Uuid> = self
            .data
            .households
            .iter()
            .copied()
            .chain(self.data.properties.iter().map(|s| s.property.household_id))
            .collect();
        if ids.len() == 1 {
            ids.into_iter().next()
        } else {
            None
        }
    }
}

impl DataSource for MemoryStore {
    fn property_snapshot(&self, property_id: Uuid) -> RentalAnalyticsResult<PropertySnapshot> {
        self.data
            .properties
            .iter()
            .find(|s| s.id() == property_id)
            .cloned()
            .ok_or_else(|| RentalAnalyticsError::not_found("Property", property_id))
    }

    fn household_property_ids(&self, household_id: Uuid) -> RentalAnalyticsResult<Vec<Uuid>> {
        let ids: Vec<Uuid> = self
            .data
            .properties
            .iter()
            .filter(|s| s.property.household_id == household_id)
            .map(|s| s.id())
            .collect();
        if ids.is_empty() && !self.data.households.contains(&household_id) {
            return Err(RentalAnalyticsError::not_found("Household", household_id));
        }
        Ok(ids)
    }
}
