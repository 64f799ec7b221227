use chrono::NaiveDate;
use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;
use uuid::Uuid;

use rental_analytics_core::{HouseholdData, MemoryStore, ReportConfig};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn config(as_of: Option<NaiveDate>) -> ReportConfig {
    as_of.map(ReportConfig::as_of).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct PropertyReportRequest {
    household: HouseholdData,
    property_id: Uuid,
    year: i32,
    month: u32,
    #[serde(default)]
    include_lifetime: bool,
    #[serde(default)]
    as_of: Option<NaiveDate>,
}

#[derive(Deserialize)]
struct PortfolioReportRequest {
    household: HouseholdData,
    household_id: Uuid,
    year: i32,
    month: u32,
    #[serde(default)]
    as_of: Option<NaiveDate>,
}

#[derive(Deserialize)]
struct TaxExportRequest {
    household: HouseholdData,
    household_id: Uuid,
    year: i32,
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Enveloped property report as JSON.
#[napi]
pub fn property_report(input_json: String) -> NapiResult<String> {
    let req: PropertyReportRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let store = MemoryStore::new(req.household);
    let output = rental_analytics_core::property_report_output(
        &store,
        req.property_id,
        req.year,
        req.month,
        req.include_lifetime,
        &config(req.as_of),
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Enveloped portfolio report as JSON; skipped properties appear under
/// `warnings`.
#[napi]
pub fn portfolio_report(input_json: String) -> NapiResult<String> {
    let req: PortfolioReportRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let store = MemoryStore::new(req.household);
    let output = rental_analytics_core::portfolio_report_output(
        &store,
        req.household_id,
        req.year,
        req.month,
        &config(req.as_of),
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Tax export
// ---------------------------------------------------------------------------

/// CSV text of the year-end export.
#[napi]
pub fn tax_export(input_json: String) -> NapiResult<String> {
    let req: TaxExportRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let store = MemoryStore::new(req.household);
    let bytes = rental_analytics_core::tax_export(&store, req.household_id, req.year)
        .map_err(to_napi_error)?;
    String::from_utf8(bytes).map_err(to_napi_error)
}
