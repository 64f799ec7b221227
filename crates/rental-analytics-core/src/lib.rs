pub mod cash_flow;
pub mod config;
pub mod error;
pub mod fallback;
pub mod irr;
pub mod metrics;
pub mod period;
pub mod report;
pub mod snapshot;
pub mod time_value;
pub mod types;

#[cfg(feature = "portfolio")]
pub mod portfolio;

#[cfg(feature = "tax_export")]
pub mod tax_export;

pub use config::ReportConfig;
pub use error::RentalAnalyticsError;
pub use report::{build_property_report, property_report, property_report_output, PropertyReport};
pub use snapshot::{DataSource, HouseholdData, MemoryStore, PropertySnapshot};
pub use types::*;

#[cfg(feature = "portfolio")]
pub use portfolio::{portfolio_report, portfolio_report_output, PortfolioReport};

#[cfg(feature = "tax_export")]
pub use tax_export::tax_export;

/// Standard result type for all rental-analytics operations
pub type RentalAnalyticsResult<T> = Result<T, RentalAnalyticsError>;
