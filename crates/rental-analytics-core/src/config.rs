use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Engine-wide knobs shared by every report operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Date treated as "today": closes the current-year IRR flow, dates the
    /// terminal equity flow and ends the lifetime range.
    pub as_of: NaiveDate,
}

impl ReportConfig {
    pub fn as_of(as_of: NaiveDate) -> Self {
        ReportConfig { as_of }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            as_of: Local::now().date_naive(),
        }
    }
}
