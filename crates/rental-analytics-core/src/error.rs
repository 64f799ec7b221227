use thiserror::Error;

#[derive(Debug, Error)]
pub enum RentalAnalyticsError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Export error: {0}")]
    ExportError(String),
}

impl RentalAnalyticsError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        RentalAnalyticsError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// True for the request-level "no such property / household" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RentalAnalyticsError::NotFound { .. })
    }
}

impl From<serde_json::Error> for RentalAnalyticsError {
    fn from(e: serde_json::Error) -> Self {
        RentalAnalyticsError::SerializationError(e.to_string())
    }
}

#[cfg(feature = "tax_export")]
impl From<csv::Error> for RentalAnalyticsError {
    fn from(e: csv::Error) -> Self {
        RentalAnalyticsError::ExportError(e.to_string())
    }
}
