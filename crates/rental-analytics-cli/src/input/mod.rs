pub mod file;
pub mod stdin;

use rental_analytics_core::{HouseholdData, MemoryStore};

/// Household records from `--input`, else from piped stdin.
pub fn load_store(path: Option<&str>) -> Result<MemoryStore, Box<dyn std::error::Error>> {
    let data: HouseholdData = if let Some(path) = path {
        file::read_json(path)?
    } else if let Some(text) = stdin::read_piped()? {
        serde_json::from_str(&text).map_err(|e| format!("Failed to parse stdin: {e}"))?
    } else {
        return Err("--input <household.json> or piped stdin required".into());
    };
    tracing::debug!(properties = data.properties.len(), "household records loaded");
    Ok(MemoryStore::new(data))
}
