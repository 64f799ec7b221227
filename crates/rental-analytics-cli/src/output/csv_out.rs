use serde_json::Value;
use std::io;

use super::{flatten, result_of};

/// Two-column `field,value` CSV of every leaf in the report, keyed by
/// dotted path so nested blocks stay distinguishable.
pub fn print_csv(value: &Value) {
    let mut wtr = csv::Writer::from_writer(io::stdout().lock());

    let rows = std::iter::once(("field".to_string(), "value".to_string()))
        .chain(flatten(result_of(value)));
    for (field, val) in rows {
        if let Err(e) = wtr.write_record([field.as_str(), val.as_str()]) {
            tracing::error!("CSV output failed: {e}");
            return;
        }
    }

    if let Some(Value::Array(warnings)) = value.get("warnings") {
        for w in warnings.iter().filter_map(Value::as_str) {
            let _ = wtr.write_record(["warning", w]);
        }
    }

    let _ = wtr.flush();
}
