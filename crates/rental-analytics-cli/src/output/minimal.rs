use serde_json::Value;

use super::{at_path, result_of, scalar};

/// Headline figures in priority order; null values are skipped.
const PRIORITY_PATHS: [&str; 6] = [
    "annual.irr",
    "annual.noi",
    "portfolio_total.annual.noi",
    "portfolio_total.annual.cash_flow",
    "monthly.noi",
    "monthly.cash_flow",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let result = result_of(value);

    for path in PRIORITY_PATHS {
        if let Some(val) = at_path(result, path).filter(|v| !v.is_null()) {
            println!("{}: {}", path, scalar(val));
            return;
        }
    }

    println!("{}", scalar(result));
}
