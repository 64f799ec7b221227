use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{at_path, flatten, result_of, scalar};

/// Columns shown per property in a portfolio listing.
const PROPERTY_COLUMNS: [&str; 7] = [
    "property_address",
    "monthly.noi",
    "ytd.cash_flow",
    "annual.noi",
    "annual.cash_flow",
    "annual.cap_rate",
    "annual.irr",
];

/// One table per report block, scalars first.
pub fn print_table(value: &Value) {
    match result_of(value) {
        Value::Object(map) => print_blocks(map),
        other => println!("{}", scalar(other)),
    }

    if let Some(Value::Array(warnings)) = value.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = value.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_blocks(map: &Map<String, Value>) {
    let mut header = Builder::default();
    header.push_record(["Field", "Value"]);
    for (key, val) in map.iter().filter(|(_, v)| !v.is_object() && !v.is_array()) {
        header.push_record([key.clone(), scalar(val)]);
    }
    println!("{}", Table::from(header));

    for (key, val) in map {
        match val {
            Value::Object(_) => {
                println!("\n{key}");
                print_fields(val);
            }
            Value::Array(items) if !items.is_empty() => {
                println!("\n{key}");
                print_rows(items);
            }
            _ => {}
        }
    }
}

fn print_fields(value: &Value) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (field, val) in flatten(value) {
        builder.push_record([field, val]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(items: &[Value]) {
    let headers: Vec<String> = match items.first() {
        Some(first) if first.get("property_address").is_some() => {
            PROPERTY_COLUMNS.iter().map(|c| c.to_string()).collect()
        }
        Some(first) => flatten(first).into_iter().map(|(k, _)| k).collect(),
        None => return,
    };

    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for item in items {
        let row: Vec<String> = headers
            .iter()
            .map(|h| at_path(item, h).map(scalar).unwrap_or_default())
            .collect();
        builder.push_record(row);
    }
    println!("{}", Table::from(builder));
}
