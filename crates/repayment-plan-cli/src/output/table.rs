use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::{format_cell, plan_rows};

/// Column order for schedule tables.
const COLUMNS: [(&str, &str); 6] = [
    ("date", "Date"),
    ("initialOutstandingPrincipal", "Opening balance"),
    ("borrowerPaymentAmount", "Payment"),
    ("interest", "Interest"),
    ("principal", "Principal"),
    ("remainingOutstandingPrincipal", "Closing balance"),
];

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match plan_rows(value) {
        Some(rows) => print_schedule_table(rows),
        None => print_flat_object(value),
    }
}

fn print_schedule_table(rows: &[Value]) {
    if rows.is_empty() {
        println!("(empty)");
        return;
    }
    println!("{}", schedule_table(rows));
}

/// Build the period table, numbering periods from 1.
pub fn schedule_table(rows: &[Value]) -> Table {
    let mut builder = Builder::default();
    let mut header = vec!["Period".to_string()];
    header.extend(COLUMNS.iter().map(|(_, title)| title.to_string()));
    builder.push_record(header);

    for (i, row) in rows.iter().enumerate() {
        let mut record = vec![(i + 1).to_string()];
        record.extend(COLUMNS.iter().map(|(key, _)| {
            row.get(*key)
                .map(|v| display_value(key, v))
                .unwrap_or_default()
        }));
        builder.push_record(record);
    }

    builder.build()
}

fn print_flat_object(value: &Value) {
    match value {
        Value::Object(map) => {
            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            for (key, val) in map {
                builder.push_record([key.clone(), format_cell(val)]);
            }
            println!("{}", builder.build());
        }
        _ => println!("{}", format_cell(value)),
    }
}

/// Dates are shown without the midnight time component.
fn display_value(key: &str, value: &Value) -> String {
    match (key, value) {
        ("date", Value::String(s)) => s.split('T').next().unwrap_or(s).to_string(),
        _ => format_cell(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schedule_table_layout() {
        let rows = vec![json!({
            "borrowerPaymentAmount": 252.61,
            "date": "2018-01-01T00:00:00Z",
            "initialOutstandingPrincipal": 1000.0,
            "interest": 4.17,
            "principal": 248.44,
            "remainingOutstandingPrincipal": 751.56
        })];
        let rendered = schedule_table(&rows).to_string();
        assert!(rendered.contains("Opening balance"));
        assert!(rendered.contains("2018-01-01"));
        assert!(!rendered.contains("T00:00:00Z"));
        assert!(rendered.contains("1000.00"));
        assert!(rendered.contains("751.56"));
    }
}
