use serde_json::Value;

use super::{format_cell, plan_rows};

/// Print just the level installment of a schedule.
///
/// Falls back to the first field of a non-schedule object.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_value(value));
}

pub fn minimal_value(value: &Value) -> String {
    if let Some(payment) = plan_rows(value)
        .and_then(|rows| rows.first())
        .and_then(|first| first.get("borrowerPaymentAmount"))
    {
        return format_cell(payment);
    }

    match value {
        Value::Object(map) => map
            .iter()
            .next()
            .map(|(key, val)| format!("{}: {}", key, format_cell(val)))
            .unwrap_or_default(),
        _ => format_cell(value),
    }
}
