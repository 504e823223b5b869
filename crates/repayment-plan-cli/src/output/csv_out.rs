use serde_json::Value;
use std::io::{self, Write};

use super::{format_cell, plan_rows};

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let _ = write_csv(stdout.lock(), value);
}

/// One header row from the first period's keys, then one row per period.
/// Anything that is not a schedule is written as `field,value` pairs.
pub fn write_csv<W: Write>(out: W, value: &Value) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);

    match (plan_rows(value), value) {
        (Some(rows), _) => {
            if let Some(Value::Object(first)) = rows.first() {
                let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
                wtr.write_record(&headers)?;
                for row in rows {
                    let record: Vec<String> = headers
                        .iter()
                        .map(|h| row.get(*h).map(format_cell).unwrap_or_default())
                        .collect();
                    wtr.write_record(&record)?;
                }
            }
        }
        (None, Value::Object(map)) => {
            wtr.write_record(["field", "value"])?;
            for (key, val) in map {
                wtr.write_record([key.as_str(), &format_cell(val)])?;
            }
        }
        (None, other) => wtr.write_record([&format_cell(other)])?,
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schedule_csv() {
        let value = json!({ "RepaymentPlan": [
            { "date": "2018-01-01T00:00:00Z", "interest": 4.17, "principal": 248.44 },
            { "date": "2018-02-01T00:00:00Z", "interest": 3.13, "principal": 249.48 }
        ]});
        let mut buf = Vec::new();
        write_csv(&mut buf, &value).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "date,interest,principal");
        assert_eq!(lines[1], "2018-01-01T00:00:00Z,4.17,248.44");
        assert_eq!(lines.len(), 3);
    }
}
