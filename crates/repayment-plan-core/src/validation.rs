//! Validation of raw repayment-plan requests.
//!
//! Every field is checked independently and all failures are collected into a
//! single [`ValidationErrors`] map keyed by field name, so a caller sees every
//! problem with a request at once instead of only the first.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::schedule::{normalize_start_date, ScheduleInput};
use crate::types::{DayCountConvention, Money, Rate};

// ---------------------------------------------------------------------------
// Field keys and reasons
// ---------------------------------------------------------------------------

pub const FIELD_LOAN_AMOUNT: &str = "LoanAmount";
pub const FIELD_NOMINAL_RATE: &str = "NominalRate";
pub const FIELD_DURATION: &str = "Duration";
pub const FIELD_START_DATE: &str = "StartDate";
/// Key of the cross-field check on amount, rate and duration.
pub const FIELD_ALL_NEGATIVE: &str = "LoanAmount, NominalRate, Duration";

pub const REASON_MISSING: &str = "Required Field Missing";
pub const REASON_BAD_LOAN_AMOUNT: &str = "Could not convert loanAmount from string to decimal";
pub const REASON_BAD_NOMINAL_RATE: &str = "Could not convert nominalRate from string to decimal";
pub const REASON_BAD_START_DATE: &str = "Could not parse startDate to RFC3339 format";
pub const REASON_BAD_DURATION: &str = "Could not convert duration to a month count";
pub const REASON_ALL_NEGATIVE: &str = "Requests are negative numbers";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Raw request as it arrives on the wire. Missing fields take their empty
/// value (`""` or `0`) and are reported by [`validate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoanRequest {
    /// Principal as a decimal string.
    pub loan_amount: String,
    /// Nominal annual rate in percentage points, as a decimal string.
    pub nominal_rate: String,
    /// Number of monthly periods.
    pub duration: i64,
    /// RFC 3339 timestamp; only its calendar date is used.
    pub start_date: String,
}

/// A request whose four fields all parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedLoan {
    pub loan_amount: Money,
    /// Percentage points (5.0 = 5%).
    pub nominal_rate_pct: Rate,
    pub duration_months: u32,
    pub start_date: DateTime<FixedOffset>,
}

impl ValidatedLoan {
    /// Build generator input under the given day-count convention.
    pub fn into_schedule_input(self, day_count: DayCountConvention) -> ScheduleInput {
        ScheduleInput {
            loan_amount: self.loan_amount,
            nominal_rate_pct: self.nominal_rate_pct,
            start_date: normalize_start_date(&self.start_date),
            duration_months: self.duration_months,
            day_count,
        }
    }
}

impl From<ValidatedLoan> for ScheduleInput {
    fn from(loan: ValidatedLoan) -> Self {
        loan.into_schedule_input(DayCountConvention::THIRTY_360)
    }
}

/// Accumulated validation failures, field name → reasons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `reason` to the reasons already recorded for `field`.
    pub fn add(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(reason.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct fields with at least one failure.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }

    /// Wrap in the `{"Validation Errors": {...}}` envelope used on the wire.
    pub fn into_report(self) -> ValidationReport {
        ValidationReport { errors: self }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, reasons) in self.iter() {
            if !first {
                write!(f, "; ")?;
            }
            first = false;
            write!(f, "{}: {}", field, reasons.join(", "))?;
        }
        Ok(())
    }
}

/// Serialized form of a validation failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    #[serde(rename = "Validation Errors")]
    pub errors: ValidationErrors,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Check presence and parseability of every field in `request`.
///
/// All failures are collected; none short-circuits the others. A compound
/// entry under [`FIELD_ALL_NEGATIVE`] is added only when amount, rate and
/// duration are *all* unusable (amount ≤ 0, rate < 0, duration ≤ 0, or not
/// parseable). Its absence says nothing about any single field: an amount of
/// `-5` with a valid rate and duration passes here and is rejected by the
/// generator instead.
pub fn validate(request: &LoanRequest) -> Result<ValidatedLoan, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let start_date = if request.start_date.is_empty() {
        errors.add(FIELD_START_DATE, REASON_MISSING);
        None
    } else {
        match DateTime::parse_from_rfc3339(&request.start_date) {
            Ok(date) => Some(date),
            Err(_) => {
                errors.add(FIELD_START_DATE, REASON_BAD_START_DATE);
                None
            }
        }
    };

    let loan_amount = parse_decimal_field(
        &request.loan_amount,
        FIELD_LOAN_AMOUNT,
        REASON_BAD_LOAN_AMOUNT,
        &mut errors,
    );

    let duration_months = if request.duration <= 0 {
        errors.add(FIELD_DURATION, REASON_MISSING);
        None
    } else {
        match u32::try_from(request.duration) {
            Ok(months) => Some(months),
            Err(_) => {
                errors.add(FIELD_DURATION, REASON_BAD_DURATION);
                None
            }
        }
    };

    let nominal_rate_pct = parse_decimal_field(
        &request.nominal_rate,
        FIELD_NOMINAL_RATE,
        REASON_BAD_NOMINAL_RATE,
        &mut errors,
    );

    let amount_unusable = loan_amount.map_or(true, |a| a <= Decimal::ZERO);
    let rate_unusable = nominal_rate_pct.map_or(true, |r| r < Decimal::ZERO);
    let duration_unusable = request.duration <= 0;
    if amount_unusable && rate_unusable && duration_unusable {
        errors.add(FIELD_ALL_NEGATIVE, REASON_ALL_NEGATIVE);
    }

    match (loan_amount, nominal_rate_pct, duration_months, start_date) {
        (Some(loan_amount), Some(nominal_rate_pct), Some(duration_months), Some(start_date))
            if errors.is_empty() =>
        {
            Ok(ValidatedLoan {
                loan_amount,
                nominal_rate_pct,
                duration_months,
                start_date,
            })
        }
        _ => Err(errors),
    }
}

/// Parse a decimal in plain (`"1000.50"`) or scientific (`"1.0005e3"`) notation.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

fn parse_decimal_field(
    raw: &str,
    field: &str,
    parse_reason: &str,
    errors: &mut ValidationErrors,
) -> Option<Decimal> {
    if raw.is_empty() {
        errors.add(field, REASON_MISSING);
        return None;
    }
    let parsed = parse_decimal(raw);
    if parsed.is_none() {
        errors.add(field, parse_reason);
    }
    parsed
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
