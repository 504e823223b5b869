//! Monthly annuity repayment schedules.
//!
//! The level installment comes from the standard annuity formula on the
//! monthly rate, while each period's interest accrues on the annual rate under
//! the input's [`DayCountConvention`] (30/360 by default). Every monetary
//! figure is rounded to cents as soon as it is computed and later periods read
//! the rounded values, so rounding carries from one period to the next. The
//! last period pays off whatever balance is left.

use chrono::{DateTime, Months, NaiveDate, TimeZone};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::RepaymentPlanError;
use crate::types::{DayCountConvention, Money, Rate};
use crate::validation::{FIELD_DURATION, FIELD_LOAN_AMOUNT};
use crate::RepaymentPlanResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Longest schedule generated, in months (100 years).
pub const MAX_DURATION_MONTHS: u32 = 1200;
/// Money is carried to whole cents.
const MONEY_DP: u32 = 2;
const PERCENT: Decimal = dec!(100);
/// Error key for an unusable [`DayCountConvention`].
pub const FIELD_DAY_COUNT: &str = "DayCount";

// ---------------------------------------------------------------------------
// Input / Output Types
// ---------------------------------------------------------------------------

/// Input for generating a repayment schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleInput {
    /// Principal borrowed.
    pub loan_amount: Money,
    /// Nominal annual rate in percentage points (5.0 = 5%).
    pub nominal_rate_pct: Rate,
    /// Date of the first period.
    pub start_date: NaiveDate,
    /// Number of monthly periods.
    pub duration_months: u32,
    #[serde(default)]
    pub day_count: DayCountConvention,
}

/// One month of the repayment schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepaymentEntry {
    /// Level annuity, or the closing payment in the final period.
    #[serde(with = "rust_decimal::serde::float")]
    pub borrower_payment_amount: Money,
    #[serde(rename = "date", with = "midnight_utc")]
    pub period_date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub initial_outstanding_principal: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub interest: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub principal: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub remaining_outstanding_principal: Money,
}

/// Chronological list of periods, one per month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepaymentSchedule {
    #[serde(rename = "RepaymentPlan")]
    pub entries: Vec<RepaymentEntry>,
}

impl RepaymentSchedule {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The installment paid in the first period.
    pub fn level_payment(&self) -> Option<Money> {
        self.entries.first().map(|e| e.borrower_payment_amount)
    }

    pub fn total_interest(&self) -> Money {
        self.entries.iter().map(|e| e.interest).sum()
    }

    pub fn total_paid(&self) -> Money {
        self.entries.iter().map(|e| e.borrower_payment_amount).sum()
    }
}

/// Everything a single period needs besides the previous period.
#[derive(Debug, Clone, Copy)]
pub struct PeriodContext {
    pub loan_amount: Money,
    /// Annual rate as a fraction (0.05 = 5%).
    pub annual_rate: Rate,
    /// Rounded level installment.
    pub annuity: Money,
    pub start_date: NaiveDate,
    pub duration_months: u32,
    pub day_count: DayCountConvention,
}

impl PeriodContext {
    /// Derive the rates and level installment for `input`.
    pub fn new(input: &ScheduleInput) -> RepaymentPlanResult<Self> {
        let annual_rate = input.nominal_rate_pct / PERCENT;
        let periodic_rate = checked(
            input.day_count.periodic_rate(annual_rate),
            "periodic rate",
        )?;
        let annuity = round_money(annuity_payment(
            input.loan_amount,
            periodic_rate,
            input.duration_months,
        )?);

        Ok(PeriodContext {
            loan_amount: input.loan_amount,
            annual_rate,
            annuity,
            start_date: input.start_date,
            duration_months: input.duration_months,
            day_count: input.day_count,
        })
    }

    /// Date of the period after `previous`, or the start date for the first.
    pub fn period_date(
        &self,
        previous: Option<&RepaymentEntry>,
    ) -> RepaymentPlanResult<NaiveDate> {
        match previous {
            Some(prev) => next_month(prev.period_date),
            None => Ok(self.start_date),
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the full month-by-month repayment schedule for a loan.
pub fn generate_schedule(input: &ScheduleInput) -> RepaymentPlanResult<RepaymentSchedule> {
    validate_schedule_input(input)?;

    let ctx = PeriodContext::new(input)?;

    let entries = (1..=ctx.duration_months).try_fold(
        Vec::with_capacity(ctx.duration_months as usize),
        |mut entries: Vec<RepaymentEntry>, period| {
            let entry = period_entry(&ctx, entries.last(), period)?;
            entries.push(entry);
            Ok::<_, RepaymentPlanError>(entries)
        },
    )?;

    Ok(RepaymentSchedule { entries })
}

/// Compute period `period` (1-based) from the period before it.
///
/// `previous` is `None` only for the first period, which opens on the full
/// loan amount and pays the level annuity. Later periods open on the previous
/// closing balance and repeat its payment. When accrued interest exceeds the
/// opening balance the principal portion is taken against the balance instead
/// of the interest. The final period pays opening balance plus interest.
pub fn period_entry(
    ctx: &PeriodContext,
    previous: Option<&RepaymentEntry>,
    period: u32,
) -> RepaymentPlanResult<RepaymentEntry> {
    let period_date = ctx.period_date(previous)?;

    let initial = match previous {
        Some(prev) => prev.remaining_outstanding_principal,
        None => round_money(ctx.loan_amount),
    };

    let interest = round_money(checked(
        ctx.day_count.accrued_interest(ctx.annual_rate, initial),
        "interest accrual",
    )?);

    let payment = if period == ctx.duration_months {
        round_money(checked(initial.checked_add(interest), "closing payment")?)
    } else {
        match previous {
            Some(prev) => prev.borrower_payment_amount,
            None => ctx.annuity,
        }
    };

    let principal = if previous.is_some() && interest > initial {
        checked(payment.checked_sub(initial), "principal portion")?
    } else {
        checked(payment.checked_sub(interest), "principal portion")?
    };
    let principal = round_money(principal);

    let remaining = round_money(checked(
        initial.checked_sub(principal),
        "remaining principal",
    )?);

    Ok(RepaymentEntry {
        borrower_payment_amount: payment,
        period_date,
        initial_outstanding_principal: initial,
        interest,
        principal,
        remaining_outstanding_principal: remaining,
    })
}

/// Level installment that amortizes `principal` over `periods` at
/// `periodic_rate`: `P * r / (1 - (1 + r)^-n)`. Unrounded.
///
/// A zero rate has no annuity factor; the principal is then split evenly.
pub fn annuity_payment(
    principal: Money,
    periodic_rate: Rate,
    periods: u32,
) -> RepaymentPlanResult<Money> {
    if periods == 0 {
        return Err(RepaymentPlanError::InvalidInput {
            field: FIELD_DURATION.into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if periodic_rate.is_zero() {
        return Ok(principal / Decimal::from(periods));
    }

    let growth = checked(
        (Decimal::ONE + periodic_rate).checked_powu(u64::from(periods)),
        "annuity growth factor",
    )?;
    let discount = Decimal::ONE - checked(Decimal::ONE.checked_div(growth), "annuity discount factor")?;
    let numerator = checked(principal.checked_mul(periodic_rate), "annuity payment")?;

    checked(numerator.checked_div(discount), "annuity payment")
}

/// Pin a timestamp to its calendar date, dropping the time of day.
///
/// The date is read in the timestamp's own offset, so `2018-03-01T23:30:00-05:00`
/// becomes 2018-03-01.
pub fn normalize_start_date<Tz: TimeZone>(start: &DateTime<Tz>) -> NaiveDate {
    start.date_naive()
}

/// One calendar month after `date`, clamped to the end of a shorter month.
///
/// Once a period lands on a clamped day the following periods keep that day,
/// so 2018-01-31 is followed by 2018-02-28 and then 2018-03-28.
pub fn next_month(date: NaiveDate) -> RepaymentPlanResult<NaiveDate> {
    date.checked_add_months(Months::new(1)).ok_or_else(|| {
        RepaymentPlanError::DateError(format!(
            "no calendar date one month after {date}"
        ))
    })
}

/// Round to cents, half away from zero.
pub fn round_money(value: Decimal) -> Money {
    value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn checked(value: Option<Decimal>, context: &str) -> RepaymentPlanResult<Decimal> {
    value.ok_or_else(|| RepaymentPlanError::ArithmeticOverflow {
        context: context.to_string(),
    })
}

fn validate_schedule_input(input: &ScheduleInput) -> RepaymentPlanResult<()> {
    if input.loan_amount <= Decimal::ZERO {
        return Err(RepaymentPlanError::InvalidInput {
            field: FIELD_LOAN_AMOUNT.into(),
            reason: "Loan amount must be positive".into(),
        });
    }
    if input.duration_months == 0 {
        return Err(RepaymentPlanError::InvalidInput {
            field: FIELD_DURATION.into(),
            reason: "Duration must be at least 1 month".into(),
        });
    }
    if input.day_count.months_in_year == 0 || input.day_count.days_in_year == 0 {
        return Err(RepaymentPlanError::InvalidInput {
            field: FIELD_DAY_COUNT.into(),
            reason: "Day count months and days per year must be positive".into(),
        });
    }
    if input.duration_months > MAX_DURATION_MONTHS {
        return Err(RepaymentPlanError::InvalidInput {
            field: FIELD_DURATION.into(),
            reason: format!("Duration cannot exceed {MAX_DURATION_MONTHS} months"),
        });
    }
    Ok(())
}

/// Serde adapter writing a date as an RFC 3339 timestamp at midnight UTC.
mod midnight_utc {
    use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let stamp = date
            .and_time(NaiveTime::MIN)
            .and_utc()
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        serializer.serialize_str(&stamp)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|stamp| stamp.date_naive())
            .map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn reference_input() -> ScheduleInput {
        ScheduleInput {
            loan_amount: dec!(1000),
            nominal_rate_pct: dec!(5.0),
            start_date: ymd(2018, 1, 1),
            duration_months: 4,
            day_count: DayCountConvention::THIRTY_360,
        }
    }

    fn entry(
        payment: Decimal,
        date: NaiveDate,
        initial: Decimal,
        interest: Decimal,
        principal: Decimal,
        remaining: Decimal,
    ) -> RepaymentEntry {
        RepaymentEntry {
            borrower_payment_amount: payment,
            period_date: date,
            initial_outstanding_principal: initial,
            interest,
            principal,
            remaining_outstanding_principal: remaining,
        }
    }

    #[test]
    fn test_reference_schedule() {
        let schedule = generate_schedule(&reference_input()).unwrap();
        let expected = vec![
            entry(dec!(252.61), ymd(2018, 1, 1), dec!(1000), dec!(4.17), dec!(248.44), dec!(751.56)),
            entry(dec!(252.61), ymd(2018, 2, 1), dec!(751.56), dec!(3.13), dec!(249.48), dec!(502.08)),
            entry(dec!(252.61), ymd(2018, 3, 1), dec!(502.08), dec!(2.09), dec!(250.52), dec!(251.56)),
            entry(dec!(252.61), ymd(2018, 4, 1), dec!(251.56), dec!(1.05), dec!(251.56), dec!(0)),
        ];
        assert_eq!(schedule.entries, expected);
    }

    #[test]
    fn test_annuity_payment_reference() {
        let monthly = dec!(0.05) / dec!(12);
        let annuity = annuity_payment(dec!(1000), monthly, 4).unwrap();
        assert_eq!(round_money(annuity), dec!(252.61));
    }

    #[test]
    fn test_zero_rate_splits_principal_evenly() {
        let input = ScheduleInput {
            nominal_rate_pct: dec!(0),
            duration_months: 3,
            ..reference_input()
        };
        let schedule = generate_schedule(&input).unwrap();
        let payments: Vec<Decimal> = schedule
            .entries
            .iter()
            .map(|e| e.borrower_payment_amount)
            .collect();
        assert_eq!(payments, vec![dec!(333.33), dec!(333.33), dec!(333.34)]);
        assert!(schedule.entries.iter().all(|e| e.interest.is_zero()));
        assert_eq!(schedule.entries[2].remaining_outstanding_principal, dec!(0));
    }

    #[test]
    fn test_single_period_is_closing_payment() {
        let input = ScheduleInput {
            duration_months: 1,
            ..reference_input()
        };
        let schedule = generate_schedule(&input).unwrap();
        assert_eq!(schedule.len(), 1);
        let only = &schedule.entries[0];
        assert_eq!(only.interest, dec!(4.17));
        assert_eq!(only.borrower_payment_amount, dec!(1004.17));
        assert_eq!(only.principal, dec!(1000));
        assert_eq!(only.remaining_outstanding_principal, dec!(0));
    }

    #[test]
    fn test_interest_above_balance_takes_principal_against_balance() {
        // 2400% a year accrues twice the balance every month.
        let input = ScheduleInput {
            loan_amount: dec!(100),
            nominal_rate_pct: dec!(2400),
            duration_months: 3,
            ..reference_input()
        };
        let ctx = PeriodContext::new(&input).unwrap();
        assert_eq!(ctx.annuity, dec!(207.69));

        let first = period_entry(&ctx, None, 1).unwrap();
        assert_eq!(first.interest, dec!(200));
        assert_eq!(first.principal, dec!(7.69));
        assert_eq!(first.remaining_outstanding_principal, dec!(92.31));

        let second = period_entry(&ctx, Some(&first), 2).unwrap();
        assert_eq!(second.interest, dec!(184.62));
        assert_eq!(second.borrower_payment_amount, dec!(207.69));
        assert_eq!(second.principal, dec!(115.38));
        assert_eq!(second.remaining_outstanding_principal, dec!(-23.07));
    }

    #[test]
    fn test_period_entry_chains_previous_balance() {
        let ctx = PeriodContext::new(&reference_input()).unwrap();
        let first = period_entry(&ctx, None, 1).unwrap();
        let second = period_entry(&ctx, Some(&first), 2).unwrap();
        assert_eq!(
            second.initial_outstanding_principal,
            first.remaining_outstanding_principal
        );
        assert_eq!(second.borrower_payment_amount, first.borrower_payment_amount);
    }

    #[test]
    fn test_month_end_start_advances_from_previous_period() {
        let input = ScheduleInput {
            start_date: ymd(2018, 1, 31),
            ..reference_input()
        };
        let schedule = generate_schedule(&input).unwrap();
        let dates: Vec<NaiveDate> = schedule.entries.iter().map(|e| e.period_date).collect();
        assert_eq!(
            dates,
            vec![ymd(2018, 1, 31), ymd(2018, 2, 28), ymd(2018, 3, 28), ymd(2018, 4, 28)]
        );
        for pair in schedule.entries.windows(2) {
            assert_eq!(next_month(pair[0].period_date).unwrap(), pair[1].period_date);
        }
    }

    #[test]
    fn test_leap_year_month_end() {
        let input = ScheduleInput {
            start_date: ymd(2020, 1, 31),
            ..reference_input()
        };
        let schedule = generate_schedule(&input).unwrap();
        assert_eq!(schedule.entries[1].period_date, ymd(2020, 2, 29));
        assert_eq!(schedule.entries[2].period_date, ymd(2020, 3, 29));
    }

    #[test]
    fn test_next_month_past_calendar_range_is_error() {
        assert!(matches!(
            next_month(NaiveDate::MAX),
            Err(RepaymentPlanError::DateError(_))
        ));
    }

    #[test]
    fn test_zero_months_in_year_is_rejected() {
        let input = ScheduleInput {
            day_count: DayCountConvention {
                months_in_year: 0,
                ..DayCountConvention::THIRTY_360
            },
            ..reference_input()
        };
        match generate_schedule(&input).unwrap_err() {
            RepaymentPlanError::InvalidInput { field, .. } => assert_eq!(field, FIELD_DAY_COUNT),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_days_in_year_is_rejected() {
        let input = ScheduleInput {
            day_count: DayCountConvention {
                days_in_year: 0,
                ..DayCountConvention::THIRTY_360
            },
            ..reference_input()
        };
        assert!(matches!(
            generate_schedule(&input),
            Err(RepaymentPlanError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_year_rollover() {
        let input = ScheduleInput {
            start_date: ymd(2018, 11, 15),
            ..reference_input()
        };
        let schedule = generate_schedule(&input).unwrap();
        assert_eq!(schedule.entries[1].period_date, ymd(2018, 12, 15));
        assert_eq!(schedule.entries[2].period_date, ymd(2019, 1, 15));
    }

    #[test]
    fn test_zero_amount_error() {
        let input = ScheduleInput {
            loan_amount: dec!(0),
            ..reference_input()
        };
        match generate_schedule(&input).unwrap_err() {
            RepaymentPlanError::InvalidInput { field, .. } => assert_eq!(field, FIELD_LOAN_AMOUNT),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_duration_error() {
        let input = ScheduleInput {
            duration_months: 0,
            ..reference_input()
        };
        assert!(generate_schedule(&input).is_err());
    }

    #[test]
    fn test_duration_cap() {
        let input = ScheduleInput {
            duration_months: MAX_DURATION_MONTHS + 1,
            ..reference_input()
        };
        assert!(generate_schedule(&input).is_err());

        let input = ScheduleInput {
            duration_months: MAX_DURATION_MONTHS,
            ..reference_input()
        };
        assert_eq!(generate_schedule(&input).unwrap().len(), 1200);
    }

    #[test]
    fn test_overflow_is_an_error_not_a_panic() {
        let input = ScheduleInput {
            loan_amount: Decimal::MAX,
            nominal_rate_pct: dec!(1200),
            duration_months: 1,
            ..reference_input()
        };
        match generate_schedule(&input).unwrap_err() {
            RepaymentPlanError::ArithmeticOverflow { .. } => {}
            other => panic!("Expected ArithmeticOverflow, got {other:?}"),
        }
    }

    #[test]
    fn test_round_money_half_away_from_zero() {
        assert_eq!(round_money(dec!(4.165)), dec!(4.17));
        assert_eq!(round_money(dec!(-4.165)), dec!(-4.17));
        assert_eq!(round_money(dec!(4.1649)), dec!(4.16));
    }

    #[test]
    fn test_entry_wire_format() {
        let schedule = generate_schedule(&reference_input()).unwrap();
        let json = serde_json::to_value(&schedule).unwrap();
        let first = &json["RepaymentPlan"][0];
        assert_eq!(first["date"], "2018-01-01T00:00:00Z");
        assert_eq!(first["interest"].as_f64(), Some(4.17));
        assert_eq!(first["borrowerPaymentAmount"].as_f64(), Some(252.61));
        assert_eq!(first["initialOutstandingPrincipal"].as_f64(), Some(1000.0));
    }

    #[test]
    fn test_schedule_totals() {
        let schedule = generate_schedule(&reference_input()).unwrap();
        assert_eq!(schedule.level_payment(), Some(dec!(252.61)));
        assert_eq!(schedule.total_interest(), dec!(10.44));
        assert_eq!(schedule.total_paid(), dec!(1010.44));
    }
}
