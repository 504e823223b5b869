use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%) unless the name says `_pct`.
pub type Rate = Decimal;

/// Interest accrual convention used by the schedule recurrence.
///
/// Interest for a period is `annual_rate * days_in_month / days_in_year`
/// applied to the opening balance. Calendar dates advance independently of
/// these figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCountConvention {
    pub days_in_month: u32,
    pub days_in_year: u32,
    pub months_in_year: u32,
}

impl DayCountConvention {
    /// 30/360: every month is 30 days, every year 360 days.
    pub const THIRTY_360: DayCountConvention = DayCountConvention {
        days_in_month: 30,
        days_in_year: 360,
        months_in_year: 12,
    };

    /// Periodic rate used for the annuity payment: `annual_rate / months_in_year`.
    /// `None` when `months_in_year` is zero.
    pub fn periodic_rate(&self, annual_rate: Rate) -> Option<Rate> {
        annual_rate.checked_div(Decimal::from(self.months_in_year))
    }

    /// Interest accrued over one period on `balance`, unrounded.
    ///
    /// Computed as `annual_rate * days_in_month * balance / days_in_year` so the
    /// only inexact step is the final division. Returns `None` on overflow.
    pub fn accrued_interest(&self, annual_rate: Rate, balance: Money) -> Option<Money> {
        annual_rate
            .checked_mul(Decimal::from(self.days_in_month))?
            .checked_mul(balance)?
            .checked_div(Decimal::from(self.days_in_year))
    }
}

impl Default for DayCountConvention {
    fn default() -> Self {
        DayCountConvention::THIRTY_360
    }
}
