pub mod error;
pub mod schedule;
pub mod types;
pub mod validation;

pub use error::RepaymentPlanError;
pub use types::*;

use schedule::{RepaymentSchedule, ScheduleInput};
use validation::LoanRequest;

/// Standard result type for all repayment-plan operations
pub type RepaymentPlanResult<T> = Result<T, RepaymentPlanError>;

/// Validate a raw request and generate its schedule under 30/360.
///
/// Validation failures come back as [`RepaymentPlanError::Validation`] with
/// every failing field; nothing is generated in that case.
pub fn generate_plan(request: &LoanRequest) -> RepaymentPlanResult<RepaymentSchedule> {
    let loan = validation::validate(request)?;
    let input: ScheduleInput = loan.into();
    schedule::generate_schedule(&input)
}
