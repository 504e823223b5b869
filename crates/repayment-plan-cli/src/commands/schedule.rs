use std::fmt;

use clap::Args;
use serde_json::Value;

use repayment_plan_core::validation::LoanRequest;
use repayment_plan_core::{generate_plan, RepaymentPlanError};

use crate::input;

/// Arguments for repayment schedule generation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ScheduleArgs {
    /// Path to JSON request file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Principal borrowed, as a decimal
    #[arg(long)]
    pub loan_amount: Option<String>,

    /// Nominal annual rate in percentage points (5.0 = 5%)
    #[arg(long, alias = "rate")]
    pub nominal_rate: Option<String>,

    /// Number of monthly periods
    #[arg(long, alias = "months")]
    pub duration: Option<i64>,

    /// First period date, RFC 3339 (e.g. 2018-01-01T00:00:00Z)
    #[arg(long)]
    pub start_date: Option<String>,
}

/// Request rejected by the validator, carrying the `{"Validation Errors": ...}` envelope.
#[derive(Debug)]
pub struct ValidationFailure(pub Value);

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ValidationFailure {}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: LoanRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(request) = input::stdin::read_stdin()? {
        request
    } else {
        request_from_flags(args)
    };
    plan_value(&request)
}

fn plan_value(request: &LoanRequest) -> Result<Value, Box<dyn std::error::Error>> {
    match generate_plan(request) {
        Ok(plan) => Ok(serde_json::to_value(plan)?),
        Err(RepaymentPlanError::Validation(errors)) => {
            Err(Box::new(ValidationFailure(serde_json::to_value(errors.into_report())?)))
        }
        Err(e) => Err(e.into()),
    }
}

/// Missing flags become empty fields so the validator reports them all at once.
fn request_from_flags(args: ScheduleArgs) -> LoanRequest {
    LoanRequest {
        loan_amount: args.loan_amount.unwrap_or_default(),
        nominal_rate: args.nominal_rate.unwrap_or_default(),
        duration: args.duration.unwrap_or_default(),
        start_date: args.start_date.unwrap_or_default(),
    }
}
