use thiserror::Error;

use crate::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum RepaymentPlanError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Arithmetic overflow in {context}")]
    ArithmeticOverflow { context: String },

    #[error("Date error: {0}")]
    DateError(String),
}

impl From<ValidationErrors> for RepaymentPlanError {
    fn from(errors: ValidationErrors) -> Self {
        RepaymentPlanError::Validation(errors)
    }
}
