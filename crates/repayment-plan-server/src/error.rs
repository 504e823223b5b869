use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use repayment_plan_core::validation::ValidationErrors;
use repayment_plan_core::RepaymentPlanError;

pub const MALFORMED_BODY_MESSAGE: &str = "Could not unmarshal the request to JSON";
pub const SERIALIZATION_MESSAGE: &str = "Could not marshal the response json";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Body is not JSON of the expected shape.
    #[error("Could not unmarshal the request to JSON: {0}")]
    MalformedBody(String),
    #[error(transparent)]
    Plan(#[from] RepaymentPlanError),
    #[error("Could not marshal the response json: {0}")]
    Serialization(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::MalformedBody(_) => {
                (StatusCode::BAD_REQUEST, MALFORMED_BODY_MESSAGE).into_response()
            }
            AppError::Plan(err) => match err {
                RepaymentPlanError::InvalidInput { field, reason } => {
                    let mut errors = ValidationErrors::new();
                    errors.add(field, reason);
                    validation_response(errors)
                }
                RepaymentPlanError::Validation(errors) => validation_response(errors),
                other @ (RepaymentPlanError::ArithmeticOverflow { .. }
                | RepaymentPlanError::DateError(_)) => {
                    (StatusCode::BAD_REQUEST, other.to_string()).into_response()
                }
            },
            AppError::Serialization(msg) => {
                tracing::error!(error = %msg, "failed to serialize repayment plan");
                (StatusCode::INTERNAL_SERVER_ERROR, SERIALIZATION_MESSAGE).into_response()
            }
        }
    }
}

fn validation_response(errors: ValidationErrors) -> Response {
    (StatusCode::BAD_REQUEST, Json(errors.into_report())).into_response()
}
