//! Request handlers for the repayment plan API.

use axum::{
    body::Bytes,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use repayment_plan_core::validation::LoanRequest;
use repayment_plan_core::{generate_plan as build_plan, RepaymentPlanError};

use crate::error::AppError;

/// Generate a repayment plan from a JSON [`LoanRequest`].
///
/// The body is decoded by hand rather than through `Json` so that any decode
/// failure, including a missing content type, maps to the same 400.
pub async fn generate_plan(body: Bytes) -> Result<Response, AppError> {
    let request: LoanRequest =
        serde_json::from_slice(&body).map_err(|e| AppError::MalformedBody(e.to_string()))?;

    let plan = build_plan(&request).map_err(|err| {
        match &err {
            RepaymentPlanError::Validation(errors) => {
                tracing::warn!(%errors, "repayment plan request failed validation")
            }
            other => tracing::warn!(error = %other, "repayment plan rejected"),
        }
        AppError::from(err)
    })?;
    tracing::info!(
        periods = plan.len(),
        level_payment = ?plan.level_payment(),
        "repayment plan generated"
    );

    let json = serde_json::to_vec(&plan).map_err(|e| AppError::Serialization(e.to_string()))?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        json,
    )
        .into_response())
}
