use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Session;
use crate::emi::{calculate_emi, RepaymentPeriod};
use super::AppJson;
use crate::error::AppError;
use crate::loans::{self, ContributorOffer, LoanRecord, LoanRequest, LoanSubmission};
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct EmiRequest {
    /// Principal in rupees
    pub amount: f64,
    /// Annual interest rate in percent
    pub annual_rate: f64,
    pub repayment_period: RepaymentPeriod,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmiResponse {
    pub emi: f64,
    pub months: u32,
    pub repayment_period: RepaymentPeriod,
}

/// Calculate the monthly installment for a loan
#[utoipa::path(
    post,
    path = "/emi",
    request_body = EmiRequest,
    responses(
        (status = 200, description = "Installment calculated", body = EmiResponse),
        (status = 400, description = "Amount or rate out of range")
    )
)]
pub async fn emi(AppJson(request): AppJson<EmiRequest>) -> Result<Json<EmiResponse>, AppError> {
    let emi = calculate_emi(request.amount, request.annual_rate, request.repayment_period)?;
    Ok(Json(EmiResponse {
        emi,
        months: request.repayment_period.months(),
        repayment_period: request.repayment_period,
    }))
}

/// List contributors with their preferred interest rates
#[utoipa::path(
    get,
    path = "/contributors",
    responses(
        (status = 200, description = "Contributors available to lend", body = [ContributorOffer]),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Not a farmer")
    ),
    security(("bearer" = []))
)]
pub async fn list_contributors(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<ContributorOffer>>, AppError> {
    Ok(Json(loans::contributor_directory(&state.db, &session).await?))
}

/// Submit a loan application
#[utoipa::path(
    post,
    path = "/loans",
    request_body = LoanRequest,
    responses(
        (status = 201, description = "Application filed as Pending", body = LoanSubmission),
        (status = 400, description = "Invalid application or unknown contributor"),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Not a farmer")
    ),
    security(("bearer" = []))
)]
pub async fn apply(
    State(state): State<AppState>,
    session: Session,
    AppJson(request): AppJson<LoanRequest>,
) -> Result<impl IntoResponse, AppError> {
    let submission = loans::submit(&state.db, &session, request).await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

/// The logged-in farmer's loan history
#[utoipa::path(
    get,
    path = "/loans",
    responses(
        (status = 200, description = "Applications, newest first", body = [LoanRecord]),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Not a farmer")
    ),
    security(("bearer" = []))
)]
pub async fn loan_history(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<LoanRecord>>, AppError> {
    Ok(Json(loans::history(&state.db, &session).await?))
}
