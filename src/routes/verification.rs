use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::Session;
use super::AppJson;
use crate::error::AppError;
use crate::loans::{self, Decision, LoanRecord};
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct DecisionRequest {
    pub decision: Decision,
}

/// Loan applications awaiting a decision
#[utoipa::path(
    get,
    path = "/loans/pending",
    responses(
        (status = 200, description = "Pending applications, oldest first", body = [LoanRecord]),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Not an admin")
    ),
    security(("bearer" = []))
)]
pub async fn list_pending(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<LoanRecord>>, AppError> {
    Ok(Json(loans::pending(&state.db, &session).await?))
}

/// Approve or reject a pending application
#[utoipa::path(
    post,
    path = "/loans/{id}/decision",
    params(("id" = i32, Path, description = "Loan application id")),
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "Decision recorded", body = LoanRecord),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "No such application"),
        (status = 409, description = "Application was already decided")
    ),
    security(("bearer" = []))
)]
pub async fn decide(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    AppJson(request): AppJson<DecisionRequest>,
) -> Result<Json<LoanRecord>, AppError> {
    Ok(Json(loans::decide(&state.db, &session, id, request.decision).await?))
}
