use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::accounts::{self, PublicUser, Registration};
use crate::auth::Session;
use super::AppJson;
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    /// Send as `Authorization: Bearer <token>` on gated endpoints
    pub token: String,
    pub user: PublicUser,
}

/// Register a farmer, contributor or admin
#[utoipa::path(
    post,
    path = "/register",
    request_body = Registration,
    responses(
        (status = 201, description = "Account created", body = PublicUser),
        (status = 400, description = "A required field is missing or invalid"),
        (status = 409, description = "Username already taken")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(registration): AppJson<Registration>,
) -> Result<impl IntoResponse, AppError> {
    let user = accounts::register(&state.db, registration).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in and open a session
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid username or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = accounts::login(&state.db, &request.username, &request.password).await?;
    let session = state.sessions.open(&user.username, user.role);
    Ok(Json(LoginResponse {
        token: session.token,
        user,
    }))
}

/// End the current session
#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 204, description = "Logged out"),
        (status = 401, description = "No session")
    ),
    security(("bearer" = []))
)]
pub async fn logout(State(state): State<AppState>, session: Session) -> StatusCode {
    state.sessions.close(&session.token);
    StatusCode::NO_CONTENT
}
