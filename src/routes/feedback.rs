use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::AppJson;
use crate::error::AppError;
use crate::feedback::send_feedback;
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct FeedbackRequest {
    pub feedback: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FeedbackResponse {
    pub message: String,
}

/// Email feedback to the operator
#[utoipa::path(
    post,
    path = "/feedback",
    request_body = FeedbackRequest,
    responses(
        (status = 200, description = "Feedback sent", body = FeedbackResponse),
        (status = 400, description = "Feedback was blank"),
        (status = 502, description = "Mail could not be delivered")
    )
)]
pub async fn submit_feedback(
    State(state): State<AppState>,
    AppJson(request): AppJson<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>, AppError> {
    send_feedback(state.mailer.as_ref(), &state.feedback, &request.feedback).await?;
    Ok(Json(FeedbackResponse {
        message: "Thank you for your feedback! It has been sent to the admin via email.".to_string(),
    }))
}
