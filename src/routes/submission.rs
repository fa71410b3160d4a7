use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
    Extension,
};
use validator::Validate;

use crate::{
    dto::submission_dto::{SubmitTestRequest, SubmitTestResponse},
    error::Result,
    middleware::auth::Claims,
    models::user::CurrentUser,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/tests/{id}/submit",
    params(
        ("id" = i64, Path, description = "Test ID")
    ),
    request_body = SubmitTestRequest,
    responses(
        (status = 200, description = "Submission scored", body = SubmitTestResponse),
        (status = 400, description = "Invalid payload, test misconfigured or attempt limit reached"),
        (status = 403, description = "Not enrolled in the course"),
        (status = 404, description = "Test not found"),
        (status = 429, description = "Too many submissions")
    )
)]
#[axum::debug_handler]
pub async fn submit_test(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<i64>,
    Json(payload): Json<SubmitTestRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = CurrentUser::try_from(&claims)?;
    let response = state
        .attempt_service
        .submit(user.id, test_id, &payload)
        .await?;
    Ok(Json(response))
}
