use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
    Extension,
};

use crate::{
    dto::result_dto::TestResultResponse,
    error::Result,
    middleware::auth::Claims,
    models::user::CurrentUser,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/me/results",
    responses(
        (status = 200, description = "Caller's attempts, newest first", body = [TestResultResponse])
    )
)]
#[axum::debug_handler]
pub async fn my_results(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user = CurrentUser::try_from(&claims)?;
    let results = state.attempt_service.list_my_results(user.id).await?;
    Ok(Json(
        results
            .into_iter()
            .map(TestResultResponse::from)
            .collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/results/{id}",
    params(
        ("id" = i64, Path, description = "Attempt ID")
    ),
    responses(
        (status = 200, description = "Attempt found", body = TestResultResponse),
        (status = 403, description = "Not the owner, an admin or the course author"),
        (status = 404, description = "Attempt not found")
    )
)]
#[axum::debug_handler]
pub async fn get_result(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let user = CurrentUser::try_from(&claims)?;
    let result = state.attempt_service.get_result(&user, id).await?;
    Ok(Json(TestResultResponse::from(result)))
}

#[utoipa::path(
    get,
    path = "/api/tests/{id}/results",
    params(
        ("id" = i64, Path, description = "Test ID")
    ),
    responses(
        (status = 200, description = "All attempts on the test, newest first", body = [TestResultResponse]),
        (status = 403, description = "Not an admin or the course author"),
        (status = 404, description = "Test not found")
    )
)]
#[axum::debug_handler]
pub async fn list_results_for_test(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let user = CurrentUser::try_from(&claims)?;
    let results = state
        .attempt_service
        .list_results_for_test(&user, test_id)
        .await?;
    Ok(Json(
        results
            .into_iter()
            .map(TestResultResponse::from)
            .collect::<Vec<_>>(),
    ))
}
