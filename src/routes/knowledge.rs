use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
    Extension,
};

use crate::{
    dto::result_dto::{CourseKnowledgeResponse, ModuleAccessResponse, ModuleKnowledgeResponse},
    error::Result,
    middleware::auth::Claims,
    models::user::CurrentUser,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/me/modules/knowledge",
    responses(
        (status = 200, description = "Caller's module knowledge", body = [ModuleKnowledgeResponse])
    )
)]
#[axum::debug_handler]
pub async fn my_module_knowledge(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user = CurrentUser::try_from(&claims)?;
    let rows = state.knowledge_service.list_module_knowledge(user.id).await?;
    Ok(Json(
        rows.into_iter()
            .map(ModuleKnowledgeResponse::from)
            .collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/me/courses/knowledge",
    responses(
        (status = 200, description = "Caller's course knowledge", body = [CourseKnowledgeResponse])
    )
)]
#[axum::debug_handler]
pub async fn my_course_knowledge(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user = CurrentUser::try_from(&claims)?;
    let rows = state.knowledge_service.list_course_knowledge(user.id).await?;
    Ok(Json(
        rows.into_iter()
            .map(CourseKnowledgeResponse::from)
            .collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/modules/{id}/knowledge",
    params(
        ("id" = i64, Path, description = "Module ID")
    ),
    responses(
        (status = 200, description = "Stored knowledge, 0 when never computed", body = ModuleKnowledgeResponse),
        (status = 404, description = "Module not found")
    )
)]
#[axum::debug_handler]
pub async fn module_knowledge(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(module_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let user = CurrentUser::try_from(&claims)?;
    let response = state
        .knowledge_service
        .module_knowledge(user.id, module_id)
        .await?
        .map(ModuleKnowledgeResponse::from)
        .unwrap_or(ModuleKnowledgeResponse {
            module_id,
            knowledge: 0.0,
            updated_at: None,
        });
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}/knowledge",
    params(
        ("id" = i64, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Stored knowledge, 0 when never computed", body = CourseKnowledgeResponse),
        (status = 404, description = "Course not found")
    )
)]
#[axum::debug_handler]
pub async fn course_knowledge(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let user = CurrentUser::try_from(&claims)?;
    let response = state
        .knowledge_service
        .course_knowledge(user.id, course_id)
        .await?
        .map(CourseKnowledgeResponse::from)
        .unwrap_or(CourseKnowledgeResponse {
            course_id,
            knowledge: 0.0,
            updated_at: None,
        });
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/modules/{id}/access",
    params(
        ("id" = i64, Path, description = "Module ID")
    ),
    responses(
        (status = 200, description = "Whether the caller may open the module", body = ModuleAccessResponse),
        (status = 404, description = "Module not found")
    )
)]
#[axum::debug_handler]
pub async fn module_access(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(module_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let user = CurrentUser::try_from(&claims)?;
    let unlocked = state
        .completion_service
        .is_module_unlocked(&user, module_id)
        .await?;
    Ok(Json(ModuleAccessResponse { module_id, unlocked }))
}
