use axum::Json;
use utoipa::OpenApi;

use crate::dto::result_dto::{
    CourseKnowledgeResponse, ModuleAccessResponse, ModuleKnowledgeResponse, TestResultResponse,
};
use crate::dto::submission_dto::{SubmitTestRequest, SubmitTestResponse};
use crate::models::question::QuestionType;
use crate::services::recommendation_service::{Recommendation, RecommendationKind};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::submission::submit_test,
        crate::routes::results::my_results,
        crate::routes::results::get_result,
        crate::routes::results::list_results_for_test,
        crate::routes::knowledge::my_module_knowledge,
        crate::routes::knowledge::my_course_knowledge,
        crate::routes::knowledge::module_knowledge,
        crate::routes::knowledge::course_knowledge,
        crate::routes::knowledge::module_access,
    ),
    components(schemas(
        SubmitTestRequest,
        SubmitTestResponse,
        Recommendation,
        RecommendationKind,
        QuestionType,
        TestResultResponse,
        ModuleKnowledgeResponse,
        CourseKnowledgeResponse,
        ModuleAccessResponse,
    )),
    tags((name = "assessment", description = "Test submission, scoring and knowledge"))
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
