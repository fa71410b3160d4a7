use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::knowledge::{CourseKnowledge, ModuleKnowledge};
use crate::models::test_result::TestResult;
use crate::utils::percent;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TestResultResponse {
    pub id: i64,
    pub test_id: i64,
    pub user_id: i64,
    pub score_in_points: i64,
    pub percent: f64,
    pub is_passed: bool,
    pub duration_in_minutes: f64,
    pub created_at: DateTime<Utc>,
}

impl From<TestResult> for TestResultResponse {
    fn from(r: TestResult) -> Self {
        Self {
            id: r.id,
            test_id: r.test_id,
            user_id: r.user_id,
            score_in_points: r.score_in_points,
            percent: percent::to_f64(r.result),
            is_passed: r.is_passed,
            duration_in_minutes: r.duration_in_minutes,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModuleKnowledgeResponse {
    pub module_id: i64,
    pub knowledge: f64,
    pub updated_at: Option<NaiveDate>,
}

impl From<ModuleKnowledge> for ModuleKnowledgeResponse {
    fn from(k: ModuleKnowledge) -> Self {
        Self {
            module_id: k.module_id,
            knowledge: percent::to_f64(k.knowledge),
            updated_at: Some(k.date_updated),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CourseKnowledgeResponse {
    pub course_id: i64,
    pub knowledge: f64,
    pub updated_at: Option<NaiveDate>,
}

impl From<CourseKnowledge> for CourseKnowledgeResponse {
    fn from(k: CourseKnowledge) -> Self {
        Self {
            course_id: k.course_id,
            knowledge: percent::to_f64(k.knowledge),
            updated_at: Some(k.date_updated),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModuleAccessResponse {
    pub module_id: i64,
    pub unlocked: bool,
}
