use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserAnswer {
    pub id: i64,
    pub test_result_id: i64,
    pub question_id: i64,
    pub answer_id: Option<i64>,
    pub text_answer: Option<String>,
    pub is_correct: bool,
    pub time_spent_minutes: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUserAnswer {
    pub test_result_id: i64,
    pub question_id: i64,
    pub answer_id: Option<i64>,
    pub text_answer: Option<String>,
    pub is_correct: bool,
    pub time_spent_minutes: i64,
}
