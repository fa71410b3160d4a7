use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::services::recommendation_service::Recommendation;

/// A single submitted value: an answer id for closed-choice questions,
/// free text for open-text ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmittedAnswer {
    Choice(i64),
    Text(String),
}

impl SubmittedAnswer {
    /// Answer id carried by the value, if it can be read as one.
    pub fn as_answer_id(&self) -> Option<i64> {
        match self {
            SubmittedAnswer::Choice(id) => Some(*id),
            SubmittedAnswer::Text(raw) => raw.trim().parse().ok(),
        }
    }

    /// Text carried by the value; `None` when it is blank.
    pub fn as_text(&self) -> Option<String> {
        let text = match self {
            SubmittedAnswer::Choice(id) => id.to_string(),
            SubmittedAnswer::Text(raw) => raw.clone(),
        };
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubmitTestRequest {
    /// Question id to answer id (closed-choice) or text (open-text).
    #[validate(length(max = 1000))]
    #[schema(value_type = Object)]
    pub answers: HashMap<i64, SubmittedAnswer>,
    /// Elapsed minutes. Required.
    #[serde(alias = "durationMinutes", alias = "duration_in_minutes")]
    #[validate(range(max = 10080.0))]
    pub duration_minutes: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitTestResponse {
    pub attempt_id: i64,
    /// Raw count of correctly answered questions.
    pub score: i64,
    pub percent: f64,
    pub passed: bool,
    /// Attempts so far, including this one.
    pub attempts: i64,
    pub recommendations: Vec<Recommendation>,
    pub module_knowledge: Option<f64>,
    pub course_knowledge: Option<f64>,
}
