use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::course::Topic;
use crate::models::question::{Question, QuestionType};
use crate::models::test::Test;
use crate::models::test_result::TestResult;
use crate::models::user_answer::UserAnswer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    Timeout,
    Topics,
    QuestionType,
    Success,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topic_ids: Vec<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topic_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_type: Option<QuestionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
}

impl Recommendation {
    fn new(kind: RecommendationKind, message: String) -> Self {
        Self {
            kind,
            message,
            topic_ids: Vec::new(),
            topic_names: Vec::new(),
            question_type: None,
            duration_minutes: None,
        }
    }
}

/// Remediation hints for a finished attempt. Questions without an answer
/// record are treated as answered incorrectly.
pub fn generate(
    attempt: &TestResult,
    test: &Test,
    questions: &[Question],
    records: &[UserAnswer],
    topics: &[Topic],
) -> Vec<Recommendation> {
    let mut out = Vec::new();

    let timed_out = test.duration_in_minutes > 0
        && attempt.duration_in_minutes > test.duration_in_minutes as f64;
    if timed_out {
        let mut rec = Recommendation::new(
            RecommendationKind::Timeout,
            format!(
                "You went over the {} minute limit. Practise answering under time pressure.",
                test.duration_in_minutes
            ),
        );
        rec.duration_minutes = Some(test.duration_in_minutes);
        out.push(rec);
    }

    let correct: HashMap<i64, bool> = records
        .iter()
        .map(|r| (r.question_id, r.is_correct))
        .collect();
    let incorrect: Vec<&Question> = questions
        .iter()
        .filter(|q| !correct.get(&q.id).copied().unwrap_or(false))
        .collect();

    let topic_ids = missed_topic_ids(&incorrect);
    if !topic_ids.is_empty() {
        let names: HashMap<i64, &str> = topics.iter().map(|t| (t.id, t.name.as_str())).collect();
        let topic_names: Vec<String> = topic_ids
            .iter()
            .filter_map(|id| names.get(id).map(|n| n.to_string()))
            .collect();
        let listed = if topic_names.is_empty() {
            topic_ids
                .iter()
                .map(|id| format!("#{}", id))
                .collect::<Vec<_>>()
                .join(", ")
        } else {
            topic_names.join(", ")
        };
        let mut rec = Recommendation::new(
            RecommendationKind::Topics,
            format!("Review these topics before retrying: {}.", listed),
        );
        rec.topic_ids = topic_ids;
        rec.topic_names = topic_names;
        out.push(rec);
    }

    if incorrect
        .iter()
        .any(|q| q.question_type == QuestionType::ClosedChoice)
    {
        let mut rec = Recommendation::new(
            RecommendationKind::QuestionType,
            "Some closed-choice questions were missed. Re-read each option and rule out distractors before choosing."
                .to_string(),
        );
        rec.question_type = Some(QuestionType::ClosedChoice);
        out.push(rec);
    }

    if incorrect
        .iter()
        .any(|q| q.question_type == QuestionType::OpenText)
    {
        let mut rec = Recommendation::new(
            RecommendationKind::QuestionType,
            "Some open-text answers did not match. Practise recalling exact terms and check spelling."
                .to_string(),
        );
        rec.question_type = Some(QuestionType::OpenText);
        out.push(rec);
    }

    if incorrect.is_empty() && !timed_out {
        out.push(Recommendation::new(
            RecommendationKind::Success,
            "All answers are correct and on time. You are ready for the next module.".to_string(),
        ));
    }

    out
}

/// Topic ids of missed questions, first occurrence order, no repeats.
fn missed_topic_ids(incorrect: &[&Question]) -> Vec<i64> {
    let mut seen = HashSet::new();
    incorrect
        .iter()
        .filter_map(|q| q.topic_id)
        .filter(|id| seen.insert(*id))
        .collect()
}
