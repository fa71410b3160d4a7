use std::collections::HashMap;

use serde::Serialize;

use crate::config::TypeMultipliers;
use crate::dto::submission_dto::SubmittedAnswer;
use crate::models::question::{Answer, Question, QuestionType};
use crate::models::test::Test;
use crate::models::user_answer::UserAnswer;
use crate::utils::time::clamp_minutes;

pub const MIN_TIME_FACTOR: f64 = 0.5;
pub const MAX_TIME_FACTOR: f64 = 1.25;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub percent: f64,
    pub weighted_earned: f64,
    pub weighted_max: f64,
    pub accuracy_ratio: f64,
    pub time_factor: f64,
}

/// Per-question verdict for one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionOutcome {
    pub question_id: i64,
    pub question_type: QuestionType,
    pub topic_id: Option<i64>,
    pub weight: f64,
    pub answer_id: Option<i64>,
    pub text_answer: Option<String>,
    pub answered: bool,
    pub is_correct: bool,
}

/// Weighted scoring of test submissions. Pure: the same inputs always give
/// the same breakdown.
#[derive(Debug, Clone, Copy)]
pub struct ScoringService {
    multipliers: TypeMultipliers,
}

impl ScoringService {
    pub fn new(multipliers: TypeMultipliers) -> Self {
        Self { multipliers }
    }

    pub fn weight(&self, question: &Question) -> f64 {
        question.complexity_points as f64 * self.multipliers.factor(question.question_type)
    }

    /// Decides correctness for every question of the test, answered or not.
    pub fn evaluate(
        &self,
        questions: &[Question],
        answers: &[Answer],
        submitted: &HashMap<i64, SubmittedAnswer>,
    ) -> Vec<QuestionOutcome> {
        let by_id: HashMap<i64, &Answer> = answers.iter().map(|a| (a.id, a)).collect();

        questions
            .iter()
            .map(|q| {
                let weight = self.weight(q);
                let provided = submitted.get(&q.id);
                let (answer_id, text_answer, is_correct) = match q.question_type {
                    QuestionType::ClosedChoice => {
                        let answer_id = provided.and_then(SubmittedAnswer::as_answer_id);
                        let is_correct = answer_id
                            .and_then(|id| by_id.get(&id))
                            .map(|a| a.question_id == q.id && a.is_correct)
                            .unwrap_or(false);
                        (answer_id, None, is_correct)
                    }
                    QuestionType::OpenText => {
                        let text = provided.and_then(SubmittedAnswer::as_text);
                        let is_correct = text
                            .as_deref()
                            .map(|t| matches_open_text(q.id, t, answers))
                            .unwrap_or(false);
                        (None, text, is_correct)
                    }
                };
                QuestionOutcome {
                    question_id: q.id,
                    question_type: q.question_type,
                    topic_id: q.topic_id,
                    weight,
                    answered: answer_id.is_some() || text_answer.is_some(),
                    answer_id,
                    text_answer,
                    is_correct,
                }
            })
            .collect()
    }

    /// Full scoring of a raw submission against the test's questions and answers.
    pub fn score(
        &self,
        test: &Test,
        questions: &[Question],
        answers: &[Answer],
        submitted: &HashMap<i64, SubmittedAnswer>,
        elapsed_minutes: f64,
    ) -> ScoreBreakdown {
        let outcomes = self.evaluate(questions, answers, submitted);
        self.score_outcomes(test, &outcomes, elapsed_minutes, None)
    }

    pub fn score_outcomes(
        &self,
        test: &Test,
        outcomes: &[QuestionOutcome],
        elapsed_minutes: f64,
        fallback_percent: Option<f64>,
    ) -> ScoreBreakdown {
        combine(
            outcomes.iter().map(|o| (o.weight, o.is_correct)),
            test.expected_minutes(),
            elapsed_minutes,
            fallback_percent,
        )
    }

    /// Scores from persisted answer records. Questions without a record count
    /// as unanswered.
    pub fn score_records(
        &self,
        test: &Test,
        questions: &[Question],
        records: &[UserAnswer],
        elapsed_minutes: f64,
        fallback_percent: Option<f64>,
    ) -> ScoreBreakdown {
        let correct: HashMap<i64, bool> = records
            .iter()
            .map(|r| (r.question_id, r.is_correct))
            .collect();
        combine(
            questions.iter().map(|q| {
                (
                    self.weight(q),
                    correct.get(&q.id).copied().unwrap_or(false),
                )
            }),
            test.expected_minutes(),
            elapsed_minutes,
            fallback_percent,
        )
    }
}

fn combine(
    weighted: impl Iterator<Item = (f64, bool)>,
    expected_minutes: f64,
    elapsed_minutes: f64,
    fallback_percent: Option<f64>,
) -> ScoreBreakdown {
    let (weighted_earned, weighted_max) =
        weighted.fold((0.0, 0.0), |(earned, max), (weight, correct)| {
            (if correct { earned + weight } else { earned }, max + weight)
        });
    let time_factor = time_factor(expected_minutes, clamp_minutes(elapsed_minutes));

    if weighted_max <= 0.0 {
        return ScoreBreakdown {
            percent: fallback_percent.unwrap_or(0.0).clamp(0.0, 100.0),
            weighted_earned,
            weighted_max,
            accuracy_ratio: 0.0,
            time_factor,
        };
    }

    let accuracy_ratio = weighted_earned / weighted_max;
    ScoreBreakdown {
        percent: (accuracy_ratio * 100.0 * time_factor).clamp(0.0, 100.0),
        weighted_earned,
        weighted_max,
        accuracy_ratio,
        time_factor,
    }
}

/// Bonus for finishing under the reference time, penalty for going over.
pub fn time_factor(expected_minutes: f64, elapsed_minutes: f64) -> f64 {
    if expected_minutes.is_nan()
        || elapsed_minutes.is_nan()
        || expected_minutes <= 0.0
        || elapsed_minutes <= 0.0
    {
        return 1.0;
    }
    (expected_minutes / elapsed_minutes).clamp(MIN_TIME_FACTOR, MAX_TIME_FACTOR)
}

pub fn normalize_text(text: &str) -> String {
    text.trim().to_lowercase()
}

fn matches_open_text(question_id: i64, submitted: &str, answers: &[Answer]) -> bool {
    let submitted = normalize_text(submitted);
    answers
        .iter()
        .filter(|a| a.question_id == question_id && a.is_correct)
        .any(|a| normalize_text(&a.text) == submitted)
}
