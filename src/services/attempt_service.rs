use std::sync::Arc;

use crate::config::ScoringConfig;
use crate::database::AssessmentStore;
use crate::dto::submission_dto::{SubmitTestRequest, SubmitTestResponse};
use crate::error::{Error, Result};
use crate::models::question::{Answer, Question};
use crate::models::test::{Test, TestOwner};
use crate::models::test_result::{NewTestResult, TestResult};
use crate::models::user::CurrentUser;
use crate::models::user_answer::{NewUserAnswer, UserAnswer};
use crate::services::completion_service::{CompletionService, CompletionUpdate};
use crate::services::knowledge_service::KnowledgeService;
use crate::services::recommendation_service;
use crate::services::scoring_service::{QuestionOutcome, ScoringService};
use crate::utils::percent::{self, to_decimal};
use crate::utils::time::clamp_minutes;

/// Test and parents resolved while checking submission preconditions.
struct SubmissionTarget {
    test: Test,
    questions: Vec<Question>,
    answers: Vec<Answer>,
    module_id: Option<i64>,
    course_id: i64,
    prior_attempts: i64,
}

#[derive(Clone)]
pub struct AttemptService {
    store: Arc<dyn AssessmentStore>,
    scoring: ScoringService,
    config: ScoringConfig,
    completion: CompletionService,
    knowledge: KnowledgeService,
}

impl AttemptService {
    pub fn new(
        store: Arc<dyn AssessmentStore>,
        config: ScoringConfig,
        completion: CompletionService,
        knowledge: KnowledgeService,
    ) -> Self {
        Self {
            store,
            scoring: ScoringService::new(config.multipliers),
            config,
            completion,
            knowledge,
        }
    }

    fn is_passing(&self, percent: f64) -> bool {
        to_decimal(percent) >= to_decimal(self.config.pass_threshold)
    }

    /// Scores a submission and records it.
    ///
    /// Preconditions fail before anything is written. Once the attempt row
    /// exists, later stages only degrade: answer records, refinement,
    /// completion and knowledge failures are logged and the response falls
    /// back to what is already durable.
    pub async fn submit(
        &self,
        user_id: i64,
        test_id: i64,
        request: &SubmitTestRequest,
    ) -> Result<SubmitTestResponse> {
        let target = self.resolve_target(user_id, test_id).await?;
        let elapsed = clamp_minutes(request.duration_minutes);

        // Provisional score, persisted right away.
        let outcomes = self
            .scoring
            .evaluate(&target.questions, &target.answers, &request.answers);
        let provisional = self
            .scoring
            .score_outcomes(&target.test, &outcomes, elapsed, None);
        let correct_count = outcomes.iter().filter(|o| o.is_correct).count() as i64;

        let mut attempt = self
            .store
            .insert_attempt(&NewTestResult {
                score_in_points: correct_count,
                is_passed: self.is_passing(provisional.percent),
                duration_in_minutes: elapsed,
                result: to_decimal(provisional.percent),
                test_id,
                user_id,
            })
            .await?;
        tracing::info!(
            attempt_id = attempt.id,
            test_id,
            user_id,
            percent = provisional.percent,
            "Attempt recorded"
        );

        let new_records = answer_records(attempt.id, &outcomes, elapsed);
        let records = match self.persist_records(&new_records).await {
            Some(records) => {
                if let Some(refined) = self.refine(&target, &attempt, &records).await {
                    attempt = refined;
                }
                records
            }
            None => provisional_records(&new_records),
        };

        if let Some(module_id) = target.module_id {
            let update = CompletionUpdate::Attempt {
                passed: attempt.is_passed,
            };
            if let Err(e) = self
                .completion
                .update_completion(user_id, module_id, update)
                .await
            {
                tracing::warn!(user_id, module_id, "Completion update failed: {:?}", e);
            }
        }

        let module_knowledge = match target.module_id {
            Some(module_id) => {
                match self
                    .knowledge
                    .recompute_module_knowledge(user_id, module_id)
                    .await
                {
                    Ok(value) => Some(value),
                    Err(e) => {
                        tracing::warn!(user_id, module_id, "Module knowledge recompute failed: {:?}", e);
                        None
                    }
                }
            }
            None => None,
        };
        let course_knowledge = match self
            .knowledge
            .recompute_course_knowledge(user_id, target.course_id)
            .await
        {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(
                    user_id,
                    course_id = target.course_id,
                    "Course knowledge recompute failed: {:?}",
                    e
                );
                None
            }
        };

        let topic_ids: Vec<i64> = {
            let mut ids: Vec<i64> = target.questions.iter().filter_map(|q| q.topic_id).collect();
            ids.sort_unstable();
            ids.dedup();
            ids
        };
        let topics = if topic_ids.is_empty() {
            Vec::new()
        } else {
            self.store.list_topics(&topic_ids).await.unwrap_or_else(|e| {
                tracing::warn!(attempt_id = attempt.id, "Topic lookup failed: {:?}", e);
                Vec::new()
            })
        };
        let recommendations = recommendation_service::generate(
            &attempt,
            &target.test,
            &target.questions,
            &records,
            &topics,
        );

        Ok(SubmitTestResponse {
            attempt_id: attempt.id,
            score: attempt.score_in_points,
            percent: percent::to_f64(attempt.result),
            passed: attempt.is_passed,
            attempts: target.prior_attempts + 1,
            recommendations,
            module_knowledge: module_knowledge.map(percent::to_f64),
            course_knowledge: course_knowledge.map(percent::to_f64),
        })
    }

    async fn resolve_target(&self, user_id: i64, test_id: i64) -> Result<SubmissionTarget> {
        let test = self
            .store
            .get_test(test_id)
            .await?
            .ok_or_else(|| Error::NotFound("Test not found".to_string()))?;
        let owner = test.owner()?;

        let questions = self.store.list_questions(test_id).await?;
        if questions.is_empty() {
            return Err(Error::InvalidState("Test has no questions".to_string()));
        }

        let (module_id, course_id) = match owner {
            TestOwner::Module(module_id) => {
                let module = self
                    .store
                    .get_module(module_id)
                    .await?
                    .ok_or_else(|| Error::NotFound("Module not found".to_string()))?;
                (Some(module_id), module.course_id)
            }
            TestOwner::Course(course_id) => (None, course_id),
        };
        if self.store.get_course(course_id).await?.is_none() {
            return Err(Error::NotFound("Course not found".to_string()));
        }
        if !self.store.is_enrolled(user_id, course_id).await? {
            return Err(Error::Forbidden("Not enrolled in course".to_string()));
        }

        let prior_attempts = self.store.count_attempts(test_id, user_id).await?;
        if let Some(max_attempts) = self.config.max_attempts {
            if prior_attempts >= max_attempts {
                return Err(Error::LimitExceeded { max_attempts });
            }
        }

        let answers = self.store.list_answers_for_test(test_id).await?;
        Ok(SubmissionTarget {
            test,
            questions,
            answers,
            module_id,
            course_id,
            prior_attempts,
        })
    }

    /// Writes the answer records and reads them back. `None` when either
    /// step failed or the read-back is incomplete.
    async fn persist_records(&self, records: &[NewUserAnswer]) -> Option<Vec<UserAnswer>> {
        let attempt_id = records.first()?.test_result_id;
        if let Err(e) = self.store.insert_user_answers(records).await {
            tracing::warn!(attempt_id, "Failed to store answer records: {:?}", e);
            return None;
        }
        match self.store.list_user_answers(attempt_id).await {
            Ok(stored) if stored.len() == records.len() => Some(stored),
            Ok(stored) => {
                tracing::warn!(
                    attempt_id,
                    expected = records.len(),
                    found = stored.len(),
                    "Answer records incomplete after insert"
                );
                None
            }
            Err(e) => {
                tracing::warn!(attempt_id, "Failed to read back answer records: {:?}", e);
                None
            }
        }
    }

    /// Rescores from the stored records and overwrites the attempt's
    /// percentage and pass flag. Keeps the provisional values on failure.
    async fn refine(
        &self,
        target: &SubmissionTarget,
        attempt: &TestResult,
        records: &[UserAnswer],
    ) -> Option<TestResult> {
        let refined = self.scoring.score_records(
            &target.test,
            &target.questions,
            records,
            attempt.duration_in_minutes,
            Some(percent::to_f64(attempt.result)),
        );
        let result = to_decimal(refined.percent);
        let passed = self.is_passing(refined.percent);
        if result == attempt.result && passed == attempt.is_passed {
            return None;
        }
        match self
            .store
            .update_attempt_score(attempt.id, result, passed)
            .await
        {
            Ok(updated) => Some(updated),
            Err(e) => {
                tracing::warn!(attempt_id = attempt.id, "Failed to refine attempt score: {:?}", e);
                None
            }
        }
    }

    /// A single attempt, visible to its owner, admins and the course author.
    pub async fn get_result(&self, user: &CurrentUser, attempt_id: i64) -> Result<TestResult> {
        let attempt = self
            .store
            .get_attempt(attempt_id)
            .await?
            .ok_or_else(|| Error::NotFound("Result not found".to_string()))?;
        if attempt.user_id == user.id || user.is_admin() {
            return Ok(attempt);
        }
        if self.is_test_author(user, attempt.test_id).await? {
            return Ok(attempt);
        }
        Err(Error::Forbidden("Not allowed to view this result".to_string()))
    }

    pub async fn list_my_results(&self, user_id: i64) -> Result<Vec<TestResult>> {
        self.store.list_user_attempts(user_id).await
    }

    /// Every attempt on a test, for admins and the course author.
    pub async fn list_results_for_test(&self, user: &CurrentUser, test_id: i64) -> Result<Vec<TestResult>> {
        if self.store.get_test(test_id).await?.is_none() {
            return Err(Error::NotFound("Test not found".to_string()));
        }
        if !user.is_admin() && !self.is_test_author(user, test_id).await? {
            return Err(Error::Forbidden("Only the course author can list results".to_string()));
        }
        self.store.list_test_attempts(test_id).await
    }

    async fn is_test_author(&self, user: &CurrentUser, test_id: i64) -> Result<bool> {
        let Some(test) = self.store.get_test(test_id).await? else {
            return Ok(false);
        };
        let course_id = match test.owner()? {
            TestOwner::Course(course_id) => course_id,
            TestOwner::Module(module_id) => match self.store.get_module(module_id).await? {
                Some(module) => module.course_id,
                None => return Ok(false),
            },
        };
        Ok(self
            .store
            .get_course(course_id)
            .await?
            .map(|c| c.author_id == user.id)
            .unwrap_or(false))
    }
}

/// One record per answered question. Elapsed time is split evenly and
/// floored to whole minutes.
fn answer_records(attempt_id: i64, outcomes: &[QuestionOutcome], elapsed: f64) -> Vec<NewUserAnswer> {
    let answered: Vec<&QuestionOutcome> = outcomes.iter().filter(|o| o.answered).collect();
    if answered.is_empty() {
        return Vec::new();
    }
    let per_answer = (clamp_minutes(elapsed) / answered.len() as f64).floor() as i64;
    answered
        .into_iter()
        .map(|o| NewUserAnswer {
            test_result_id: attempt_id,
            question_id: o.question_id,
            answer_id: o.answer_id,
            text_answer: o.text_answer.clone(),
            is_correct: o.is_correct,
            time_spent_minutes: per_answer,
        })
        .collect()
}

/// Stand-ins for records that never made it to storage.
fn provisional_records(records: &[NewUserAnswer]) -> Vec<UserAnswer> {
    records
        .iter()
        .map(|r| UserAnswer {
            id: 0,
            test_result_id: r.test_result_id,
            question_id: r.question_id,
            answer_id: r.answer_id,
            text_answer: r.text_answer.clone(),
            is_correct: r.is_correct,
            time_spent_minutes: r.time_spent_minutes,
        })
        .collect()
}
