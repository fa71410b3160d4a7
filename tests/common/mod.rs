#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rust_decimal::Decimal;

use learning_backend::config::ScoringConfig;
use learning_backend::database::AssessmentStore;
use learning_backend::error::{Error, Result};
use learning_backend::middleware::auth::Claims;
use learning_backend::models::course::{Course, Module, Topic};
use learning_backend::models::knowledge::{CourseKnowledge, ModuleKnowledge};
use learning_backend::models::module_passed::ModulePassed;
use learning_backend::models::question::{Answer, Question, QuestionType};
use learning_backend::models::test::Test;
use learning_backend::models::test_result::{NewTestResult, TestResult};
use learning_backend::models::user_answer::{NewUserAnswer, UserAnswer};
use learning_backend::AppState;

pub const JWT_SECRET: &str = "test_secret_key";

#[derive(Default)]
struct Tables {
    courses: Vec<Course>,
    modules: Vec<Module>,
    topics: Vec<Topic>,
    enrollments: Vec<(i64, i64)>,
    tests: Vec<Test>,
    questions: Vec<Question>,
    answers: Vec<Answer>,
    attempts: Vec<TestResult>,
    user_answers: Vec<UserAnswer>,
    module_knowledge: Vec<ModuleKnowledge>,
    course_knowledge: Vec<CourseKnowledge>,
    module_passed: Vec<ModulePassed>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Store held entirely in memory, with switches to make individual
/// stages fail.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    pub fail_answer_insert: AtomicBool,
    pub fail_module_knowledge: AtomicBool,
    pub conflict_on_completion_insert: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    pub fn add_course(&self, author_id: i64) -> i64 {
        let mut t = self.lock();
        let id = t.next_id();
        t.courses.push(Course {
            id,
            name: format!("Course {}", id),
            author_id,
            is_published: true,
        });
        id
    }

    pub fn add_module(&self, course_id: i64) -> i64 {
        let mut t = self.lock();
        let id = t.next_id();
        t.modules.push(Module {
            id,
            name: format!("Module {}", id),
            course_id,
        });
        id
    }

    pub fn add_topic(&self, module_id: i64, name: &str) -> i64 {
        let mut t = self.lock();
        let id = t.next_id();
        t.topics.push(Topic {
            id,
            name: name.to_string(),
            module_id,
        });
        id
    }

    pub fn enroll(&self, user_id: i64, course_id: i64) {
        self.lock().enrollments.push((user_id, course_id));
    }

    pub fn add_test(&self, module_id: Option<i64>, course_id: Option<i64>, minutes: i64) -> i64 {
        let mut t = self.lock();
        let id = t.next_id();
        t.tests.push(Test {
            id,
            name: format!("Test {}", id),
            description: String::new(),
            duration_in_minutes: minutes,
            module_id,
            course_id,
            created_at: Some(Utc::now()),
        });
        id
    }

    /// Closed-choice question; returns (question id, correct answer id, wrong answer id).
    pub fn add_choice_question(&self, test_id: i64, points: i64, topic_id: Option<i64>) -> (i64, i64, i64) {
        let mut t = self.lock();
        let qid = t.next_id();
        t.questions.push(Question {
            id: qid,
            test_id,
            text: format!("Question {}", qid),
            complexity_points: points,
            question_type: QuestionType::ClosedChoice,
            topic_id,
        });
        let right = t.next_id();
        t.answers.push(Answer {
            id: right,
            question_id: qid,
            is_correct: true,
            text: "right".into(),
        });
        let wrong = t.next_id();
        t.answers.push(Answer {
            id: wrong,
            question_id: qid,
            is_correct: false,
            text: "wrong".into(),
        });
        (qid, right, wrong)
    }

    pub fn add_text_question(&self, test_id: i64, points: i64, expected: &str) -> i64 {
        let mut t = self.lock();
        let qid = t.next_id();
        t.questions.push(Question {
            id: qid,
            test_id,
            text: format!("Question {}", qid),
            complexity_points: points,
            question_type: QuestionType::OpenText,
            topic_id: None,
        });
        let aid = t.next_id();
        t.answers.push(Answer {
            id: aid,
            question_id: qid,
            is_correct: true,
            text: expected.to_string(),
        });
        qid
    }

    pub fn set_passed(&self, user_id: i64, module_id: i64, is_passed: bool) {
        let mut t = self.lock();
        let id = t.next_id();
        t.module_passed.push(ModulePassed {
            id,
            user_id,
            module_id,
            is_passed,
            date_passed: None,
        });
    }

    pub fn passed_row(&self, user_id: i64, module_id: i64) -> Option<ModulePassed> {
        self.lock()
            .module_passed
            .iter()
            .find(|r| r.user_id == user_id && r.module_id == module_id)
            .cloned()
    }

    pub fn attempts(&self) -> Vec<TestResult> {
        self.lock().attempts.clone()
    }

    pub fn answer_records(&self) -> Vec<UserAnswer> {
        self.lock().user_answers.clone()
    }

    pub fn stored_module_knowledge(&self, user_id: i64, module_id: i64) -> Option<Decimal> {
        self.lock()
            .module_knowledge
            .iter()
            .find(|k| k.user_id == user_id && k.module_id == module_id)
            .map(|k| k.knowledge)
    }

    pub fn stored_course_knowledge(&self, user_id: i64, course_id: i64) -> Option<Decimal> {
        self.lock()
            .course_knowledge
            .iter()
            .find(|k| k.user_id == user_id && k.course_id == course_id)
            .map(|k| k.knowledge)
    }
}

fn newest_first(mut rows: Vec<TestResult>) -> Vec<TestResult> {
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    rows
}

#[async_trait]
impl AssessmentStore for MemoryStore {
    async fn get_test(&self, test_id: i64) -> Result<Option<Test>> {
        Ok(self.lock().tests.iter().find(|t| t.id == test_id).cloned())
    }

    async fn list_questions(&self, test_id: i64) -> Result<Vec<Question>> {
        Ok(self
            .lock()
            .questions
            .iter()
            .filter(|q| q.test_id == test_id)
            .cloned()
            .collect())
    }

    async fn list_answers_for_test(&self, test_id: i64) -> Result<Vec<Answer>> {
        let t = self.lock();
        let ids: Vec<i64> = t
            .questions
            .iter()
            .filter(|q| q.test_id == test_id)
            .map(|q| q.id)
            .collect();
        let answers = t
            .answers
            .iter()
            .filter(|a| ids.contains(&a.question_id))
            .cloned()
            .collect();
        Ok(answers)
    }

    async fn get_module(&self, module_id: i64) -> Result<Option<Module>> {
        Ok(self.lock().modules.iter().find(|m| m.id == module_id).cloned())
    }

    async fn get_course(&self, course_id: i64) -> Result<Option<Course>> {
        Ok(self.lock().courses.iter().find(|c| c.id == course_id).cloned())
    }

    async fn list_course_modules(&self, course_id: i64) -> Result<Vec<Module>> {
        let mut modules: Vec<Module> = self
            .lock()
            .modules
            .iter()
            .filter(|m| m.course_id == course_id)
            .cloned()
            .collect();
        modules.sort_by_key(|m| m.id);
        Ok(modules)
    }

    async fn list_module_tests(&self, module_id: i64) -> Result<Vec<Test>> {
        if self.fail_module_knowledge.load(Ordering::SeqCst) {
            return Err(Error::Internal("module tests unavailable".into()));
        }
        Ok(self
            .lock()
            .tests
            .iter()
            .filter(|t| t.module_id == Some(module_id))
            .cloned()
            .collect())
    }

    async fn list_topics(&self, topic_ids: &[i64]) -> Result<Vec<Topic>> {
        Ok(self
            .lock()
            .topics
            .iter()
            .filter(|t| topic_ids.contains(&t.id))
            .cloned()
            .collect())
    }

    async fn is_enrolled(&self, user_id: i64, course_id: i64) -> Result<bool> {
        Ok(self.lock().enrollments.contains(&(user_id, course_id)))
    }

    async fn count_attempts(&self, test_id: i64, user_id: i64) -> Result<i64> {
        Ok(self
            .lock()
            .attempts
            .iter()
            .filter(|a| a.test_id == test_id && a.user_id == user_id)
            .count() as i64)
    }

    async fn insert_attempt(&self, attempt: &NewTestResult) -> Result<TestResult> {
        let mut t = self.lock();
        let id = t.next_id();
        // Strictly increasing timestamps keep "latest" unambiguous.
        let created_at = Utc::now() + Duration::milliseconds(id);
        let row = TestResult {
            id,
            score_in_points: attempt.score_in_points,
            is_passed: attempt.is_passed,
            duration_in_minutes: attempt.duration_in_minutes,
            result: attempt.result,
            test_id: attempt.test_id,
            user_id: attempt.user_id,
            created_at,
        };
        t.attempts.push(row.clone());
        Ok(row)
    }

    async fn update_attempt_score(&self, attempt_id: i64, result: Decimal, is_passed: bool) -> Result<TestResult> {
        let mut t = self.lock();
        let row = t
            .attempts
            .iter_mut()
            .find(|a| a.id == attempt_id)
            .ok_or_else(|| Error::NotFound("Result not found".into()))?;
        row.result = result;
        row.is_passed = is_passed;
        Ok(row.clone())
    }

    async fn get_attempt(&self, attempt_id: i64) -> Result<Option<TestResult>> {
        Ok(self.lock().attempts.iter().find(|a| a.id == attempt_id).cloned())
    }

    async fn latest_attempt(&self, test_id: i64, user_id: i64) -> Result<Option<TestResult>> {
        let rows: Vec<TestResult> = self
            .lock()
            .attempts
            .iter()
            .filter(|a| a.test_id == test_id && a.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(rows).into_iter().next())
    }

    async fn list_user_attempts(&self, user_id: i64) -> Result<Vec<TestResult>> {
        let rows = self
            .lock()
            .attempts
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(rows))
    }

    async fn list_test_attempts(&self, test_id: i64) -> Result<Vec<TestResult>> {
        let rows = self
            .lock()
            .attempts
            .iter()
            .filter(|a| a.test_id == test_id)
            .cloned()
            .collect();
        Ok(newest_first(rows))
    }

    async fn insert_user_answers(&self, answers: &[NewUserAnswer]) -> Result<()> {
        if self.fail_answer_insert.load(Ordering::SeqCst) {
            return Err(Error::Internal("answer table unavailable".into()));
        }
        let mut t = self.lock();
        for a in answers {
            let id = t.next_id();
            t.user_answers.push(UserAnswer {
                id,
                test_result_id: a.test_result_id,
                question_id: a.question_id,
                answer_id: a.answer_id,
                text_answer: a.text_answer.clone(),
                is_correct: a.is_correct,
                time_spent_minutes: a.time_spent_minutes,
            });
        }
        Ok(())
    }

    async fn list_user_answers(&self, attempt_id: i64) -> Result<Vec<UserAnswer>> {
        Ok(self
            .lock()
            .user_answers
            .iter()
            .filter(|a| a.test_result_id == attempt_id)
            .cloned()
            .collect())
    }

    async fn upsert_module_knowledge(
        &self,
        user_id: i64,
        module_id: i64,
        knowledge: Decimal,
        date: NaiveDate,
    ) -> Result<ModuleKnowledge> {
        let mut t = self.lock();
        if let Some(row) = t
            .module_knowledge
            .iter_mut()
            .find(|k| k.user_id == user_id && k.module_id == module_id)
        {
            row.knowledge = knowledge;
            row.date_updated = date;
            return Ok(row.clone());
        }
        let id = t.next_id();
        let row = ModuleKnowledge {
            id,
            user_id,
            module_id,
            knowledge,
            date_updated: date,
        };
        t.module_knowledge.push(row.clone());
        Ok(row)
    }

    async fn get_module_knowledge(&self, user_id: i64, module_id: i64) -> Result<Option<ModuleKnowledge>> {
        Ok(self
            .lock()
            .module_knowledge
            .iter()
            .find(|k| k.user_id == user_id && k.module_id == module_id)
            .cloned())
    }

    async fn list_module_knowledge(&self, user_id: i64) -> Result<Vec<ModuleKnowledge>> {
        Ok(self
            .lock()
            .module_knowledge
            .iter()
            .filter(|k| k.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn upsert_course_knowledge(
        &self,
        user_id: i64,
        course_id: i64,
        knowledge: Decimal,
        date: NaiveDate,
    ) -> Result<CourseKnowledge> {
        let mut t = self.lock();
        if let Some(row) = t
            .course_knowledge
            .iter_mut()
            .find(|k| k.user_id == user_id && k.course_id == course_id)
        {
            row.knowledge = knowledge;
            row.date_updated = date;
            return Ok(row.clone());
        }
        let id = t.next_id();
        let row = CourseKnowledge {
            id,
            user_id,
            course_id,
            knowledge,
            date_updated: date,
        };
        t.course_knowledge.push(row.clone());
        Ok(row)
    }

    async fn get_course_knowledge(&self, user_id: i64, course_id: i64) -> Result<Option<CourseKnowledge>> {
        Ok(self
            .lock()
            .course_knowledge
            .iter()
            .find(|k| k.user_id == user_id && k.course_id == course_id)
            .cloned())
    }

    async fn list_course_knowledge(&self, user_id: i64) -> Result<Vec<CourseKnowledge>> {
        Ok(self
            .lock()
            .course_knowledge
            .iter()
            .filter(|k| k.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_module_passed(&self, user_id: i64, module_id: i64) -> Result<Option<ModulePassed>> {
        Ok(self.passed_row(user_id, module_id))
    }

    async fn upsert_module_passed(
        &self,
        user_id: i64,
        module_id: i64,
        is_passed: bool,
        date_passed: Option<NaiveDate>,
    ) -> Result<ModulePassed> {
        if self.conflict_on_completion_insert.swap(false, Ordering::SeqCst) {
            // A concurrent writer got there first.
            let mut t = self.lock();
            let id = t.next_id();
            t.module_passed.push(ModulePassed {
                id,
                user_id,
                module_id,
                is_passed: false,
                date_passed: None,
            });
            return Err(Error::Conflict("duplicate key value violates unique constraint".into()));
        }
        let mut t = self.lock();
        if let Some(row) = t
            .module_passed
            .iter_mut()
            .find(|r| r.user_id == user_id && r.module_id == module_id)
        {
            row.is_passed = row.is_passed || is_passed;
            row.date_passed = row.date_passed.or(date_passed);
            return Ok(row.clone());
        }
        let id = t.next_id();
        let row = ModulePassed {
            id,
            user_id,
            module_id,
            is_passed,
            date_passed,
        };
        t.module_passed.push(row.clone());
        Ok(row)
    }

    async fn set_module_passed(
        &self,
        id: i64,
        is_passed: bool,
        date_passed: Option<NaiveDate>,
    ) -> Result<ModulePassed> {
        let mut t = self.lock();
        let row = t
            .module_passed
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::NotFound("Completion row not found".into()))?;
        row.is_passed = is_passed;
        row.date_passed = date_passed;
        Ok(row.clone())
    }
}

pub fn scoring(max_attempts: Option<i64>) -> ScoringConfig {
    ScoringConfig {
        max_attempts,
        ..ScoringConfig::default()
    }
}

pub fn app_state(store: Arc<MemoryStore>, max_attempts: Option<i64>) -> AppState {
    AppState::new(store, JWT_SECRET.to_string(), scoring(max_attempts))
}

pub fn token_for(user_id: i64, role: Option<&str>) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (Utc::now().timestamp() + 3600) as usize,
        role: role.map(String::from),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}
