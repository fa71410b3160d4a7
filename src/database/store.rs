use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::models::course::{Course, Module, Topic};
use crate::models::knowledge::{CourseKnowledge, ModuleKnowledge};
use crate::models::module_passed::ModulePassed;
use crate::models::question::{Answer, Question};
use crate::models::test::Test;
use crate::models::test_result::{NewTestResult, TestResult};
use crate::models::user_answer::{NewUserAnswer, UserAnswer};

/// Everything the assessment engine reads from or writes to persistent storage.
///
/// Each call is its own unit of work; the engine never holds a transaction
/// across calls, so a failure in one stage leaves earlier stages committed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssessmentStore: Send + Sync {
    // Registries owned by the CRUD layer.
    async fn get_test(&self, test_id: i64) -> Result<Option<Test>>;
    async fn list_questions(&self, test_id: i64) -> Result<Vec<Question>>;
    /// Answers of every question in the test.
    async fn list_answers_for_test(&self, test_id: i64) -> Result<Vec<Answer>>;
    async fn get_module(&self, module_id: i64) -> Result<Option<Module>>;
    async fn get_course(&self, course_id: i64) -> Result<Option<Course>>;
    /// Modules of a course in ascending id order.
    async fn list_course_modules(&self, course_id: i64) -> Result<Vec<Module>>;
    async fn list_module_tests(&self, module_id: i64) -> Result<Vec<Test>>;
    async fn list_topics(&self, topic_ids: &[i64]) -> Result<Vec<Topic>>;
    async fn is_enrolled(&self, user_id: i64, course_id: i64) -> Result<bool>;

    // Attempt ledger.
    async fn count_attempts(&self, test_id: i64, user_id: i64) -> Result<i64>;
    async fn insert_attempt(&self, attempt: &NewTestResult) -> Result<TestResult>;
    async fn update_attempt_score(
        &self,
        attempt_id: i64,
        result: Decimal,
        is_passed: bool,
    ) -> Result<TestResult>;
    async fn get_attempt(&self, attempt_id: i64) -> Result<Option<TestResult>>;
    /// Most recent attempt by creation order.
    async fn latest_attempt(&self, test_id: i64, user_id: i64) -> Result<Option<TestResult>>;
    async fn list_user_attempts(&self, user_id: i64) -> Result<Vec<TestResult>>;
    async fn list_test_attempts(&self, test_id: i64) -> Result<Vec<TestResult>>;
    async fn insert_user_answers(&self, answers: &[NewUserAnswer]) -> Result<()>;
    async fn list_user_answers(&self, attempt_id: i64) -> Result<Vec<UserAnswer>>;

    // Knowledge aggregates, one row per pair.
    async fn upsert_module_knowledge(
        &self,
        user_id: i64,
        module_id: i64,
        knowledge: Decimal,
        date: NaiveDate,
    ) -> Result<ModuleKnowledge>;
    async fn get_module_knowledge(
        &self,
        user_id: i64,
        module_id: i64,
    ) -> Result<Option<ModuleKnowledge>>;
    async fn list_module_knowledge(&self, user_id: i64) -> Result<Vec<ModuleKnowledge>>;
    async fn upsert_course_knowledge(
        &self,
        user_id: i64,
        course_id: i64,
        knowledge: Decimal,
        date: NaiveDate,
    ) -> Result<CourseKnowledge>;
    async fn get_course_knowledge(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> Result<Option<CourseKnowledge>>;
    async fn list_course_knowledge(&self, user_id: i64) -> Result<Vec<CourseKnowledge>>;

    // Module completion.
    async fn get_module_passed(&self, user_id: i64, module_id: i64)
        -> Result<Option<ModulePassed>>;
    /// Insert-or-update keyed on (user, module). An existing `true` is kept.
    async fn upsert_module_passed(
        &self,
        user_id: i64,
        module_id: i64,
        is_passed: bool,
        date_passed: Option<NaiveDate>,
    ) -> Result<ModulePassed>;
    async fn set_module_passed(
        &self,
        id: i64,
        is_passed: bool,
        date_passed: Option<NaiveDate>,
    ) -> Result<ModulePassed>;
}
