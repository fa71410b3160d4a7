use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::database::store::AssessmentStore;
use crate::error::Result;
use crate::models::course::{Course, Module, Topic};
use crate::models::knowledge::{CourseKnowledge, ModuleKnowledge};
use crate::models::module_passed::ModulePassed;
use crate::models::question::{Answer, Question};
use crate::models::test::Test;
use crate::models::test_result::{NewTestResult, TestResult};
use crate::models::user_answer::{NewUserAnswer, UserAnswer};

const TEST_COLUMNS: &str =
    "id, name, description, duration_in_minutes, module_id, course_id, created_at";
const RESULT_COLUMNS: &str =
    "id, score_in_points, is_passed, duration_in_minutes, result, test_id, user_id, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssessmentStore for PgStore {
    async fn get_test(&self, test_id: i64) -> Result<Option<Test>> {
        let test = sqlx::query_as::<_, Test>(&format!(
            "SELECT {} FROM tests WHERE id = $1",
            TEST_COLUMNS
        ))
        .bind(test_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(test)
    }

    async fn list_questions(&self, test_id: i64) -> Result<Vec<Question>> {
        let rows = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, test_id, text, complexity_points, question_type, topic_id
            FROM questions
            WHERE test_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_answers_for_test(&self, test_id: i64) -> Result<Vec<Answer>> {
        let rows = sqlx::query_as::<_, Answer>(
            r#"
            SELECT a.id, a.question_id, a.is_correct, a.text
            FROM answers a
            JOIN questions q ON q.id = a.question_id
            WHERE q.test_id = $1
            ORDER BY a.id ASC
            "#,
        )
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_module(&self, module_id: i64) -> Result<Option<Module>> {
        let module =
            sqlx::query_as::<_, Module>("SELECT id, name, course_id FROM modules WHERE id = $1")
                .bind(module_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(module)
    }

    async fn get_course(&self, course_id: i64) -> Result<Option<Course>> {
        let course = sqlx::query_as::<_, Course>(
            "SELECT id, name, author_id, is_published FROM courses WHERE id = $1",
        )
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(course)
    }

    async fn list_course_modules(&self, course_id: i64) -> Result<Vec<Module>> {
        let rows = sqlx::query_as::<_, Module>(
            "SELECT id, name, course_id FROM modules WHERE course_id = $1 ORDER BY id ASC",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_module_tests(&self, module_id: i64) -> Result<Vec<Test>> {
        let rows = sqlx::query_as::<_, Test>(&format!(
            "SELECT {} FROM tests WHERE module_id = $1 ORDER BY id ASC",
            TEST_COLUMNS
        ))
        .bind(module_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_topics(&self, topic_ids: &[i64]) -> Result<Vec<Topic>> {
        if topic_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder =
            QueryBuilder::<Postgres>::new("SELECT id, name, module_id FROM topics WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in topic_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY id ASC");

        let rows = builder
            .build_query_as::<Topic>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn is_enrolled(&self, user_id: i64, course_id: i64) -> Result<bool> {
        let enrolled: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM course_enrollments
                WHERE user_id = $1 AND course_id = $2 AND date_ended IS NULL
            )
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(enrolled)
    }

    async fn count_attempts(&self, test_id: i64, user_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM test_results WHERE test_id = $1 AND user_id = $2",
        )
        .bind(test_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn insert_attempt(&self, attempt: &NewTestResult) -> Result<TestResult> {
        let row = sqlx::query_as::<_, TestResult>(&format!(
            r#"
            INSERT INTO test_results (
                score_in_points, is_passed, duration_in_minutes, result, test_id, user_id
            ) VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            RESULT_COLUMNS
        ))
        .bind(attempt.score_in_points)
        .bind(attempt.is_passed)
        .bind(attempt.duration_in_minutes)
        .bind(attempt.result)
        .bind(attempt.test_id)
        .bind(attempt.user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_attempt_score(
        &self,
        attempt_id: i64,
        result: Decimal,
        is_passed: bool,
    ) -> Result<TestResult> {
        let row = sqlx::query_as::<_, TestResult>(&format!(
            "UPDATE test_results SET result = $2, is_passed = $3 WHERE id = $1 RETURNING {}",
            RESULT_COLUMNS
        ))
        .bind(attempt_id)
        .bind(result)
        .bind(is_passed)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_attempt(&self, attempt_id: i64) -> Result<Option<TestResult>> {
        let row = sqlx::query_as::<_, TestResult>(&format!(
            "SELECT {} FROM test_results WHERE id = $1",
            RESULT_COLUMNS
        ))
        .bind(attempt_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn latest_attempt(&self, test_id: i64, user_id: i64) -> Result<Option<TestResult>> {
        let row = sqlx::query_as::<_, TestResult>(&format!(
            r#"
            SELECT {} FROM test_results
            WHERE test_id = $1 AND user_id = $2
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
            RESULT_COLUMNS
        ))
        .bind(test_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_user_attempts(&self, user_id: i64) -> Result<Vec<TestResult>> {
        let rows = sqlx::query_as::<_, TestResult>(&format!(
            "SELECT {} FROM test_results WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
            RESULT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_test_attempts(&self, test_id: i64) -> Result<Vec<TestResult>> {
        let rows = sqlx::query_as::<_, TestResult>(&format!(
            "SELECT {} FROM test_results WHERE test_id = $1 ORDER BY created_at DESC, id DESC",
            RESULT_COLUMNS
        ))
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_user_answers(&self, answers: &[NewUserAnswer]) -> Result<()> {
        if answers.is_empty() {
            return Ok(());
        }
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO user_answers \
             (test_result_id, question_id, answer_id, text_answer, is_correct, time_spent_minutes) ",
        );
        builder.push_values(answers, |mut row, a| {
            row.push_bind(a.test_result_id)
                .push_bind(a.question_id)
                .push_bind(a.answer_id)
                .push_bind(a.text_answer.clone())
                .push_bind(a.is_correct)
                .push_bind(a.time_spent_minutes);
        });
        builder.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn list_user_answers(&self, attempt_id: i64) -> Result<Vec<UserAnswer>> {
        let rows = sqlx::query_as::<_, UserAnswer>(
            r#"
            SELECT id, test_result_id, question_id, answer_id, text_answer, is_correct, time_spent_minutes
            FROM user_answers
            WHERE test_result_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(attempt_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn upsert_module_knowledge(
        &self,
        user_id: i64,
        module_id: i64,
        knowledge: Decimal,
        date: NaiveDate,
    ) -> Result<ModuleKnowledge> {
        let row = sqlx::query_as::<_, ModuleKnowledge>(
            r#"
            INSERT INTO module_knowledge (user_id, module_id, knowledge, date_updated)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, module_id) DO UPDATE SET
                knowledge = EXCLUDED.knowledge,
                date_updated = EXCLUDED.date_updated
            RETURNING id, user_id, module_id, knowledge, date_updated
            "#,
        )
        .bind(user_id)
        .bind(module_id)
        .bind(knowledge)
        .bind(date)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_module_knowledge(
        &self,
        user_id: i64,
        module_id: i64,
    ) -> Result<Option<ModuleKnowledge>> {
        let row = sqlx::query_as::<_, ModuleKnowledge>(
            r#"
            SELECT id, user_id, module_id, knowledge, date_updated
            FROM module_knowledge
            WHERE user_id = $1 AND module_id = $2
            "#,
        )
        .bind(user_id)
        .bind(module_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_module_knowledge(&self, user_id: i64) -> Result<Vec<ModuleKnowledge>> {
        let rows = sqlx::query_as::<_, ModuleKnowledge>(
            r#"
            SELECT id, user_id, module_id, knowledge, date_updated
            FROM module_knowledge
            WHERE user_id = $1
            ORDER BY module_id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn upsert_course_knowledge(
        &self,
        user_id: i64,
        course_id: i64,
        knowledge: Decimal,
        date: NaiveDate,
    ) -> Result<CourseKnowledge> {
        let row = sqlx::query_as::<_, CourseKnowledge>(
            r#"
            INSERT INTO course_knowledge (user_id, course_id, knowledge, date_updated)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, course_id) DO UPDATE SET
                knowledge = EXCLUDED.knowledge,
                date_updated = EXCLUDED.date_updated
            RETURNING id, user_id, course_id, knowledge, date_updated
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .bind(knowledge)
        .bind(date)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_course_knowledge(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> Result<Option<CourseKnowledge>> {
        let row = sqlx::query_as::<_, CourseKnowledge>(
            r#"
            SELECT id, user_id, course_id, knowledge, date_updated
            FROM course_knowledge
            WHERE user_id = $1 AND course_id = $2
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_course_knowledge(&self, user_id: i64) -> Result<Vec<CourseKnowledge>> {
        let rows = sqlx::query_as::<_, CourseKnowledge>(
            r#"
            SELECT id, user_id, course_id, knowledge, date_updated
            FROM course_knowledge
            WHERE user_id = $1
            ORDER BY course_id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_module_passed(
        &self,
        user_id: i64,
        module_id: i64,
    ) -> Result<Option<ModulePassed>> {
        let row = sqlx::query_as::<_, ModulePassed>(
            r#"
            SELECT id, user_id, module_id, is_passed, date_passed
            FROM module_passed
            WHERE user_id = $1 AND module_id = $2
            "#,
        )
        .bind(user_id)
        .bind(module_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn upsert_module_passed(
        &self,
        user_id: i64,
        module_id: i64,
        is_passed: bool,
        date_passed: Option<NaiveDate>,
    ) -> Result<ModulePassed> {
        let row = sqlx::query_as::<_, ModulePassed>(
            r#"
            INSERT INTO module_passed (user_id, module_id, is_passed, date_passed)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, module_id) DO UPDATE SET
                is_passed = module_passed.is_passed OR EXCLUDED.is_passed,
                date_passed = COALESCE(module_passed.date_passed, EXCLUDED.date_passed)
            RETURNING id, user_id, module_id, is_passed, date_passed
            "#,
        )
        .bind(user_id)
        .bind(module_id)
        .bind(is_passed)
        .bind(date_passed)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn set_module_passed(
        &self,
        id: i64,
        is_passed: bool,
        date_passed: Option<NaiveDate>,
    ) -> Result<ModulePassed> {
        let row = sqlx::query_as::<_, ModulePassed>(
            r#"
            UPDATE module_passed
            SET is_passed = is_passed OR $2,
                date_passed = COALESCE(date_passed, $3)
            WHERE id = $1
            RETURNING id, user_id, module_id, is_passed, date_passed
            "#,
        )
        .bind(id)
        .bind(is_passed)
        .bind(date_passed)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}
