use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One submission of a test by a user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TestResult {
    pub id: i64,
    pub score_in_points: i64,
    pub is_passed: bool,
    pub duration_in_minutes: f64,
    pub result: Decimal,
    pub test_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTestResult {
    pub score_in_points: i64,
    pub is_passed: bool,
    pub duration_in_minutes: f64,
    pub result: Decimal,
    pub test_id: i64,
    pub user_id: i64,
}
