use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ModuleKnowledge {
    pub id: i64,
    pub user_id: i64,
    pub module_id: i64,
    pub knowledge: Decimal,
    pub date_updated: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CourseKnowledge {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub knowledge: Decimal,
    pub date_updated: NaiveDate,
}
