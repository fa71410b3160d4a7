use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Completion flag per (user, module). Once `is_passed` is true it stays true.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ModulePassed {
    pub id: i64,
    pub user_id: i64,
    pub module_id: i64,
    pub is_passed: bool,
    pub date_passed: Option<NaiveDate>,
}
