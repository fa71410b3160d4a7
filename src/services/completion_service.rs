use std::sync::Arc;

use rust_decimal::Decimal;

use crate::config::ScoringConfig;
use crate::database::AssessmentStore;
use crate::error::{Error, Result};
use crate::models::module_passed::ModulePassed;
use crate::models::user::CurrentUser;
use crate::utils::percent::to_decimal;
use crate::utils::time::today;

/// What triggered a completion update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompletionUpdate {
    /// A fresh attempt on one of the module's tests. Only seeds a missing row.
    Attempt { passed: bool },
    /// A freshly recomputed module knowledge value.
    Knowledge { percent: Decimal },
}

/// Module completion gate. Completion is monotonic: a passed module never
/// goes back to failed.
#[derive(Clone)]
pub struct CompletionService {
    store: Arc<dyn AssessmentStore>,
    config: ScoringConfig,
}

impl CompletionService {
    pub fn new(store: Arc<dyn AssessmentStore>, config: ScoringConfig) -> Self {
        Self { store, config }
    }

    fn reaches_threshold(&self, percent: Decimal) -> bool {
        percent >= to_decimal(self.config.pass_threshold)
    }

    /// Returns the row as it stands after the update, or `None` when a
    /// conflicting insert left nothing to update.
    pub async fn update_completion(
        &self,
        user_id: i64,
        module_id: i64,
        update: CompletionUpdate,
    ) -> Result<Option<ModulePassed>> {
        match self.store.get_module_passed(user_id, module_id).await? {
            Some(row) if row.is_passed => Ok(Some(row)),
            Some(row) => match update {
                CompletionUpdate::Knowledge { percent } if self.reaches_threshold(percent) => {
                    tracing::info!(user_id, module_id, %percent, "Module passed");
                    let row = self
                        .store
                        .set_module_passed(row.id, true, Some(today()))
                        .await?;
                    Ok(Some(row))
                }
                _ => Ok(Some(row)),
            },
            None => {
                let passed = match update {
                    CompletionUpdate::Attempt { passed } => passed,
                    CompletionUpdate::Knowledge { percent } => self.reaches_threshold(percent),
                };
                let date_passed = passed.then(today);
                match self
                    .store
                    .upsert_module_passed(user_id, module_id, passed, date_passed)
                    .await
                {
                    Ok(row) => Ok(Some(row)),
                    Err(Error::Conflict(msg)) => {
                        tracing::warn!(user_id, module_id, "Completion insert conflicted: {}", msg);
                        self.recover_conflict(user_id, module_id, passed).await
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }

    async fn recover_conflict(
        &self,
        user_id: i64,
        module_id: i64,
        passed: bool,
    ) -> Result<Option<ModulePassed>> {
        let Some(row) = self.store.get_module_passed(user_id, module_id).await? else {
            tracing::warn!(user_id, module_id, "No completion row to update after conflict");
            return Ok(None);
        };
        if row.is_passed || !passed {
            return Ok(Some(row));
        }
        let row = self
            .store
            .set_module_passed(row.id, true, Some(today()))
            .await?;
        Ok(Some(row))
    }

    /// Sequential gating. Modules are ordered by id; module `i` opens once
    /// module `i - 1` is passed. Authors and admins always pass through.
    pub async fn is_module_unlocked(&self, user: &CurrentUser, module_id: i64) -> Result<bool> {
        Ok(self.check_access(user, module_id).await?.is_none())
    }

    /// Same walk as [`Self::is_module_unlocked`], failing with `Forbidden`.
    pub async fn ensure_module_access(&self, user: &CurrentUser, module_id: i64) -> Result<()> {
        match self.check_access(user, module_id).await? {
            None => Ok(()),
            Some(reason) => Err(Error::Forbidden(reason.to_string())),
        }
    }

    async fn check_access(&self, user: &CurrentUser, module_id: i64) -> Result<Option<&'static str>> {
        let module = self
            .store
            .get_module(module_id)
            .await?
            .ok_or_else(|| Error::NotFound("Module not found".to_string()))?;
        let course = self
            .store
            .get_course(module.course_id)
            .await?
            .ok_or_else(|| Error::NotFound("Course not found".to_string()))?;

        if user.is_admin() || course.author_id == user.id {
            return Ok(None);
        }
        if !self.store.is_enrolled(user.id, course.id).await? {
            return Ok(Some("Not enrolled"));
        }

        let modules = self.store.list_course_modules(course.id).await?;
        let idx = modules
            .iter()
            .position(|m| m.id == module_id)
            .ok_or_else(|| Error::NotFound("Module not found".to_string()))?;
        if idx == 0 {
            return Ok(None);
        }

        let previous = &modules[idx - 1];
        let passed = self
            .store
            .get_module_passed(user.id, previous.id)
            .await?
            .map(|row| row.is_passed)
            .unwrap_or(false);
        Ok(if passed { None } else { Some("Module locked") })
    }
}
