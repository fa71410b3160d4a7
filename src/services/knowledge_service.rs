use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::database::AssessmentStore;
use crate::error::{Error, Result};
use crate::models::knowledge::{CourseKnowledge, ModuleKnowledge};
use crate::services::completion_service::{CompletionService, CompletionUpdate};
use crate::utils::percent::mean;
use crate::utils::time::today;

/// Mastery aggregates per (user, module) and (user, course).
///
/// Module knowledge is the mean over the module's tests of the latest
/// attempt's stored percentage; a test without attempts contributes 0.
/// Course knowledge is the mean of the persisted module values.
#[derive(Clone)]
pub struct KnowledgeService {
    store: Arc<dyn AssessmentStore>,
    completion: CompletionService,
}

impl KnowledgeService {
    pub fn new(store: Arc<dyn AssessmentStore>, completion: CompletionService) -> Self {
        Self { store, completion }
    }

    pub async fn recompute_module_knowledge(&self, user_id: i64, module_id: i64) -> Result<Decimal> {
        let tests = self.store.list_module_tests(module_id).await?;
        let mut per_test = Vec::with_capacity(tests.len());
        for test in &tests {
            let latest = self.store.latest_attempt(test.id, user_id).await?;
            per_test.push(latest.map(|a| a.result).unwrap_or(Decimal::ZERO));
        }
        let knowledge = mean(&per_test);

        self.store
            .upsert_module_knowledge(user_id, module_id, knowledge, today())
            .await?;
        tracing::debug!(user_id, module_id, %knowledge, tests = tests.len(), "Module knowledge updated");

        if let Err(e) = self
            .completion
            .update_completion(user_id, module_id, CompletionUpdate::Knowledge { percent: knowledge })
            .await
        {
            tracing::warn!(user_id, module_id, "Completion update failed: {:?}", e);
        }

        Ok(knowledge)
    }

    pub async fn recompute_course_knowledge(&self, user_id: i64, course_id: i64) -> Result<Decimal> {
        let modules = self.store.list_course_modules(course_id).await?;
        let stored: HashMap<i64, Decimal> = self
            .store
            .list_module_knowledge(user_id)
            .await?
            .into_iter()
            .map(|k| (k.module_id, k.knowledge))
            .collect();

        let mut per_module = Vec::with_capacity(modules.len());
        for module in &modules {
            let value = match stored.get(&module.id) {
                Some(value) => *value,
                None => self.recompute_module_knowledge(user_id, module.id).await?,
            };
            per_module.push(value);
        }
        let knowledge = mean(&per_module);

        self.store
            .upsert_course_knowledge(user_id, course_id, knowledge, today())
            .await?;
        tracing::debug!(user_id, course_id, %knowledge, modules = modules.len(), "Course knowledge updated");

        Ok(knowledge)
    }

    /// Stored value for the pair, `None` when nothing was computed yet.
    pub async fn module_knowledge(&self, user_id: i64, module_id: i64) -> Result<Option<ModuleKnowledge>> {
        if self.store.get_module(module_id).await?.is_none() {
            return Err(Error::NotFound("Module not found".to_string()));
        }
        self.store.get_module_knowledge(user_id, module_id).await
    }

    pub async fn course_knowledge(&self, user_id: i64, course_id: i64) -> Result<Option<CourseKnowledge>> {
        if self.store.get_course(course_id).await?.is_none() {
            return Err(Error::NotFound("Course not found".to_string()));
        }
        self.store.get_course_knowledge(user_id, course_id).await
    }

    pub async fn list_module_knowledge(&self, user_id: i64) -> Result<Vec<ModuleKnowledge>> {
        self.store.list_module_knowledge(user_id).await
    }

    pub async fn list_course_knowledge(&self, user_id: i64) -> Result<Vec<CourseKnowledge>> {
        self.store.list_course_knowledge(user_id).await
    }
}
