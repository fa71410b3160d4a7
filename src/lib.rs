pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::config::ScoringConfig;
use crate::database::AssessmentStore;
use crate::services::{
    attempt_service::AttemptService, completion_service::CompletionService,
    knowledge_service::KnowledgeService,
};

#[derive(Clone)]
pub struct AppState {
    pub jwt_secret: String,
    pub attempt_service: AttemptService,
    pub knowledge_service: KnowledgeService,
    pub completion_service: CompletionService,
}

impl AppState {
    pub fn new(store: Arc<dyn AssessmentStore>, jwt_secret: String, scoring: ScoringConfig) -> Self {
        let completion_service = CompletionService::new(store.clone(), scoring.clone());
        let knowledge_service = KnowledgeService::new(store.clone(), completion_service.clone());
        let attempt_service = AttemptService::new(
            store,
            scoring,
            completion_service.clone(),
            knowledge_service.clone(),
        );

        Self {
            jwt_secret,
            attempt_service,
            knowledge_service,
            completion_service,
        }
    }
}
