pub mod attempt_service;
pub mod completion_service;
pub mod knowledge_service;
pub mod recommendation_service;
pub mod scoring_service;
