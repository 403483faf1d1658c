// Library root for the quiz question API

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;

use std::{sync::Arc, time::Duration};

use axum::{
    routing::{get, post},
    Router,
};

// Re-export commonly used types
pub use db::{Database, InMemoryStore, QuestionStore};
pub use error::{ApiError, StoreError};
pub use models::{Choice, CreateQuestionRequest, NewChoice, Question};

/// Store handle shared by every request; built once at startup.
pub type SharedStore = Arc<dyn QuestionStore>;

/// Create the Axum router with all endpoints and middleware
pub fn create_router(store: SharedStore, request_timeout: Duration) -> Router {
    let router = Router::new()
        // Health check endpoints
        .route("/health", get(handlers::health_check))
        .route("/health/ready", get(handlers::readiness_check))
        // Question endpoints
        .route("/question/", post(handlers::questions::create_question))
        .route("/question", post(handlers::questions::create_question))
        // Add shared state (question store)
        .with_state(store);

    middleware::apply_middleware(router, request_timeout)
}
