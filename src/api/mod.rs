use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::tool::LlmSearch;

pub mod handlers;

pub fn create_router(tool: Arc<LlmSearch>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/llm_search", post(handlers::llm_search_handler))
        .route("/api/health", get(handlers::health_handler))
        .with_state(tool)
        .layer(ServiceBuilder::new().layer(cors))
}
