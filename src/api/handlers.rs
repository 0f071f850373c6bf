use axum::{Json, extract::State, http::StatusCode};
use std::sync::Arc;
use std::time::Instant;

use crate::data_models::SearchOutput;
use crate::tool::{LlmSearch, LlmSearchRequest};

pub async fn llm_search_handler(
    State(tool): State<Arc<LlmSearch>>,
    Json(request): Json<LlmSearchRequest>,
) -> Result<Json<SearchOutput>, (StatusCode, String)> {
    let start = Instant::now();

    if request.query.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Query cannot be empty".to_string()));
    }

    let output = tool.llm_search(&request).await.map_err(|e| {
        log::error!("search failed for {:?}: {:#}", request.query, e);
        (StatusCode::BAD_GATEWAY, format!("Search error: {}", e))
    })?;

    log::info!(
        "llm_search {:?} crawl={} answered in {}ms",
        request.query,
        request.crawl.unwrap_or(false),
        start.elapsed().as_millis()
    );
    Ok(Json(output))
}

pub async fn health_handler() -> &'static str {
    "ok"
}
