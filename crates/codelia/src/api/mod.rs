mod analysis;
mod config;
mod error;
mod history;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use codelia_core::AnalysisService;
use codelia_db::Database;
use codelia_logging::Logger;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AnalysisService>,
    pub db: Arc<Database>,
    pub logger: Arc<Logger>,
}

pub fn create_router(
    service: Arc<AnalysisService>,
    db: Arc<Database>,
    logger: Arc<Logger>,
) -> Router {
    let state = AppState {
        service,
        db,
        logger,
    };

    Router::new()
        .route(
            "/api/config",
            get(config::get_config).post(config::update_config),
        )
        .route("/api/evaluate", post(analysis::evaluate))
        .route("/api/improve", post(analysis::improve))
        .route(
            "/api/history",
            get(history::list_history).post(history::save_history),
        )
        .route("/api/history/delete", post(history::delete_history))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
