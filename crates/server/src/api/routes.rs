use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::{handlers, search, tabs, webhook};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Search
        .route("/search", get(search::search))
        // Tabs and conversion
        .route("/tab/{id}", get(tabs::get_tab))
        .route("/onsong", post(tabs::onsong))
        .route("/format", post(tabs::format))
        // Webhook destination and delivery
        .route(
            "/webhook/config",
            get(webhook::get_config)
                .post(webhook::save_config)
                .delete(webhook::clear_config),
        )
        .route("/webhook/test", post(webhook::test))
        .route("/webhook/send", post(webhook::send))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
