use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod error;
pub mod handlers;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{AppState, Session};

pub async fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();
    let state = Arc::new(state);
    state.spawn_sweeper();

    Router::new()
        .route("/api/countries", get(handlers::list_countries))
        .route("/api/sessions", post(handlers::create_session))
        .route("/api/sessions/:id", delete(handlers::delete_session))
        .route("/api/sessions/:id/overview", get(handlers::get_overview))
        .route("/api/sessions/:id/reports", get(handlers::get_reports))
        .route("/api/sessions/:id/summary/pillars", get(handlers::get_pillar_summary))
        .route("/api/sessions/:id/summary/weekly", get(handlers::get_weekly_summary))
        .route("/api/sessions/:id/cooccurrence", get(handlers::get_cooccurrence))
        .route("/api/sessions/:id/frequency", post(handlers::post_frequency))
        .route("/api/sessions/:id/topics", post(handlers::post_topics))
        .route("/api/sessions/:id/topics/view", get(handlers::get_topic_view))
        .route("/api/sessions/:id/search", post(handlers::post_search))
        .layer(cors)
        .with_state(state)
}

pub mod prelude {
    pub use crate::{create_app, ApiError, AppState};
    pub use rol_core::{Country, DashboardConfig, Error, Result};
}
