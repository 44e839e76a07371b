pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod seed;
pub mod session;
pub mod state;
pub mod templates;
pub mod utils;
pub mod visits;

use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    routes::routes(&state.config)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
