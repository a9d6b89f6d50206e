pub mod health;

use axum::{routing::get, Router};

use crate::routines::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/routines",
            get(handlers::handle_list_routines).post(handlers::handle_create_routine),
        )
        .with_state(state)
}
