use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use shared_config::AppConfig;

use crate::handlers;

pub fn slot_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::book_slot))
        .route("/{date}", get(handlers::get_available_slots))
        .with_state(state)
}
