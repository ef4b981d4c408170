use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use shared_config::AppConfig;
use slot_cell::router::slot_routes;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Slot Booking API is running!" }))
        .nest("/api/slots", slot_routes(state))
}
