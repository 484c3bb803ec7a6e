use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::features::open_dates::handlers;
use crate::features::open_dates::services::OpenDateService;

/// Create routes for the open dates feature
pub fn routes(service: Arc<OpenDateService>) -> Router {
    Router::new()
        .route("/api/open-dates", post(handlers::create_open_date))
        .route("/api/open-dates/{id}", get(handlers::get_open_date))
        .route(
            "/api/open-dates/{id}/visibility",
            patch(handlers::update_open_date_visibility),
        )
        .with_state(service)
}
