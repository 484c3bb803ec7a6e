//! Contributor routes

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::contributors::handlers;
use crate::features::contributors::services::ContributorService;

/// Create routes for the contributors feature
pub fn routes(service: Arc<ContributorService>) -> Router {
    Router::new()
        .route(
            "/api/contributors",
            post(handlers::create_contributor).get(handlers::list_contributors),
        )
        .route(
            "/api/contributors/{identifier}",
            get(handlers::get_contributor)
                .put(handlers::update_contributor)
                .delete(handlers::delete_contributor),
        )
        .route(
            "/api/contributors/{identifier}/edit",
            get(handlers::get_contributor_edit_form),
        )
        .route(
            "/api/contributors/{identifier}/open-dates/public",
            get(handlers::list_public_open_dates),
        )
        // Administrators
        .route(
            "/api/contributors/{identifier}/admins/{user_id}",
            post(handlers::add_admin).delete(handlers::remove_admin),
        )
        .route(
            "/api/contributors/{identifier}/super-admins/{user_id}",
            post(handlers::add_super_admin).delete(handlers::remove_super_admin),
        )
        // Open date relations
        .route(
            "/api/contributors/{identifier}/owned-open-dates/{open_date_id}",
            post(handlers::add_owned_open_date).delete(handlers::remove_owned_open_date),
        )
        .route(
            "/api/contributors/{identifier}/invited-open-dates/{open_date_id}",
            post(handlers::add_invited_open_date).delete(handlers::remove_invited_open_date),
        )
        // Troupe membership
        .route(
            "/api/contributors/{identifier}/teams/{team_identifier}",
            post(handlers::add_team).delete(handlers::remove_team),
        )
        .with_state(service)
}
