pub mod contributors;
pub mod open_dates;
pub mod users;

use std::sync::Arc;

use axum::Router;

use crate::modules::persistence::Repository;

/// Every feature's routes over one repository
pub fn routes(repository: Arc<dyn Repository>) -> Router {
    let user_service = Arc::new(users::UserService::new(Arc::clone(&repository)));
    let contributor_service = Arc::new(contributors::ContributorService::new(Arc::clone(
        &repository,
    )));
    let open_date_service = Arc::new(open_dates::OpenDateService::new(repository));

    Router::new()
        .merge(users::routes::routes(user_service))
        .merge(contributors::routes::routes(contributor_service))
        .merge(open_dates::routes::routes(open_date_service))
}
