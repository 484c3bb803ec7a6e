use utoipa::{Modify, OpenApi};

use crate::features::contributors::{
    dtos as contributors_dtos, handlers as contributors_handlers, models as contributors_models,
};
use crate::features::open_dates::{dtos as open_dates_dtos, handlers as open_dates_handlers};
use crate::features::users::{dtos as users_dtos, handlers as users_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Users
        users_handlers::create_user,
        users_handlers::get_user,
        // Contributors
        contributors_handlers::create_contributor,
        contributors_handlers::list_contributors,
        contributors_handlers::get_contributor,
        contributors_handlers::get_contributor_edit_form,
        contributors_handlers::update_contributor,
        contributors_handlers::delete_contributor,
        contributors_handlers::list_public_open_dates,
        contributors_handlers::add_admin,
        contributors_handlers::remove_admin,
        contributors_handlers::add_super_admin,
        contributors_handlers::remove_super_admin,
        contributors_handlers::add_owned_open_date,
        contributors_handlers::remove_owned_open_date,
        contributors_handlers::add_invited_open_date,
        contributors_handlers::remove_invited_open_date,
        contributors_handlers::add_team,
        contributors_handlers::remove_team,
        // Open dates
        open_dates_handlers::create_open_date,
        open_dates_handlers::get_open_date,
        open_dates_handlers::update_open_date_visibility,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Users
            users_dtos::CreateUserDto,
            users_dtos::UserResponseDto,
            ApiResponse<users_dtos::UserResponseDto>,
            // Contributors
            contributors_models::ContributorType,
            contributors_dtos::CreateContributorDto,
            contributors_dtos::ContributorEditFormDto,
            contributors_dtos::ContributorResponseDto,
            ApiResponse<contributors_dtos::ContributorResponseDto>,
            ApiResponse<Vec<contributors_dtos::ContributorResponseDto>>,
            ApiResponse<contributors_dtos::ContributorEditFormDto>,
            // Open dates
            open_dates_dtos::CreateOpenDateDto,
            open_dates_dtos::UpdateVisibilityDto,
            open_dates_dtos::OpenDateResponseDto,
            ApiResponse<open_dates_dtos::OpenDateResponseDto>,
            ApiResponse<Vec<open_dates_dtos::OpenDateResponseDto>>,
        )
    ),
    tags(
        (name = "users", description = "User accounts"),
        (name = "contributors", description = "Troupes, teams, improvisators and improv groups"),
        (name = "open-dates", description = "Open dates on contributor calendars"),
    ),
    info(
        title = "Improv Agenda API",
        version = "0.1.0",
        description = "API documentation for Improv Agenda",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
