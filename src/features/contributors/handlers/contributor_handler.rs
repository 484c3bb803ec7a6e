use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::contributors::dtos::{
    ContributorEditFormDto, ContributorQueryParams, ContributorResponseDto, CreateContributorDto,
};
use crate::features::contributors::services::{ContributorService, RelationOutcome};
use crate::features::open_dates::dtos::OpenDateResponseDto;
use crate::shared::types::ApiResponse;

fn relation_response(
    (contributor, changed): RelationOutcome,
    changed_message: &str,
) -> Json<ApiResponse<ContributorResponseDto>> {
    let message = if changed {
        changed_message
    } else {
        "Nothing to change"
    };
    Json(ApiResponse::success(
        Some(contributor),
        Some(message.to_string()),
        None,
    ))
}

// ==================== Contributor Handlers ====================

/// Create a contributor
#[utoipa::path(
    post,
    path = "/api/contributors",
    request_body = CreateContributorDto,
    responses(
        (status = 201, description = "Contributor created", body = ApiResponse<ContributorResponseDto>),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Creator or troupe not found")
    ),
    tag = "contributors"
)]
pub async fn create_contributor(
    State(service): State<Arc<ContributorService>>,
    AppJson(dto): AppJson<CreateContributorDto>,
) -> Result<(StatusCode, Json<ApiResponse<ContributorResponseDto>>)> {
    let contributor = service.create(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(contributor),
            Some("Contributor created".to_string()),
            None,
        )),
    ))
}

/// List contributors, optionally of one type
#[utoipa::path(
    get,
    path = "/api/contributors",
    params(ContributorQueryParams),
    responses(
        (status = 200, description = "Page of contributors", body = ApiResponse<Vec<ContributorResponseDto>>)
    ),
    tag = "contributors"
)]
pub async fn list_contributors(
    State(service): State<Arc<ContributorService>>,
    Query(params): Query<ContributorQueryParams>,
) -> Result<Json<ApiResponse<Vec<ContributorResponseDto>>>> {
    let (contributors, total) = service.list(&params).await?;
    Ok(Json(ApiResponse::listed(contributors, total)))
}

/// Get a contributor by identifier
#[utoipa::path(
    get,
    path = "/api/contributors/{identifier}",
    params(
        ("identifier" = String, Path, description = "Contributor identifier slug")
    ),
    responses(
        (status = 200, description = "Contributor details", body = ApiResponse<ContributorResponseDto>),
        (status = 404, description = "Contributor not found")
    ),
    tag = "contributors"
)]
pub async fn get_contributor(
    State(service): State<Arc<ContributorService>>,
    Path(identifier): Path<String>,
) -> Result<Json<ApiResponse<ContributorResponseDto>>> {
    let contributor = service.get(&identifier).await?;
    Ok(Json(ApiResponse::success(Some(contributor), None, None)))
}

/// Current values of a contributor's edit form
#[utoipa::path(
    get,
    path = "/api/contributors/{identifier}/edit",
    params(
        ("identifier" = String, Path, description = "Contributor identifier slug")
    ),
    responses(
        (status = 200, description = "Edit form values", body = ApiResponse<ContributorEditFormDto>),
        (status = 404, description = "Contributor not found")
    ),
    tag = "contributors"
)]
pub async fn get_contributor_edit_form(
    State(service): State<Arc<ContributorService>>,
    Path(identifier): Path<String>,
) -> Result<Json<ApiResponse<ContributorEditFormDto>>> {
    let form = service.edit_form(&identifier).await?;
    Ok(Json(ApiResponse::success(Some(form), None, None)))
}

/// Submit a contributor's edit form
///
/// Changing `shortName` regenerates the identifier; the response carries the
/// new one.
#[utoipa::path(
    put,
    path = "/api/contributors/{identifier}",
    params(
        ("identifier" = String, Path, description = "Contributor identifier slug")
    ),
    request_body = ContributorEditFormDto,
    responses(
        (status = 200, description = "Contributor updated", body = ApiResponse<ContributorResponseDto>),
        (status = 400, description = "Invalid form"),
        (status = 404, description = "Contributor not found")
    ),
    tag = "contributors"
)]
pub async fn update_contributor(
    State(service): State<Arc<ContributorService>>,
    Path(identifier): Path<String>,
    AppJson(form): AppJson<ContributorEditFormDto>,
) -> Result<Json<ApiResponse<ContributorResponseDto>>> {
    let contributor = service.update(&identifier, form).await?;
    Ok(Json(ApiResponse::success(
        Some(contributor),
        Some("Contributor updated".to_string()),
        None,
    )))
}

/// Delete a contributor
#[utoipa::path(
    delete,
    path = "/api/contributors/{identifier}",
    params(
        ("identifier" = String, Path, description = "Contributor identifier slug")
    ),
    responses(
        (status = 200, description = "Contributor deleted"),
        (status = 404, description = "Contributor not found")
    ),
    tag = "contributors"
)]
pub async fn delete_contributor(
    State(service): State<Arc<ContributorService>>,
    Path(identifier): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(&identifier).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Contributor deleted".to_string()),
        None,
    )))
}

/// Public open dates of a contributor
///
/// For a troupe this includes the public open dates owned by its teams.
#[utoipa::path(
    get,
    path = "/api/contributors/{identifier}/open-dates/public",
    params(
        ("identifier" = String, Path, description = "Contributor identifier slug")
    ),
    responses(
        (status = 200, description = "Public open dates", body = ApiResponse<Vec<OpenDateResponseDto>>),
        (status = 404, description = "Contributor not found")
    ),
    tag = "contributors"
)]
pub async fn list_public_open_dates(
    State(service): State<Arc<ContributorService>>,
    Path(identifier): Path<String>,
) -> Result<Json<ApiResponse<Vec<OpenDateResponseDto>>>> {
    let open_dates = service.public_open_dates(&identifier).await?;
    let total = open_dates.len() as i64;
    Ok(Json(ApiResponse::listed(open_dates, total)))
}

// ==================== Administrator Handlers ====================

/// Add an admin
#[utoipa::path(
    post,
    path = "/api/contributors/{identifier}/admins/{user_id}",
    params(
        ("identifier" = String, Path, description = "Contributor identifier slug"),
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Admin added", body = ApiResponse<ContributorResponseDto>),
        (status = 404, description = "Contributor or user not found")
    ),
    tag = "contributors"
)]
pub async fn add_admin(
    State(service): State<Arc<ContributorService>>,
    Path((identifier, user_id)): Path<(String, Uuid)>,
) -> Result<Json<ApiResponse<ContributorResponseDto>>> {
    let outcome = service.add_admin(&identifier, user_id).await?;
    Ok(relation_response(outcome, "Admin added"))
}

/// Remove an admin
#[utoipa::path(
    delete,
    path = "/api/contributors/{identifier}/admins/{user_id}",
    params(
        ("identifier" = String, Path, description = "Contributor identifier slug"),
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Admin removed", body = ApiResponse<ContributorResponseDto>),
        (status = 404, description = "Contributor not found")
    ),
    tag = "contributors"
)]
pub async fn remove_admin(
    State(service): State<Arc<ContributorService>>,
    Path((identifier, user_id)): Path<(String, Uuid)>,
) -> Result<Json<ApiResponse<ContributorResponseDto>>> {
    let outcome = service.remove_admin(&identifier, user_id).await?;
    Ok(relation_response(outcome, "Admin removed"))
}

/// Add a super-admin
#[utoipa::path(
    post,
    path = "/api/contributors/{identifier}/super-admins/{user_id}",
    params(
        ("identifier" = String, Path, description = "Contributor identifier slug"),
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Super-admin added", body = ApiResponse<ContributorResponseDto>),
        (status = 404, description = "Contributor or user not found")
    ),
    tag = "contributors"
)]
pub async fn add_super_admin(
    State(service): State<Arc<ContributorService>>,
    Path((identifier, user_id)): Path<(String, Uuid)>,
) -> Result<Json<ApiResponse<ContributorResponseDto>>> {
    let outcome = service.add_super_admin(&identifier, user_id).await?;
    Ok(relation_response(outcome, "Super-admin added"))
}

/// Remove a super-admin
#[utoipa::path(
    delete,
    path = "/api/contributors/{identifier}/super-admins/{user_id}",
    params(
        ("identifier" = String, Path, description = "Contributor identifier slug"),
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Super-admin removed", body = ApiResponse<ContributorResponseDto>),
        (status = 404, description = "Contributor not found")
    ),
    tag = "contributors"
)]
pub async fn remove_super_admin(
    State(service): State<Arc<ContributorService>>,
    Path((identifier, user_id)): Path<(String, Uuid)>,
) -> Result<Json<ApiResponse<ContributorResponseDto>>> {
    let outcome = service.remove_super_admin(&identifier, user_id).await?;
    Ok(relation_response(outcome, "Super-admin removed"))
}

// ==================== Open Date Relation Handlers ====================

/// Take ownership of an open date
///
/// A date owned by another contributor is moved to this one.
#[utoipa::path(
    post,
    path = "/api/contributors/{identifier}/owned-open-dates/{open_date_id}",
    params(
        ("identifier" = String, Path, description = "Contributor identifier slug"),
        ("open_date_id" = Uuid, Path, description = "Open date ID")
    ),
    responses(
        (status = 200, description = "Open date owned", body = ApiResponse<ContributorResponseDto>),
        (status = 404, description = "Contributor or open date not found")
    ),
    tag = "contributors"
)]
pub async fn add_owned_open_date(
    State(service): State<Arc<ContributorService>>,
    Path((identifier, open_date_id)): Path<(String, Uuid)>,
) -> Result<Json<ApiResponse<ContributorResponseDto>>> {
    let outcome = service.add_owned_open_date(&identifier, open_date_id).await?;
    Ok(relation_response(outcome, "Open date owned"))
}

/// Give up ownership of an open date
#[utoipa::path(
    delete,
    path = "/api/contributors/{identifier}/owned-open-dates/{open_date_id}",
    params(
        ("identifier" = String, Path, description = "Contributor identifier slug"),
        ("open_date_id" = Uuid, Path, description = "Open date ID")
    ),
    responses(
        (status = 200, description = "Open date released", body = ApiResponse<ContributorResponseDto>),
        (status = 404, description = "Contributor or open date not found")
    ),
    tag = "contributors"
)]
pub async fn remove_owned_open_date(
    State(service): State<Arc<ContributorService>>,
    Path((identifier, open_date_id)): Path<(String, Uuid)>,
) -> Result<Json<ApiResponse<ContributorResponseDto>>> {
    let outcome = service
        .remove_owned_open_date(&identifier, open_date_id)
        .await?;
    Ok(relation_response(outcome, "Open date released"))
}

/// Invite a contributor to an open date
#[utoipa::path(
    post,
    path = "/api/contributors/{identifier}/invited-open-dates/{open_date_id}",
    params(
        ("identifier" = String, Path, description = "Contributor identifier slug"),
        ("open_date_id" = Uuid, Path, description = "Open date ID")
    ),
    responses(
        (status = 200, description = "Invitation added", body = ApiResponse<ContributorResponseDto>),
        (status = 404, description = "Contributor or open date not found")
    ),
    tag = "contributors"
)]
pub async fn add_invited_open_date(
    State(service): State<Arc<ContributorService>>,
    Path((identifier, open_date_id)): Path<(String, Uuid)>,
) -> Result<Json<ApiResponse<ContributorResponseDto>>> {
    let outcome = service
        .add_invited_to_open_date(&identifier, open_date_id)
        .await?;
    Ok(relation_response(outcome, "Invitation added"))
}

/// Withdraw an invitation
#[utoipa::path(
    delete,
    path = "/api/contributors/{identifier}/invited-open-dates/{open_date_id}",
    params(
        ("identifier" = String, Path, description = "Contributor identifier slug"),
        ("open_date_id" = Uuid, Path, description = "Open date ID")
    ),
    responses(
        (status = 200, description = "Invitation removed", body = ApiResponse<ContributorResponseDto>),
        (status = 404, description = "Contributor or open date not found")
    ),
    tag = "contributors"
)]
pub async fn remove_invited_open_date(
    State(service): State<Arc<ContributorService>>,
    Path((identifier, open_date_id)): Path<(String, Uuid)>,
) -> Result<Json<ApiResponse<ContributorResponseDto>>> {
    let outcome = service
        .remove_invited_to_open_date(&identifier, open_date_id)
        .await?;
    Ok(relation_response(outcome, "Invitation removed"))
}

// ==================== Team Handlers ====================

/// Add a team to a troupe
#[utoipa::path(
    post,
    path = "/api/contributors/{identifier}/teams/{team_identifier}",
    params(
        ("identifier" = String, Path, description = "Troupe identifier slug"),
        ("team_identifier" = String, Path, description = "Team identifier slug")
    ),
    responses(
        (status = 200, description = "Team added", body = ApiResponse<ContributorResponseDto>),
        (status = 400, description = "Not a troupe or not a team"),
        (status = 404, description = "Troupe or team not found")
    ),
    tag = "contributors"
)]
pub async fn add_team(
    State(service): State<Arc<ContributorService>>,
    Path((identifier, team_identifier)): Path<(String, String)>,
) -> Result<Json<ApiResponse<ContributorResponseDto>>> {
    let outcome = service.add_team(&identifier, &team_identifier).await?;
    Ok(relation_response(outcome, "Team added"))
}

/// Remove a team from a troupe
#[utoipa::path(
    delete,
    path = "/api/contributors/{identifier}/teams/{team_identifier}",
    params(
        ("identifier" = String, Path, description = "Troupe identifier slug"),
        ("team_identifier" = String, Path, description = "Team identifier slug")
    ),
    responses(
        (status = 200, description = "Team removed", body = ApiResponse<ContributorResponseDto>),
        (status = 400, description = "Not a troupe or not a team"),
        (status = 404, description = "Troupe or team not found")
    ),
    tag = "contributors"
)]
pub async fn remove_team(
    State(service): State<Arc<ContributorService>>,
    Path((identifier, team_identifier)): Path<(String, String)>,
) -> Result<Json<ApiResponse<ContributorResponseDto>>> {
    let outcome = service.remove_team(&identifier, &team_identifier).await?;
    Ok(relation_response(outcome, "Team removed"))
}

#[cfg(test)]
mod tests {
    use axum_test::TestServer;
    use serde_json::{json, Value};

    use crate::shared::test_helpers::{create_test_user, test_app};

    #[tokio::test]
    async fn test_create_edit_and_aggregate_over_http() {
        let (app, repository) = test_app();
        let server = TestServer::new(app).unwrap();
        let user = create_test_user(&repository, "organizer").await;

        let troupe = server
            .post("/api/contributors")
            .json(&json!({
                "type": "troupe",
                "name": "La Ligue d'Impro",
                "shortName": "Ligue",
                "createdBy": user,
            }))
            .await;
        troupe.assert_status(axum::http::StatusCode::CREATED);
        assert_eq!(troupe.json::<Value>()["data"]["identifier"], "ligue");

        server
            .post("/api/contributors")
            .json(&json!({
                "type": "team",
                "name": "Les Bleus",
                "shortName": "Bleus",
                "createdBy": user,
            }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);
        server
            .post("/api/contributors/ligue/teams/bleus")
            .await
            .assert_status_ok();

        let date = server
            .post("/api/open-dates")
            .json(&json!({
                "title": "Match contre Lyon",
                "isPublic": true,
                "ownerId": troupe.json::<Value>()["data"]["id"],
            }))
            .await
            .json::<Value>();
        let private = server
            .post("/api/open-dates")
            .json(&json!({
                "title": "Répétition",
                "ownerId": troupe.json::<Value>()["data"]["id"],
            }))
            .await
            .json::<Value>();
        assert_eq!(private["data"]["isPublic"], false);

        let public = server
            .get("/api/contributors/ligue/open-dates/public")
            .await
            .json::<Value>();
        assert_eq!(public["meta"]["total"], 1);
        assert_eq!(public["data"][0]["id"], date["data"]["id"]);

        let edited = server
            .put("/api/contributors/ligue")
            .json(&json!({
                "name": "La Ligue",
                "shortName": "Ligue de Lyon",
                "location": "Lyon",
            }))
            .await;
        edited.assert_status_ok();
        assert_eq!(edited.json::<Value>()["data"]["identifier"], "ligue-de-lyon");

        server
            .get("/api/contributors/ligue")
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn test_edit_form_rejects_overlong_name() {
        let (app, repository) = test_app();
        let server = TestServer::new(app).unwrap();
        let user = create_test_user(&repository, "organizer").await;

        server
            .post("/api/contributors")
            .json(&json!({
                "type": "improvisator",
                "name": "Jeanne",
                "shortName": "Jeanne",
                "createdBy": user,
            }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let response = server
            .put("/api/contributors/jeanne")
            .json(&json!({
                "name": "x".repeat(101),
                "shortName": "Jeanne",
            }))
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["success"], false);
    }

    #[tokio::test]
    async fn test_list_filters_by_type_query() {
        let (app, repository) = test_app();
        let server = TestServer::new(app).unwrap();
        let user = create_test_user(&repository, "organizer").await;

        for (kind, short_name) in [("troupe", "Ligue"), ("improv_group", "Zygos")] {
            server
                .post("/api/contributors")
                .json(&json!({
                    "type": kind,
                    "name": short_name,
                    "shortName": short_name,
                    "createdBy": user,
                }))
                .await
                .assert_status(axum::http::StatusCode::CREATED);
        }

        let body = server
            .get("/api/contributors")
            .add_query_param("type", "improv_group")
            .await
            .json::<Value>();
        assert_eq!(body["meta"]["total"], 1);
        assert_eq!(body["data"][0]["identifier"], "zygos");
    }

    #[tokio::test]
    async fn test_list_page_past_the_end_is_empty() {
        let (app, repository) = test_app();
        let server = TestServer::new(app).unwrap();
        let user = create_test_user(&repository, "organizer").await;

        server
            .post("/api/contributors")
            .json(&json!({
                "type": "troupe",
                "name": "Ligue",
                "shortName": "Ligue",
                "createdBy": user,
            }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let response = server
            .get("/api/contributors")
            .add_query_param("page", i64::MAX)
            .add_query_param("pageSize", 20)
            .await;
        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["meta"]["total"], 1);
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn test_edit_form_rejects_malformed_picture_url() {
        let (app, repository) = test_app();
        let server = TestServer::new(app).unwrap();
        let user = create_test_user(&repository, "organizer").await;

        server
            .post("/api/contributors")
            .json(&json!({
                "type": "improvisator",
                "name": "Jeanne",
                "shortName": "Jeanne",
                "createdBy": user,
            }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        server
            .put("/api/contributors/jeanne")
            .json(&json!({
                "name": "Jeanne",
                "shortName": "Jeanne",
                "bannerPicUrl": "not a url",
            }))
            .await
            .assert_status_bad_request();

        server
            .put("/api/contributors/jeanne")
            .json(&json!({
                "name": "Jeanne",
                "shortName": "Jeanne",
                "bannerPicUrl": "",
            }))
            .await
            .assert_status_ok();
    }
}
