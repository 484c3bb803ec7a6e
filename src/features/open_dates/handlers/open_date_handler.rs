use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::open_dates::dtos::{
    CreateOpenDateDto, OpenDateResponseDto, UpdateVisibilityDto,
};
use crate::features::open_dates::services::OpenDateService;
use crate::shared::types::ApiResponse;

/// Create an open date owned by a contributor
#[utoipa::path(
    post,
    path = "/api/open-dates",
    request_body = CreateOpenDateDto,
    responses(
        (status = 201, description = "Open date created", body = ApiResponse<OpenDateResponseDto>),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Owner not found")
    ),
    tag = "open-dates"
)]
pub async fn create_open_date(
    State(service): State<Arc<OpenDateService>>,
    AppJson(dto): AppJson<CreateOpenDateDto>,
) -> Result<(StatusCode, Json<ApiResponse<OpenDateResponseDto>>)> {
    let open_date = service.create(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(open_date),
            Some("Open date created".to_string()),
            None,
        )),
    ))
}

/// Get an open date by id
#[utoipa::path(
    get,
    path = "/api/open-dates/{id}",
    params(
        ("id" = Uuid, Path, description = "Open date ID")
    ),
    responses(
        (status = 200, description = "Open date details", body = ApiResponse<OpenDateResponseDto>),
        (status = 404, description = "Open date not found")
    ),
    tag = "open-dates"
)]
pub async fn get_open_date(
    State(service): State<Arc<OpenDateService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OpenDateResponseDto>>> {
    let open_date = service.get(id).await?;
    Ok(Json(ApiResponse::success(Some(open_date), None, None)))
}

/// Make an open date public or private
#[utoipa::path(
    patch,
    path = "/api/open-dates/{id}/visibility",
    params(
        ("id" = Uuid, Path, description = "Open date ID")
    ),
    request_body = UpdateVisibilityDto,
    responses(
        (status = 200, description = "Visibility updated", body = ApiResponse<OpenDateResponseDto>),
        (status = 404, description = "Open date not found")
    ),
    tag = "open-dates"
)]
pub async fn update_open_date_visibility(
    State(service): State<Arc<OpenDateService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateVisibilityDto>,
) -> Result<Json<ApiResponse<OpenDateResponseDto>>> {
    let open_date = service.set_visibility(id, dto.is_public).await?;
    Ok(Json(ApiResponse::success(
        Some(open_date),
        Some("Visibility updated".to_string()),
        None,
    )))
}

#[cfg(test)]
mod tests {
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use uuid::Uuid;

    use crate::shared::test_helpers::{create_test_contributor, test_app};

    #[tokio::test]
    async fn test_visibility_toggle_reaches_public_listing() {
        let (app, repository) = test_app();
        let server = TestServer::new(app).unwrap();
        let owner = create_test_contributor(&repository, "Jeanne").await;

        let created = server
            .post("/api/open-dates")
            .json(&json!({ "title": "Impro libre", "ownerId": owner }))
            .await
            .json::<Value>();
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let listing = server
            .get("/api/contributors/jeanne/open-dates/public")
            .await
            .json::<Value>();
        assert_eq!(listing["meta"]["total"], 0);

        server
            .patch(&format!("/api/open-dates/{}/visibility", id))
            .json(&json!({ "isPublic": true }))
            .await
            .assert_status_ok();

        let listing = server
            .get("/api/contributors/jeanne/open-dates/public")
            .await
            .json::<Value>();
        assert_eq!(listing["meta"]["total"], 1);
        assert_eq!(listing["data"][0]["id"], id.as_str());
    }

    #[tokio::test]
    async fn test_unknown_open_date_is_not_found() {
        let (app, _) = test_app();
        let server = TestServer::new(app).unwrap();

        let response = server
            .get(&format!("/api/open-dates/{}", Uuid::new_v4()))
            .await;
        response.assert_status_not_found();
        assert_eq!(response.json::<Value>()["success"], false);
    }
}
