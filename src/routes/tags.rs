use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::{AppError, AppResult},
    models::Tag,
    response::ApiResponse,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct TagList {
    pub items: Vec<Tag>,
}

pub fn router() -> Router<DbPool> {
    Router::new()
        .route("/", get(list_tags))
        .route("/{id}", get(get_tag))
}

#[utoipa::path(
    get,
    path = "/api/tags",
    responses(
        (status = 200, description = "List tags", body = ApiResponse<TagList>)
    ),
    tag = "Tags"
)]
pub async fn list_tags(State(pool): State<DbPool>) -> AppResult<Json<ApiResponse<TagList>>> {
    let items = sqlx::query_as::<_, Tag>("SELECT * FROM tags ORDER BY name")
        .fetch_all(&pool)
        .await?;

    Ok(Json(ApiResponse::success("Tags", TagList { items }, None)))
}

#[utoipa::path(
    get,
    path = "/api/tags/{id}",
    params(
        ("id" = Uuid, Path, description = "Tag ID")
    ),
    responses(
        (status = 200, description = "Tag", body = ApiResponse<Tag>),
        (status = 404, description = "Tag not found")
    ),
    tag = "Tags"
)]
pub async fn get_tag(
    State(pool): State<DbPool>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Tag>>> {
    let tag = sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(ApiResponse::success("Tag", tag, None)))
}
