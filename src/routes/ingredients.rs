use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::{AppError, AppResult},
    models::Ingredient,
    response::ApiResponse,
    routes::params::IngredientQuery,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct IngredientList {
    pub items: Vec<Ingredient>,
}

pub fn router() -> Router<DbPool> {
    Router::new()
        .route("/", get(list_ingredients))
        .route("/{id}", get(get_ingredient))
}

#[utoipa::path(
    get,
    path = "/api/ingredients",
    params(
        ("name" = Option<String>, Query, description = "Name prefix search")
    ),
    responses(
        (status = 200, description = "List ingredients", body = ApiResponse<IngredientList>)
    ),
    tag = "Ingredients"
)]
pub async fn list_ingredients(
    State(pool): State<DbPool>,
    Query(query): Query<IngredientQuery>,
) -> AppResult<Json<ApiResponse<IngredientList>>> {
    let pattern = query
        .name
        .as_ref()
        .filter(|s| !s.is_empty())
        .map(|s| format!("{s}%"));

    let items = sqlx::query_as::<_, Ingredient>(
        r#"
        SELECT * FROM ingredients
        WHERE ($1::text IS NULL OR name ILIKE $1)
        ORDER BY name, measurement_unit
        "#,
    )
    .bind(pattern.as_deref())
    .fetch_all(&pool)
    .await?;

    Ok(Json(ApiResponse::success(
        "Ingredients",
        IngredientList { items },
        None,
    )))
}

#[utoipa::path(
    get,
    path = "/api/ingredients/{id}",
    params(
        ("id" = Uuid, Path, description = "Ingredient ID")
    ),
    responses(
        (status = 200, description = "Ingredient", body = ApiResponse<Ingredient>),
        (status = 404, description = "Ingredient not found")
    ),
    tag = "Ingredients"
)]
pub async fn get_ingredient(
    State(pool): State<DbPool>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Ingredient>>> {
    let ingredient = sqlx::query_as::<_, Ingredient>("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(ApiResponse::success("Ingredient", ingredient, None)))
}
