use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::recipes::{
        CreateRecipeRequest, RecipeDto, RecipeList, RecipeShort, UpdateRecipeRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, MaybeAuthUser},
    pdf,
    response::ApiResponse,
    routes::params::RecipeQuery,
    services::{cart_service, favorite_service, recipe_service, shopping_list_service},
};

pub fn router() -> Router<DbPool> {
    Router::new()
        .route("/", get(list_recipes).post(create_recipe))
        .route("/download_shopping_cart", get(download_shopping_cart))
        .route(
            "/{id}",
            get(get_recipe).patch(update_recipe).delete(delete_recipe),
        )
        .route("/{id}/favorite", post(add_favorite).delete(remove_favorite))
        .route(
            "/{id}/shopping_cart",
            post(add_to_cart).delete(remove_from_cart),
        )
}

#[utoipa::path(
    get,
    path = "/api/recipes",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("author" = Option<Uuid>, Query, description = "Filter by author id"),
        ("tags" = Option<String>, Query, description = "Comma-separated tag slugs"),
        ("is_favorited" = Option<bool>, Query, description = "Only the caller's favorites"),
        ("is_in_shopping_cart" = Option<bool>, Query, description = "Only recipes in the caller's cart")
    ),
    responses(
        (status = 200, description = "List recipes", body = ApiResponse<RecipeList>)
    ),
    tag = "Recipes"
)]
pub async fn list_recipes(
    State(pool): State<DbPool>,
    caller: MaybeAuthUser,
    Query(query): Query<RecipeQuery>,
) -> AppResult<Json<ApiResponse<RecipeList>>> {
    let resp = recipe_service::list_recipes(&pool, &caller, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/recipes",
    request_body = CreateRecipeRequest,
    responses(
        (status = 200, description = "Recipe created", body = ApiResponse<RecipeDto>),
        (status = 400, description = "Invalid ingredients, tags or cooking time")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn create_recipe(
    State(pool): State<DbPool>,
    user: AuthUser,
    Json(payload): Json<CreateRecipeRequest>,
) -> AppResult<Json<ApiResponse<RecipeDto>>> {
    let resp = recipe_service::create_recipe(&pool, &user, payload).await?;
    Ok(Json(resp))
}

/// Aggregate the caller's cart and stream it back as a finalized PDF
/// attachment. An empty cart still yields a valid title-only document.
#[utoipa::path(
    get,
    path = "/api/recipes/download_shopping_cart",
    responses(
        (status = 200, description = "Shopping list PDF (application/pdf attachment)"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "ShoppingCart"
)]
pub async fn download_shopping_cart(
    State(pool): State<DbPool>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let lines = shopping_list_service::aggregate(&pool, &user).await?;
    let bytes = pdf::render(&lines).map_err(AppError::Internal)?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", pdf::PDF_FILENAME),
        ),
    ];
    Ok((headers, bytes))
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe", body = ApiResponse<RecipeDto>),
        (status = 404, description = "Recipe not found")
    ),
    tag = "Recipes"
)]
pub async fn get_recipe(
    State(pool): State<DbPool>,
    caller: MaybeAuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<RecipeDto>>> {
    let resp = recipe_service::get_recipe(&pool, &caller, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/recipes/{id}",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    request_body = UpdateRecipeRequest,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<RecipeDto>),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn update_recipe(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRecipeRequest>,
) -> AppResult<Json<ApiResponse<RecipeDto>>> {
    let resp = recipe_service::update_recipe(&pool, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Deleted", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn delete_recipe(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = recipe_service::delete_recipe(&pool, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/favorite",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Added to favorites", body = ApiResponse<RecipeShort>),
        (status = 400, description = "Already in favorites"),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn add_favorite(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<RecipeShort>>> {
    let resp = favorite_service::add_favorite(&pool, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/favorite",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Removed from favorites", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Not in favorites")
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn remove_favorite(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = favorite_service::remove_favorite(&pool, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/shopping_cart",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Added to shopping cart", body = ApiResponse<RecipeShort>),
        (status = 400, description = "Already in the shopping cart"),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = [])),
    tag = "ShoppingCart"
)]
pub async fn add_to_cart(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<RecipeShort>>> {
    let resp = cart_service::add_to_cart(&pool, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/shopping_cart",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Removed from shopping cart", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Not in the shopping cart")
    ),
    security(("bearer_auth" = [])),
    tag = "ShoppingCart"
)]
pub async fn remove_from_cart(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = cart_service::remove_from_cart(&pool, &user, id).await?;
    Ok(Json(resp))
}
