use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::{
        subscriptions::{SubscriptionDto, SubscriptionList},
        users::{UserDto, UserList},
    },
    error::AppResult,
    middleware::auth::{AuthUser, MaybeAuthUser},
    response::ApiResponse,
    routes::params::{RecipesLimitQuery, SubscriptionQuery, UserQuery},
    services::{subscription_service, user_service},
};

pub fn router() -> Router<DbPool> {
    Router::new()
        .route("/", get(list_users))
        .route("/me", get(me))
        .route("/subscriptions", get(subscriptions))
        .route("/{id}", get(get_user))
        .route("/{id}/subscribe", post(subscribe).delete(unsubscribe))
}

#[utoipa::path(
    get,
    path = "/api/users",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("username" = Option<String>, Query, description = "Username prefix search")
    ),
    responses(
        (status = 200, description = "List users", body = ApiResponse<UserList>)
    ),
    tag = "Users"
)]
pub async fn list_users(
    State(pool): State<DbPool>,
    caller: MaybeAuthUser,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<ApiResponse<UserList>>> {
    let resp = user_service::list_users(&pool, &caller, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserDto>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn me(
    State(pool): State<DbPool>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UserDto>>> {
    let resp = user_service::get_me(&pool, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = ApiResponse<UserDto>),
        (status = 404, description = "User not found")
    ),
    tag = "Users"
)]
pub async fn get_user(
    State(pool): State<DbPool>,
    caller: MaybeAuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<UserDto>>> {
    let resp = user_service::get_user(&pool, &caller, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users/subscriptions",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("recipes_limit" = Option<i64>, Query, description = "Recipes shown per author, default 3")
    ),
    responses(
        (status = 200, description = "Followed authors", body = ApiResponse<SubscriptionList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Subscriptions"
)]
pub async fn subscriptions(
    State(pool): State<DbPool>,
    user: AuthUser,
    Query(query): Query<SubscriptionQuery>,
) -> AppResult<Json<ApiResponse<SubscriptionList>>> {
    let resp = subscription_service::list_subscriptions(&pool, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/subscribe",
    params(
        ("id" = Uuid, Path, description = "Author ID"),
        ("recipes_limit" = Option<i64>, Query, description = "Recipes shown for the author, default 3")
    ),
    responses(
        (status = 200, description = "Subscribed", body = ApiResponse<SubscriptionDto>),
        (status = 400, description = "Already following or following yourself"),
        (status = 404, description = "Author not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Subscriptions"
)]
pub async fn subscribe(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<RecipesLimitQuery>,
) -> AppResult<Json<ApiResponse<SubscriptionDto>>> {
    let resp = subscription_service::subscribe(&pool, &user, id, query.recipes_limit).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/subscribe",
    params(
        ("id" = Uuid, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Unsubscribed", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Not following this author")
    ),
    security(("bearer_auth" = [])),
    tag = "Subscriptions"
)]
pub async fn unsubscribe(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = subscription_service::unsubscribe(&pool, &user, id).await?;
    Ok(Json(resp))
}
