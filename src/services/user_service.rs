use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::users::{UserDto, UserList},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, MaybeAuthUser},
    models::User,
    response::{ApiResponse, Meta},
    routes::params::UserQuery,
};

#[derive(FromRow)]
struct UserWithSubscription {
    #[sqlx(flatten)]
    user: User,
    is_subscribed: bool,
}

pub async fn list_users(
    pool: &DbPool,
    caller: &MaybeAuthUser,
    query: UserQuery,
) -> AppResult<ApiResponse<UserList>> {
    let (page, limit, offset) = query.normalize();
    let caller_id = caller.0.as_ref().map(|u| u.user_id);
    let pattern = query
        .username
        .as_ref()
        .filter(|s| !s.is_empty())
        .map(|s| format!("{s}%"));

    let rows = sqlx::query_as::<_, UserWithSubscription>(
        r#"
        SELECT u.*,
               EXISTS (
                   SELECT 1 FROM follows f
                   WHERE f.user_id = $1 AND f.author_id = u.id
               ) AS is_subscribed
        FROM users u
        WHERE ($2::text IS NULL OR u.username ILIKE $2)
        ORDER BY u.username
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(caller_id)
    .bind(pattern.as_deref())
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM users u WHERE ($1::text IS NULL OR u.username ILIKE $1)",
    )
    .bind(pattern.as_deref())
    .fetch_one(pool)
    .await?;

    let items = rows
        .into_iter()
        .map(|row| UserDto::from_user(row.user, row.is_subscribed))
        .collect();

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("Users", UserList { items }, Some(meta)))
}

pub async fn get_user(
    pool: &DbPool,
    caller: &MaybeAuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<UserDto>> {
    let caller_id = caller.0.as_ref().map(|u| u.user_id);
    let dto = fetch_user_dto(pool, caller_id, id).await?;
    Ok(ApiResponse::success("User", dto, None))
}

pub async fn get_me(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<UserDto>> {
    let dto = fetch_user_dto(pool, Some(user.user_id), user.user_id).await?;
    Ok(ApiResponse::success("Me", dto, None))
}

pub(crate) async fn fetch_user_dto(
    pool: &DbPool,
    caller_id: Option<Uuid>,
    id: Uuid,
) -> AppResult<UserDto> {
    let row = sqlx::query_as::<_, UserWithSubscription>(
        r#"
        SELECT u.*,
               EXISTS (
                   SELECT 1 FROM follows f
                   WHERE f.user_id = $1 AND f.author_id = u.id
               ) AS is_subscribed
        FROM users u
        WHERE u.id = $2
        "#,
    )
    .bind(caller_id)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound)?;

    Ok(UserDto::from_user(row.user, row.is_subscribed))
}
