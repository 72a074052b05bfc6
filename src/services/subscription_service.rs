use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::{
        recipes::RecipeShort,
        subscriptions::{SubscriptionDto, SubscriptionList},
        users::UserDto,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, Meta},
    routes::params::SubscriptionQuery,
};

pub async fn subscribe(
    pool: &DbPool,
    user: &AuthUser,
    author_id: Uuid,
    recipes_limit: Option<i64>,
) -> AppResult<ApiResponse<SubscriptionDto>> {
    if author_id == user.user_id {
        return Err(AppError::BadRequest(
            "You cannot follow yourself".to_string(),
        ));
    }

    let author: User = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(author_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound)?;

    sqlx::query("INSERT INTO follows (id, user_id, author_id) VALUES ($1, $2, $3)")
        .bind(Uuid::new_v4())
        .bind(user.user_id)
        .bind(author_id)
        .execute(pool)
        .await
        .map_err(|e| AppError::unique_or_db(e, "You already follow this author"))?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "subscribe",
        Some("follows"),
        Some(serde_json::json!({ "author_id": author_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let dto = build_subscription_dto(pool, author, recipes_limit).await?;
    Ok(ApiResponse::success("Subscribed", dto, None))
}

pub async fn unsubscribe(
    pool: &DbPool,
    user: &AuthUser,
    author_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM follows WHERE user_id = $1 AND author_id = $2")
        .bind(user.user_id)
        .bind(author_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::BadRequest(
            "You do not follow this author".to_string(),
        ));
    }

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "unsubscribe",
        Some("follows"),
        Some(serde_json::json!({ "author_id": author_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Unsubscribed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn list_subscriptions(
    pool: &DbPool,
    user: &AuthUser,
    query: SubscriptionQuery,
) -> AppResult<ApiResponse<SubscriptionList>> {
    let (page, limit, offset) = query.normalize();

    let authors = sqlx::query_as::<_, User>(
        r#"
        SELECT u.* FROM follows f
        JOIN users u ON u.id = f.author_id
        WHERE f.user_id = $1
        ORDER BY f.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user.user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM follows WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(pool)
        .await?;

    let mut items = Vec::with_capacity(authors.len());
    for author in authors {
        items.push(build_subscription_dto(pool, author, query.recipes_limit).await?);
    }

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "Subscriptions",
        SubscriptionList { items },
        Some(meta),
    ))
}

async fn build_subscription_dto(
    pool: &DbPool,
    author: User,
    recipes_limit: Option<i64>,
) -> AppResult<SubscriptionDto> {
    let limit = recipes_limit.unwrap_or(3).clamp(0, 100);

    let recipes = sqlx::query_as::<_, RecipeShort>(
        r#"
        SELECT id, name, cooking_time FROM recipes
        WHERE author_id = $1
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(author.id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let recipes_count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
            .bind(author.id)
            .fetch_one(pool)
            .await?;

    Ok(SubscriptionDto {
        // The caller follows this author by construction.
        author: UserDto::from_user(author, true),
        recipes,
        recipes_count: recipes_count.0,
    })
}
