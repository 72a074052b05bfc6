use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::recipes::RecipeShort,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    services::recipe_service,
};

pub async fn add_favorite(
    pool: &DbPool,
    user: &AuthUser,
    recipe_id: Uuid,
) -> AppResult<ApiResponse<RecipeShort>> {
    let recipe = recipe_service::fetch_recipe(pool, recipe_id).await?;

    sqlx::query("INSERT INTO favorites (id, user_id, recipe_id) VALUES ($1, $2, $3)")
        .bind(Uuid::new_v4())
        .bind(user.user_id)
        .bind(recipe_id)
        .execute(pool)
        .await
        .map_err(|e| AppError::unique_or_db(e, "Recipe is already in favorites"))?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "favorite_add",
        Some("favorites"),
        Some(serde_json::json!({ "recipe_id": recipe_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let short = RecipeShort {
        id: recipe.id,
        name: recipe.name,
        cooking_time: recipe.cooking_time,
    };
    Ok(ApiResponse::success("Added to favorites", short, None))
}

pub async fn remove_favorite(
    pool: &DbPool,
    user: &AuthUser,
    recipe_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND recipe_id = $2")
        .bind(user.user_id)
        .bind(recipe_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::BadRequest(
            "Recipe is not in favorites".to_string(),
        ));
    }

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "favorite_remove",
        Some("favorites"),
        Some(serde_json::json!({ "recipe_id": recipe_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Removed from favorites",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
