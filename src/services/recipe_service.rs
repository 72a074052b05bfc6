use std::collections::HashSet;

use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::recipes::{
        CreateRecipeRequest, IngredientAmount, IngredientLineDto, RecipeDto, RecipeList,
        UpdateRecipeRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, MaybeAuthUser, ensure_author_or_admin},
    models::{Recipe, Tag},
    response::{ApiResponse, Meta},
    routes::params::RecipeQuery,
    services::user_service,
};

pub async fn list_recipes(
    pool: &DbPool,
    caller: &MaybeAuthUser,
    query: RecipeQuery,
) -> AppResult<ApiResponse<RecipeList>> {
    let (page, limit, offset) = query.normalize();
    let caller_id = caller.0.as_ref().map(|u| u.user_id);
    let tag_slugs: Option<Vec<String>> = query.tags.as_ref().map(|t| {
        t.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    });
    let only_favorited = query.is_favorited.unwrap_or(false);
    let only_in_cart = query.is_in_shopping_cart.unwrap_or(false);

    let filter = r#"
        WHERE ($1::uuid IS NULL OR r.author_id = $1)
          AND ($2::text[] IS NULL OR EXISTS (
                SELECT 1 FROM recipe_tags rt
                JOIN tags t ON t.id = rt.tag_id
                WHERE rt.recipe_id = r.id AND t.slug = ANY($2)))
          AND (NOT $3::bool OR EXISTS (
                SELECT 1 FROM favorites f
                WHERE f.recipe_id = r.id AND f.user_id = $4))
          AND (NOT $5::bool OR EXISTS (
                SELECT 1 FROM cart_entries ce
                WHERE ce.recipe_id = r.id AND ce.user_id = $4))
    "#;

    let recipes = sqlx::query_as::<_, Recipe>(&format!(
        "SELECT r.* FROM recipes r {filter} ORDER BY r.created_at DESC LIMIT $6 OFFSET $7"
    ))
    .bind(query.author)
    .bind(tag_slugs.as_deref())
    .bind(only_favorited)
    .bind(caller_id)
    .bind(only_in_cart)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) =
        sqlx::query_as(&format!("SELECT COUNT(*) FROM recipes r {filter}"))
            .bind(query.author)
            .bind(tag_slugs.as_deref())
            .bind(only_favorited)
            .bind(caller_id)
            .bind(only_in_cart)
            .fetch_one(pool)
            .await?;

    let mut items = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        items.push(build_recipe_dto(pool, caller_id, recipe).await?);
    }

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "Recipes",
        RecipeList { items },
        Some(meta),
    ))
}

pub async fn get_recipe(
    pool: &DbPool,
    caller: &MaybeAuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<RecipeDto>> {
    let recipe = fetch_recipe(pool, id).await?;
    let dto = build_recipe_dto(pool, caller.0.as_ref().map(|u| u.user_id), recipe).await?;
    Ok(ApiResponse::success("Recipe", dto, None))
}

pub async fn create_recipe(
    pool: &DbPool,
    user: &AuthUser,
    payload: CreateRecipeRequest,
) -> AppResult<ApiResponse<RecipeDto>> {
    if payload.cooking_time < 1 {
        return Err(AppError::BadRequest(
            "cooking_time must be at least 1 minute".to_string(),
        ));
    }
    validate_ingredients(pool, &payload.ingredients).await?;
    validate_tags(pool, &payload.tags).await?;

    let id = Uuid::new_v4();
    let mut tx = pool.begin().await?;

    let recipe: Recipe = sqlx::query_as(
        r#"
        INSERT INTO recipes (id, author_id, name, text, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user.user_id)
    .bind(payload.name.as_str())
    .bind(payload.text.as_str())
    .bind(payload.cooking_time)
    .fetch_one(&mut *tx)
    .await?;

    insert_lines(&mut tx, recipe.id, &payload.ingredients, &payload.tags).await?;
    tx.commit().await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "recipe_create",
        Some("recipes"),
        Some(serde_json::json!({ "recipe_id": recipe.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let dto = build_recipe_dto(pool, Some(user.user_id), recipe).await?;
    Ok(ApiResponse::success("Recipe created", dto, None))
}

pub async fn update_recipe(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateRecipeRequest,
) -> AppResult<ApiResponse<RecipeDto>> {
    let existing = fetch_recipe(pool, id).await?;
    ensure_author_or_admin(user, existing.author_id)?;

    if let Some(cooking_time) = payload.cooking_time {
        if cooking_time < 1 {
            return Err(AppError::BadRequest(
                "cooking_time must be at least 1 minute".to_string(),
            ));
        }
    }
    if let Some(ingredients) = payload.ingredients.as_ref() {
        validate_ingredients(pool, ingredients).await?;
    }
    if let Some(tags) = payload.tags.as_ref() {
        validate_tags(pool, tags).await?;
    }

    let mut tx = pool.begin().await?;

    let recipe: Recipe = sqlx::query_as(
        r#"
        UPDATE recipes
        SET name = COALESCE($2, name),
            text = COALESCE($3, text),
            cooking_time = COALESCE($4, cooking_time)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.name.as_deref())
    .bind(payload.text.as_deref())
    .bind(payload.cooking_time)
    .fetch_one(&mut *tx)
    .await?;

    if let Some(ingredients) = payload.ingredients.as_ref() {
        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_ingredient_lines(&mut tx, id, ingredients).await?;
    }
    if let Some(tags) = payload.tags.as_ref() {
        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_tag_lines(&mut tx, id, tags).await?;
    }

    tx.commit().await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "recipe_update",
        Some("recipes"),
        Some(serde_json::json!({ "recipe_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let dto = build_recipe_dto(pool, Some(user.user_id), recipe).await?;
    Ok(ApiResponse::success("Updated", dto, None))
}

pub async fn delete_recipe(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = fetch_recipe(pool, id).await?;
    ensure_author_or_admin(user, existing.author_id)?;

    // Ingredient lines, tag links, favorites and cart entries cascade.
    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "recipe_delete",
        Some("recipes"),
        Some(serde_json::json!({ "recipe_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub(crate) async fn fetch_recipe(pool: &DbPool, id: Uuid) -> AppResult<Recipe> {
    sqlx::query_as::<_, Recipe>("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound)
}

async fn validate_ingredients(pool: &DbPool, ingredients: &[IngredientAmount]) -> AppResult<()> {
    if ingredients.is_empty() {
        return Err(AppError::BadRequest(
            "at least one ingredient is required".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    for line in ingredients {
        if !seen.insert(line.id) {
            return Err(AppError::BadRequest(
                "ingredients must not repeat".to_string(),
            ));
        }
        if line.amount < 1 {
            return Err(AppError::BadRequest(
                "ingredient amount must be at least 1".to_string(),
            ));
        }
    }
    let ids: Vec<Uuid> = ingredients.iter().map(|l| l.id).collect();
    let known: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM ingredients WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_one(pool)
            .await?;
    if known.0 as usize != ids.len() {
        return Err(AppError::BadRequest("unknown ingredient".to_string()));
    }
    Ok(())
}

async fn validate_tags(pool: &DbPool, tags: &[Uuid]) -> AppResult<()> {
    if tags.is_empty() {
        return Err(AppError::BadRequest(
            "at least one tag is required".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    for tag in tags {
        if !seen.insert(*tag) {
            return Err(AppError::BadRequest("tags must not repeat".to_string()));
        }
    }
    let known: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tags WHERE id = ANY($1)")
        .bind(tags)
        .fetch_one(pool)
        .await?;
    if known.0 as usize != tags.len() {
        return Err(AppError::BadRequest("unknown tag".to_string()));
    }
    Ok(())
}

async fn insert_lines(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    recipe_id: Uuid,
    ingredients: &[IngredientAmount],
    tags: &[Uuid],
) -> AppResult<()> {
    insert_ingredient_lines(tx, recipe_id, ingredients).await?;
    insert_tag_lines(tx, recipe_id, tags).await?;
    Ok(())
}

async fn insert_ingredient_lines(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    recipe_id: Uuid,
    ingredients: &[IngredientAmount],
) -> AppResult<()> {
    for line in ingredients {
        sqlx::query(
            r#"
            INSERT INTO recipe_ingredients (id, recipe_id, ingredient_id, amount)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(recipe_id)
        .bind(line.id)
        .bind(line.amount)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

async fn insert_tag_lines(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    recipe_id: Uuid,
    tags: &[Uuid],
) -> AppResult<()> {
    for tag_id in tags {
        sqlx::query("INSERT INTO recipe_tags (id, recipe_id, tag_id) VALUES ($1, $2, $3)")
            .bind(Uuid::new_v4())
            .bind(recipe_id)
            .bind(tag_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

/// Assemble the read shape: embedded author, tags, ingredient lines and the
/// caller's favorite/cart flags.
pub(crate) async fn build_recipe_dto(
    pool: &DbPool,
    caller_id: Option<Uuid>,
    recipe: Recipe,
) -> AppResult<RecipeDto> {
    let author = user_service::fetch_user_dto(pool, caller_id, recipe.author_id).await?;

    let tags = sqlx::query_as::<_, Tag>(
        r#"
        SELECT t.* FROM recipe_tags rt
        JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = $1
        ORDER BY t.name
        "#,
    )
    .bind(recipe.id)
    .fetch_all(pool)
    .await?;

    let ingredients = sqlx::query_as::<_, IngredientLineRow>(
        r#"
        SELECT i.id, i.name, i.measurement_unit, ri.amount
        FROM recipe_ingredients ri
        JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = $1
        ORDER BY i.name
        "#,
    )
    .bind(recipe.id)
    .fetch_all(pool)
    .await?;

    let flags: (bool, bool) = sqlx::query_as(
        r#"
        SELECT
            EXISTS (SELECT 1 FROM favorites f
                    WHERE f.user_id = $1 AND f.recipe_id = $2),
            EXISTS (SELECT 1 FROM cart_entries ce
                    WHERE ce.user_id = $1 AND ce.recipe_id = $2)
        "#,
    )
    .bind(caller_id)
    .bind(recipe.id)
    .fetch_one(pool)
    .await?;

    Ok(RecipeDto {
        id: recipe.id,
        author,
        name: recipe.name,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
        tags,
        ingredients: ingredients
            .into_iter()
            .map(|row| IngredientLineDto {
                id: row.id,
                name: row.name,
                measurement_unit: row.measurement_unit,
                amount: row.amount,
            })
            .collect(),
        is_favorited: flags.0,
        is_in_shopping_cart: flags.1,
    })
}

#[derive(sqlx::FromRow)]
struct IngredientLineRow {
    id: Uuid,
    name: String,
    measurement_unit: String,
    amount: i32,
}
