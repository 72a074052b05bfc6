use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{dto::users::UserDto, models::Tag};

/// One ingredient reference with its quantity, as submitted by a client.
#[derive(Debug, Deserialize, ToSchema)]
pub struct IngredientAmount {
    pub id: Uuid,
    pub amount: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRecipeRequest {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub ingredients: Vec<IngredientAmount>,
    pub tags: Vec<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRecipeRequest {
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    pub ingredients: Option<Vec<IngredientAmount>>,
    pub tags: Option<Vec<Uuid>>,
}

/// Ingredient line in the read shape, amount included.
#[derive(Debug, Serialize, ToSchema)]
pub struct IngredientLineDto {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Full read shape: author, tags and ingredient lines embedded, plus the
/// caller's favorite/cart flags. The write shape above carries bare ids;
/// the two are deliberately separate types.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecipeDto {
    pub id: Uuid,
    pub author: UserDto,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<IngredientLineDto>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

/// Truncated recipe used by favorite/cart responses and subscription lists.
#[derive(Debug, Serialize, ToSchema, sqlx::FromRow)]
pub struct RecipeShort {
    pub id: Uuid,
    pub name: String,
    pub cooking_time: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecipeList {
    pub items: Vec<RecipeDto>,
}
