use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::{recipes::RecipeShort, users::UserDto};

/// A followed author together with a truncated list of their recipes.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionDto {
    pub author: UserDto,
    pub recipes: Vec<RecipeShort>,
    pub recipes_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionList {
    pub items: Vec<SubscriptionDto>,
}
