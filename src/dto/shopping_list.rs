use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// One raw (ingredient, amount) pair pulled through a cart entry's recipe.
#[derive(Debug, Clone, FromRow)]
pub struct IngredientRow {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Summed quantity of one distinct (name, unit) ingredient across every
/// recipe in the user's cart. Derived on every request, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AggregatedLine {
    pub name: String,
    pub amount: i64,
    pub measurement_unit: String,
}
