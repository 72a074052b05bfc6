use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

// serde_urlencoded cannot round-trip non-string fields through
// #[serde(flatten)], so every query type carries page/per_page inline.
fn normalize(page: Option<i64>, per_page: Option<i64>) -> (i64, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;
    (page, per_page, offset)
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecipeQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub author: Option<Uuid>,
    /// Comma-separated tag slugs; a recipe matches when it carries any of them.
    pub tags: Option<String>,
    pub is_favorited: Option<bool>,
    pub is_in_shopping_cart: Option<bool>,
}

impl RecipeQuery {
    pub fn normalize(&self) -> (i64, i64, i64) {
        normalize(self.page, self.per_page)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UserQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub username: Option<String>,
}

impl UserQuery {
    pub fn normalize(&self) -> (i64, i64, i64) {
        normalize(self.page, self.per_page)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubscriptionQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub recipes_limit: Option<i64>,
}

impl SubscriptionQuery {
    pub fn normalize(&self) -> (i64, i64, i64) {
        normalize(self.page, self.per_page)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct IngredientQuery {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecipesLimitQuery {
    pub recipes_limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::normalize;

    #[test]
    fn defaults_apply_when_unset() {
        assert_eq!(normalize(None, None), (1, 20, 0));
    }

    #[test]
    fn clamps_out_of_range_values() {
        assert_eq!(normalize(Some(0), Some(0)), (1, 1, 0));
        assert_eq!(normalize(Some(3), Some(1000)), (3, 100, 200));
    }
}
