use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        recipes::{
            CreateRecipeRequest, IngredientAmount, IngredientLineDto, RecipeDto, RecipeList,
            RecipeShort, UpdateRecipeRequest,
        },
        subscriptions::{SubscriptionDto, SubscriptionList},
        users::{UserDto, UserList},
    },
    models::{Ingredient, Recipe, Tag, User},
    response::{ApiResponse, Meta},
    routes::{auth, health, ingredients, params, recipes, tags, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        users::list_users,
        users::me,
        users::get_user,
        users::subscriptions,
        users::subscribe,
        users::unsubscribe,
        tags::list_tags,
        tags::get_tag,
        ingredients::list_ingredients,
        ingredients::get_ingredient,
        recipes::list_recipes,
        recipes::create_recipe,
        recipes::get_recipe,
        recipes::update_recipe,
        recipes::delete_recipe,
        recipes::add_favorite,
        recipes::remove_favorite,
        recipes::add_to_cart,
        recipes::remove_from_cart,
        recipes::download_shopping_cart
    ),
    components(
        schemas(
            User,
            Tag,
            Ingredient,
            Recipe,
            UserDto,
            UserList,
            RecipeDto,
            RecipeList,
            RecipeShort,
            IngredientLineDto,
            IngredientAmount,
            CreateRecipeRequest,
            UpdateRecipeRequest,
            SubscriptionDto,
            SubscriptionList,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            tags::TagList,
            ingredients::IngredientList,
            params::RecipeQuery,
            params::UserQuery,
            params::SubscriptionQuery,
            params::IngredientQuery,
            Meta,
            ApiResponse<UserDto>,
            ApiResponse<UserList>,
            ApiResponse<RecipeDto>,
            ApiResponse<RecipeList>,
            ApiResponse<SubscriptionList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Users", description = "User profile endpoints"),
        (name = "Subscriptions", description = "Follow/unfollow endpoints"),
        (name = "Tags", description = "Tag reference data"),
        (name = "Ingredients", description = "Ingredient reference data"),
        (name = "Recipes", description = "Recipe endpoints"),
        (name = "Favorites", description = "Favorite endpoints"),
        (name = "ShoppingCart", description = "Shopping cart and PDF download"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
