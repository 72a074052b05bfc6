pub mod audit_logs;
pub mod cart_entries;
pub mod favorites;
pub mod follows;
pub mod ingredients;
pub mod recipe_ingredients;
pub mod recipe_tags;
pub mod recipes;
pub mod tags;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use cart_entries::Entity as CartEntries;
pub use favorites::Entity as Favorites;
pub use follows::Entity as Follows;
pub use ingredients::Entity as Ingredients;
pub use recipe_ingredients::Entity as RecipeIngredients;
pub use recipe_tags::Entity as RecipeTags;
pub use recipes::Entity as Recipes;
pub use tags::Entity as Tags;
pub use users::Entity as Users;
