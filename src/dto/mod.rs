pub mod auth;
pub mod recipes;
pub mod shopping_list;
pub mod subscriptions;
pub mod users;
