pub mod catalog;
pub mod config;
pub mod database;
pub mod recipes;
pub mod subscriptions;
pub mod users;

mod rows;

pub use catalog::CatalogRepository;
pub use config::DatabaseConfig;
pub use database::Database;
pub use recipes::RecipeRepository;
pub use subscriptions::SubscriptionRepository;
pub use users::UserRepository;

use foodgram_core::AppError;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";

/// Field a constraint violation is reported on.
fn constraint_field(constraint: &str) -> &'static str {
    match constraint {
        "users_email_key" => "email",
        "users_username_key" => "username",
        "tags_slug_key" => "slug",
        "ingredients_name_unit_unique" => "name",
        "subscriptions_unique" | "subscriptions_not_self" => "author",
        "favorites_pkey" | "shopping_cart_pkey" => "recipe",
        "recipe_ingredients_pkey" | "recipe_ingredients_ingredient_id_fkey" => "ingredients",
        "recipe_tags_pkey" | "recipe_tags_tag_id_fkey" => "tags",
        c if c.contains("cooking_time") => "cooking_time",
        c if c.contains("amount") => "ingredients",
        _ => "non_field_errors",
    }
}

/// Map a sqlx error to [`AppError`]. Constraint violations become
/// validation errors, everything else a database error.
pub(crate) fn db_error(err: sqlx::Error) -> AppError {
    if let Some(db) = err.as_database_error() {
        let code = db.code();
        let message = match code.as_deref() {
            Some(UNIQUE_VIOLATION) => Some("This value already exists."),
            Some(FOREIGN_KEY_VIOLATION) => Some("Referenced object does not exist."),
            Some(CHECK_VIOLATION) => Some("Value violates a constraint."),
            _ => None,
        };
        if let Some(message) = message {
            let field = db.constraint().map_or("non_field_errors", constraint_field);
            tracing::debug!(field = %field, constraint = ?db.constraint(), "Constraint violation");
            return AppError::validation(field, message);
        }
    }
    AppError::DatabaseError(err.to_string())
}
