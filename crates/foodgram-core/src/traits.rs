use std::future::Future;

use crate::error::AppError;
use crate::models::{
    Credentials, Ingredient, Membership, NewIngredient, NewTag, Page, PageRequest, Profile,
    Recipe, RecipeDraft, RecipeFilter, RecipeSummary, ShoppingListItem, Tag, User, UserRecord,
};

/// Persists accounts and their auth tokens.
pub trait UserStore: Send + Sync + Clone {
    fn create_user(&self, record: &UserRecord)
    -> impl Future<Output = Result<User, AppError>> + Send;

    fn email_exists(&self, email: &str) -> impl Future<Output = Result<bool, AppError>> + Send;

    fn username_exists(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<bool, AppError>> + Send;

    /// Look up a user annotated with whether `viewer` follows them.
    fn get_profile(
        &self,
        id: i64,
        viewer: Option<i64>,
    ) -> impl Future<Output = Result<Option<Profile>, AppError>> + Send;

    /// All users ordered by id.
    fn list_profiles(
        &self,
        viewer: Option<i64>,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<Profile>, AppError>> + Send;

    fn credentials_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<Credentials>, AppError>> + Send;

    fn credentials_by_id(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<Credentials>, AppError>> + Send;

    fn set_password_hash(
        &self,
        user_id: i64,
        password_hash: &str,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Store the digest of a freshly issued token.
    fn insert_token(
        &self,
        user_id: i64,
        digest: &str,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    fn user_by_token(
        &self,
        digest: &str,
    ) -> impl Future<Output = Result<Option<User>, AppError>> + Send;

    /// Revoke every token of a user. Returns the number removed.
    fn delete_tokens(&self, user_id: i64) -> impl Future<Output = Result<u64, AppError>> + Send;
}

/// Persists follow relationships between users.
pub trait SubscriptionStore: Send + Sync + Clone {
    /// Insert the edge. Returns false if it already existed.
    fn subscribe(
        &self,
        user_id: i64,
        author_id: i64,
    ) -> impl Future<Output = Result<bool, AppError>> + Send;

    /// Remove the edge. Returns false if there was nothing to remove.
    fn unsubscribe(
        &self,
        user_id: i64,
        author_id: i64,
    ) -> impl Future<Output = Result<bool, AppError>> + Send;

    /// Authors followed by `user_id`, ordered by author id.
    fn subscribed_authors(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<User>, AppError>> + Send;

    /// Newest recipes of an author, at most `limit` when given.
    fn author_recipes(
        &self,
        author_id: i64,
        limit: Option<u32>,
    ) -> impl Future<Output = Result<Vec<RecipeSummary>, AppError>> + Send;

    fn count_author_recipes(
        &self,
        author_id: i64,
    ) -> impl Future<Output = Result<i64, AppError>> + Send;
}

/// Read access to tags and ingredients, plus the writes used by data loading.
pub trait CatalogStore: Send + Sync + Clone {
    fn list_tags(&self) -> impl Future<Output = Result<Vec<Tag>, AppError>> + Send;

    fn get_tag(&self, id: i64) -> impl Future<Output = Result<Option<Tag>, AppError>> + Send;

    fn create_tag(&self, tag: &NewTag) -> impl Future<Output = Result<Tag, AppError>> + Send;

    /// Ingredients ordered by name, optionally restricted to a
    /// case-insensitive name prefix.
    fn search_ingredients(
        &self,
        prefix: Option<&str>,
    ) -> impl Future<Output = Result<Vec<Ingredient>, AppError>> + Send;

    fn get_ingredient(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<Ingredient>, AppError>> + Send;

    /// Get-or-create by `(name, measurement_unit)`. Returns true if a row was inserted.
    fn upsert_ingredient(
        &self,
        ingredient: &NewIngredient,
    ) -> impl Future<Output = Result<bool, AppError>> + Send;

    /// Ids from `ids` that match no ingredient.
    fn missing_ingredients(
        &self,
        ids: &[i64],
    ) -> impl Future<Output = Result<Vec<i64>, AppError>> + Send;

    /// Ids from `ids` that match no tag.
    fn missing_tags(&self, ids: &[i64]) -> impl Future<Output = Result<Vec<i64>, AppError>> + Send;
}

/// Persists recipes with their associations and per-user memberships.
pub trait RecipeStore: Send + Sync + Clone {
    /// Insert a recipe with its tags and ingredients atomically. Returns the new id.
    fn insert_recipe(
        &self,
        author_id: i64,
        draft: &RecipeDraft,
    ) -> impl Future<Output = Result<i64, AppError>> + Send;

    /// Update scalar fields and replace associations atomically.
    fn update_recipe(
        &self,
        id: i64,
        draft: &RecipeDraft,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Returns false if no recipe had this id.
    fn delete_recipe(&self, id: i64) -> impl Future<Output = Result<bool, AppError>> + Send;

    fn recipe_author(&self, id: i64)
    -> impl Future<Output = Result<Option<i64>, AppError>> + Send;

    fn get_recipe(
        &self,
        id: i64,
        viewer: Option<i64>,
    ) -> impl Future<Output = Result<Option<Recipe>, AppError>> + Send;

    /// Recipes matching `filter`, newest first.
    fn list_recipes(
        &self,
        filter: &RecipeFilter,
        viewer: Option<i64>,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<Recipe>, AppError>> + Send;

    fn recipe_summary(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<RecipeSummary>, AppError>> + Send;

    /// Returns false if the pair was already present.
    fn add_membership(
        &self,
        kind: Membership,
        user_id: i64,
        recipe_id: i64,
    ) -> impl Future<Output = Result<bool, AppError>> + Send;

    /// Returns false if the pair was absent.
    fn remove_membership(
        &self,
        kind: Membership,
        user_id: i64,
        recipe_id: i64,
    ) -> impl Future<Output = Result<bool, AppError>> + Send;

    /// Ingredients of every recipe in the user's cart, summed per
    /// ingredient and ordered by name.
    fn shopping_list(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<Vec<ShoppingListItem>, AppError>> + Send;
}
