use crate::config::RecipeLimits;
use crate::error::AppError;
use crate::models::{
    Membership, Page, PageRequest, Recipe, RecipeDraft, RecipeFilter, RecipeInput, RecipeSummary,
    User,
};
use crate::shopping_list::render_shopping_list;
use crate::traits::{CatalogStore, RecipeStore};
use crate::validation::validate_recipe;

/// Recipe publishing, browsing, favorites, shopping cart, and the
/// shopping-list export.
///
/// Write paths validate in two steps: [`validate_recipe`] for everything
/// decidable from the payload, then catalog lookups for the referenced
/// ingredient and tag ids.
pub struct RecipeService<R, C>
where
    R: RecipeStore,
    C: CatalogStore,
{
    recipes: R,
    catalog: C,
    limits: RecipeLimits,
}

impl<R, C> RecipeService<R, C>
where
    R: RecipeStore,
    C: CatalogStore,
{
    pub fn new(recipes: R, catalog: C, limits: RecipeLimits) -> Self {
        Self {
            recipes,
            catalog,
            limits,
        }
    }

    pub async fn get(&self, id: i64, viewer: Option<&User>) -> Result<Recipe, AppError> {
        self.recipes
            .get_recipe(id, viewer.map(|v| v.id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Recipe {id}")))
    }

    /// Membership filters only apply to an authenticated viewer; for
    /// anonymous requests they are ignored.
    pub async fn list(
        &self,
        author: Option<i64>,
        tags: Vec<String>,
        only_favorited: bool,
        only_in_cart: bool,
        viewer: Option<&User>,
        page: PageRequest,
    ) -> Result<Page<Recipe>, AppError> {
        let viewer_id = viewer.map(|v| v.id);
        let filter = RecipeFilter {
            author,
            tags,
            favorited_by: viewer_id.filter(|_| only_favorited),
            in_cart_of: viewer_id.filter(|_| only_in_cart),
        };
        tracing::debug!(?filter, page = page.page, "Listing recipes");
        self.recipes.list_recipes(&filter, viewer_id, page).await
    }

    pub async fn create(&self, author: &User, input: RecipeInput) -> Result<Recipe, AppError> {
        let draft = self.validate(input).await?;
        let id = self.recipes.insert_recipe(author.id, &draft).await?;
        tracing::info!(recipe_id = id, author_id = author.id, "Recipe created");
        self.get(id, Some(author)).await
    }

    /// Full replacement of a recipe's fields and associations. An absent
    /// image keeps the current one.
    pub async fn update(&self, actor: &User, id: i64, input: RecipeInput) -> Result<Recipe, AppError> {
        self.ensure_author(actor, id).await?;
        let draft = self.validate(input).await?;
        self.recipes.update_recipe(id, &draft).await?;
        tracing::info!(recipe_id = id, author_id = actor.id, "Recipe updated");
        self.get(id, Some(actor)).await
    }

    pub async fn delete(&self, actor: &User, id: i64) -> Result<(), AppError> {
        self.ensure_author(actor, id).await?;
        if !self.recipes.delete_recipe(id).await? {
            return Err(AppError::NotFound(format!("Recipe {id}")));
        }
        tracing::info!(recipe_id = id, author_id = actor.id, "Recipe deleted");
        Ok(())
    }

    /// Add a recipe to the user's favorites or cart.
    pub async fn add(&self, kind: Membership, user: &User, id: i64) -> Result<RecipeSummary, AppError> {
        let summary = self
            .recipes
            .recipe_summary(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Recipe {id}")))?;
        if !self.recipes.add_membership(kind, user.id, id).await? {
            return Err(AppError::validation(
                "recipe",
                format!("Recipe is already in {}.", kind.as_str()),
            ));
        }
        tracing::info!(recipe_id = id, user_id = user.id, list = kind.as_str(), "Recipe added");
        Ok(summary)
    }

    /// Remove a recipe from the user's favorites or cart.
    pub async fn remove(&self, kind: Membership, user: &User, id: i64) -> Result<(), AppError> {
        if self.recipes.recipe_author(id).await?.is_none() {
            return Err(AppError::NotFound(format!("Recipe {id}")));
        }
        if !self.recipes.remove_membership(kind, user.id, id).await? {
            return Err(AppError::validation(
                "recipe",
                format!("Recipe is not in {}.", kind.as_str()),
            ));
        }
        tracing::info!(recipe_id = id, user_id = user.id, list = kind.as_str(), "Recipe removed");
        Ok(())
    }

    /// Render the user's aggregated shopping list as plain text.
    pub async fn shopping_list(&self, user: &User) -> Result<String, AppError> {
        let items = self.recipes.shopping_list(user.id).await?;
        tracing::debug!(user_id = user.id, lines = items.len(), "Shopping list built");
        Ok(render_shopping_list(&items))
    }

    async fn ensure_author(&self, actor: &User, id: i64) -> Result<(), AppError> {
        match self.recipes.recipe_author(id).await? {
            None => Err(AppError::NotFound(format!("Recipe {id}"))),
            Some(author_id) if author_id != actor.id => Err(AppError::Forbidden(
                "Only the author can modify this recipe.".into(),
            )),
            Some(_) => Ok(()),
        }
    }

    async fn validate(&self, input: RecipeInput) -> Result<RecipeDraft, AppError> {
        let draft = validate_recipe(input, &self.limits)?;

        let ingredient_ids: Vec<i64> = draft.ingredients.iter().map(|i| i.id).collect();
        let missing = self.catalog.missing_ingredients(&ingredient_ids).await?;
        if let Some(id) = missing.first() {
            return Err(AppError::validation(
                "ingredients",
                format!("Ingredient {id} does not exist."),
            ));
        }

        let missing = self.catalog.missing_tags(&draft.tags).await?;
        if let Some(id) = missing.first() {
            return Err(AppError::validation("tags", format!("Tag {id} does not exist.")));
        }

        Ok(draft)
    }
}
