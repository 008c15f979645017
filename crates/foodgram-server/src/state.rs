use foodgram_core::{AccountService, MediaStore, RecipeLimits, RecipeService};
use foodgram_db::{
    CatalogRepository, Database, RecipeRepository, SubscriptionRepository, UserRepository,
};

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    pub db: Database,
    pub media: MediaStore,
    pub limits: RecipeLimits,
    /// Upper bound on request body size.
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn accounts(&self) -> AccountService<UserRepository, SubscriptionRepository> {
        AccountService::new(self.db.user_repo(), self.db.subscription_repo())
    }

    pub fn recipes(&self) -> RecipeService<RecipeRepository, CatalogRepository> {
        RecipeService::new(self.db.recipe_repo(), self.db.catalog_repo(), self.limits)
    }
}
