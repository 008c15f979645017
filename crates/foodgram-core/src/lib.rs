pub mod accounts;
pub mod auth;
pub mod config;
pub mod error;
pub mod media;
pub mod models;
pub mod recipes;
pub mod shopping_list;
pub mod traits;
pub mod validation;


pub use accounts::AccountService;
pub use config::RecipeLimits;
pub use error::AppError;
pub use media::MediaStore;
pub use recipes::RecipeService;
pub use traits::{CatalogStore, RecipeStore, SubscriptionStore, UserStore};
