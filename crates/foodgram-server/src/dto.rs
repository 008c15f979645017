use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use foodgram_core::{AppError, MediaStore};
use foodgram_core::models::{
    Ingredient, IngredientAmount, NewUser, Profile, Recipe, RecipeIngredient, RecipeInput,
    RecipeSummary, Subscription, Tag, User,
};

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

impl From<RegisterRequest> for NewUser {
    fn from(req: RegisterRequest) -> Self {
        NewUser {
            email: req.email,
            username: req.username,
            first_name: req.first_name,
            last_name: req.last_name,
            password: req.password,
        }
    }
}

/// Returned by registration; carries no viewer-relative fields.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CreatedUserResponse {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for CreatedUserResponse {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl From<Profile> for UserResponse {
    fn from(profile: Profile) -> Self {
        Self {
            email: profile.user.email,
            id: profile.user.id,
            username: profile.user.username,
            first_name: profile.user.first_name,
            last_name: profile.user.last_name,
            is_subscribed: profile.is_subscribed,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SetPasswordRequest {
    pub new_password: Option<String>,
    pub current_password: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct TokenResponse {
    pub auth_token: String,
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

#[derive(Debug, Default, utoipa::IntoParams)]
pub struct RecipesLimitQuery {
    /// Maximum number of recipes embedded per author
    pub recipes_limit: Option<u32>,
}

#[derive(Debug, Default, utoipa::IntoParams)]
pub struct SubscriptionsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Maximum number of recipes embedded per author
    pub recipes_limit: Option<u32>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SubscriptionResponse {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub recipes: Vec<RecipeShortResponse>,
    pub recipes_count: i64,
}

impl SubscriptionResponse {
    pub fn new(sub: Subscription, media: &MediaStore) -> Self {
        Self {
            email: sub.author.email,
            id: sub.author.id,
            username: sub.author.username,
            first_name: sub.author.first_name,
            last_name: sub.author.last_name,
            is_subscribed: sub.is_subscribed,
            recipes: sub
                .recipes
                .into_iter()
                .map(|r| RecipeShortResponse::new(r, media))
                .collect(),
            recipes_count: sub.recipes_count,
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct TagResponse {
    pub id: i64,
    pub name: String,
    /// Hex color, `#RRGGBB`
    pub color: String,
    pub slug: String,
}

impl From<Tag> for TagResponse {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
            color: tag.color,
            slug: tag.slug,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct IngredientResponse {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

impl From<Ingredient> for IngredientResponse {
    fn from(i: Ingredient) -> Self {
        Self {
            id: i.id,
            name: i.name,
            measurement_unit: i.measurement_unit,
        }
    }
}

#[derive(Debug, Default, utoipa::IntoParams)]
pub struct IngredientSearchQuery {
    /// Case-insensitive name prefix
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// Recipes
// ---------------------------------------------------------------------------

/// An integer that may also arrive as a numeric string (`"15"`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WholeNumber {
    Int(i64),
    Text(String),
}

impl WholeNumber {
    fn resolve<T: TryFrom<i64>>(self, field: &str) -> Result<T, AppError> {
        let value = match self {
            WholeNumber::Int(n) => n,
            WholeNumber::Text(raw) => raw
                .trim()
                .parse()
                .map_err(|_| AppError::validation(field, "Enter a whole number."))?,
        };
        T::try_from(value).map_err(|_| AppError::validation(field, "Number is out of range."))
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct IngredientAmountRequest {
    pub id: i64,
    #[schema(value_type = i32)]
    pub amount: WholeNumber,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RecipeRequest {
    pub ingredients: Option<Vec<IngredientAmountRequest>>,
    pub tags: Option<Vec<i64>>,
    /// Base64 data URI, e.g. `data:image/png;base64,...`
    pub image: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    /// Minutes
    #[schema(value_type = Option<i64>)]
    pub cooking_time: Option<WholeNumber>,
}

impl TryFrom<RecipeRequest> for RecipeInput {
    type Error = AppError;

    fn try_from(req: RecipeRequest) -> Result<Self, Self::Error> {
        let cooking_time = req
            .cooking_time
            .map(|n| n.resolve("cooking_time"))
            .transpose()?;
        let ingredients = req
            .ingredients
            .map(|items| {
                items
                    .into_iter()
                    .map(|i| {
                        Ok(IngredientAmount {
                            id: i.id,
                            amount: i.amount.resolve("ingredients")?,
                        })
                    })
                    .collect::<Result<Vec<_>, AppError>>()
            })
            .transpose()?;

        Ok(RecipeInput {
            name: req.name,
            text: req.text,
            cooking_time,
            tags: req.tags,
            ingredients,
            image: req.image,
        })
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RecipeIngredientResponse {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

impl From<RecipeIngredient> for RecipeIngredientResponse {
    fn from(i: RecipeIngredient) -> Self {
        Self {
            id: i.id,
            name: i.name,
            measurement_unit: i.measurement_unit,
            amount: i.amount,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RecipeResponse {
    pub id: i64,
    pub tags: Vec<TagResponse>,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    /// Public image URL
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i32,
    pub pub_date: DateTime<Utc>,
}

impl RecipeResponse {
    pub fn new(recipe: Recipe, media: &MediaStore) -> Self {
        Self {
            id: recipe.id,
            tags: recipe.tags.into_iter().map(Into::into).collect(),
            author: recipe.author.into(),
            ingredients: recipe.ingredients.into_iter().map(Into::into).collect(),
            is_favorited: recipe.is_favorited,
            is_in_shopping_cart: recipe.is_in_shopping_cart,
            name: recipe.name,
            image: recipe.image.map(|path| media.url_for(&path)),
            text: recipe.text,
            cooking_time: recipe.cooking_time,
            pub_date: recipe.pub_date,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RecipeShortResponse {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    pub cooking_time: i32,
}

impl RecipeShortResponse {
    pub fn new(summary: RecipeSummary, media: &MediaStore) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            image: summary.image.map(|path| media.url_for(&path)),
            cooking_time: summary.cooking_time,
        }
    }
}

/// Documents the recipe list query. The handler parses the raw query
/// string itself because `tags` may repeat.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct RecipeListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Author id
    pub author: Option<i64>,
    /// Tag slugs; a recipe matches if it has any of them
    pub tags: Option<Vec<String>>,
    /// `1` to show only the requester's favorites
    pub is_favorited: Option<u8>,
    /// `1` to show only recipes in the requester's cart
    pub is_in_shopping_cart: Option<u8>,
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// Offending input field for validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}
