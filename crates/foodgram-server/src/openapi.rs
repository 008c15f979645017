use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Foodgram API",
        version = "0.1.0",
        description = "Recipe sharing: publish recipes, follow authors, collect favorites and build shopping lists."
    ),
    paths(
        crate::routes::users::list_users,
        crate::routes::users::register,
        crate::routes::users::get_user,
        crate::routes::users::me,
        crate::routes::users::set_password,
        crate::routes::users::subscriptions,
        crate::routes::users::subscribe,
        crate::routes::users::unsubscribe,
        crate::routes::users::login,
        crate::routes::users::logout,
        crate::routes::catalog::list_tags,
        crate::routes::catalog::get_tag,
        crate::routes::catalog::list_ingredients,
        crate::routes::catalog::get_ingredient,
        crate::routes::recipes::list_recipes,
        crate::routes::recipes::create_recipe,
        crate::routes::recipes::get_recipe,
        crate::routes::recipes::update_recipe,
        crate::routes::recipes::delete_recipe,
        crate::routes::recipes::add_favorite,
        crate::routes::recipes::remove_favorite,
        crate::routes::recipes::add_to_cart,
        crate::routes::recipes::remove_from_cart,
        crate::routes::recipes::download_shopping_cart,
        crate::routes::health,
    ),
    components(schemas(
        crate::dto::RegisterRequest,
        crate::dto::CreatedUserResponse,
        crate::dto::UserResponse,
        crate::dto::SetPasswordRequest,
        crate::dto::LoginRequest,
        crate::dto::TokenResponse,
        crate::dto::SubscriptionResponse,
        crate::dto::TagResponse,
        crate::dto::IngredientResponse,
        crate::dto::IngredientAmountRequest,
        crate::dto::RecipeRequest,
        crate::dto::RecipeIngredientResponse,
        crate::dto::RecipeResponse,
        crate::dto::RecipeShortResponse,
        crate::dto::HealthResponse,
        crate::dto::ErrorResponse,
    )),
    tags(
        (name = "users", description = "Registration and profiles"),
        (name = "subscriptions", description = "Following authors"),
        (name = "auth", description = "Token login and logout"),
        (name = "catalog", description = "Tags and ingredients"),
        (name = "recipes", description = "Recipes, favorites and the shopping cart"),
        (name = "system", description = "Health and system status"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds the `Authorization: Token <key>` scheme to the OpenAPI spec.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "token",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::with_description(
                            "Authorization",
                            "`Token <key>` as returned by /api/auth/token/login/.",
                        ),
                    ),
                ),
            );
        }
    }
}
