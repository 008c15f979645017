use std::sync::Arc;

use axum::extract::{OriginalUri, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;

use foodgram_core::{AppError, MediaStore};
use foodgram_core::models::{Membership, PageRequest, RecipeInput, User};
use foodgram_core::shopping_list::SHOPPING_LIST_FILENAME;

use crate::auth::{CurrentUser, MaybeUser};
use crate::dto::{RecipeListParams, RecipeRequest, RecipeResponse, RecipeShortResponse};
use crate::error::{ApiError, JsonBody, PathParam};
use crate::pagination::Paginated;
use crate::query::{FromQueryString, QueryParams, pairs, parse_flag, parse_number};
use crate::state::AppState;

/// Parsed `/recipes/` query string.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RecipeListQuery {
    page: Option<u32>,
    limit: Option<u32>,
    author: Option<i64>,
    tags: Vec<String>,
    is_favorited: bool,
    is_in_shopping_cart: bool,
}

impl FromQueryString for RecipeListQuery {
    fn from_query(raw: Option<&str>) -> Result<Self, AppError> {
        let mut query = Self::default();
        for (key, value) in pairs(raw) {
            match key.as_str() {
                "page" => query.page = Some(parse_number("page", &value)?),
                "limit" => query.limit = Some(parse_number("limit", &value)?),
                "author" => query.author = Some(parse_number("author", &value)?),
                "tags" => query.tags.push(value),
                "is_favorited" => query.is_favorited = parse_flag("is_favorited", &value)?,
                "is_in_shopping_cart" => {
                    query.is_in_shopping_cart = parse_flag("is_in_shopping_cart", &value)?
                }
                _ => {}
            }
        }
        Ok(query)
    }
}

/// Store an uploaded image and swap the data URI in `input` for the
/// stored path. Returns the path so it can be discarded on failure.
async fn store_image(
    media: &MediaStore,
    input: &mut RecipeInput,
) -> Result<Option<String>, AppError> {
    let Some(data_uri) = input.image.take() else {
        return Ok(None);
    };
    let relative = media.save_recipe_image(&data_uri).await?;
    input.image = Some(relative.clone());
    Ok(Some(relative))
}

// ---------------------------------------------------------------------------
// Recipes
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/recipes/",
    params(RecipeListParams),
    responses(
        (status = 200, description = "Paginated recipes, newest first", body = Paginated<RecipeResponse>),
        (status = 400, description = "Malformed query", body = crate::dto::ErrorResponse),
    ),
    tag = "recipes"
)]
pub async fn list_recipes(
    State(state): State<Arc<AppState>>,
    MaybeUser(viewer): MaybeUser,
    QueryParams(query): QueryParams<RecipeListQuery>,
    OriginalUri(uri): OriginalUri,
) -> Result<impl IntoResponse, ApiError> {
    let request = PageRequest::new(query.page, query.limit);

    let page = state
        .recipes()
        .list(
            query.author,
            query.tags,
            query.is_favorited,
            query.is_in_shopping_cart,
            viewer.as_ref(),
            request,
        )
        .await?
        .map(|recipe| RecipeResponse::new(recipe, &state.media));

    Ok(axum::Json(Paginated::new(page, request, &uri)))
}

#[utoipa::path(
    post,
    path = "/api/recipes/",
    request_body = RecipeRequest,
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Invalid recipe", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::dto::ErrorResponse),
    ),
    security(("token" = [])),
    tag = "recipes"
)]
pub async fn create_recipe(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    JsonBody(body): JsonBody<RecipeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut input = RecipeInput::try_from(body)?;
    let stored = store_image(&state.media, &mut input).await?;

    let recipe = match state.recipes().create(&user, input).await {
        Ok(recipe) => recipe,
        Err(e) => {
            if let Some(path) = stored {
                state.media.discard(&path).await;
            }
            return Err(e.into());
        }
    };

    Ok((
        StatusCode::CREATED,
        axum::Json(RecipeResponse::new(recipe, &state.media)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}/",
    params(("id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Recipe", body = RecipeResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "recipes"
)]
pub async fn get_recipe(
    State(state): State<Arc<AppState>>,
    MaybeUser(viewer): MaybeUser,
    PathParam(id): PathParam<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let recipe = state.recipes().get(id, viewer.as_ref()).await?;
    Ok(axum::Json(RecipeResponse::new(recipe, &state.media)))
}

/// Serves both PUT and PATCH; every field except `image` is required.
#[utoipa::path(
    patch,
    path = "/api/recipes/{id}/",
    params(("id" = i64, Path, description = "Recipe ID")),
    request_body = RecipeRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Invalid recipe", body = crate::dto::ErrorResponse),
        (status = 403, description = "Not the author", body = crate::dto::ErrorResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    security(("token" = [])),
    tag = "recipes"
)]
pub async fn update_recipe(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    PathParam(id): PathParam<i64>,
    JsonBody(body): JsonBody<RecipeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut input = RecipeInput::try_from(body)?;
    let stored = store_image(&state.media, &mut input).await?;

    let recipe = match state.recipes().update(&user, id, input).await {
        Ok(recipe) => recipe,
        Err(e) => {
            if let Some(path) = stored {
                state.media.discard(&path).await;
            }
            return Err(e.into());
        }
    };

    Ok(axum::Json(RecipeResponse::new(recipe, &state.media)))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/",
    params(("id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 403, description = "Not the author", body = crate::dto::ErrorResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    security(("token" = [])),
    tag = "recipes"
)]
pub async fn delete_recipe(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    PathParam(id): PathParam<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.recipes().delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Favorites & shopping cart
// ---------------------------------------------------------------------------

async fn add_membership(
    state: &AppState,
    kind: Membership,
    user: &User,
    id: i64,
) -> Result<(StatusCode, axum::Json<RecipeShortResponse>), ApiError> {
    let summary = state.recipes().add(kind, user, id).await?;
    Ok((
        StatusCode::CREATED,
        axum::Json(RecipeShortResponse::new(summary, &state.media)),
    ))
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/favorite/",
    params(("id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 201, description = "Added to favorites", body = RecipeShortResponse),
        (status = 400, description = "Already a favorite", body = crate::dto::ErrorResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    security(("token" = [])),
    tag = "recipes"
)]
pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    PathParam(id): PathParam<i64>,
) -> Result<impl IntoResponse, ApiError> {
    add_membership(&state, Membership::Favorite, &user, id).await
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/favorite/",
    params(("id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Removed from favorites"),
        (status = 400, description = "Not a favorite", body = crate::dto::ErrorResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    security(("token" = [])),
    tag = "recipes"
)]
pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    PathParam(id): PathParam<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.recipes().remove(Membership::Favorite, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/shopping_cart/",
    params(("id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 201, description = "Added to the cart", body = RecipeShortResponse),
        (status = 400, description = "Already in the cart", body = crate::dto::ErrorResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    security(("token" = [])),
    tag = "recipes"
)]
pub async fn add_to_cart(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    PathParam(id): PathParam<i64>,
) -> Result<impl IntoResponse, ApiError> {
    add_membership(&state, Membership::ShoppingCart, &user, id).await
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/shopping_cart/",
    params(("id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Removed from the cart"),
        (status = 400, description = "Not in the cart", body = crate::dto::ErrorResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    security(("token" = [])),
    tag = "recipes"
)]
pub async fn remove_from_cart(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    PathParam(id): PathParam<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .recipes()
        .remove(Membership::ShoppingCart, &user, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/recipes/download_shopping_cart/",
    responses(
        (status = 200, description = "Shopping list attachment", body = String, content_type = "text/plain"),
        (status = 401, description = "Unauthorized", body = crate::dto::ErrorResponse),
    ),
    security(("token" = [])),
    tag = "recipes"
)]
pub async fn download_shopping_cart(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let list = state.recipes().shopping_list(&user).await?;
    let headers = [
        (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{SHOPPING_LIST_FILENAME}\""),
        ),
    ];
    Ok((headers, list))
}
