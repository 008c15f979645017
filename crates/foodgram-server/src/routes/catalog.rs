use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;

use foodgram_core::AppError;
use foodgram_core::traits::CatalogStore;

use crate::dto::{IngredientResponse, IngredientSearchQuery, TagResponse};
use crate::error::{ApiError, PathParam};
use crate::query::QueryParams;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/tags/",
    responses((status = 200, description = "All tags", body = Vec<TagResponse>)),
    tag = "catalog"
)]
pub async fn list_tags(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let tags = state.db.catalog_repo().list_tags().await?;
    let body: Vec<TagResponse> = tags.into_iter().map(Into::into).collect();
    Ok(axum::Json(body))
}

#[utoipa::path(
    get,
    path = "/api/tags/{id}/",
    params(("id" = i64, Path, description = "Tag ID")),
    responses(
        (status = 200, description = "Tag", body = TagResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "catalog"
)]
pub async fn get_tag(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let tag = state
        .db
        .catalog_repo()
        .get_tag(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tag {id}")))?;
    Ok(axum::Json(TagResponse::from(tag)))
}

// ---------------------------------------------------------------------------
// Ingredients
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/ingredients/",
    params(IngredientSearchQuery),
    responses((status = 200, description = "Matching ingredients", body = Vec<IngredientResponse>)),
    tag = "catalog"
)]
pub async fn list_ingredients(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<IngredientSearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let prefix = query.name.as_deref().map(str::trim).filter(|p| !p.is_empty());
    let found = state.db.catalog_repo().search_ingredients(prefix).await?;
    tracing::debug!(prefix = ?prefix, hits = found.len(), "Ingredient search");

    let body: Vec<IngredientResponse> = found.into_iter().map(Into::into).collect();
    Ok(axum::Json(body))
}

#[utoipa::path(
    get,
    path = "/api/ingredients/{id}/",
    params(("id" = i64, Path, description = "Ingredient ID")),
    responses(
        (status = 200, description = "Ingredient", body = IngredientResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "catalog"
)]
pub async fn get_ingredient(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let ingredient = state
        .db
        .catalog_repo()
        .get_ingredient(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Ingredient {id}")))?;
    Ok(axum::Json(IngredientResponse::from(ingredient)))
}
