//! Query-string extraction with per-field validation errors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use url::form_urlencoded;

use foodgram_core::AppError;

use crate::dto::{IngredientSearchQuery, RecipesLimitQuery, SubscriptionsQuery};
use crate::error::ApiError;
use crate::pagination::PageQuery;

/// A query string type that reports malformed values against the
/// parameter that carried them.
pub trait FromQueryString: Sized {
    fn from_query(raw: Option<&str>) -> Result<Self, AppError>;
}

/// Extracts `T` from the query string. Rejections are `validation_error`
/// bodies naming the bad parameter.
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: FromQueryString,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(T::from_query(parts.uri.query())?))
    }
}

/// Decoded `(key, value)` pairs in request order.
pub fn pairs(raw: Option<&str>) -> impl Iterator<Item = (String, String)> + '_ {
    form_urlencoded::parse(raw.unwrap_or_default().as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
}

pub fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, AppError> {
    value
        .parse()
        .map_err(|_| AppError::validation(field, "Enter a whole number."))
}

pub fn parse_flag(field: &str, value: &str) -> Result<bool, AppError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(AppError::validation(field, "Expected 0 or 1.")),
    }
}

impl FromQueryString for PageQuery {
    fn from_query(raw: Option<&str>) -> Result<Self, AppError> {
        let mut query = Self::default();
        for (key, value) in pairs(raw) {
            match key.as_str() {
                "page" => query.page = Some(parse_number("page", &value)?),
                "limit" => query.limit = Some(parse_number("limit", &value)?),
                _ => {}
            }
        }
        Ok(query)
    }
}

impl FromQueryString for RecipesLimitQuery {
    fn from_query(raw: Option<&str>) -> Result<Self, AppError> {
        let mut query = Self::default();
        for (key, value) in pairs(raw) {
            if key == "recipes_limit" {
                query.recipes_limit = Some(parse_number("recipes_limit", &value)?);
            }
        }
        Ok(query)
    }
}

impl FromQueryString for SubscriptionsQuery {
    fn from_query(raw: Option<&str>) -> Result<Self, AppError> {
        let page = PageQuery::from_query(raw)?;
        let limit = RecipesLimitQuery::from_query(raw)?;
        Ok(Self {
            page: page.page,
            limit: page.limit,
            recipes_limit: limit.recipes_limit,
        })
    }
}

impl FromQueryString for IngredientSearchQuery {
    fn from_query(raw: Option<&str>) -> Result<Self, AppError> {
        let name = pairs(raw).find(|(key, _)| key == "name").map(|(_, v)| v);
        Ok(Self { name })
    }
}
