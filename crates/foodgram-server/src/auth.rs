use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use foodgram_core::AppError;
use foodgram_core::auth::parse_authorization;
use foodgram_core::models::User;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated user. Rejects with 401 when no valid token is sent.
pub struct CurrentUser(pub User);

/// The authenticated user if an `Authorization` header is present.
///
/// A header carrying an unknown or malformed token is still a 401; only a
/// missing header yields `None`.
pub struct MaybeUser(pub Option<User>);

impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(Self(None));
        };

        let token = header
            .to_str()
            .ok()
            .and_then(parse_authorization)
            .ok_or_else(|| {
                AppError::Unauthorized("Expected: Authorization: Token <key>".to_string())
            })?;

        let user = state
            .accounts()
            .authenticate(token)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid token.".to_string()))?;

        Ok(Self(Some(user)))
    }
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state).await?;
        user.map(Self).ok_or_else(|| {
            AppError::Unauthorized("Authentication credentials were not provided.".to_string())
                .into()
        })
    }
}
