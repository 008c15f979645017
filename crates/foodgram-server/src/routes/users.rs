use std::sync::Arc;

use axum::extract::{OriginalUri, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::auth::{CurrentUser, MaybeUser};
use crate::dto::{
    CreatedUserResponse, LoginRequest, RecipesLimitQuery, RegisterRequest, SetPasswordRequest,
    SubscriptionResponse, SubscriptionsQuery, TokenResponse, UserResponse,
};
use crate::error::{ApiError, JsonBody, PathParam};
use crate::pagination::{PageQuery, Paginated};
use crate::query::QueryParams;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/users/",
    params(PageQuery),
    responses(
        (status = 200, description = "Paginated users", body = Paginated<UserResponse>),
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    MaybeUser(viewer): MaybeUser,
    QueryParams(query): QueryParams<PageQuery>,
    OriginalUri(uri): OriginalUri,
) -> Result<impl IntoResponse, ApiError> {
    let request = query.request();
    let page = state
        .accounts()
        .list_profiles(viewer.as_ref(), request)
        .await?
        .map(UserResponse::from);

    Ok(axum::Json(Paginated::new(page, request, &uri)))
}

#[utoipa::path(
    post,
    path = "/api/users/",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = CreatedUserResponse),
        (status = 400, description = "Invalid registration data", body = crate::dto::ErrorResponse),
    ),
    tag = "users"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.accounts().register(body.into()).await?;
    Ok((
        StatusCode::CREATED,
        axum::Json(CreatedUserResponse::from(user)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}/",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    MaybeUser(viewer): MaybeUser,
    PathParam(id): PathParam<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state.accounts().profile(id, viewer.as_ref()).await?;
    Ok(axum::Json(UserResponse::from(profile)))
}

#[utoipa::path(
    get,
    path = "/api/users/me/",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized", body = crate::dto::ErrorResponse),
    ),
    security(("token" = [])),
    tag = "users"
)]
pub async fn me(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state.accounts().profile(user.id, Some(&user)).await?;
    Ok(axum::Json(UserResponse::from(profile)))
}

#[utoipa::path(
    post,
    path = "/api/users/set_password/",
    request_body = SetPasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Invalid password", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::dto::ErrorResponse),
    ),
    security(("token" = [])),
    tag = "users"
)]
pub async fn set_password(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    JsonBody(body): JsonBody<SetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .accounts()
        .set_password(&user, body.current_password, body.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/users/subscriptions/",
    params(SubscriptionsQuery),
    responses(
        (status = 200, description = "Followed authors", body = Paginated<SubscriptionResponse>),
        (status = 401, description = "Unauthorized", body = crate::dto::ErrorResponse),
    ),
    security(("token" = [])),
    tag = "subscriptions"
)]
pub async fn subscriptions(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    QueryParams(query): QueryParams<SubscriptionsQuery>,
    OriginalUri(uri): OriginalUri,
) -> Result<impl IntoResponse, ApiError> {
    let request = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .request();
    let page = state
        .accounts()
        .subscriptions(&user, request, query.recipes_limit)
        .await?
        .map(|sub| SubscriptionResponse::new(sub, &state.media));

    Ok(axum::Json(Paginated::new(page, request, &uri)))
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/subscribe/",
    params(("id" = i64, Path, description = "Author ID"), RecipesLimitQuery),
    responses(
        (status = 201, description = "Subscribed", body = SubscriptionResponse),
        (status = 400, description = "Self or repeat subscription", body = crate::dto::ErrorResponse),
        (status = 404, description = "Author not found", body = crate::dto::ErrorResponse),
    ),
    security(("token" = [])),
    tag = "subscriptions"
)]
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    PathParam(author_id): PathParam<i64>,
    QueryParams(query): QueryParams<RecipesLimitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let sub = state
        .accounts()
        .subscribe(&user, author_id, query.recipes_limit)
        .await?;
    Ok((
        StatusCode::CREATED,
        axum::Json(SubscriptionResponse::new(sub, &state.media)),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/subscribe/",
    params(("id" = i64, Path, description = "Author ID")),
    responses(
        (status = 204, description = "Unsubscribed"),
        (status = 400, description = "Not subscribed", body = crate::dto::ErrorResponse),
        (status = 404, description = "Author not found", body = crate::dto::ErrorResponse),
    ),
    security(("token" = [])),
    tag = "subscriptions"
)]
pub async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    PathParam(author_id): PathParam<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.accounts().unsubscribe(&user, author_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/auth/token/login/",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Bad credentials", body = crate::dto::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let auth_token = state.accounts().login(body.email, body.password).await?;
    Ok(axum::Json(TokenResponse { auth_token }))
}

#[utoipa::path(
    post,
    path = "/api/auth/token/logout/",
    responses(
        (status = 204, description = "Tokens revoked"),
        (status = 401, description = "Unauthorized", body = crate::dto::ErrorResponse),
    ),
    security(("token" = [])),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    state.accounts().logout(&user).await?;
    Ok(StatusCode::NO_CONTENT)
}
