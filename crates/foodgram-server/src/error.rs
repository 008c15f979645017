use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::StatusCode;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use axum::response::{IntoResponse, Response};

use foodgram_core::error::AppError;

use crate::dto::ErrorResponse;

/// Error returned by handlers and extractors.
pub enum ApiError {
    App(AppError),
    /// The request body could not be read or parsed as JSON.
    InvalidBody { status: StatusCode, message: String },
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            ApiError::InvalidBody { status, message } => {
                let body = ErrorResponse {
                    error: "invalid_body".to_string(),
                    message,
                    field: None,
                };
                return (status, axum::Json(body)).into_response();
            }
            ApiError::App(err) => err,
        };

        let (status, error_type) = match &err {
            AppError::Validation { .. } => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::SerializationError(_) => (StatusCode::BAD_REQUEST, "serialization_error"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::DatabaseError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::ConfigError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::StorageError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            AppError::Generic(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        if status.is_server_error() {
            tracing::error!(error = %err, "Request failed");
        }

        let body = match err {
            AppError::Validation { field, message } => ErrorResponse {
                error: error_type.to_string(),
                message,
                field: Some(field),
            },
            other => ErrorResponse {
                error: error_type.to_string(),
                message: other.to_string(),
                field: None,
            },
        };

        (status, axum::Json(body)).into_response()
    }
}

/// `axum::Json` with rejections rendered as [`ErrorResponse`].
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                // Oversized bodies keep their 413; parse failures are client errors.
                let status = match rejection.status() {
                    StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
                    _ => StatusCode::BAD_REQUEST,
                };
                Err(ApiError::InvalidBody {
                    status,
                    message: rejection.body_text(),
                })
            }
        }
    }
}

/// `axum::extract::Path` where an id that does not parse is a 404, since no
/// resource can live at that path.
pub struct PathParam<T>(pub T);

impl<S, T> FromRequestParts<S> for PathParam<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Path::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Path(value)) => Ok(Self(value)),
            Err(PathRejection::FailedToDeserializePathParams(_)) => {
                Err(AppError::NotFound(format!("Resource at {}", parts.uri.path())).into())
            }
            Err(other) => Err(AppError::Generic(other.body_text()).into()),
        }
    }
}
