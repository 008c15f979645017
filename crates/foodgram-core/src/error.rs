use thiserror::Error;

/// Application-wide error types for Foodgram.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request data failed validation. `field` names the offending input.
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// Referenced entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or invalid credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed to touch this resource.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Writing or reading uploaded media failed.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Shorthand for a [`AppError::Validation`] on a single field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns true for errors caused by the client's request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::Validation { .. }
                | AppError::NotFound(_)
                | AppError::Unauthorized(_)
                | AppError::Forbidden(_)
                | AppError::SerializationError(_)
        )
    }
}
