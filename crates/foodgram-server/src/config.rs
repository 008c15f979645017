use std::path::PathBuf;

use foodgram_core::AppError;

const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory uploaded images are written to and served from.
    pub media_root: PathBuf,
    /// Public prefix for image URLs in responses.
    pub media_url: String,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            media_root: PathBuf::from("media"),
            media_url: "/media/".to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    /// Read configuration from environment variables.
    ///
    /// - `FOODGRAM_PORT` (default 8000)
    /// - `FOODGRAM_MEDIA_ROOT` (default `media`)
    /// - `FOODGRAM_MEDIA_URL` (default `/media/`)
    /// - `FOODGRAM_MAX_BODY_BYTES` (default 10 MiB)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();

        let port = match lookup("FOODGRAM_PORT") {
            None => defaults.port,
            Some(raw) => raw.parse().map_err(|_| {
                AppError::ConfigError(format!("Invalid FOODGRAM_PORT '{raw}': must be a port number"))
            })?,
        };

        let max_body_bytes = match lookup("FOODGRAM_MAX_BODY_BYTES") {
            None => defaults.max_body_bytes,
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(AppError::ConfigError(format!(
                        "Invalid FOODGRAM_MAX_BODY_BYTES '{raw}': must be a positive integer"
                    )));
                }
            },
        };

        Ok(Self {
            port,
            media_root: lookup("FOODGRAM_MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.media_root),
            media_url: lookup("FOODGRAM_MEDIA_URL").unwrap_or(defaults.media_url),
            max_body_bytes,
        })
    }
}
