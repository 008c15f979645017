use crate::error::AppError;

/// Bounds applied to recipe cooking time and ingredient amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecipeLimits {
    pub min_cooking_time: i32,
    pub max_cooking_time: i32,
    pub min_amount: i32,
    pub max_amount: i32,
}

impl Default for RecipeLimits {
    fn default() -> Self {
        Self {
            min_cooking_time: 1,
            max_cooking_time: 32_000,
            min_amount: 1,
            max_amount: 32_000,
        }
    }
}

impl RecipeLimits {
    /// Read limits from environment variables.
    ///
    /// - `FOODGRAM_MIN_COOKING_TIME` / `FOODGRAM_MAX_COOKING_TIME` (default 1 / 32000)
    /// - `FOODGRAM_MIN_AMOUNT` / `FOODGRAM_MAX_AMOUNT` (default 1 / 32000)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build limits from an arbitrary key lookup. Missing keys fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();
        let read = |key: &str, default: i32| -> Result<i32, AppError> {
            match lookup(key) {
                None => Ok(default),
                Some(raw) => {
                    let parsed: i32 = raw.trim().parse().map_err(|_| {
                        AppError::ConfigError(format!(
                            "Invalid {key} '{raw}': must be a positive integer"
                        ))
                    })?;
                    if parsed < 1 {
                        return Err(AppError::ConfigError(format!("{key} must be at least 1")));
                    }
                    Ok(parsed)
                }
            }
        };

        let limits = Self {
            min_cooking_time: read("FOODGRAM_MIN_COOKING_TIME", defaults.min_cooking_time)?,
            max_cooking_time: read("FOODGRAM_MAX_COOKING_TIME", defaults.max_cooking_time)?,
            min_amount: read("FOODGRAM_MIN_AMOUNT", defaults.min_amount)?,
            max_amount: read("FOODGRAM_MAX_AMOUNT", defaults.max_amount)?,
        };

        if limits.min_cooking_time > limits.max_cooking_time {
            return Err(AppError::ConfigError(
                "FOODGRAM_MIN_COOKING_TIME exceeds FOODGRAM_MAX_COOKING_TIME".into(),
            ));
        }
        if limits.min_amount > limits.max_amount {
            return Err(AppError::ConfigError(
                "FOODGRAM_MIN_AMOUNT exceeds FOODGRAM_MAX_AMOUNT".into(),
            ));
        }

        Ok(limits)
    }
}
