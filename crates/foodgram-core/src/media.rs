use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use uuid::Uuid;

use crate::error::AppError;

const RECIPE_DIR: &str = "recipes";

/// Image formats accepted for recipe uploads, keyed by MIME subtype.
const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("png", "png"),
    ("jpeg", "jpg"),
    ("jpg", "jpg"),
    ("gif", "gif"),
    ("webp", "webp"),
];

/// A decoded `data:image/<type>;base64,<payload>` upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

/// Parse and decode a base64 data URI. Errors are reported on field `image`.
pub fn decode_data_uri(data: &str) -> Result<DecodedImage, AppError> {
    let invalid = |msg: &str| AppError::validation("image", msg);

    let rest = data
        .strip_prefix("data:")
        .ok_or_else(|| invalid("Image must be a base64 data URI."))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| invalid("Image must be a base64 data URI."))?;
    let mime = meta
        .strip_suffix(";base64")
        .ok_or_else(|| invalid("Image data must be base64 encoded."))?;
    let subtype = mime
        .strip_prefix("image/")
        .ok_or_else(|| invalid("Upload is not an image."))?
        .to_ascii_lowercase();

    let extension = ALLOWED_TYPES
        .iter()
        .find(|(name, _)| *name == subtype)
        .map(|(_, ext)| *ext)
        .ok_or_else(|| invalid("Unsupported image type."))?;

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| invalid("Image payload is not valid base64."))?;
    if bytes.is_empty() {
        return Err(invalid("Image payload is empty."));
    }

    Ok(DecodedImage { extension, bytes })
}

/// File-backed store for uploaded recipe images.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    base_url: String,
}

impl MediaStore {
    /// `root` is the directory on disk; `base_url` is the public prefix the
    /// directory is served under (e.g. `/media/`).
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            root: root.into(),
            base_url,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Decode a data URI and write it under `recipes/`, returning the
    /// relative path to store on the recipe.
    pub async fn save_recipe_image(&self, data_uri: &str) -> Result<String, AppError> {
        let image = decode_data_uri(data_uri)?;
        let relative = format!("{RECIPE_DIR}/{}.{}", Uuid::new_v4().simple(), image.extension);

        let dir = self.root.join(RECIPE_DIR);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::StorageError(format!("Failed to create {}: {e}", dir.display()))
        })?;

        let path = self.root.join(&relative);
        tokio::fs::write(&path, &image.bytes).await.map_err(|e| {
            AppError::StorageError(format!("Failed to write {}: {e}", path.display()))
        })?;

        tracing::debug!(path = %relative, bytes = image.bytes.len(), "Stored recipe image");
        Ok(relative)
    }

    /// Remove a stored file. Failures are logged and otherwise ignored.
    pub async fn discard(&self, relative: &str) {
        let path = self.root.join(relative);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove media file");
        }
    }

    /// Public URL for a stored relative path.
    pub fn url_for(&self, relative: &str) -> String {
        format!("{}{}", self.base_url, relative.trim_start_matches('/'))
    }
}
