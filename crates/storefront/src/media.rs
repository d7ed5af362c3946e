//! Local storage for uploaded product images.
//!
//! Files live under `<media root>/products/` with generated names. Stored
//! paths are relative to the media root, which is what the `product.image`
//! column holds.

use std::path::{Component, Path, PathBuf};

use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Directory (relative to the media root) product images are written to.
pub const PRODUCT_DIR: &str = "products";

/// Accepted image extensions, lowercase.
pub const SUPPORTED_FORMATS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Longest stem kept from the uploaded file name.
const MAX_STEM_LENGTH: usize = 40;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("file has no extension: {0:?}")]
    MissingExtension(String),

    #[error("unsupported image format '{0}'; supported: png, jpg, jpeg, gif, webp")]
    UnsupportedFormat(String),

    #[error("empty file")]
    Empty,

    #[error("path escapes the media root: {0:?}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Whether the error comes from the upload itself rather than the server.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingExtension(_) | Self::UnsupportedFormat(_) | Self::Empty
        )
    }
}

/// Lowercased extension of `file_name` if it is a supported image format.
///
/// # Errors
///
/// Returns `MediaError::MissingExtension` or `MediaError::UnsupportedFormat`.
pub fn image_extension(file_name: &str) -> Result<String, MediaError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| MediaError::MissingExtension(file_name.to_string()))?
        .to_ascii_lowercase();

    if SUPPORTED_FORMATS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(MediaError::UnsupportedFormat(ext))
    }
}

/// File-name-safe version of the uploaded name's stem.
fn sanitized_stem(file_name: &str) -> String {
    let stem: String = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .take(MAX_STEM_LENGTH)
        .collect();

    let stem = stem.trim_matches('_');
    if stem.is_empty() {
        "image".to_string()
    } else {
        stem.to_string()
    }
}

/// Image storage rooted at a directory on local disk.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a product image and return its path relative to the media root.
    ///
    /// # Errors
    ///
    /// Returns a client-side `MediaError` for empty files or unsupported
    /// extensions, and `MediaError::Io` if the file cannot be written.
    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn save_product_image(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, MediaError> {
        let ext = image_extension(file_name)?;
        if bytes.is_empty() {
            return Err(MediaError::Empty);
        }

        let dir = self.root.join(PRODUCT_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let name = format!(
            "{}_{}.{ext}",
            sanitized_stem(file_name),
            Uuid::new_v4().simple()
        );
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dir.join(&name))
            .await?;
        file.write_all(bytes).await?;
        file.flush().await?;

        let relative = format!("{PRODUCT_DIR}/{name}");
        tracing::info!(path = %relative, "stored product image");
        Ok(relative)
    }

    /// Remove a stored file. A file that is already gone is not an error.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::InvalidPath` for paths that would leave the media
    /// root and `MediaError::Io` for other filesystem failures.
    pub async fn delete(&self, relative: &str) -> Result<(), MediaError> {
        let path = self.resolve(relative)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(path = %relative, "deleted media file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %relative, "media file already absent");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf, MediaError> {
        let rel = Path::new(relative);
        let only_normal = rel
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if relative.is_empty() || !only_normal {
            return Err(MediaError::InvalidPath(relative.to_string()));
        }
        Ok(self.root.join(rel))
    }
}
