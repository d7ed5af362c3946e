//! Product creation and deletion for the staff uploader.
//!
//! The image is written first so that a rejected file never touches the
//! database. If the row cannot be inserted afterwards, the stored file is
//! removed again.

use axum::body::Bytes;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use bikeshop_core::catalog::{DEFAULT_BRAND, DEFAULT_PRODUCT_NAME, Product};
use bikeshop_core::{Price, ProductId};

use crate::db::catalog::NewProduct;
use crate::db::{CatalogRepository, RepositoryError};
use crate::media::{MediaError, MediaStorage};

const MAX_NAME_LENGTH: usize = 200;
const MAX_BRAND_LENGTH: usize = 120;
const MAX_CATEGORY_LENGTH: usize = 200;

/// Raw uploader form fields.
#[derive(Debug, Clone, Default)]
pub struct ProductUpload {
    pub name: String,
    pub brand: String,
    pub category: String,
    pub price: String,
    pub image: Option<UploadedImage>,
}

#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedProduct {
    pub id: ProductId,
    pub name: String,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Missing category")]
    MissingCategory,

    #[error("Missing image")]
    MissingImage,

    #[error("{0} is too long (at most {1} characters)")]
    TooLong(&'static str, usize),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl UploadError {
    /// Whether the uploader sent something we refuse, as opposed to a
    /// failure on our side.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        match self {
            Self::MissingCategory | Self::MissingImage | Self::TooLong(..) => true,
            Self::Media(e) => e.is_client_error(),
            Self::Repository(_) => false,
        }
    }
}

fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), UploadError> {
    if value.chars().count() > max {
        return Err(UploadError::TooLong(field, max));
    }
    Ok(())
}

/// Uploader fields with defaults applied and limits checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFields {
    pub name: String,
    pub brand: String,
    pub category: String,
    pub price: Price,
}

impl ProductUpload {
    /// Split the form into checked fields and the image.
    ///
    /// A blank name becomes "New Product", a blank brand "Unbranded", and a
    /// price that does not parse becomes 0.00.
    ///
    /// # Errors
    ///
    /// `MissingCategory`, `MissingImage`, or `TooLong` for an overlong field.
    pub fn into_fields(self) -> Result<(ProductFields, UploadedImage), UploadError> {
        let name = match self.name.trim() {
            "" => DEFAULT_PRODUCT_NAME,
            name => name,
        };
        let brand = match self.brand.trim() {
            "" => DEFAULT_BRAND,
            brand => brand,
        };
        let category = self.category.trim();
        if category.is_empty() {
            return Err(UploadError::MissingCategory);
        }
        let image = self.image.ok_or(UploadError::MissingImage)?;

        check_length("Name", name, MAX_NAME_LENGTH)?;
        check_length("Brand", brand, MAX_BRAND_LENGTH)?;
        check_length("Category", category, MAX_CATEGORY_LENGTH)?;

        let fields = ProductFields {
            name: name.to_string(),
            brand: brand.to_string(),
            category: category.to_string(),
            price: Price::parse_lenient(&self.price),
        };
        Ok((fields, image))
    }
}

/// Validate the form, store the image, and insert the product.
///
/// # Errors
///
/// Client errors from [`ProductUpload::into_fields`] or a rejected file;
/// `UploadError::Media`/`UploadError::Repository` for storage failures.
#[instrument(skip(pool, media, upload), fields(name = %upload.name, category = %upload.category))]
pub async fn create_product(
    pool: &PgPool,
    media: &MediaStorage,
    upload: ProductUpload,
) -> Result<CreatedProduct, UploadError> {
    let (fields, image) = upload.into_fields()?;

    let path = media
        .save_product_image(&image.file_name, &image.bytes)
        .await?;

    let product = NewProduct {
        name: fields.name,
        brand_id: None,
        category: fields.category,
        price: fields.price,
        image: Some(path.clone()),
        image_url: None,
    };

    match insert_with_brand(&CatalogRepository::new(pool), &fields.brand, product).await {
        Ok(product) => {
            tracing::info!(product_id = %product.id, image = %path, "product created");
            Ok(CreatedProduct {
                id: product.id,
                name: product.name,
            })
        }
        Err(e) => {
            if let Err(cleanup) = media.delete(&path).await {
                tracing::error!(error = %cleanup, image = %path, "failed to remove orphaned image");
            }
            Err(e.into())
        }
    }
}

async fn insert_with_brand(
    catalog: &CatalogRepository<'_>,
    brand: &str,
    mut product: NewProduct,
) -> Result<Product, RepositoryError> {
    let brand = catalog.get_or_create_brand(brand).await?;
    product.brand_id = Some(brand.id);
    catalog.create_product(&product).await
}

/// Delete a product and its stored image.
///
/// Returns `false` if the product does not exist. The row is gone once this
/// returns `true`; failing to remove the file afterwards is only logged.
///
/// # Errors
///
/// Returns `RepositoryError` if the delete fails.
#[instrument(skip(pool, media))]
pub async fn delete_product(
    pool: &PgPool,
    media: &MediaStorage,
    id: ProductId,
) -> Result<bool, RepositoryError> {
    let Some(deleted) = CatalogRepository::new(pool).delete_product(id).await? else {
        return Ok(false);
    };

    remove_stored_image(media, deleted.image.as_deref()).await;
    tracing::info!(product_id = %deleted.id, "product deleted");
    Ok(true)
}

/// Remove a deleted product's image. Failure is only logged: the row is
/// already gone.
async fn remove_stored_image(media: &MediaStorage, image: Option<&str>) {
    let Some(image) = image.filter(|p| !p.is_empty()) else {
        return;
    };
    if let Err(e) = media.delete(image).await {
        tracing::warn!(error = %e, image, "product deleted but image was not removed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use sqlx::postgres::PgPoolOptions;

    use super::*;

    /// A pool whose every query fails quickly.
    fn unreachable_pool() -> PgPool {
        PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://bikeshop@127.0.0.1:1/bikeshop")
            .unwrap()
    }

    fn upload(category: &str, image: Option<(&str, &'static [u8])>) -> ProductUpload {
        ProductUpload {
            name: "Deore M6100 Cassette".to_string(),
            brand: "Shimano".to_string(),
            category: category.to_string(),
            price: "64.99".to_string(),
            image: image.map(|(file_name, bytes)| UploadedImage {
                file_name: file_name.to_string(),
                bytes: Bytes::from_static(bytes),
            }),
        }
    }

    #[tokio::test]
    async fn test_missing_category() {
        let dir = tempfile::tempdir().unwrap();
        let err = create_product(
            &unreachable_pool(),
            &MediaStorage::new(dir.path()),
            upload("  ", Some(("c.png", b"png"))),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, UploadError::MissingCategory));
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_missing_image() {
        let dir = tempfile::tempdir().unwrap();
        let err = create_product(
            &unreachable_pool(),
            &MediaStorage::new(dir.path()),
            upload("Drivetrain", None),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, UploadError::MissingImage));
    }

    #[tokio::test]
    async fn test_rejected_file_is_client_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = create_product(
            &unreachable_pool(),
            &MediaStorage::new(dir.path()),
            upload("Drivetrain", Some(("cassette.pdf", b"%PDF"))),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, UploadError::Media(MediaError::UnsupportedFormat(_))));
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_overlong_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut form = upload("Drivetrain", Some(("c.png", b"png")));
        form.name = "x".repeat(MAX_NAME_LENGTH + 1);
        let err = create_product(&unreachable_pool(), &MediaStorage::new(dir.path()), form)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::TooLong("Name", _)));
    }

    #[test]
    fn test_blank_fields_get_defaults() {
        let mut form = upload("  Drivetrain ", Some(("c.png", b"png")));
        form.name = "   ".to_string();
        form.brand = String::new();
        form.price = "not-a-price".to_string();

        let (fields, image) = form.into_fields().unwrap();
        assert_eq!(
            fields,
            ProductFields {
                name: "New Product".to_string(),
                brand: "Unbranded".to_string(),
                category: "Drivetrain".to_string(),
                price: Price::ZERO,
            }
        );
        assert_eq!(fields.price.to_string(), "0.00");
        assert_eq!(image.file_name, "c.png");
    }

    #[test]
    fn test_given_fields_are_trimmed_and_kept() {
        let mut form = upload("Drivetrain", Some(("c.png", b"png")));
        form.price = " 64.999 ".to_string();
        let (fields, _) = form.into_fields().unwrap();
        assert_eq!(fields.name, "Deore M6100 Cassette");
        assert_eq!(fields.brand, "Shimano");
        assert_eq!(fields.price.to_string(), "65.00");
    }

    #[test]
    fn test_negative_price_becomes_zero() {
        let mut form = upload("Drivetrain", Some(("c.png", b"png")));
        form.price = "-5".to_string();
        let (fields, _) = form.into_fields().unwrap();
        assert_eq!(fields.price, Price::ZERO);
    }

    #[tokio::test]
    async fn test_remove_stored_image_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let media = MediaStorage::new(dir.path());
        let path = media.save_product_image("fork.jpg", b"jpeg").await.unwrap();
        assert!(dir.path().join(&path).exists());

        remove_stored_image(&media, Some(&path)).await;
        assert!(!dir.path().join(&path).exists());

        // Already gone, blank, or absent: nothing to do.
        remove_stored_image(&media, Some(&path)).await;
        remove_stored_image(&media, Some("")).await;
        remove_stored_image(&media, None).await;
    }

    #[tokio::test]
    async fn test_failed_insert_removes_stored_image() {
        let dir = tempfile::tempdir().unwrap();
        let err = create_product(
            &unreachable_pool(),
            &MediaStorage::new(dir.path()),
            upload("Drivetrain", Some(("cassette.png", b"\x89PNG"))),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, UploadError::Repository(_)));
        assert!(!err.is_client_error());

        let product_dir = dir.path().join(crate::media::PRODUCT_DIR);
        let mut entries = tokio::fs::read_dir(&product_dir).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }
}
