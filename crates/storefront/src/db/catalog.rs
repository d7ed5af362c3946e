//! Catalog repository: brands and products.
//!
//! Queries are built at runtime with `sqlx::query_as` so the crate compiles
//! without a live database.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use bikeshop_core::catalog::{Brand, CatalogFilter, Product};
use bikeshop_core::pagination::Page;
use bikeshop_core::{BrandId, Price, ProductId};

use super::{RepositoryError, conflict_or};

const PRODUCT_SELECT: &str = "\
    SELECT p.id, p.name, b.name AS brand_name, p.category, p.price, p.image, p.image_url \
    FROM product p LEFT JOIN brand b ON b.id = p.brand_id";

const FILTER_CLAUSE: &str = "\
    WHERE ($1::text IS NULL OR p.category = $1) \
      AND ($2::text IS NULL OR p.name ILIKE '%' || $2 || '%')";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    brand_name: Option<String>,
    category: String,
    price: Decimal,
    image: Option<String>,
    image_url: Option<String>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("product {} has invalid price: {e}", row.id))
        })?;
        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            brand: row.brand_name,
            category: row.category,
            price,
            image: row.image,
            image_url: row.image_url,
        })
    }
}

fn into_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
    rows.into_iter().map(Product::try_from).collect()
}

/// Fields for a product insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub brand_id: Option<BrandId>,
    pub category: String,
    pub price: Price,
    pub image: Option<String>,
    pub image_url: Option<String>,
}

/// Outcome of an import upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Created,
    Updated,
}

/// A product row that was deleted, with what is needed to clean up after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedProduct {
    pub id: ProductId,
    /// Stored image path, relative to the media root.
    pub image: Option<String>,
}

/// Escape `ILIKE` wildcards so search text matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Count products matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn count(&self, filter: &CatalogFilter) -> Result<u64, RepositoryError> {
        let sql = format!("SELECT COUNT(*) FROM product p {FILTER_CLAUSE}");
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(filter.category.as_deref())
            .bind(filter.search.as_deref().map(escape_like))
            .fetch_one(self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// One page of products matching `filter`, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` for a row with an invalid price.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: &CatalogFilter,
        page: &Page,
    ) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!("{PRODUCT_SELECT} {FILTER_CLAUSE} ORDER BY p.id LIMIT $3 OFFSET $4");
        let rows: Vec<ProductRow> = sqlx::query_as(&sql)
            .bind(filter.category.as_deref())
            .bind(filter.search.as_deref().map(escape_like))
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;
        into_products(rows)
    }

    /// Products with the given ids. Missing ids are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(count = ids.len()))]
    pub async fn products_by_ids(
        &self,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<i64> = ids.iter().map(ProductId::as_i64).collect();
        let sql = format!("{PRODUCT_SELECT} WHERE p.id = ANY($1) ORDER BY p.id");
        let rows: Vec<ProductRow> = sqlx::query_as(&sql)
            .bind(raw)
            .fetch_all(self.pool)
            .await?;
        into_products(rows)
    }

    /// Fetch the brand called `name`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_or_create_brand(&self, name: &str) -> Result<Brand, RepositoryError> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let (id, name): (i64, String) = sqlx::query_as(
            "INSERT INTO brand (name) VALUES ($1) \
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
             RETURNING id, name",
        )
        .bind(name)
        .fetch_one(self.pool)
        .await?;
        Ok(Brand {
            id: BrandId::new(id),
            name,
        })
    }

    /// Insert a product and return it with its brand name resolved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create_product(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row: ProductRow = sqlx::query_as(
            "WITH inserted AS ( \
                 INSERT INTO product (name, brand_id, category, price, image, image_url) \
                 VALUES ($1, $2, $3, $4, $5, $6) \
                 RETURNING id, name, brand_id, category, price, image, image_url \
             ) \
             SELECT i.id, i.name, b.name AS brand_name, i.category, i.price, i.image, i.image_url \
             FROM inserted i LEFT JOIN brand b ON b.id = i.brand_id",
        )
        .bind(&product.name)
        .bind(product.brand_id)
        .bind(&product.category)
        .bind(product.price.amount())
        .bind(product.image.as_deref())
        .bind(product.image_url.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_or(e, "product"))?;
        Product::try_from(row)
    }

    /// Delete a product, returning its stored image path.
    ///
    /// Returns `None` if no product has this id. The caller removes the image
    /// file once the row is gone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    #[instrument(skip(self))]
    pub async fn delete_product(
        &self,
        id: ProductId,
    ) -> Result<Option<DeletedProduct>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let image: Option<Option<String>> =
            sqlx::query_scalar("DELETE FROM product WHERE id = $1 RETURNING image")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        tx.commit().await?;

        Ok(image.map(|image| DeletedProduct {
            id,
            image: image.filter(|path| !path.trim().is_empty()),
        }))
    }

    /// Update every product called `product.name`, or insert it if none exists.
    ///
    /// The stored image is left untouched on update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either statement fails.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn upsert_by_name(&self, product: &NewProduct) -> Result<Upserted, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE product SET brand_id = $2, category = $3, price = $4, image_url = $5 \
             WHERE name = $1",
        )
        .bind(&product.name)
        .bind(product.brand_id)
        .bind(&product.category)
        .bind(product.price.amount())
        .bind(product.image_url.as_deref())
        .execute(&mut *tx)
        .await?;

        let outcome = if updated.rows_affected() > 0 {
            Upserted::Updated
        } else {
            sqlx::query(
                "INSERT INTO product (name, brand_id, category, price, image, image_url) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(&product.name)
            .bind(product.brand_id)
            .bind(&product.category)
            .bind(product.price.amount())
            .bind(product.image.as_deref())
            .bind(product.image_url.as_deref())
            .execute(&mut *tx)
            .await?;
            Upserted::Created
        };

        tx.commit().await?;
        Ok(outcome)
    }

    /// Insert `product` unless one with the same name exists.
    ///
    /// Returns whether a row was inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_if_absent(&self, product: &NewProduct) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO product (name, brand_id, category, price, image, image_url) \
             SELECT $1::varchar, $2::bigint, $3::varchar, $4::numeric, $5::varchar, $6::varchar \
             WHERE NOT EXISTS (SELECT 1 FROM product WHERE name = $1::varchar)",
        )
        .bind(&product.name)
        .bind(product.brand_id)
        .bind(&product.category)
        .bind(product.price.amount())
        .bind(product.image.as_deref())
        .bind(product.image_url.as_deref())
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("hub"), "hub");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
    }

    fn row(price: &str) -> ProductRow {
        ProductRow {
            id: 7,
            name: "Pro 4 Rear Hub".to_string(),
            brand_name: Some("Hope".to_string()),
            category: "Hubs & Freewheels".to_string(),
            price: price.parse().unwrap(),
            image: None,
            image_url: Some("https://picsum.photos/seed/hope_pro4/600/400".to_string()),
        }
    }

    #[test]
    fn test_row_conversion() {
        let product = Product::try_from(row("249.00")).unwrap();
        assert_eq!(product.id, ProductId::new(7));
        assert_eq!(product.brand.as_deref(), Some("Hope"));
        assert_eq!(product.price.to_string(), "249.00");
    }

    #[test]
    fn test_row_with_negative_price_is_corrupt() {
        let err = Product::try_from(row("-1.00")).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }
}
