//! Catalog import from CSV.
//!
//! ```bash
//! bikeshop-cli import-products parts.csv
//! ```
//!
//! The file needs a header row with `name,brand,category,price,image_url`
//! (`image_url` may be left out). Products are matched by name: existing ones
//! are updated, new ones created, and brands are created on demand. Every
//! row is validated before anything is written, so a bad price aborts the
//! whole import.

use std::io;
use std::path::Path;

use bikeshop_core::catalog::DEFAULT_BRAND;
use bikeshop_core::{Price, PriceError};
use bikeshop_storefront::db::catalog::{NewProduct, Upserted};
use bikeshop_storefront::db::{CatalogRepository, RepositoryError};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Cannot read {path}: {source}")]
    Open { path: String, source: csv::Error },

    #[error("Line {line}: {source}")]
    Csv { line: u64, source: csv::Error },

    #[error("Line {line}: missing {field}")]
    MissingField { line: u64, field: &'static str },

    #[error("Line {line}: invalid price {value:?}: {source}")]
    InvalidPrice {
        line: u64,
        value: String,
        source: PriceError,
    },

    #[error(transparent)]
    Connect(#[from] super::ConnectError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Deserialize)]
struct CsvProduct {
    name: String,
    #[serde(default)]
    brand: String,
    category: String,
    price: String,
    #[serde(default)]
    image_url: String,
}

/// A validated CSV row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    pub name: String,
    pub brand: String,
    pub category: String,
    pub price: Price,
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
}

/// Parse and validate every row. Line numbers count the header as line 1.
pub fn parse_rows<R: io::Read>(reader: R) -> Result<Vec<ImportRow>, ImportError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();

    for (index, record) in reader.deserialize::<CsvProduct>().enumerate() {
        let line = index as u64 + 2;
        let record = record.map_err(|source| ImportError::Csv { line, source })?;

        if record.name.is_empty() {
            return Err(ImportError::MissingField { line, field: "name" });
        }
        if record.category.is_empty() {
            return Err(ImportError::MissingField {
                line,
                field: "category",
            });
        }
        let price = record
            .price
            .parse::<Price>()
            .map_err(|source| ImportError::InvalidPrice {
                line,
                value: record.price.clone(),
                source,
            })?;

        rows.push(ImportRow {
            name: record.name,
            brand: if record.brand.is_empty() {
                DEFAULT_BRAND.to_string()
            } else {
                record.brand
            },
            category: record.category,
            price,
            image_url: Some(record.image_url).filter(|url| !url.is_empty()),
        });
    }
    Ok(rows)
}

/// Import the CSV file at `path`.
pub async fn products(path: &Path) -> Result<ImportSummary, ImportError> {
    let file = std::fs::File::open(path).map_err(|e| ImportError::Open {
        path: path.display().to_string(),
        source: e.into(),
    })?;
    let rows = parse_rows(file)?;
    tracing::info!(rows = rows.len(), "CSV validated");

    let pool = super::connect().await?;
    let catalog = CatalogRepository::new(&pool);
    let mut summary = ImportSummary::default();

    for row in rows {
        let brand = catalog.get_or_create_brand(&row.brand).await?;
        let outcome = catalog
            .upsert_by_name(&NewProduct {
                name: row.name,
                brand_id: Some(brand.id),
                category: row.category,
                price: row.price,
                image: None,
                image_url: row.image_url,
            })
            .await?;
        match outcome {
            Upserted::Created => summary.created += 1,
            Upserted::Updated => summary.updated += 1,
        }
    }

    tracing::info!(
        created = summary.created,
        updated = summary.updated,
        "Imported/updated {} products",
        summary.created + summary.updated
    );
    Ok(summary)
}
