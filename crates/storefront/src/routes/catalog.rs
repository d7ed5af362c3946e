//! Catalog listing.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use bikeshop_core::catalog::{CATEGORIES, CatalogFilter, PAGE_SIZE, Product};
use bikeshop_core::pagination::{Page, Paginator};
use bikeshop_core::{Price, ProductId};

use crate::db::CatalogRepository;
use crate::error::Result;
use crate::middleware::OptionalAuth;
use crate::models::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub cat: Option<String>,
    pub q: Option<String>,
    /// Kept as text: a page that is not a number means page 1.
    pub page: Option<String>,
}

/// A product as the JSON API shows it.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub brand: Option<String>,
    pub category: String,
    pub price: Price,
    pub display_image: Option<String>,
}

impl ProductView {
    #[must_use]
    pub fn new(product: &Product, media_url: &str) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            brand: product.brand.clone(),
            category: product.category.clone(),
            price: product.price,
            display_image: product.display_image(media_url),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub products: Vec<ProductView>,
    pub categories: &'static [&'static str],
    pub page: Page,
    pub cat: Option<String>,
    pub q: Option<String>,
    /// Lets the client show staff delete controls.
    pub user: Option<CurrentUser>,
}

/// `GET /?cat=&q=&page=`
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<CatalogResponse>> {
    let filter = CatalogFilter::from_query(query.cat.as_deref(), query.q.as_deref());
    let catalog = CatalogRepository::new(state.pool());

    let count = catalog.count(&filter).await?;
    let page = Paginator::new(count, PAGE_SIZE).page(query.page.as_deref());
    let products = catalog.list(&filter, &page).await?;

    let media_url = state.media_url();
    Ok(Json(CatalogResponse {
        products: products
            .iter()
            .map(|p| ProductView::new(p, media_url))
            .collect(),
        categories: CATEGORIES,
        page,
        cat: filter.category,
        q: filter.search,
        user,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_view_prefers_uploaded_image() {
        let product = Product {
            id: ProductId::new(4),
            name: "Fox 34 Float".to_string(),
            brand: Some("Fox".to_string()),
            category: "Forks".to_string(),
            price: "899.00".parse().unwrap(),
            image: Some("products/fox34_ab12.jpg".to_string()),
            image_url: Some("https://cdn.example.com/fox34.jpg".to_string()),
        };
        let view = ProductView::new(&product, "/media/");
        assert_eq!(
            view.display_image.as_deref(),
            Some("/media/products/fox34_ab12.jpg")
        );

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["price"], "899.00");
        assert_eq!(json["id"], 4);
    }
}
