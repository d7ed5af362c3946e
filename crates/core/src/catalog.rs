//! Catalog domain types.

use serde::{Deserialize, Serialize};

use crate::types::{BrandId, Price, ProductId};

/// Products shown per catalog page.
pub const PAGE_SIZE: u32 = 12;

/// Brand assigned to uploads that do not name one.
pub const DEFAULT_BRAND: &str = "Unbranded";

/// Name given to uploads submitted without one.
pub const DEFAULT_PRODUCT_NAME: &str = "New Product";

/// Sidebar categories. Products should use one of these names so the
/// category filter finds them, but the catalog does not enforce it.
pub const CATEGORIES: &[&str] = &[
    "Ball Bearings & Plain Bearings",
    "Brakes",
    "Cables & Housings",
    "Cockpit",
    "Drivetrain",
    "Forks",
    "Frames",
    "Hubs & Freewheels",
    "Inner Tubes",
    "Pedals",
    "Power Meters",
    "Quick Releases & Thru Axles",
    "Rear Shock Absorbers",
    "Rims",
    "Saddles",
    "Seat Clamps",
    "Seatposts",
    "Shifting Components",
    "Spokes & Nipples",
    "Tires",
    "Wheels",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
}

/// A catalog product with its brand name resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub brand: Option<String>,
    pub category: String,
    pub price: Price,
    /// Path of the uploaded image relative to the media root.
    pub image: Option<String>,
    /// Remote image used when nothing was uploaded.
    pub image_url: Option<String>,
}

impl Product {
    /// The image to show for this product.
    ///
    /// An uploaded file wins over `image_url`; empty strings count as absent.
    #[must_use]
    pub fn display_image(&self, media_url: &str) -> Option<String> {
        if let Some(path) = non_empty(self.image.as_deref()) {
            return Some(format!(
                "{}/{}",
                media_url.trim_end_matches('/'),
                path.trim_start_matches('/')
            ));
        }
        non_empty(self.image_url.as_deref()).map(str::to_owned)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Filters accepted by the catalog listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    /// Exact category match.
    pub category: Option<String>,
    /// Case-insensitive substring of the product name.
    pub search: Option<String>,
}

impl CatalogFilter {
    /// Build a filter from raw query parameters; blank values are ignored.
    #[must_use]
    pub fn from_query(category: Option<&str>, search: Option<&str>) -> Self {
        Self {
            category: non_empty_owned(category),
            search: non_empty_owned(search),
        }
    }
}

fn non_empty_owned(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_owned)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(image: Option<&str>, image_url: Option<&str>) -> Product {
        Product {
            id: ProductId::new(1),
            name: "Volt Saddle".to_owned(),
            brand: Some("WTB".to_owned()),
            category: "Saddles".to_owned(),
            price: "64.95".parse().unwrap(),
            image: image.map(str::to_owned),
            image_url: image_url.map(str::to_owned),
        }
    }

    #[test]
    fn test_display_image_prefers_upload() {
        let p = product(Some("products/volt.jpg"), Some("https://img.example/volt.jpg"));
        assert_eq!(
            p.display_image("/media/").as_deref(),
            Some("/media/products/volt.jpg")
        );
    }

    #[test]
    fn test_display_image_falls_back_to_url() {
        let p = product(Some(""), Some("https://img.example/volt.jpg"));
        assert_eq!(
            p.display_image("/media").as_deref(),
            Some("https://img.example/volt.jpg")
        );
    }

    #[test]
    fn test_display_image_none() {
        assert_eq!(product(None, Some("  ")).display_image("/media"), None);
    }

    #[test]
    fn test_filter_ignores_blank_params() {
        let filter = CatalogFilter::from_query(Some(""), Some("hub"));
        assert_eq!(filter.category, None);
        assert_eq!(filter.search.as_deref(), Some("hub"));
    }

    #[test]
    fn test_categories_are_unique() {
        let mut sorted: Vec<_> = CATEGORIES.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), CATEGORIES.len());
    }
}
