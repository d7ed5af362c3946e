//! Sample catalog data.
//!
//! ```bash
//! bikeshop-cli load-sample-data
//! ```
//!
//! Inserts a fixed set of bike parts with placeholder images. Products that
//! already exist (by name) are left alone, so the command can be rerun.

use std::collections::BTreeSet;

use bikeshop_core::{Price, PriceError};
use bikeshop_storefront::db::catalog::NewProduct;
use bikeshop_storefront::db::{CatalogRepository, RepositoryError};
use thiserror::Error;

/// One sample product.
pub struct SampleItem {
    pub name: &'static str,
    pub brand: &'static str,
    pub category: &'static str,
    pub image_url: &'static str,
    pub price: &'static str,
}

const fn item(
    name: &'static str,
    brand: &'static str,
    category: &'static str,
    image_url: &'static str,
    price: &'static str,
) -> SampleItem {
    SampleItem {
        name,
        brand,
        category,
        image_url,
        price,
    }
}

#[rustfmt::skip]
pub const ITEMS: &[SampleItem] = &[
    item("DEORE BR-M6100 2-Piston Caliper", "Shimano", "Brakes", "https://picsum.photos/seed/deore_m6100/600/400", "89.00"),
    item("MT5 NEXT Disc Brake", "Magura", "Brakes", "https://picsum.photos/seed/magura_mt5/600/400", "139.00"),
    item("Road Pro Complete Cable Kit", "Jagwire", "Cables & Housings", "https://picsum.photos/seed/jagwire_roadpro/600/400", "39.00"),
    item("Service Course SL Stem", "Zipp", "Cockpit", "https://picsum.photos/seed/zipp_sc_sl/600/400", "120.00"),
    item("FOX 34 Trail Fork", "FOX", "Forks", "https://picsum.photos/seed/fox34/600/400", "899.00"),
    item("Deluxe Select+ Rear Shock", "RockShox", "Rear Shock Absorbers", "https://picsum.photos/seed/deluxe_select_plus/600/400", "439.00"),
    item("Pro 4 Rear Hub", "Hope", "Hubs & Freewheels", "https://picsum.photos/seed/hope_pro4/600/400", "249.00"),
    item("RS4 Rear Hub", "Hope", "Hubs & Freewheels", "https://picsum.photos/seed/hope_rs4/600/400", "259.00"),
    item("R 470 Rim (700C)", "DT Swiss", "Rims", "https://picsum.photos/seed/dt_r470/600/400", "79.00"),
    item("Marathon Plus 700x28C", "Schwalbe", "Tires", "https://picsum.photos/seed/schwalbe_mp/600/400", "58.00"),
    item("Race 28 Inner Tube (700x20-25)", "Continental", "Inner Tubes", "https://picsum.photos/seed/conti_race28/600/400", "9.50"),
    item("DURA-ACE PD-R9100 SPD-SL Pedals", "Shimano", "Pedals", "https://picsum.photos/seed/pd_r9100/600/400", "279.00"),
    item("Volt Saddle", "WTB", "Saddles", "https://picsum.photos/seed/wtb_volt/600/400", "64.95"),
];

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("Sample item {0:?} has an invalid price: {1}")]
    InvalidPrice(&'static str, PriceError),

    #[error(transparent)]
    Connect(#[from] super::ConnectError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSummary {
    pub inserted: usize,
    pub kept: usize,
    pub brands: usize,
}

/// Insert every sample product that is not already in the catalog.
pub async fn load() -> Result<SampleSummary, SampleError> {
    let pool = super::connect().await?;
    let catalog = CatalogRepository::new(&pool);
    let mut inserted = 0;

    for item in ITEMS {
        let price: Price = item
            .price
            .parse()
            .map_err(|e| SampleError::InvalidPrice(item.name, e))?;
        let brand = catalog.get_or_create_brand(item.brand).await?;
        let created = catalog
            .insert_if_absent(&NewProduct {
                name: item.name.to_string(),
                brand_id: Some(brand.id),
                category: item.category.to_string(),
                price,
                image: None,
                image_url: Some(item.image_url.to_string()),
            })
            .await?;
        if created {
            inserted += 1;
        }
    }

    let summary = SampleSummary {
        inserted,
        kept: ITEMS.len() - inserted,
        brands: ITEMS.iter().map(|i| i.brand).collect::<BTreeSet<_>>().len(),
    };
    tracing::info!(
        inserted = summary.inserted,
        kept = summary.kept,
        "Loaded/kept {} products across {} brands",
        ITEMS.len(),
        summary.brands
    );
    Ok(summary)
}
