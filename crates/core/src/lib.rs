//! Bikeshop Core - Domain types and storefront logic.
//!
//! This crate provides the pieces shared by every Bikeshop component:
//! - `storefront` - Public-facing shop (catalog, cart, checkout, uploader)
//! - `cli` - Command-line tools for migrations and catalog import
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. The storefront loads state (session values, catalog rows),
//! hands it to these functions, and persists whatever comes back.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, and usernames
//! - [`catalog`] - Product/brand domain types and the category list
//! - [`cart`] - The session cart ledger and its resolution against the catalog
//! - [`checkout`] - Checkout form validation and order snapshots
//! - [`pagination`] - Lenient page-number pagination

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod pagination;
pub mod types;

pub use types::*;
