//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Password signup and login
//! - `cart` - Loading, storing, and resolving the session cart ledger
//! - `uploader` - Product creation and deletion with stored images

pub mod auth;
pub mod cart;
pub mod uploader;
