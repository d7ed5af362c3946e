//! User domain type.

use chrono::{DateTime, Utc};

use bikeshop_core::{UserId, Username};

/// A site account. The password hash never leaves the repository layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    /// Staff may delete products from the catalog grid.
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}
