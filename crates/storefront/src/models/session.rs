//! Session-related types.

use serde::{Deserialize, Serialize};

use bikeshop_core::UserId;

use super::User;

/// Identity of the logged-in user, as stored in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub is_staff: bool,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.to_string(),
            is_staff: user.is_staff,
        }
    }
}

/// Session keys. The cart and order keys are owned by `bikeshop_core`.
pub mod keys {
    /// The logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    pub use bikeshop_core::cart::SESSION_KEY as CART;
    pub use bikeshop_core::checkout::ORDER_SESSION_KEY as LAST_ORDER;
}
