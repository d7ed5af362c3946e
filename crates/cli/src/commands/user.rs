//! User management.
//!
//! ```bash
//! BIKESHOP_USER_PASSWORD='...' bikeshop-cli user create -u mechanic --staff
//! ```
//!
//! The password is taken from the environment so it never appears in shell
//! history or the process list.

use bikeshop_core::{UserId, Username, UsernameError};
use bikeshop_storefront::services::auth::{AuthError, AuthService};
use thiserror::Error;

pub const PASSWORD_ENV_VAR: &str = "BIKESHOP_USER_PASSWORD";

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    #[error(transparent)]
    Connect(#[from] super::ConnectError),

    #[error("Could not create user: {0}")]
    Auth(#[from] AuthError),
}

/// Create a user, optionally with staff rights.
pub async fn create(username: &str, staff: bool) -> Result<UserId, UserError> {
    let username = Username::parse(username)?;
    let pool = super::connect().await?;

    let password = std::env::var(PASSWORD_ENV_VAR)
        .ok()
        .filter(|p| !p.is_empty())
        .ok_or(UserError::MissingEnvVar(PASSWORD_ENV_VAR))?;

    let user = AuthService::new(&pool)
        .create_user(&username, &password, staff)
        .await?;

    tracing::info!(user_id = %user.id, username = %user.username, staff, "User created");
    Ok(user.id)
}
