//! Password authentication service.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;
use tracing::instrument;

use bikeshop_core::Username;

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Handles signup, login, and CLI-created accounts.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a non-staff user from the signup form.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername`, `AuthError::PasswordMismatch`, or
    /// `AuthError::WeakPassword` for bad input, and
    /// `AuthError::UserAlreadyExists` if the username is taken.
    #[instrument(skip(self, password1, password2))]
    pub async fn signup(
        &self,
        username: &str,
        password1: &str,
        password2: &str,
    ) -> Result<User, AuthError> {
        let username = Username::parse(username)?;
        if password1 != password2 {
            return Err(AuthError::PasswordMismatch);
        }
        self.create_user(&username, password1, false).await
    }

    /// Create a user directly, e.g. a staff account from the CLI.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if the password is rejected and
    /// `AuthError::UserAlreadyExists` if the username is taken.
    pub async fn create_user(
        &self,
        username: &Username,
        password: &str,
        is_staff: bool,
    ) -> Result<User, AuthError> {
        validate_password(password, username)?;
        let password_hash = hash_password(password)?;

        self.users
            .create(username, &password_hash, is_staff)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Check a username/password pair.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the user does not exist or
    /// the password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username = Username::parse(username).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_credentials(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;
        Ok(user)
    }
}

/// Reject passwords that are short, entirely numeric, or the username itself.
fn validate_password(password: &str, username: &Username) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "This password is too short. It must contain at least {MIN_PASSWORD_LENGTH} characters."
        )));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(AuthError::WeakPassword(
            "This password is entirely numeric.".to_string(),
        ));
    }
    if password.eq_ignore_ascii_case(username.as_str()) {
        return Err(AuthError::WeakPassword(
            "The password is too similar to the username.".to_string(),
        ));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
