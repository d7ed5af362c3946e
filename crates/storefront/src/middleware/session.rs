//! Session middleware configuration.
//!
//! Sessions are stored in `PostgreSQL` by `tower-sessions-sqlx-store`. Its
//! table is created by `PostgresStore::migrate`, which the CLI's `migrate`
//! command runs alongside the schema migrations.
//!
//! The session cookie is signed with a key derived from
//! `STOREFRONT_SESSION_SECRET`; a cookie signed under another secret is
//! ignored and the request starts a fresh session.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};
use sqlx::PgPool;
use tower_sessions::cookie::Key;
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;

pub const SESSION_COOKIE_NAME: &str = "bikeshop_session";

/// Sessions expire after 7 days without a request.
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Session layer backed by the `PostgreSQL` store.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore, SignedCookie> {
    session_layer(
        PostgresStore::new(pool.clone()),
        &config.session_secret,
        config.secure_cookies(),
    )
}

/// Cookie settings shared by every store.
#[must_use]
pub fn session_layer<S: SessionStore>(
    store: S,
    secret: &SecretString,
    secure: bool,
) -> SessionManagerLayer<S, SignedCookie> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(signing_key(secret))
}

/// SHA-512 of the secret: exactly the 64 bytes a cookie `Key` needs.
fn signing_key(secret: &SecretString) -> Key {
    let digest = Sha512::digest(secret.expose_secret().as_bytes());
    Key::from(digest.as_slice())
}
