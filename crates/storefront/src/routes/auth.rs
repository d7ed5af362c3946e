//! Signup, login, and logout.

use axum::{
    Form, Json,
    extract::State,
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{login_user, logout_user};
use crate::models::CurrentUser;
use crate::services::auth::AuthService;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

// =============================================================================
// Signup
// =============================================================================

/// Describe the signup form.
pub async fn signup_page() -> impl IntoResponse {
    Json(json!({ "fields": ["username", "password1", "password2"] }))
}

/// Create an account and log it in.
#[instrument(skip(state, session, form), fields(username = %form.username))]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Result<Redirect> {
    let user = AuthService::new(state.pool())
        .signup(&form.username, &form.password1, &form.password2)
        .await?;

    let current = CurrentUser::from(&user);
    login_user(&session, &current).await?;
    set_sentry_user(&current.id, &current.username);
    tracing::info!(user_id = %current.id, "user signed up");

    Ok(Redirect::to("/"))
}

// =============================================================================
// Login / Logout
// =============================================================================

/// Describe the login form.
pub async fn login_page() -> impl IntoResponse {
    Json(json!({ "fields": ["username", "password"] }))
}

#[instrument(skip(state, session, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect> {
    let user = AuthService::new(state.pool())
        .login(&form.username, &form.password)
        .await
        .inspect_err(|e| tracing::info!(error = %e, "login failed"))?;

    let current = CurrentUser::from(&user);
    login_user(&session, &current).await?;
    set_sentry_user(&current.id, &current.username);

    Ok(Redirect::to("/"))
}

/// Log out. The whole session goes, cart included.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    logout_user(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/"))
}
