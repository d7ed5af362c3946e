//! Session-based authentication extractors.
//!
//! Page requests without a login are redirected to `/login`; API requests
//! (any path containing `/api/`) get a JSON 401 instead.

use axum::{
    Json,
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};

/// Requires a logged-in user.
///
/// ```rust,ignore
/// async fn uploader(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Requires a logged-in staff user; others get 403.
pub struct RequireStaff(pub CurrentUser);

/// The current user, if any. Never rejects.
pub struct OptionalAuth(pub Option<CurrentUser>);

#[derive(Debug, PartialEq, Eq)]
pub enum AuthRejection {
    RedirectToLogin,
    Unauthorized,
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "ok": false, "error": "auth", "message": "Login required" })),
            )
                .into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "Staff access required" })),
            )
                .into_response(),
        }
    }
}

fn is_api_request(parts: &Parts) -> bool {
    let path = parts
        .extensions
        .get::<OriginalUri>()
        .map_or_else(|| parts.uri.path(), |uri| uri.0.path());
    path.contains("/api/")
}

async fn current_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    match session.get::<CurrentUser>(session_keys::CURRENT_USER).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "unreadable user in session");
            None
        }
    }
}

async fn require_user(parts: &Parts) -> Result<CurrentUser, AuthRejection> {
    current_user(parts).await.ok_or_else(|| {
        if is_api_request(parts) {
            AuthRejection::Unauthorized
        } else {
            AuthRejection::RedirectToLogin
        }
    })
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_user(parts).await.map(Self)
    }
}

impl<S> FromRequestParts<S> for RequireStaff
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = require_user(parts).await?;
        if !user.is_staff {
            tracing::warn!(user_id = %user.id, "staff-only action refused");
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self(user))
    }
}

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(parts).await))
    }
}

/// Store the logged-in user, cycling the session id first.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn login_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Log out by flushing the whole session, cart included.
///
/// # Errors
///
/// Returns an error if the session store cannot delete the record.
pub async fn logout_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Router, body::Body, http::Request, routing::get};
    use bikeshop_core::UserId;
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, SessionManagerLayer};

    use super::*;

    async fn login_as(session: Session, staff: bool) -> &'static str {
        let user = CurrentUser {
            id: UserId::new(1),
            username: "mechanic".to_string(),
            is_staff: staff,
        };
        login_user(&session, &user).await.unwrap();
        "ok"
    }

    fn app() -> Router {
        Router::new()
            .route("/login-staff", get(|s: Session| login_as(s, true)))
            .route("/login-customer", get(|s: Session| login_as(s, false)))
            .route("/uploader", get(|RequireAuth(u): RequireAuth| async move { u.username }))
            .route(
                "/uploader/api/create",
                get(|RequireAuth(u): RequireAuth| async move { u.username }),
            )
            .route("/staff", get(|RequireStaff(u): RequireStaff| async move { u.username }))
            .route(
                "/whoami",
                get(|OptionalAuth(u): OptionalAuth| async move {
                    u.map_or_else(|| "guest".to_string(), |u| u.username)
                }),
            )
            .layer(SessionManagerLayer::new(MemoryStore::default()).with_secure(false))
    }

    async fn get_with(app: &Router, uri: &str, cookie: Option<&str>) -> Response {
        let mut req = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            req = req.header("cookie", cookie);
        }
        app.clone()
            .oneshot(req.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn login_cookie(app: &Router, uri: &str) -> String {
        let response = get_with(app, uri, None).await;
        let set_cookie = response.headers().get("set-cookie").unwrap().to_str().unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_page_redirects_to_login() {
        let response = get_with(&app(), "/uploader", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get("location").unwrap(), "/login");
    }

    #[tokio::test]
    async fn test_api_gets_json_401() {
        let response = get_with(&app(), "/uploader/api/create", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logged_in_user_passes() {
        let app = app();
        let cookie = login_cookie(&app, "/login-customer").await;
        let response = get_with(&app, "/uploader", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_staff_only() {
        let app = app();
        let customer = login_cookie(&app, "/login-customer").await;
        let response = get_with(&app, "/staff", Some(&customer)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let staff = login_cookie(&app, "/login-staff").await;
        let response = get_with(&app, "/staff", Some(&staff)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_optional_auth_never_rejects() {
        let response = get_with(&app(), "/whoami", None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
