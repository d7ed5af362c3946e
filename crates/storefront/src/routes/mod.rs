//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                            - Catalog (?cat=&q=&page=)
//! GET  /health                      - Liveness
//! GET  /health/ready                - Readiness (database)
//!
//! # Cart
//! GET  /cart                        - Cart contents
//! GET  /cart/count                  - Cart badge count
//! POST /cart/add/{product_id}       - Add (form: qty)
//! POST /cart/update/{product_id}    - Set quantity (form: qty)
//! POST /cart/remove/{product_id}    - Remove line
//!
//! # Checkout
//! GET  /checkout                    - Review cart
//! POST /checkout                    - Place order
//! GET  /success                     - Last order (shown once)
//!
//! # Auth
//! GET|POST /signup
//! GET|POST /login
//! GET|POST /logout
//!
//! # Uploader (login required)
//! GET  /uploader
//! POST /uploader/api/create         - Multipart product create
//! POST /uploader/api/delete/{pk}
//!
//! # Staff
//! POST /products/{id}/delete
//! ```

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod products;
pub mod uploader;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .route("/add/{product_id}", post(cart::add))
        .route("/update/{product_id}", post(cart::update))
        .route("/remove/{product_id}", post(cart::remove))
}

/// Signup and login are rate limited per client IP.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", get(auth::signup_page).post(auth::signup))
        .route("/login", get(auth::login_page).post(auth::login))
        .route_layer(auth_rate_limiter())
        .route("/logout", get(auth::logout).post(auth::logout))
}

pub fn uploader_api_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/create",
            post(uploader::create).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/delete/{pk}", post(uploader::delete))
        .route_layer(api_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::index))
        .nest("/cart", cart_routes())
        .route("/checkout", get(checkout::show).post(checkout::submit))
        .route("/success", get(checkout::success))
        .merge(auth_routes())
        .route("/uploader", get(uploader::page))
        .nest("/uploader/api", uploader_api_routes(max_upload_bytes))
        .route("/products/{id}/delete", post(products::delete))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    use crate::config::{MediaConfig, StorefrontConfig};
    use crate::middleware::session_layer;
    use crate::state::AppState;

    /// The full app over an in-memory session store. Nothing here may touch
    /// the database: the pool points at a closed port.
    fn app(media_root: &std::path::Path) -> axum::Router {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://bikeshop@127.0.0.1:1/bikeshop"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%"),
            media: MediaConfig {
                root: media_root.to_path_buf(),
                ..MediaConfig::default()
            },
            sentry_dsn: None,
            sentry_environment: None,
        };
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy(config.database_url())
            .unwrap();
        let sessions = session_layer(MemoryStore::default(), &config.session_secret, false);
        crate::app(AppState::new(config, pool), sessions)
    }

    fn request(method: &str, uri: &str, cookie: Option<&str>) -> axum::http::request::Builder {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", "198.51.100.4");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder
    }

    fn form(method: &str, uri: &str, cookie: Option<&str>, body: &'static str) -> Request<Body> {
        request(method, uri, cookie)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("x-requested-with", "XMLHttpRequest")
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: &axum::Router, req: Request<Body>) -> Response {
        app.clone().oneshot(req).await.unwrap()
    }

    async fn json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn session_cookie(response: &Response) -> String {
        let set_cookie = response.headers().get(header::SET_COOKIE).unwrap();
        set_cookie.to_str().unwrap().split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_and_headers() {
        let dir = tempfile::tempdir().unwrap();
        let req = request("GET", "/health", None).body(Body::empty()).unwrap();
        let response = send(&app(dir.path()), req).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
    }

    #[tokio::test]
    async fn test_add_to_cart_and_count() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());

        let response = send(&app, form("POST", "/cart/add/3", None, "qty=2")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = session_cookie(&response);
        assert_eq!(json(response).await, serde_json::json!({ "ok": true, "count": 2 }));

        let response = send(&app, form("POST", "/cart/add/7", Some(&cookie), "")).await;
        assert_eq!(json(response).await["count"], 3);

        let response = send(
            &app,
            request("GET", "/cart/count", Some(&cookie)).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(json(response).await, serde_json::json!({ "count": 3 }));
    }

    #[tokio::test]
    async fn test_add_rejects_bad_quantity() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());

        let response = send(&app, form("POST", "/cart/add/3", None, "qty=2")).await;
        let cookie = session_cookie(&response);

        for body in ["qty=abc", "qty=0", "qty=-4"] {
            let response = send(&app, form("POST", "/cart/add/3", Some(&cookie), body)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        }

        let response = send(
            &app,
            request("GET", "/cart/count", Some(&cookie)).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(json(response).await["count"], 2);
    }

    #[tokio::test]
    async fn test_non_ajax_add_redirects_to_cart() {
        let dir = tempfile::tempdir().unwrap();
        let req = request("POST", "/cart/add/3", None)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("qty=1"))
            .unwrap();
        let response = send(&app(dir.path()), req).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/cart");
    }

    #[tokio::test]
    async fn test_success_without_order() {
        let dir = tempfile::tempdir().unwrap();
        let response = send(
            &app(dir.path()),
            request("GET", "/success", None).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await, serde_json::json!({ "order": null }));
    }

    #[tokio::test]
    async fn test_uploader_requires_login() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());

        let req = request("GET", "/uploader", None).body(Body::empty()).unwrap();
        let response = send(&app, req).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");

        let response = send(
            &app,
            request("POST", "/uploader/api/create", None)
                .header(header::CONTENT_TYPE, "multipart/form-data; boundary=X")
                .body(Body::from("--X--\r\n"))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json(response).await,
            serde_json::json!({ "ok": false, "error": "auth", "message": "Login required" })
        );

        let response = send(
            &app,
            request("POST", "/uploader/api/delete/5", None).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_staff_delete_requires_login() {
        let dir = tempfile::tempdir().unwrap();
        let response = send(
            &app(dir.path()),
            request("POST", "/products/5/delete", None).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
    }

    #[tokio::test]
    async fn test_logout_redirects_home() {
        let dir = tempfile::tempdir().unwrap();
        let response = send(
            &app(dir.path()),
            request("POST", "/logout", None).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
    }
}
