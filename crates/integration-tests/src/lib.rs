//! Helpers for the Bikeshop integration tests.
//!
//! The tests drive a running storefront over HTTP and are `#[ignore]`d by
//! default.
//!
//! ```bash
//! cargo run -p bikeshop-cli -- migrate
//! cargo run -p bikeshop-cli -- load-sample-data
//! cargo run -p bikeshop-storefront &
//! cargo test -p bikeshop-integration-tests -- --ignored
//! ```
//!
//! `STOREFRONT_BASE_URL` points the tests at another server.

use reqwest::{Client, RequestBuilder, StatusCode, redirect};
use serde_json::Value;

pub const AJAX_HEADER: (&str, &str) = ("X-Requested-With", "XMLHttpRequest");

/// Password used for accounts the tests sign up.
pub const TEST_PASSWORD: &str = "gravel-grinder-42";

#[must_use]
pub fn base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A client with its own cookie jar that does not follow redirects, so
/// tests can assert on `303 See Other` targets.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

#[must_use]
pub fn unique_username(prefix: &str) -> String {
    format!("{prefix}_{}", uuid::Uuid::new_v4().simple())
}

#[must_use]
pub fn ajax(request: RequestBuilder) -> RequestBuilder {
    request.header(AJAX_HEADER.0, AJAX_HEADER.1)
}

/// Sign up (and thereby log in) a fresh user.
///
/// # Panics
///
/// Panics if the request fails or signup is refused.
pub async fn signup(client: &Client, username: &str) {
    let resp = client
        .post(format!("{}/signup", base_url()))
        .form(&[
            ("username", username),
            ("password1", TEST_PASSWORD),
            ("password2", TEST_PASSWORD),
        ])
        .send()
        .await
        .expect("Failed to sign up");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER, "signup refused");
}

/// Fetch a JSON document.
///
/// # Panics
///
/// Panics if the request fails or the body is not JSON.
pub async fn get_json(client: &Client, path: &str) -> (StatusCode, Value) {
    let resp = client
        .get(format!("{}{path}", base_url()))
        .send()
        .await
        .expect("Request failed");
    let status = resp.status();
    (status, resp.json().await.expect("Response is not JSON"))
}

/// The first product on the catalog's first page.
///
/// # Panics
///
/// Panics if the catalog is empty; load the sample data first.
pub async fn first_product(client: &Client) -> Value {
    let (_, body) = get_json(client, "/").await;
    body["products"]
        .as_array()
        .and_then(|products| products.first())
        .cloned()
        .expect("Catalog is empty; run `bikeshop-cli load-sample-data`")
}
