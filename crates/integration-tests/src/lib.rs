//! End-to-end tests for the Voltio storefront.
//!
//! These tests drive a running server over HTTP and are ignored by default.
//! Start the storefront against a migrated, seeded database, then run:
//!
//! ```bash
//! cargo test -p voltio-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `VOLTIO_BASE_URL` - Storefront address (default `http://localhost:3000`)
//! - `VOLTIO_TEST_ADMIN_EMAIL` / `VOLTIO_TEST_ADMIN_PASSWORD` - Credentials
//!   of an admin created with `voltio admin create`

#![cfg_attr(not(test), forbid(unsafe_code))]

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

/// Storefront base URL from the environment.
#[must_use]
pub fn base_url() -> String {
    std::env::var("VOLTIO_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Absolute URL for an API path such as `/cart`.
#[must_use]
pub fn api(path: &str) -> String {
    format!("{}/api{path}", base_url())
}

/// Random private address, so each client gets its own sign-in rate limit.
#[must_use]
pub fn client_address() -> String {
    let [a, b, c, ..] = *uuid::Uuid::new_v4().as_bytes();
    format!("10.{a}.{b}.{c}")
}

/// A client that keeps the session cookie between requests and presents
/// itself as a distinct visitor through `X-Forwarded-For`.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn session_client() -> Client {
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-forwarded-for",
        HeaderValue::from_str(&client_address()).expect("address is a valid header value"),
    );

    Client::builder()
        .cookie_store(true)
        .default_headers(headers)
        .build()
        .expect("Failed to build client")
}

/// Unique email so repeated runs don't collide.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@test.voltio.mx", uuid::Uuid::new_v4().simple())
}

/// Register a fresh customer on `client` and return its profile.
///
/// # Panics
///
/// Panics if registration does not return 201.
pub async fn register_customer(client: &Client) -> Value {
    let response = client
        .post(api("/auth/register"))
        .json(&json!({
            "email": unique_email("cliente"),
            "password": "bateria-llena-2024",
            "name": "Cliente de Prueba",
        }))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("Invalid register response")
}

/// Sign in as the admin named by the test environment, if configured.
///
/// # Panics
///
/// Panics if credentials are set but the login fails.
pub async fn admin_client() -> Option<Client> {
    let email = std::env::var("VOLTIO_TEST_ADMIN_EMAIL").ok()?;
    let password = std::env::var("VOLTIO_TEST_ADMIN_PASSWORD").ok()?;

    let client = session_client();
    let response = client
        .post(api("/auth/login"))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(response.status(), StatusCode::OK, "admin login failed");
    Some(client)
}

/// First in-stock product from the public catalog.
///
/// # Panics
///
/// Panics if the catalog request fails.
pub async fn first_in_stock_product(client: &Client) -> Option<Value> {
    let page: Value = client
        .get(api("/products?per_page=50"))
        .send()
        .await
        .expect("Failed to list products")
        .json()
        .await
        .expect("Invalid catalog response");

    page["items"]
        .as_array()?
        .iter()
        .find(|p| p["stock"].as_i64().unwrap_or(0) > 1)
        .cloned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    #[test]
    fn test_client_addresses_are_private_and_distinct() {
        let first: Ipv4Addr = client_address().parse().unwrap();
        let second: Ipv4Addr = client_address().parse().unwrap();
        assert!(first.is_private());
        assert_ne!(first, second);
    }
}
