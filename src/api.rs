//! Spreadsheet-backend HTTP client.
//!
//! One configurable endpoint (a Google Apps Script web app in the original
//! deployment): `GET {url}?action=getData` returns the full remote state,
//! and writes are POSTed as tagged JSON action bodies. The script replies
//! with an opaque body to POSTs, so push responses are never read; only
//! transport-level failures are observable.

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::ShopError;
use crate::models::{PushAction, RemoteSnapshot};

/// Default timeout for backend requests (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// URL normalisation
// ---------------------------------------------------------------------------

/// Normalise the backend URL:
/// - strip surrounding whitespace and trailing slashes
/// - ensure a scheme is present (https, or http for localhost)
pub fn normalize_backend_url(url: &str) -> String {
    let mut url = url.trim().to_string();
    if url.is_empty() {
        return url;
    }

    // Ensure scheme
    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    // Strip trailing slashes
    while url.ends_with('/') {
        url.pop();
    }

    url
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Convert a `reqwest::Error` into a user-friendly message.
fn friendly_error(url: &str, err: &reqwest::Error) -> String {
    if err.is_connect() {
        return format!("cannot reach backend at {url}");
    }
    if err.is_timeout() {
        return format!("connection to {url} timed out");
    }
    if err.is_builder() {
        return format!("invalid backend URL: {url}");
    }
    format!("network error communicating with {url}: {err}")
}

fn build_client() -> Result<Client, ShopError> {
    Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .map_err(|e| ShopError::sync(format!("create HTTP client: {e}")))
}

// ---------------------------------------------------------------------------
// Pull
// ---------------------------------------------------------------------------

/// Fetch the full remote state: `GET {url}?action=getData`.
pub async fn fetch_remote_state(backend_url: &str) -> Result<RemoteSnapshot, ShopError> {
    let base = normalize_backend_url(backend_url);
    let client = build_client()?;

    let resp = client
        .get(&base)
        .query(&[("action", "getData")])
        .send()
        .await
        .map_err(|e| ShopError::sync(friendly_error(&base, &e)))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(ShopError::sync(format!(
            "backend returned HTTP {}",
            status.as_u16()
        )));
    }

    let body = resp
        .text()
        .await
        .map_err(|e| ShopError::sync(friendly_error(&base, &e)))?;
    serde_json::from_str(&body).map_err(|e| ShopError::sync(format!("invalid JSON from backend: {e}")))
}

// ---------------------------------------------------------------------------
// Push
// ---------------------------------------------------------------------------

/// POST a write action to the backend.
///
/// The response body (and status, in the original no-cors deployment) is not
/// part of the contract; anything that made it onto the wire counts as
/// delivered. Only transport failures surface, as `ShopError::Sync`.
pub async fn post_action(backend_url: &str, action: &PushAction) -> Result<(), ShopError> {
    let base = normalize_backend_url(backend_url);
    let client = build_client()?;

    let body = serde_json::to_value(action)
        .map_err(|e| ShopError::sync(format!("serialize push body: {e}")))?;
    debug!(action = action_name(&body), "posting to backend");

    client
        .post(&base)
        .json(&body)
        .send()
        .await
        .map_err(|e| ShopError::sync(friendly_error(&base, &e)))?;

    Ok(())
}

fn action_name(body: &Value) -> &str {
    body.get("action").and_then(Value::as_str).unwrap_or("?")
}
