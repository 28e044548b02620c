//! Refresh-token exchange against the Microsoft identity platform.

use reqwest::Client;
use serde::Deserialize;

use skylift_common::{Error, Result};

use crate::config::Credentials;

/// OAuth2 token endpoint (common tenant).
pub const TOKEN_URL: &str = "https://login.microsoftonline.com/common/oauth2/v2.0/token";

/// Token endpoint response.
///
/// Only the access token is consumed. Expiry metadata is intentionally
/// ignored: a fresh token is fetched for every operation.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Exchange the refresh token for a short-lived access token.
///
/// Sends a form-encoded POST with the `refresh_token` grant and returns
/// the `access_token` field of the response body verbatim. Failures
/// surface as-is; there is no retry.
///
/// # Errors
/// - `Error::Network` when the request cannot be sent
/// - `Error::Authentication` when the endpoint answers non-2xx
/// - `Error::Serialization` when the body lacks a parsable `access_token`
pub async fn fetch_access_token(http: &Client, credentials: &Credentials) -> Result<String> {
    tracing::debug!("requesting access token");

    let response = http
        .post(TOKEN_URL)
        .form(&[
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("refresh_token", credentials.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
            ("redirect_uri", credentials.redirect_uri.as_str()),
        ])
        .send()
        .await
        .map_err(|e| Error::Network(format!("Failed to reach token endpoint: {e}")))?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Authentication(format!(
            "Token endpoint returned {status}: {body}"
        )));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| Error::Serialization(format!("Malformed token response: {e}")))?;

    Ok(token.access_token)
}
