//! Client credentials loaded once from the process environment.

use std::env;
use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use skylift_common::{Error, Result};

const ENV_CLIENT_ID: &str = "ONEDRIVE_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "ONEDRIVE_CLIENT_SECRET";
const ENV_REFRESH_TOKEN: &str = "ONEDRIVE_REFRESH_TOKEN";
const ENV_REDIRECT_URI: &str = "ONEDRIVE_REDIRECT_URI";
const ENV_DRIVE_ID: &str = "ONEDRIVE_DRIVE_ID";

/// OAuth2 credentials for the refresh-token grant.
///
/// Immutable for the lifetime of the client; secrets are zeroized on
/// drop and redacted from `Debug` output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    /// Application (client) ID.
    pub client_id: String,
    /// Application client secret.
    pub client_secret: String,
    /// Long-lived refresh token.
    pub refresh_token: String,
    /// Redirect URI registered for the application.
    pub redirect_uri: String,
    /// Optional drive identifier. Requests address the signed-in user's
    /// default drive (`me/drive`); the identifier is accepted so
    /// deployments that set it keep loading cleanly.
    pub drive_id: Option<String>,
}

impl Credentials {
    /// Create credentials from explicit values.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
        redirect_uri: impl Into<String>,
        drive_id: Option<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
            redirect_uri: redirect_uri.into(),
            drive_id,
        }
    }

    /// Load credentials from the environment.
    ///
    /// Reads `ONEDRIVE_CLIENT_ID`, `ONEDRIVE_CLIENT_SECRET`,
    /// `ONEDRIVE_REFRESH_TOKEN` and `ONEDRIVE_REDIRECT_URI` (all
    /// required) plus the optional `ONEDRIVE_DRIVE_ID`.
    ///
    /// # Errors
    /// - `Error::Config` naming the first missing or empty variable
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            client_id: require(ENV_CLIENT_ID)?,
            client_secret: require(ENV_CLIENT_SECRET)?,
            refresh_token: require(ENV_REFRESH_TOKEN)?,
            redirect_uri: require(ENV_REDIRECT_URI)?,
            drive_id: env::var(ENV_DRIVE_ID).ok().filter(|v| !v.is_empty()),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("drive_id", &self.drive_id)
            .finish()
    }
}

/// Read a required environment variable, rejecting empty values.
fn require(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        Ok(_) => Err(Error::Config(format!(
            "Environment variable {name} is empty"
        ))),
        Err(_) => Err(Error::Config(format!(
            "Missing environment variable {name}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secrets() {
        let credentials = Credentials::new(
            "app-id",
            "very-secret",
            "refresh-secret",
            "https://localhost/callback",
            Some("drive-1".to_string()),
        );

        let debug = format!("{:?}", credentials);
        assert!(debug.contains("app-id"));
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("very-secret"));
        assert!(!debug.contains("refresh-secret"));
    }

    #[test]
    fn test_from_env_round_trip() {
        // Single test mutating these variables; no other test touches them.
        env::set_var(ENV_CLIENT_ID, "id");
        env::set_var(ENV_CLIENT_SECRET, "secret");
        env::set_var(ENV_REFRESH_TOKEN, "refresh");
        env::set_var(ENV_REDIRECT_URI, "https://localhost/cb");
        env::remove_var(ENV_DRIVE_ID);

        let credentials = Credentials::from_env().unwrap();
        assert_eq!(credentials.client_id, "id");
        assert_eq!(credentials.redirect_uri, "https://localhost/cb");
        assert_eq!(credentials.drive_id, None);

        env::set_var(ENV_DRIVE_ID, "b!drive");
        let credentials = Credentials::from_env().unwrap();
        assert_eq!(credentials.drive_id.as_deref(), Some("b!drive"));

        env::remove_var(ENV_REFRESH_TOKEN);
        let err = Credentials::from_env().unwrap_err();
        assert!(err.to_string().contains(ENV_REFRESH_TOKEN));

        env::remove_var(ENV_CLIENT_ID);
        env::remove_var(ENV_CLIENT_SECRET);
        env::remove_var(ENV_REDIRECT_URI);
        env::remove_var(ENV_DRIVE_ID);
    }
}
