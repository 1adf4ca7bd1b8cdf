//! OAuth credentials and access-token refresh for the Google APIs.

use std::path::Path;
use std::time::{Duration, Instant};

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::SheetsError;

/// Refresh this long before the reported expiry so a token never goes stale
/// mid-request.
const EXPIRY_SLACK: Duration = Duration::from_secs(60);

/// Authorized-user credentials, in the JSON layout Google's client tooling
/// writes (`client_id` / `client_secret` / `refresh_token`).
#[derive(Debug, Clone, Deserialize)]
pub struct UserCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
    pub refresh_token: SecretString,
}

impl UserCredentials {
    /// Load and parse the credentials JSON file.
    pub fn load(path: &Path) -> Result<Self, SheetsError> {
        let raw = std::fs::read_to_string(path).map_err(|e| SheetsError::Credentials {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|e| SheetsError::Credentials {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Exchanges the refresh token for short-lived access tokens and caches the
/// current one until it nears expiry.
#[derive(Debug)]
pub struct TokenManager {
    client: reqwest::Client,
    credentials: UserCredentials,
    token_url: String,
    cached: tokio::sync::Mutex<Option<CachedToken>>,
}

impl TokenManager {
    pub fn new(
        client: reqwest::Client,
        credentials: UserCredentials,
        token_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            credentials,
            token_url: token_url.into(),
            cached: tokio::sync::Mutex::new(None),
        }
    }

    /// Return a bearer token, refreshing if missing or about to expire.
    pub async fn bearer_token(&self) -> Result<String, SheetsError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref()
            && Instant::now() + EXPIRY_SLACK < token.expires_at
        {
            return Ok(token.access_token.clone());
        }

        let fresh = self.refresh().await?;
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }

    async fn refresh(&self) -> Result<CachedToken, SheetsError> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            (
                "client_secret",
                self.credentials.client_secret.expose_secret(),
            ),
            (
                "refresh_token",
                self.credentials.refresh_token.expose_secret(),
            ),
            ("grant_type", "refresh_token"),
        ];

        let resp = self
            .client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            return Err(SheetsError::TokenExchange(format!(
                "token endpoint returned {status}: {detail}"
            )));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| SheetsError::TokenExchange(e.to_string()))?;

        tracing::debug!("Refreshed Google API access token");

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        })
    }
}
