use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::{credential_error, HatResult};

/// Google's OAuth token endpoint
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens this close to expiry are treated as expired
const EXPIRY_SKEW_SECS: i64 = 10;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// OAuth credential in Google's "authorized user" JSON layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    /// Current access token
    pub token: String,
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Access token expiry; `None` means the token never expires
    pub expiry: Option<DateTime<Utc>>,
}

impl Credential {
    /// Whether the access token is expired at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => now >= expiry - Duration::seconds(EXPIRY_SKEW_SECS),
            None => false,
        }
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Token endpoint answer to a refresh grant
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
}

/// Where credentials come from and how they are renewed
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the persisted credential, `None` if nothing is stored
    async fn load(&self) -> HatResult<Option<Credential>>;

    /// Renew the access token of `credential` in place
    async fn refresh(&self, credential: &mut Credential) -> HatResult<()>;
}

/// Credential store backed by a JSON file
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
    client: Client,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            client: Client::new(),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Write the credential back so the next run starts with a fresh token
    pub async fn save(&self, credential: &Credential) -> HatResult<()> {
        let json = serde_json::to_string_pretty(credential)?;
        tokio::fs::write(&self.path, json).await?;
        debug!("Saved credential to {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> HatResult<Option<Credential>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let credential: Credential = serde_json::from_str(&content).map_err(|e| {
            credential_error(&format!("Failed to parse {}: {}", self.path.display(), e))
        })?;

        debug!("Loaded credential from {}", self.path.display());
        Ok(Some(credential))
    }

    async fn refresh(&self, credential: &mut Credential) -> HatResult<()> {
        let refresh_token = credential
            .refresh_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| credential_error("No refresh token in credential"))?;

        let params = [
            ("client_id", credential.client_id.clone()),
            ("client_secret", credential.client_secret.clone()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token".to_string()),
        ];

        let response = self
            .client
            .post(&credential.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| credential_error(&format!("Failed to refresh token: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(credential_error(&format!(
                "Failed to refresh token: HTTP {} - {}",
                status, error_body
            )));
        }

        let refreshed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| credential_error(&format!("Failed to parse token response: {}", e)))?;

        let expires_in = refreshed.expires_in.unwrap_or(3600);
        let expiry = Duration::try_seconds(expires_in)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                credential_error(&format!("Token lifetime out of range: {}s", expires_in))
            })?;

        credential.token = refreshed.access_token;
        credential.expiry = Some(expiry);
        // Google only sometimes rotates the refresh token
        if let Some(rotated) = refreshed.refresh_token {
            credential.refresh_token = Some(rotated);
        }
        info!("Refreshed Google Calendar access token");

        // The new token is usable even when it cannot be persisted
        if let Err(e) = self.save(credential).await {
            warn!("Failed to save refreshed credential to {}: {}", self.path.display(), e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn credential(expiry: Option<DateTime<Utc>>, refresh_token: Option<&str>) -> Credential {
        Credential {
            token: "access".to_string(),
            refresh_token: refresh_token.map(str::to_string),
            token_uri: DEFAULT_TOKEN_URI.to_string(),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            scopes: vec![],
            expiry,
        }
    }

    #[test]
    fn test_is_expired() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        assert!(!credential(None, None).is_expired(now));
        assert!(!credential(Some(now + Duration::hours(1)), None).is_expired(now));
        assert!(credential(Some(now - Duration::hours(1)), None).is_expired(now));
        // Inside the skew window
        assert!(credential(Some(now + Duration::seconds(5)), None).is_expired(now));
    }

    #[test]
    fn test_has_refresh_token() {
        assert!(credential(None, Some("refresh")).has_refresh_token());
        assert!(!credential(None, Some("")).has_refresh_token());
        assert!(!credential(None, None).has_refresh_token());
    }

    #[test]
    fn test_parse_authorized_user_json() {
        let parsed: Credential = serde_json::from_value(json!({
            "token": "ya29.abc",
            "refresh_token": "1//xyz",
            "client_id": "id.apps.googleusercontent.com",
            "client_secret": "shh",
            "scopes": ["https://www.googleapis.com/auth/calendar.readonly"],
            "expiry": "2024-05-01T12:00:00.000000Z"
        }))
        .unwrap();

        assert_eq!(parsed.token_uri, DEFAULT_TOKEN_URI);
        assert_eq!(
            parsed.expiry,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
        );
        assert!(parsed.has_refresh_token());
    }

    #[tokio::test]
    async fn test_missing_file_loads_none() {
        let store = FileCredentialStore::new("no/such/token.json");
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token_fails() {
        let store = FileCredentialStore::new("no/such/token.json");
        let mut cred = credential(None, None);
        assert!(store.refresh(&mut cred).await.is_err());
        assert_eq!(cred.token, "access");
    }
}
