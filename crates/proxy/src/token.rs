//! OAuth bearer-token storage and refresh.
//!
//! Credentials live in a JSON file shared with the standalone
//! `pagepilot-token-refresh` binary. In-process refreshes are single-flight:
//! the cache mutex is held across the refresh request, so concurrent callers
//! wait for one refresh instead of each spending the refresh token.
//!
//! The file itself is not locked. The proxy and the standalone refresher can
//! still both refresh the same token if their buffers overlap.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;

use crate::error::ProxyError;

/// Refresh when the token expires within this window.
pub const REFRESH_BUFFER: Duration = Duration::from_secs(5 * 60);

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Contents of the credentials file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry as epoch milliseconds.
    pub expires_at: i64,
}

impl Credentials {
    /// Whether the token expires within `buffer` of `now_ms`.
    pub fn needs_refresh(&self, now_ms: i64, buffer: Duration) -> bool {
        let buffer_ms = i64::try_from(buffer.as_millis()).unwrap_or(i64::MAX);
        self.expires_at.saturating_sub(buffer_ms) <= now_ms
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    /// Lifetime in seconds.
    expires_in: i64,
}

/// The credentials file on disk.
#[derive(Debug, Clone)]
pub struct CredentialsFile {
    path: PathBuf,
}

impl CredentialsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<Credentials, ProxyError> {
        let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ProxyError::Credentials(format!("cannot read {}: {e}", self.path.display()))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            ProxyError::Credentials(format!("invalid JSON in {}: {e}", self.path.display()))
        })
    }

    /// Write to a sibling temp file, then rename over the original so
    /// readers never see a partial document.
    pub async fn save(&self, credentials: &Credentials) -> Result<(), ProxyError> {
        let body = serde_json::to_vec_pretty(credentials)
            .map_err(|e| ProxyError::Credentials(e.to_string()))?;
        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("credentials.json");
        let tmp = self
            .path
            .with_file_name(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));

        tokio::fs::write(&tmp, body).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

/// Outcome of [`TokenManager::refresh_if_needed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed,
    StillValid,
}

/// Hands out a valid access token, refreshing it when close to expiry.
pub struct TokenManager {
    file: CredentialsFile,
    client: reqwest::Client,
    token_url: String,
    client_id: Option<String>,
    cache: Mutex<Option<Credentials>>,
}

impl TokenManager {
    pub fn new(
        file: CredentialsFile,
        token_url: impl Into<String>,
        client_id: Option<String>,
    ) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            file,
            client,
            token_url: token_url.into(),
            client_id,
            cache: Mutex::new(None),
        })
    }

    /// A token valid for at least [`REFRESH_BUFFER`].
    pub async fn access_token(&self) -> Result<String, ProxyError> {
        let mut cache = self.cache.lock().await;
        let current = match cache.take() {
            Some(creds) => creds,
            None => self.file.load().await?,
        };

        let creds = if current.needs_refresh(Utc::now().timestamp_millis(), REFRESH_BUFFER) {
            // The file may have been refreshed by the standalone refresher.
            let on_disk = self.file.load().await?;
            if on_disk.needs_refresh(Utc::now().timestamp_millis(), REFRESH_BUFFER) {
                self.refresh(&on_disk).await?
            } else {
                on_disk
            }
        } else {
            current
        };

        let token = creds.access_token.clone();
        *cache = Some(creds);
        Ok(token)
    }

    /// Refresh the file's token if it is near expiry. Used by the
    /// standalone refresher.
    pub async fn refresh_if_needed(&self) -> Result<RefreshOutcome, ProxyError> {
        let mut cache = self.cache.lock().await;
        let creds = self.file.load().await?;
        if !creds.needs_refresh(Utc::now().timestamp_millis(), REFRESH_BUFFER) {
            *cache = Some(creds);
            return Ok(RefreshOutcome::StillValid);
        }
        let refreshed = self.refresh(&creds).await?;
        *cache = Some(refreshed);
        Ok(RefreshOutcome::Refreshed)
    }

    /// Drop the cached token so the next call re-reads the file.
    pub async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }

    async fn refresh(&self, current: &Credentials) -> Result<Credentials, ProxyError> {
        let mut body = json!({
            "grant_type": "refresh_token",
            "refresh_token": current.refresh_token,
        });
        if let Some(client_id) = &self.client_id {
            body["client_id"] = json!(client_id);
        }

        let response = self.client.post(&self.token_url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::error!(status = status.as_u16(), "OAuth token refresh rejected");
            return Err(ProxyError::TokenRefresh {
                status: status.as_u16(),
                message,
            });
        }
        let fresh: RefreshResponse = response.json().await?;

        let refreshed = Credentials {
            access_token: fresh.access_token,
            // Providers may omit the refresh token when it is not rotated.
            refresh_token: fresh
                .refresh_token
                .unwrap_or_else(|| current.refresh_token.clone()),
            expires_at: Utc::now()
                .timestamp_millis()
                .saturating_add(fresh.expires_in.saturating_mul(1000)),
        };
        self.file.save(&refreshed).await?;
        tracing::info!(
            path = %self.file.path().display(),
            expires_at = refreshed.expires_at,
            "OAuth token refreshed",
        );
        Ok(refreshed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;

    use super::*;

    fn credentials(expires_at: i64) -> Credentials {
        Credentials {
            access_token: "old-access".into(),
            refresh_token: "old-refresh".into(),
            expires_at,
        }
    }

    async fn write_file(dir: &tempfile::TempDir, creds: &Credentials) -> CredentialsFile {
        let file = CredentialsFile::new(dir.path().join("credentials.json"));
        file.save(creds).await.unwrap();
        file
    }

    // -- needs_refresh ---------------------------------------------------------

    #[test]
    fn needs_refresh_inside_buffer() {
        let now = 1_000_000_000;
        assert!(credentials(now + 60_000).needs_refresh(now, REFRESH_BUFFER));
        assert!(credentials(now - 1).needs_refresh(now, REFRESH_BUFFER));
        assert!(!credentials(now + 10 * 60_000).needs_refresh(now, REFRESH_BUFFER));
    }

    // -- file --------------------------------------------------------------------

    #[tokio::test]
    async fn save_then_load_keeps_camel_case_layout() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_file(&dir, &credentials(42)).await;

        let raw = std::fs::read_to_string(file.path()).unwrap();
        assert!(raw.contains("\"accessToken\""));
        assert!(raw.contains("\"expiresAt\": 42"));
        assert_eq!(file.load().await.unwrap(), credentials(42));

        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[tokio::test]
    async fn missing_file_is_credentials_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = CredentialsFile::new(dir.path().join("absent.json"));
        assert_matches!(file.load().await, Err(ProxyError::Credentials(_)));
    }

    // -- refresh -----------------------------------------------------------------

    #[tokio::test]
    async fn valid_token_is_returned_without_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let far = Utc::now().timestamp_millis() + 3_600_000;
        let file = write_file(&dir, &credentials(far)).await;
        let manager = TokenManager::new(file, "http://127.0.0.1:9/token", None).unwrap();

        assert_eq!(manager.access_token().await.unwrap(), "old-access");
    }

    #[tokio::test]
    async fn expiring_token_is_refreshed_once_for_concurrent_callers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_body(mockito::Matcher::PartialJson(json!({
                "grant_type": "refresh_token",
                "refresh_token": "old-refresh",
                "client_id": "client-1",
            })))
            .with_status(200)
            .with_body(r#"{"access_token":"new-access","expires_in":3600}"#)
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let soon = Utc::now().timestamp_millis() + 60_000;
        let file = write_file(&dir, &credentials(soon)).await;
        let manager = Arc::new(
            TokenManager::new(
                file.clone(),
                format!("{}/token", server.url()),
                Some("client-1".into()),
            )
            .unwrap(),
        );

        let (a, b) = tokio::join!(manager.access_token(), manager.access_token());
        assert_eq!(a.unwrap(), "new-access");
        assert_eq!(b.unwrap(), "new-access");
        mock.assert_async().await;

        let saved = file.load().await.unwrap();
        assert_eq!(saved.access_token, "new-access");
        assert_eq!(saved.refresh_token, "old-refresh");
        assert!(!saved.needs_refresh(Utc::now().timestamp_millis(), REFRESH_BUFFER));
    }

    #[tokio::test]
    async fn huge_expires_in_saturates_instead_of_overflowing() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(200)
            .with_body(format!(
                r#"{{"access_token":"new-access","expires_in":{}}}"#,
                i64::MAX
            ))
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = write_file(&dir, &credentials(0)).await;
        let manager =
            TokenManager::new(file.clone(), format!("{}/token", server.url()), None).unwrap();

        assert_eq!(manager.access_token().await.unwrap(), "new-access");
        assert_eq!(file.load().await.unwrap().expires_at, i64::MAX);
    }

    #[tokio::test]
    async fn rejected_refresh_surfaces_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = write_file(&dir, &credentials(0)).await;
        let manager =
            TokenManager::new(file, format!("{}/token", server.url()), None).unwrap();

        assert_matches!(
            manager.refresh_if_needed().await,
            Err(ProxyError::TokenRefresh { status: 400, .. })
        );
    }

    #[tokio::test]
    async fn refresh_if_needed_reports_still_valid() {
        let dir = tempfile::tempdir().unwrap();
        let far = Utc::now().timestamp_millis() + 3_600_000;
        let file = write_file(&dir, &credentials(far)).await;
        let manager = TokenManager::new(file, "http://127.0.0.1:9/token", None).unwrap();

        assert_eq!(
            manager.refresh_if_needed().await.unwrap(),
            RefreshOutcome::StillValid
        );
    }
}
