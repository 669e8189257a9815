use crate::error::{AuthError, SetupError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use google_gmail1::oauth2;
use hyper::client::HttpConnector;
use hyper_rustls::HttpsConnector;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use yup_oauth2::authenticator_delegate::InstalledFlowDelegate;
use yup_oauth2::storage::{TokenInfo, TokenStorage};
use yup_oauth2::{
    ApplicationSecret, InstalledFlowAuthenticator, InstalledFlowReturnMethod,
    read_application_secret,
};

pub const SCOPES: &[&str] = &["https://www.googleapis.com/auth/gmail.readonly"];

pub type GmailAuthenticator = oauth2::authenticator::Authenticator<HttpsConnector<HttpConnector>>;

#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    scopes: Vec<String>,
    token: TokenInfo,
}

/// Keeps the OAuth token as JSON in a local file. A token issued for a
/// different scope set is treated as absent.
#[derive(Debug, Clone)]
pub struct FileTokenStorage {
    path: PathBuf,
}

#[async_trait]
impl TokenStorage for FileTokenStorage {
    async fn set(&self, scopes: &[&str], token: TokenInfo) -> Result<()> {
        let stored = StoredToken {
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            token,
        };
        let serialized =
            serde_json::to_string_pretty(&stored).context("Failed to serialize token")?;

        tokio::fs::write(&self.path, serialized)
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        tracing::debug!("Saved token to {}", self.path.display());

        Ok(())
    }

    async fn get(&self, scopes: &[&str]) -> Option<TokenInfo> {
        let stored = match self.load().await {
            Ok(stored) => stored?,
            Err(e) => {
                tracing::warn!("{:#}", e);
                return None;
            }
        };

        let covers_scopes = scopes.iter().all(|s| stored.scopes.iter().any(|have| have == s));
        if !covers_scopes {
            tracing::debug!("Stored token was issued for other scopes, ignoring it");
            return None;
        }

        Some(stored.token)
    }
}

impl FileTokenStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    async fn load(&self) -> Result<Option<StoredToken>> {
        let serialized = match tokio::fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", self.path.display()));
            }
        };

        let stored = serde_json::from_str(&serialized)
            .with_context(|| format!("Failed to deserialize {}", self.path.display()))?;
        Ok(Some(stored))
    }

    /// Removes the stored token. Missing files are fine.
    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", self.path.display())),
        }
    }
}

/// Sends the user to the consent page in their browser.
pub struct BrowserDelegate;

impl InstalledFlowDelegate for BrowserDelegate {
    fn present_user_url<'a>(
        &'a self,
        url: &'a str,
        need_code: bool,
    ) -> Pin<Box<dyn Future<Output = std::result::Result<String, String>> + Send + 'a>> {
        Box::pin(async move {
            eprintln!("Please authorize this app by visiting:\n\n  {url}\n");
            if let Err(e) = open::that(url) {
                tracing::warn!("Could not open a browser: {}", e);
            }

            if !need_code {
                return Ok(String::new());
            }

            eprintln!("Enter the authorization code:");
            let mut code = String::new();
            use tokio::io::AsyncBufReadExt;
            tokio::io::BufReader::new(tokio::io::stdin())
                .read_line(&mut code)
                .await
                .map_err(|e| e.to_string())?;
            Ok(code.trim().to_string())
        })
    }
}

pub struct Authenticator;

impl Authenticator {
    pub async fn load_secret<P: AsRef<Path>>(path: P) -> Result<ApplicationSecret> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SetupError::MissingCredentials {
                path: path.to_path_buf(),
            }
            .into());
        }

        read_application_secret(path).await.map_err(|e| {
            SetupError::InvalidCredentials {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    pub async fn authenticate(
        secret: ApplicationSecret,
        storage: FileTokenStorage,
    ) -> Result<GmailAuthenticator> {
        let auth = InstalledFlowAuthenticator::builder(
            secret,
            InstalledFlowReturnMethod::HTTPRedirect,
        )
        .with_storage(Box::new(storage))
        .flow_delegate(Box::new(BrowserDelegate))
        .build()
        .await
        .context("Failed to build authenticator")?;

        Ok(auth)
    }

    /// Builds an authenticator and makes sure it can hand out a token.
    ///
    /// Expired tokens are refreshed by the authenticator itself. If that
    /// fails while a stored token exists, the stored token is discarded and
    /// the browser flow runs once more.
    pub async fn authorize(
        secret: ApplicationSecret,
        storage: FileTokenStorage,
    ) -> Result<GmailAuthenticator> {
        let auth = Self::authenticate(secret.clone(), storage.clone()).await?;
        match auth.token(SCOPES).await {
            Ok(_) => return Ok(auth),
            Err(e) if storage.exists() => {
                tracing::warn!("Stored token rejected ({}), authorizing again", e);
                storage.clear().await?;
            }
            Err(e) => return Err(AuthError::TokenUnavailable(e.to_string()).into()),
        }

        let auth = Self::authenticate(secret, storage).await?;
        auth.token(SCOPES)
            .await
            .map_err(|e| AuthError::TokenUnavailable(e.to_string()))?;
        Ok(auth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(access: &str) -> TokenInfo {
        TokenInfo {
            access_token: Some(access.to_string()),
            refresh_token: Some("refresh-me".to_string()),
            expires_at: None,
            id_token: None,
        }
    }

    #[tokio::test]
    async fn test_storage_round_trips_token() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileTokenStorage::new(dir.path().join("token.json"));

        assert!(storage.get(SCOPES).await.is_none());
        storage.set(SCOPES, token("abc")).await.unwrap();
        assert!(storage.exists());

        let loaded = storage.get(SCOPES).await.unwrap();
        assert_eq!(loaded.access_token.as_deref(), Some("abc"));
        assert_eq!(loaded.refresh_token.as_deref(), Some("refresh-me"));
    }

    #[tokio::test]
    async fn test_storage_overwrites_previous_token() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileTokenStorage::new(dir.path().join("token.json"));

        storage.set(SCOPES, token("first")).await.unwrap();
        storage.set(SCOPES, token("second")).await.unwrap();

        let loaded = storage.get(SCOPES).await.unwrap();
        assert_eq!(loaded.access_token.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_storage_ignores_other_scopes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileTokenStorage::new(dir.path().join("token.json"));

        storage.set(&["https://www.googleapis.com/auth/gmail.send"], token("abc")).await.unwrap();
        assert!(storage.get(SCOPES).await.is_none());
    }

    #[tokio::test]
    async fn test_storage_treats_garbage_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(FileTokenStorage::new(&path).get(SCOPES).await.is_none());
    }

    #[tokio::test]
    async fn test_clear_removes_file_and_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileTokenStorage::new(dir.path().join("token.json"));

        storage.set(SCOPES, token("abc")).await.unwrap();
        storage.clear().await.unwrap();
        assert!(!storage.exists());
        storage.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_load_secret_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Authenticator::load_secret(dir.path().join("credentials.json"))
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<SetupError>(),
            Some(SetupError::MissingCredentials { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_secret_reports_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "{}").unwrap();

        let err = Authenticator::load_secret(&path).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SetupError>(),
            Some(SetupError::InvalidCredentials { .. })
        ));
    }
}
