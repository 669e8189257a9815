use std::path::PathBuf;
use thiserror::Error;

/// Problems with the locally downloaded OAuth client setup.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("{} not found", .path.display())]
    MissingCredentials { path: PathBuf },

    #[error("Invalid client credentials in {}: {reason}", .path.display())]
    InvalidCredentials { path: PathBuf, reason: String },
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Could not obtain an access token: {0}")]
    TokenUnavailable(String),
}

impl SetupError {
    /// Steps for creating the client credentials file.
    pub fn remediation(&self) -> Vec<String> {
        let path = match self {
            SetupError::MissingCredentials { path } => path,
            SetupError::InvalidCredentials { path, .. } => path,
        };
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "credentials.json".to_string());

        vec![
            "Go to https://console.cloud.google.com/".to_string(),
            "Create a project (or select existing)".to_string(),
            "Enable the Gmail API".to_string(),
            "Create OAuth 2.0 credentials (Desktop app)".to_string(),
            format!("Download and save as '{file_name}' in this directory"),
        ]
    }
}
