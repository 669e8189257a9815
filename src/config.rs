use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_SETTINGS_PATH: &str = "settings.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OAuth client file downloaded from the Google Cloud console.
    pub credentials_path: PathBuf,
    /// Where the access and refresh tokens are kept between runs.
    pub token_path: PathBuf,
    pub default_limit: u32,
    pub rule_width: usize,
    pub color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials_path: PathBuf::from("credentials.json"),
            token_path: PathBuf::from("token.json"),
            default_limit: 10,
            rule_width: 70,
            color: true,
        }
    }
}

impl Config {
    /// Reads settings from `path`, falling back to defaults when the file is
    /// missing or cannot be parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };

        match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}
