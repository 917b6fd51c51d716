//! Configuration management for gitsync
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (GITSYNC_*)
//! 3. Config file (~/.config/gitsync/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Reconciliation settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    /// How long a cached snapshot is shown without a blocking reload
    #[serde(with = "humantime_serde")]
    pub cache_ttl: Duration,

    /// Upper bound on account and credential resolution
    #[serde(with = "humantime_serde")]
    pub credential_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(5 * 60),
            credential_timeout: Duration::from_secs(10),
        }
    }
}

/// Backend clone client settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the git endpoints of the workspace backend
    pub url: String,

    /// Per-request timeout; the backend may need to boot a VM
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080/api/git".to_string(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// GitHub mirror settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// REST API base URL (change for GitHub Enterprise)
    pub api_url: String,

    /// Number of commits requested per reconciliation
    pub commits_per_page: u8,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            commits_per_page: 30,
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub backend: BackendConfig,
    pub github: GitHubConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/gitsync/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gitsync").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - GITSYNC_BACKEND_URL: backend base URL
    /// - GITSYNC_GITHUB_API_URL: GitHub API base URL
    /// - GITSYNC_CACHE_TTL: cache TTL as a humantime string ("90s", "5m")
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(url) = lookup("GITSYNC_BACKEND_URL") {
            self.backend.url = url;
        }

        if let Some(url) = lookup("GITSYNC_GITHUB_API_URL") {
            self.github.api_url = url;
        }

        if let Some(ttl) = lookup("GITSYNC_CACHE_TTL") {
            self.sync.cache_ttl = humantime::parse_duration(&ttl)
                .map_err(|e| Error::Config(format!("Invalid GITSYNC_CACHE_TTL '{}': {}", ttl, e)))?;
        }

        Ok(self)
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, backend_url: Option<String>) -> Self {
        if let Some(url) = backend_url {
            self.backend.url = url;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(backend_url: Option<String>) -> Result<Self> {
        Ok(Self::load()?
            .with_env_overrides()?
            .with_cli_overrides(backend_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.sync.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.sync.credential_timeout, Duration::from_secs(10));
        assert_eq!(config.github.api_url, "https://api.github.com");
    }

    #[test]
    fn test_cli_overrides() {
        let config = Config::default().with_cli_overrides(Some("https://backend.test".to_string()));
        assert_eq!(config.backend.url, "https://backend.test");
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("GITSYNC_BACKEND_URL", "https://env.backend"),
            ("GITSYNC_CACHE_TTL", "90s"),
        ]
        .into_iter()
        .collect();

        let config = Config::default()
            .with_overrides_from(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.backend.url, "https://env.backend");
        assert_eq!(config.sync.cache_ttl, Duration::from_secs(90));
        assert_eq!(config.github.api_url, "https://api.github.com");
    }

    #[test]
    fn test_invalid_ttl_override() {
        let result = Config::default().with_overrides_from(|k| {
            (k == "GITSYNC_CACHE_TTL").then(|| "soon".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[sync]
cache_ttl = "2m"
credential_timeout = "3s"

[backend]
url = "https://workspaces.example.com/git"

[github]
commits_per_page = 50
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.sync.cache_ttl, Duration::from_secs(120));
        assert_eq!(config.sync.credential_timeout, Duration::from_secs(3));
        assert_eq!(config.backend.url, "https://workspaces.example.com/git");
        // request_timeout should use default
        assert_eq!(config.backend.request_timeout, Duration::from_secs(60));
        assert_eq!(config.github.commits_per_page, 50);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[github]\napi_url = \"https://ghe.example.com/api/v3\"").unwrap();

        let config = Config::load_from_file(file.path()).unwrap();
        assert_eq!(config.github.api_url, "https://ghe.example.com/api/v3");
        assert_eq!(config.sync.cache_ttl, Duration::from_secs(300));
    }
}
