use crate::constants::{self, env_vars, head_to_head, retry};
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub mod paths;
pub mod validation;

use paths::{get_cache_dir_path, get_config_path, get_log_dir_path};
use validation::validate_config;

/// Configuration structure for the application.
/// Handles loading, saving, and managing application settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the upstream sports data API. Should include https:// prefix.
    pub api_domain: String,
    /// Static credential sent with every upstream request.
    #[serde(default)]
    pub api_key: String,
    /// League used when a command doesn't name one.
    #[serde(default = "default_league")]
    pub league: String,
    /// Directory for the durable cache tier. Defaults to the platform cache directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<String>,
    /// Path to the log file. If not specified, logs will be written to a default location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file_path: Option<String>,
    /// HTTP timeout in seconds for API requests. Defaults to 30 seconds if not specified.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_seconds: u64,
    /// Pause before the single head-to-head retry after an empty answer.
    #[serde(default = "default_head_to_head_retry_delay")]
    pub head_to_head_retry_delay_ms: u64,
    #[serde(default)]
    pub retry: RetryConfig,
    /// Last-resort team identifiers, keyed by lowercase team name or alias.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fallback_team_ids: BTreeMap<String, i64>,
}

/// Backoff settings for upstream calls.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts, first try included.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

fn default_http_timeout() -> u64 {
    constants::DEFAULT_HTTP_TIMEOUT_SECONDS
}

fn default_league() -> String {
    constants::DEFAULT_LEAGUE.to_string()
}

fn default_head_to_head_retry_delay() -> u64 {
    head_to_head::RETRY_DELAY_MS
}

fn default_max_attempts() -> u32 {
    retry::MAX_ATTEMPTS
}

fn default_base_delay() -> u64 {
    retry::BASE_DELAY_MS
}

fn default_max_delay() -> u64 {
    retry::MAX_DELAY_MS
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_domain: String::new(),
            api_key: String::new(),
            league: default_league(),
            cache_dir: None,
            log_file_path: None,
            http_timeout_seconds: default_http_timeout(),
            head_to_head_retry_delay_ms: default_head_to_head_retry_delay(),
            retry: RetryConfig::default(),
            fallback_team_ids: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Loads configuration from the default config file location.
    /// Environment variables can override config file values.
    ///
    /// # Environment Variables
    /// - `STATLINE_API_DOMAIN` - Override API domain
    /// - `STATLINE_API_KEY` - Override the upstream credential
    /// - `STATLINE_LEAGUE` - Override the default league
    /// - `STATLINE_CACHE_DIR` - Override the durable cache directory
    /// - `STATLINE_LOG_FILE` - Override log file path
    /// - `STATLINE_HTTP_TIMEOUT` - Override HTTP timeout in seconds (default: 30)
    ///
    /// # Notes
    /// - Without a config file, `STATLINE_API_DOMAIN` must be set
    /// - Environment variables take precedence over config file
    pub async fn load() -> Result<Self, AppError> {
        let config_path = get_config_path();

        let mut config = if Path::new(&config_path).exists() {
            Self::load_from_path(&config_path).await?
        } else if std::env::var(env_vars::API_DOMAIN).is_ok() {
            Config::default()
        } else {
            return Err(AppError::config_error(format!(
                "No configuration file at {config_path} and {} is not set",
                env_vars::API_DOMAIN
            )));
        };

        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;

        Ok(config)
    }

    /// Applies overrides from a variable lookup (the process environment in `load`).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_domain) = lookup(env_vars::API_DOMAIN) {
            self.api_domain = api_domain;
        }
        if let Some(api_key) = lookup(env_vars::API_KEY) {
            self.api_key = api_key;
        }
        if let Some(league) = lookup(env_vars::LEAGUE) {
            self.league = league;
        }
        if let Some(cache_dir) = lookup(env_vars::CACHE_DIR) {
            self.cache_dir = Some(cache_dir);
        }
        if let Some(log_file_path) = lookup(env_vars::LOG_FILE) {
            self.log_file_path = Some(log_file_path);
        }
        if let Some(timeout) = lookup(env_vars::HTTP_TIMEOUT).and_then(|s| s.parse::<u64>().ok()) {
            self.http_timeout_seconds = timeout;
        }
    }

    /// Validates the configuration settings
    pub fn validate(&self) -> Result<(), AppError> {
        validate_config(self)
    }

    /// Directory of the durable cache tier.
    pub fn resolved_cache_dir(&self) -> PathBuf {
        match &self.cache_dir {
            Some(dir) => PathBuf::from(dir),
            None => PathBuf::from(get_cache_dir_path()),
        }
    }

    /// Saves current configuration to the default config file location.
    pub async fn save(&self) -> Result<(), AppError> {
        let config_path = get_config_path();
        self.save_to_path(&config_path).await
    }

    /// Returns the platform-specific path for the config file.
    pub fn get_config_path() -> String {
        paths::get_config_path()
    }

    /// Returns the platform-specific path for the log directory.
    pub fn get_log_dir_path() -> String {
        paths::get_log_dir_path()
    }

    /// Displays current configuration settings to stdout.
    ///
    /// The API key is masked.
    pub async fn display() -> Result<(), AppError> {
        let config_path = get_config_path();
        let log_dir = get_log_dir_path();

        if Path::new(&config_path).exists() {
            let config = Config::load().await?;
            println!("\nCurrent Configuration");
            println!("────────────────────────────────────");
            println!("Config Location:");
            println!("{config_path}");
            println!("────────────────────────────────────");
            println!("API Domain:");
            println!("{}", config.api_domain);
            println!("API Key:");
            println!("{}", mask_secret(&config.api_key));
            println!("────────────────────────────────────");
            println!("League: {}", config.league);
            println!("HTTP Timeout: {} seconds", config.http_timeout_seconds);
            println!(
                "Retry: {} attempts, {}ms base, {}ms max",
                config.retry.max_attempts, config.retry.base_delay_ms, config.retry.max_delay_ms
            );
            println!("────────────────────────────────────");
            println!("Cache Directory:");
            println!("{}", config.resolved_cache_dir().display());
            println!("Log File Location:");
            if let Some(custom_path) = &config.log_file_path {
                println!("{custom_path}");
            } else {
                println!("{log_dir}/statline.log");
                println!("(Default location)");
            }
            if !config.fallback_team_ids.is_empty() {
                println!("────────────────────────────────────");
                println!("Fallback team ids: {}", config.fallback_team_ids.len());
            }
        } else {
            println!("\nNo configuration file found at:");
            println!("{config_path}");
        }

        Ok(())
    }

    /// Saves configuration to a custom file path.
    ///
    /// Creates the parent directory if it doesn't exist and ensures the API domain
    /// has a scheme (https:// unless http://localhost was given).
    ///
    /// # Errors
    /// * `AppError::Config` - If the provided path has no parent directory
    /// * `AppError::Io` - If there's an I/O error creating directories or writing the file
    /// * `AppError::TomlSerialize` - If there's an error serializing the configuration
    pub async fn save_to_path(&self, path: &str) -> Result<(), AppError> {
        let config_dir = Path::new(path).parent().ok_or_else(|| {
            AppError::config_error(format!("Path '{path}' has no parent directory"))
        })?;

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).await?;
        }
        let normalized = Config {
            api_domain: normalize_domain(&self.api_domain),
            ..self.clone()
        };
        let content = toml::to_string_pretty(&normalized)?;
        let mut file = fs::File::create(path).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Loads configuration from a custom file path.
    pub async fn load_from_path(path: &str) -> Result<Self, AppError> {
        let content = fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

fn normalize_domain(domain: &str) -> String {
    let domain = domain.trim().trim_end_matches('/');
    if domain.starts_with("https://")
        || domain.starts_with("http://localhost")
        || domain.starts_with("http://127.0.0.1")
    {
        domain.to_string()
    } else {
        format!("https://{}", domain.trim_start_matches("http://"))
    }
}

fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return "(not set)".to_string();
    }
    let tail: String = secret
        .chars()
        .skip(secret.chars().count().saturating_sub(4))
        .collect();
    format!("****{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn sample_config() -> Config {
        Config {
            api_domain: "https://api.example.com".to_string(),
            api_key: "secret-key-1234".to_string(),
            log_file_path: Some("/custom/log/path".to_string()),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_config_load_existing_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let config_path_str = config_path.to_string_lossy();

        let config_content = r#"
api_domain = "https://api.example.com"
api_key = "abc"
league = "NCAA"
log_file_path = "/custom/log/path"

[retry]
max_attempts = 6

[fallback_team_ids]
"dallas cowboys" = 4388
"#;
        tokio::fs::write(&config_path, config_content)
            .await
            .unwrap();

        let config = Config::load_from_path(&config_path_str).await.unwrap();

        assert_eq!(config.api_domain, "https://api.example.com");
        assert_eq!(config.league, "NCAA");
        assert_eq!(config.log_file_path, Some("/custom/log/path".to_string()));
        assert_eq!(config.retry.max_attempts, 6);
        assert_eq!(config.retry.base_delay_ms, retry::BASE_DELAY_MS);
        assert_eq!(config.fallback_team_ids.get("dallas cowboys"), Some(&4388));
    }

    #[tokio::test]
    async fn test_config_defaults_for_missing_fields() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        tokio::fs::write(&config_path, "api_domain = \"https://api.example.com\"\n")
            .await
            .unwrap();

        let config = Config::load_from_path(&config_path.to_string_lossy())
            .await
            .unwrap();

        assert_eq!(config.league, constants::DEFAULT_LEAGUE);
        assert_eq!(config.log_file_path, None);
        assert_eq!(config.http_timeout_seconds, constants::DEFAULT_HTTP_TIMEOUT_SECONDS);
        assert_eq!(config.head_to_head_retry_delay_ms, head_to_head::RETRY_DELAY_MS);
        assert_eq!(config.retry, RetryConfig::default());
        assert!(config.fallback_team_ids.is_empty());
    }

    #[tokio::test]
    async fn test_config_save_and_load_roundtrip() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");
        let config_path_str = config_path.to_string_lossy();
        let mut original = sample_config();
        original.fallback_team_ids.insert("bears".to_string(), 4387);

        original.save_to_path(&config_path_str).await.unwrap();
        let loaded = Config::load_from_path(&config_path_str).await.unwrap();
        assert_eq!(original, loaded);
    }

    #[tokio::test]
    async fn test_config_save_adds_https_prefix() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let config_path_str = config_path.to_string_lossy();
        let config = Config {
            api_domain: "http://api.example.com/".to_string(),
            ..sample_config()
        };
        config.save_to_path(&config_path_str).await.unwrap();

        let loaded = Config::load_from_path(&config_path_str).await.unwrap();
        assert_eq!(loaded.api_domain, "https://api.example.com");
    }

    #[test]
    fn test_optional_fields_not_serialized_when_unset() {
        let config = Config {
            log_file_path: None,
            ..sample_config()
        };
        let toml_string = toml::to_string_pretty(&config).unwrap();
        assert!(toml_string.contains("api_domain = \"https://api.example.com\""));
        assert!(!toml_string.contains("log_file_path"));
        assert!(!toml_string.contains("cache_dir"));
        assert!(!toml_string.contains("fallback_team_ids"));
    }

    #[test]
    fn test_apply_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (env_vars::API_DOMAIN, "http://localhost:9000"),
            (env_vars::API_KEY, "from-env"),
            (env_vars::HTTP_TIMEOUT, "5"),
            (env_vars::CACHE_DIR, "/tmp/statline-cache"),
        ]);
        let mut config = sample_config();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.api_domain, "http://localhost:9000");
        assert_eq!(config.api_key, "from-env");
        assert_eq!(config.http_timeout_seconds, 5);
        assert_eq!(config.resolved_cache_dir(), PathBuf::from("/tmp/statline-cache"));
        // untouched
        assert_eq!(config.league, constants::DEFAULT_LEAGUE);
    }

    #[test]
    fn test_invalid_timeout_override_is_ignored() {
        let mut config = sample_config();
        config.apply_overrides(|name| {
            (name == env_vars::HTTP_TIMEOUT).then(|| "soon".to_string())
        });
        assert_eq!(config.http_timeout_seconds, constants::DEFAULT_HTTP_TIMEOUT_SECONDS);
    }

    #[tokio::test]
    async fn test_config_malformed_toml_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("malformed_config.toml");
        tokio::fs::write(&config_path, "api_domain = \"x\"\n[broken\n")
            .await
            .unwrap();

        let result = Config::load_from_path(&config_path.to_string_lossy()).await;
        assert!(matches!(result.unwrap_err(), AppError::TomlDeserialize(_)));
    }

    #[tokio::test]
    async fn test_config_load_from_nonexistent_path() {
        let result = Config::load_from_path("/nonexistent/path/config.toml").await;
        assert!(matches!(result.unwrap_err(), AppError::Io(_)));
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret(""), "(not set)");
        assert_eq!(mask_secret("abcdef123"), "****f123");
    }

    #[test]
    fn test_get_config_path() {
        let config_path = Config::get_config_path();
        assert!(config_path.contains("statline"));
        assert!(config_path.ends_with("config.toml"));
    }
}
