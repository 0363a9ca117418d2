use crate::client::Client;
use crate::error::{ConfigError, Result};
use crate::session::SessionConfig;
use crate::walker::{PageCount, WalkOptions};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_directory")]
    pub directory: String,
    #[serde(default = "default_log_filename")]
    pub filename: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalkConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub page_count: PageCount,
}

#[derive(Clone, Deserialize)]
pub struct Config {
    pub server_url: String,

    #[serde(alias = "company")]
    pub organization: String,

    pub user: String,

    pub password: String,

    #[serde(default = "default_report")]
    pub report: String,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub walk: WalkConfig,

    #[serde(default)]
    pub logging: LogConfig,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("server_url", &self.server_url)
            .field("organization", &self.organization)
            .field("user", &self.user)
            .field("report", &self.report)
            .field("http", &self.http)
            .field("walk", &self.walk)
            .field("logging", &self.logging)
            .finish_non_exhaustive()
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: default_log_directory(),
            filename: default_log_filename(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            page_count: PageCount::default(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::FileRead)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;

        config.validate()?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.server_url.is_empty() {
            return Err(ConfigError::MissingField("server_url".to_string()).into());
        }
        if !self.server_url.starts_with("http") {
            return Err(ConfigError::InvalidValue(format!(
                "server_url must start with http(s): {}",
                self.server_url
            ))
            .into());
        }

        for (name, value) in [
            ("organization", &self.organization),
            ("user", &self.user),
            ("password", &self.password),
        ] {
            if value.is_empty() {
                return Err(ConfigError::MissingField(name.to_string()).into());
            }
        }

        if self.walk.concurrency == 0 {
            return Err(ConfigError::InvalidValue(
                "walk.concurrency must be greater than 0".to_string(),
            )
            .into());
        }

        if self.http.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "http.timeout_secs must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }

    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            server_url: self.server_url.clone(),
            organization: self.organization.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
        }
    }

    /// HTTP client for the configured server.
    pub fn client(&self) -> Result<Client> {
        Client::builder()
            .base_url(&self.server_url)
            .timeout(Duration::from_secs(self.http.timeout_secs))
            .header("user-agent", &self.http.user_agent)?
            .header("accept", "text/html,application/xhtml+xml,*/*")?
            .build()
    }

    pub fn walk_options(&self) -> WalkOptions {
        WalkOptions {
            concurrency: self.walk.concurrency,
            page_count: self.walk.page_count,
        }
    }
}

fn default_report() -> String {
    "reports/malformed-phone-numbers.json".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36".to_string()
}

fn default_concurrency() -> usize {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_directory() -> String {
    "logs".to_string()
}

fn default_log_filename() -> String {
    "ming800.log".to_string()
}
