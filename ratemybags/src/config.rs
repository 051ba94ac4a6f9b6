//! Application configuration.
//!
//! Layers, later wins: built-in defaults, an optional TOML file named by
//! `RATEMYBAGS_CONFIG`, then individual environment variables.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_PATH_VAR: &str = "RATEMYBAGS_CONFIG";

pub const DEFAULT_DEMO_WALLET: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("public host '{0}' must start with http:// or https://")]
    InvalidHost(String),

    #[error("invalid bind address '{addr}': {source}")]
    InvalidBindAddr {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioConfig {
    /// Base URL of the portfolio API. Unset means demo data only.
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: None,
            timeout_ms: 3_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Absolute origin used in every generated URL
    pub public_host: String,
    pub bind_addr: String,
    /// Directory holding `images/`
    pub public_dir: PathBuf,
    pub demo_wallet_address: String,
    pub log_format: LogFormat,
    pub portfolio: PortfolioConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            public_host: "http://localhost:3000".to_string(),
            bind_addr: "127.0.0.1:3000".to_string(),
            public_dir: PathBuf::from("public"),
            demo_wallet_address: DEFAULT_DEMO_WALLET.to_string(),
            log_format: LogFormat::Pretty,
            portfolio: PortfolioConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Loads configuration reading variables through `env`.
    pub fn load_from(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = match env(CONFIG_PATH_VAR).filter(|p| !p.trim().is_empty()) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        let mut config = config.apply_env(&env)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    fn apply_env(mut self, env: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = var("PUBLIC_HOST").or_else(|| var("NEXT_PUBLIC_HOST")) {
            self.public_host = host;
        }
        if let Some(addr) = var("BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(dir) = var("PUBLIC_DIR") {
            self.public_dir = PathBuf::from(dir);
        }
        if let Some(wallet) = var("DEMO_WALLET_ADDRESS") {
            self.demo_wallet_address = wallet;
        }
        if let Some(url) = var("PORTFOLIO_API_URL") {
            self.portfolio.api_url = Some(url);
        }
        if let Some(key) = var("PORTFOLIO_API_KEY") {
            self.portfolio.api_key = Some(key);
        }
        if let Some(raw) = var("PORTFOLIO_TIMEOUT_MS") {
            self.portfolio.timeout_ms = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORTFOLIO_TIMEOUT_MS",
                value: raw.clone(),
            })?;
        }
        if let Some(raw) = var("RATEMYBAGS_LOG_FORMAT") {
            self.log_format = LogFormat::parse(&raw).ok_or_else(|| ConfigError::InvalidValue {
                key: "RATEMYBAGS_LOG_FORMAT",
                value: raw.clone(),
            })?;
        }
        Ok(self)
    }

    /// Normalizes the host and checks the values start-up depends on.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        let host = self.public_host.trim().trim_end_matches('/');
        if !(host.starts_with("http://") || host.starts_with("https://")) {
            return Err(ConfigError::InvalidHost(self.public_host.clone()));
        }
        self.public_host = host.to_string();
        self.socket_addr()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_addr
            .parse()
            .map_err(|source| ConfigError::InvalidBindAddr {
                addr: self.bind_addr.clone(),
                source,
            })
    }

    pub fn images_dir(&self) -> PathBuf {
        self.public_dir.join("images")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = AppConfig::load_from(env(&[])).expect("loads");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.socket_addr().expect("parses").port(), 3000);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = AppConfig::load_from(env(&[
            ("PUBLIC_HOST", "https://bags.example.com/"),
            ("BIND_ADDR", "0.0.0.0:8080"),
            ("PORTFOLIO_API_URL", "https://api.example.com"),
            ("PORTFOLIO_TIMEOUT_MS", "1500"),
            ("RATEMYBAGS_LOG_FORMAT", "JSON"),
        ]))
        .expect("loads");
        assert_eq!(config.public_host, "https://bags.example.com");
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.portfolio.api_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(config.portfolio.timeout_ms, 1500);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn legacy_host_variable_is_honoured() {
        let config =
            AppConfig::load_from(env(&[("NEXT_PUBLIC_HOST", "https://legacy.example.com")]))
                .expect("loads");
        assert_eq!(config.public_host, "https://legacy.example.com");

        let both = AppConfig::load_from(env(&[
            ("NEXT_PUBLIC_HOST", "https://legacy.example.com"),
            ("PUBLIC_HOST", "https://new.example.com"),
        ]))
        .expect("loads");
        assert_eq!(both.public_host, "https://new.example.com");
    }

    #[test]
    fn toml_file_is_layered_under_environment() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            r#"
public_host = "https://from-file.example.com"
demo_wallet_address = "0x0000000000000000000000000000000000000001"

[portfolio]
api_url = "https://portfolio.example.com"
timeout_ms = 500
"#
        )
        .expect("writes");

        let path = file.path().to_string_lossy().to_string();
        let config = AppConfig::load_from(env(&[
            (CONFIG_PATH_VAR, path.as_str()),
            ("PORTFOLIO_TIMEOUT_MS", "750"),
        ]))
        .expect("loads");

        assert_eq!(config.public_host, "https://from-file.example.com");
        assert_eq!(
            config.demo_wallet_address,
            "0x0000000000000000000000000000000000000001"
        );
        assert_eq!(config.portfolio.api_url.as_deref(), Some("https://portfolio.example.com"));
        assert_eq!(config.portfolio.timeout_ms, 750);
        assert_eq!(config.bind_addr, "127.0.0.1:3000");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let result = AppConfig::load_from(env(&[(CONFIG_PATH_VAR, "/nonexistent/ratemybags.toml")]));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            AppConfig::load_from(env(&[("PUBLIC_HOST", "bags.example.com")])),
            Err(ConfigError::InvalidHost(_))
        ));
        assert!(matches!(
            AppConfig::load_from(env(&[("BIND_ADDR", "localhost")])),
            Err(ConfigError::InvalidBindAddr { .. })
        ));
        assert!(matches!(
            AppConfig::load_from(env(&[("PORTFOLIO_TIMEOUT_MS", "soon")])),
            Err(ConfigError::InvalidValue { key: "PORTFOLIO_TIMEOUT_MS", .. })
        ));
        assert!(matches!(
            AppConfig::load_from(env(&[("RATEMYBAGS_LOG_FORMAT", "xml")])),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            AppConfig::from_toml_str("public_host = 3"),
            Err(ConfigError::Parse(_))
        ));
    }
}
