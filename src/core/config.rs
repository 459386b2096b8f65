use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};
use tracing::debug;

pub const DEFAULT_ORIGIN_URL: &str = "https://economia.awesomeapi.com.br/json/last/USD-BRL";

/// Deadlines, endpoints and file locations for both processes.
///
/// Timeouts are written in milliseconds in the YAML file, e.g.
/// `fetch_timeout_ms: 200`. Any omitted key falls back to its default.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    #[serde(rename = "fetch_timeout_ms", with = "duration_ms")]
    pub fetch_timeout: Duration,
    #[serde(rename = "persist_timeout_ms", with = "duration_ms")]
    pub persist_timeout: Duration,
    #[serde(rename = "client_timeout_ms", with = "duration_ms")]
    pub client_timeout: Duration,
    pub origin_url: String,
    pub listen_addr: String,
    /// Quote endpoint the client calls.
    pub server_url: String,
    pub database_path: PathBuf,
    /// File the client overwrites with the latest bid.
    pub output_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            fetch_timeout: Duration::from_millis(200),
            persist_timeout: Duration::from_millis(10),
            client_timeout: Duration::from_millis(300),
            origin_url: DEFAULT_ORIGIN_URL.to_string(),
            listen_addr: "0.0.0.0:8080".to_string(),
            server_url: "http://localhost:8080/cotacao".to_string(),
            database_path: PathBuf::from("cotacoes.db"),
            output_path: PathBuf::from("cotacao.txt"),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, or the defaults if no file exists there.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(path = %config_path.display(), "No config file found, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("br", "cotacao", "cotacao")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Explicit path wins; otherwise the default location is tried.
    pub fn resolve(config_path: Option<&str>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
