//! Server configuration, read from a TOML file.
//!
//! Every section and key is optional; missing values take the defaults
//! below.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Directory holding named contexts: `-c prod` → `/etc/eventide/prod.toml`.
pub const CONTEXT_DIR: &str = "/etc/eventide";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub auth: AuthConfig,
    pub log: LogConfig,
    pub content: ContentConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub data_dir: PathBuf,
    pub db_name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("/var/lib/eventide"),
            db_name: "eventide".to_string(),
        }
    }
}

impl DatabaseConfig {
    /// `{data_dir}/{db_name}.redb`
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.redb", self.db_name))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9101,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Require tokens on the API service.
    pub enable: bool,
    pub host: String,
    pub port: u16,
    pub use_ssl: bool,
    pub cert: PathBuf,
    pub key: PathBuf,
    /// Kept as a string so an unknown mode is reported at startup with the
    /// list of valid ones.
    pub mode: String,
    /// Seconds.
    pub token_ttl: i64,
    pub users_file: PathBuf,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enable: false,
            host: "0.0.0.0".to_string(),
            port: 9100,
            use_ssl: false,
            cert: PathBuf::from("/etc/eventide/ssl/cert.pem"),
            key: PathBuf::from("/etc/eventide/ssl/key.pem"),
            mode: "proxy".to_string(),
            token_ttl: 86400,
            users_file: PathBuf::from("/etc/eventide/htpasswd"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing` EnvFilter directive, e.g. `info` or `policy=debug,info`.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub packs_base_path: PathBuf,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            packs_base_path: PathBuf::from("/opt/eventide/packs"),
        }
    }
}

impl Config {
    /// Resolve a context name or path to a config file path.
    ///
    /// - If it contains `/` or `.`, treat as a file path.
    /// - Otherwise, resolve to `/etc/eventide/<name>.toml`.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            Path::new(CONTEXT_DIR).join(format!("{}.toml", name_or_path))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
