use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, ensure};
use serde::Deserialize;

use crate::files::PathResolver;
use crate::http::connection::ConnectionSettings;
use crate::http::parser::Limits;

/// Environment variable naming a YAML config file.
pub const CONFIG_ENV: &str = "FILESERVE_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Cap on concurrently served connections. Unset means unbounded.
    pub max_connections: Option<usize>,
    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:6703".to_string(),
            max_connections: None,
            read_timeout_secs: 10,
            write_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Document root
    pub root: PathBuf,
    pub index_file: String,
    pub max_body_bytes: usize,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            index_file: "index.html".to_string(),
            max_body_bytes: Limits::default().max_body,
        }
    }
}

impl Config {
    /// Loads the file named by `FILESERVE_CONFIG` (defaults otherwise), then
    /// applies the `LISTEN` and `DOC_ROOT` overrides.
    pub fn load() -> anyhow::Result<Self> {
        let cfg = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };

        cfg.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        Self::from_yaml(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let cfg: Self = serde_yaml::from_str(yaml).context("Failed to parse YAML config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Applies `LISTEN` and `DOC_ROOT` from `lookup` on top of this config.
    pub fn with_overrides<F>(mut self, lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("LISTEN") {
            self.server.listen_addr = addr;
        }
        if let Some(root) = lookup("DOC_ROOT") {
            self.static_files.root = PathBuf::from(root);
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.server.listen_addr.is_empty(), "server.listen_addr must not be empty");
        ensure!(self.server.max_connections != Some(0), "server.max_connections must be at least 1");
        ensure!(self.server.read_timeout_secs > 0, "server.read_timeout_secs must be positive");
        ensure!(self.server.write_timeout_secs > 0, "server.write_timeout_secs must be positive");
        ensure!(
            !self.static_files.index_file.is_empty() && !self.static_files.index_file.contains('/'),
            "static_files.index_file must be a plain file name"
        );
        Ok(())
    }

    /// Per-connection settings derived from this config.
    pub fn connection_settings(&self) -> Arc<ConnectionSettings> {
        Arc::new(ConnectionSettings {
            resolver: PathResolver::new(&self.static_files.root, &self.static_files.index_file),
            limits: Limits {
                max_body: self.static_files.max_body_bytes,
                ..Limits::default()
            },
            read_timeout: Duration::from_secs(self.server.read_timeout_secs),
            write_timeout: Duration::from_secs(self.server.write_timeout_secs),
        })
    }
}
