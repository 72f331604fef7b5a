//! Server configuration.
//!
//! Settings come from an optional YAML file and are then overridden by the
//! command line:
//!
//! ```yaml
//! server:
//!   listen_addr: "127.0.0.1:8080"
//!   idle_timeout_ms: 5000
//! static_files:
//!   root: "./htdocs"
//! ```
//!
//! ```bash
//! lantern --port 8080 --doc-root ./htdocs
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;

/// Command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(name = "lantern")]
#[command(about = "Static-file HTTP/1.1 server")]
#[command(version)]
pub struct Cli {
    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Directory files are served from
    #[arg(long = "doc-root", alias = "doc_root")]
    pub doc_root: Option<PathBuf>,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Maximum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,
}

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
    /// How long a connection may sit without delivering a complete request.
    pub idle_timeout_ms: u64,
    /// How long shutdown waits for open connections to finish.
    pub shutdown_grace_ms: u64,
    /// When set, requests whose `Host` differs are rejected.
    pub allowed_host: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            idle_timeout_ms: 5_000,
            shutdown_grace_ms: 10_000,
            allowed_host: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    pub root: PathBuf,
    pub index_file: String,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            index_file: "index.html".to_string(),
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(yaml).context("invalid configuration")
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&yaml).with_context(|| format!("in config file {}", path.display()))
    }

    /// Builds the effective configuration: the file named by `--config`
    /// (or defaults), then command-line overrides, then validation.
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let mut cfg = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if cli.host.is_some() || cli.port.is_some() {
            let (default_host, default_port) = split_host_port(&cfg.server.listen_addr);
            let host = cli.host.as_deref().unwrap_or(default_host);
            let port = cli.port.map(|p| p.to_string());
            let port = port.as_deref().unwrap_or(default_port);
            cfg.server.listen_addr = if host.contains(':') && !host.starts_with('[') {
                format!("[{}]:{}", host, port)
            } else {
                format!("{}:{}", host, port)
            };
        }

        if let Some(root) = &cli.doc_root {
            cfg.static_files.root = root.clone();
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let root = &self.static_files.root;
        if root.as_os_str().is_empty() {
            anyhow::bail!("no document root configured (use --doc-root or static_files.root)");
        }
        if !root.is_dir() {
            anyhow::bail!("document root {} is not a directory", root.display());
        }
        if self.server.idle_timeout_ms == 0 {
            anyhow::bail!("server.idle_timeout_ms must be greater than zero");
        }
        if self.static_files.index_file.is_empty() || self.static_files.index_file.contains('/') {
            anyhow::bail!("static_files.index_file must be a plain file name");
        }
        Ok(())
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.server.idle_timeout_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.server.shutdown_grace_ms)
    }
}

/// Splits `host:port`, keeping bracketed IPv6 hosts intact.
fn split_host_port(addr: &str) -> (&str, &str) {
    match addr.rsplit_once(':') {
        Some((host, port)) if !port.ends_with(']') => (host, port),
        _ => (addr, "8080"),
    }
}
