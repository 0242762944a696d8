//! Configuration file management for stride.
//!
//! Provides a TOML config file at `~/.config/stride/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use stride_db::config::DbConfig;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: String,
    pub port: u16,
    pub plan_path: String,
    /// Mark the session cookie `Secure`. Turn on behind HTTPS.
    pub secure_cookies: bool,
}

impl ServerSection {
    pub const DEFAULT_BIND: &str = "127.0.0.1";
    pub const DEFAULT_PORT: u16 = 3000;
    pub const DEFAULT_PLAN_PATH: &str = "plan.csv";
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: Self::DEFAULT_BIND.to_owned(),
            port: Self::DEFAULT_PORT,
            plan_path: Self::DEFAULT_PLAN_PATH.to_owned(),
            secure_cookies: false,
        }
    }
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// `$XDG_CONFIG_HOME/stride` or `~/.config/stride`.
///
/// XDG layout on every platform; `dirs::config_dir()` would pick
/// `~/Library/Application Support` on macOS.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("stride");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("stride")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// `$XDG_DATA_HOME/stride` or `~/.local/share/stride`.
pub fn data_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg).join("stride");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".local")
        .join("share")
        .join("stride")
}

/// Guest-mode completions and measurements.
pub fn default_guest_file() -> PathBuf {
    data_dir().join("guest.json")
}

/// Session token written by `stride login`.
pub fn session_file() -> PathBuf {
    data_dir().join("session")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Errors if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Write the config file with 0600 permissions on Unix, creating parent
/// directories as needed.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    write_private(&config_path(), &contents)
}

/// Write `contents` to `path`, readable by the owner only.
pub fn write_private(path: &std::path::Path, contents: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory {}", dir.display()))?;
    }
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct StrideConfig {
    pub db_config: DbConfig,
    pub plan_path: PathBuf,
    pub server: ServerSection,
}

impl StrideConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config
    /// file > default.
    ///
    /// - DB URL: `cli_db_url` > `STRIDE_DATABASE_URL` > `database.url` > `DbConfig::DEFAULT_URL`
    /// - Plan: `cli_plan` > `STRIDE_PLAN_PATH` > `server.plan_path` > `plan.csv`
    ///
    /// A missing config file is not an error; a malformed one is.
    pub fn resolve(cli_db_url: Option<&str>, cli_plan: Option<&str>) -> Result<Self> {
        let file_config = if config_path().exists() {
            Some(load_config()?)
        } else {
            None
        };

        let db_url = if let Some(url) = cli_db_url {
            url.to_owned()
        } else if let Ok(url) = std::env::var(DbConfig::ENV_VAR) {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_owned()
        };

        let server = file_config.map(|cfg| cfg.server).unwrap_or_default();

        let plan_path = if let Some(path) = cli_plan {
            path.to_owned()
        } else if let Ok(path) = std::env::var("STRIDE_PLAN_PATH") {
            path
        } else {
            server.plan_path.clone()
        };

        Ok(Self {
            db_config: DbConfig::new(db_url),
            plan_path: PathBuf::from(plan_path),
            server,
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
