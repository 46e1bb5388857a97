//! Configuration for cinedb paths and display settings.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (CINEDB_HOME, CINEDB_CONTENT_FILE, CINEDB_USERS_FILE)
//! 2. Config file (.cinedb/config.yaml)
//! 3. Defaults (~/.cinedb, content.jsonl and users.jsonl inside it)
//!
//! Config file discovery:
//! - Searches current directory and parents for .cinedb/config.yaml
//! - Relative paths in the config file resolve against the .cinedb/ directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

pub const DEFAULT_CONTENT_FILE: &str = "content.jsonl";
pub const DEFAULT_USERS_FILE: &str = "users.jsonl";
pub const DEFAULT_DISPLAY_LIMIT: usize = 20;

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub display: Option<DisplayConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Data directory (relative to .cinedb/)
    pub home: Option<String>,
    /// Content collection file
    pub content: Option<String>,
    /// User collection file
    pub users: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Rows printed by listing commands
    pub limit: Option<usize>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Data directory
    pub home: PathBuf,
    /// Content collection (JSONL)
    pub content_file: PathBuf,
    /// User collection (JSONL)
    pub users_file: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    pub display_limit: usize,
}

impl ResolvedConfig {
    /// Defaults rooted at `home`
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        Self {
            content_file: home.join(DEFAULT_CONTENT_FILE),
            users_file: home.join(DEFAULT_USERS_FILE),
            home,
            config_file: None,
            display_limit: DEFAULT_DISPLAY_LIMIT,
        }
    }
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(".cinedb").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    resolve_config(find_config_file(&cwd))
}

/// Layer env vars over an optional config file over defaults
fn resolve_config(config_file: Option<PathBuf>) -> Result<ResolvedConfig> {
    let default_home = || -> Result<PathBuf> {
        Ok(dirs::home_dir()
            .context("Failed to determine home directory")?
            .join(".cinedb"))
    };

    let file = config_file
        .as_deref()
        .map(load_config_file)
        .transpose()?;

    let cinedb_dir = config_file
        .as_deref()
        .and_then(Path::parent)
        .unwrap_or(Path::new("."));
    let paths = file.as_ref().map(|f| f.paths.clone()).unwrap_or_default();

    let home = match (env_path("CINEDB_HOME"), &paths.home) {
        (Some(env_home), _) => env_home,
        (None, Some(home)) => resolve_path(cinedb_dir, home),
        (None, None) => default_home()?,
    };

    let content_file = match (env_path("CINEDB_CONTENT_FILE"), &paths.content) {
        (Some(path), _) => path,
        (None, Some(path)) => resolve_path(cinedb_dir, path),
        (None, None) => home.join(DEFAULT_CONTENT_FILE),
    };

    let users_file = match (env_path("CINEDB_USERS_FILE"), &paths.users) {
        (Some(path), _) => path,
        (None, Some(path)) => resolve_path(cinedb_dir, path),
        (None, None) => home.join(DEFAULT_USERS_FILE),
    };

    let display_limit = file
        .as_ref()
        .and_then(|f| f.display.as_ref())
        .and_then(|d| d.limit)
        .unwrap_or(DEFAULT_DISPLAY_LIMIT);

    Ok(ResolvedConfig {
        home,
        content_file,
        users_file,
        config_file,
        display_limit,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (bypasses the cache)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}
