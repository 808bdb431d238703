//! Configuration loader
//!
//! Loads agent configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. If `GASOLINE_SERVER_URL` is set, configuration comes from the
//!    environment (unset variables keep their defaults)
//! 2. Otherwise the first config file found by [`probe_config_paths`]
//! 3. Otherwise built-in defaults
//!
//! The result is always validated.
//!
//! ## Environment Variables
//! - `GASOLINE_SERVER_URL`: Dev server base URL
//! - `GASOLINE_REQUEST_TIMEOUT_MS`: Per-request timeout
//! - `GASOLINE_POLL_MS`: Default poll interval
//! - `GASOLINE_ERROR_POLL_MS`: Poll interval after a failed cycle
//! - `GASOLINE_BREAKER_MAX_FAILURES`: Failures before the breaker opens
//! - `GASOLINE_HANDLER_TIMEOUT_MS`: Upper bound on one command handler
//! - `GASOLINE_STORAGE_PATH`: JSON store file (in-memory if unset)
//! - `GASOLINE_TELEMETRY_LEVEL`: Minimum level relayed as extension logs
//! - `GASOLINE_LOG_LEVEL`: Console log level
//! - `GASOLINE_LOG_JSON`: JSON console output (true/false)
//!
//! ## File Locations
//! The loader probes, in order, the current working directory, its parent,
//! and the executable's directory for `gasoline.toml`, `gasoline.json`,
//! `config.toml` and `config.json`.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use gasoline_domain::{Config, GasolineError, Result};

/// Variable whose presence selects environment-based configuration
pub const SERVER_URL_VAR: &str = "GASOLINE_SERVER_URL";

const FILE_NAMES: [&str; 4] = ["gasoline.toml", "gasoline.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `GasolineError::Config` if an environment value or the config
/// file is malformed, or the resulting configuration fails validation.
pub fn load() -> Result<Config> {
    let config = if std::env::var_os(SERVER_URL_VAR).is_some() {
        let config = load_from_env()?;
        tracing::info!("Configuration loaded from environment variables");
        config
    } else {
        match probe_config_paths() {
            Some(path) => load_from_file(Some(path))?,
            None => {
                tracing::debug!("No config file found, using defaults");
                Config::default()
            }
        }
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables on top of the defaults
///
/// # Errors
/// Returns `GasolineError::Config` if a variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    if let Some(url) = env_string(SERVER_URL_VAR) {
        config.server.url = url;
    }
    if let Some(ms) = env_parse("GASOLINE_REQUEST_TIMEOUT_MS")? {
        config.server.request_timeout_ms = ms;
    }
    if let Some(ms) = env_parse("GASOLINE_POLL_MS")? {
        config.sync.default_poll_ms = ms;
    }
    if let Some(ms) = env_parse("GASOLINE_ERROR_POLL_MS")? {
        config.sync.error_poll_ms = ms;
    }
    if let Some(max) = env_parse("GASOLINE_BREAKER_MAX_FAILURES")? {
        config.breaker.max_failures = max;
    }
    if let Some(ms) = env_parse("GASOLINE_HANDLER_TIMEOUT_MS")? {
        config.pilot.handler_timeout_ms = ms;
    }
    if let Some(path) = env_string("GASOLINE_STORAGE_PATH") {
        config.storage.path = Some(PathBuf::from(path));
    }
    if let Some(level) = env_string("GASOLINE_TELEMETRY_LEVEL") {
        config.telemetry.capture_level = level;
    }
    if let Some(level) = env_string("GASOLINE_LOG_LEVEL") {
        config.logging.level = level;
    }
    config.logging.json = env_bool("GASOLINE_LOG_JSON", config.logging.json);

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns `GasolineError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(GasolineError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            GasolineError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| GasolineError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| GasolineError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| GasolineError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(GasolineError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// First existing config file in the standard locations, if any
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        if let Some(parent) = cwd.parent() {
            dirs.push(parent.to_path_buf());
        }
        dirs.insert(0, cwd);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    probe_dirs(&dirs)
}

fn probe_dirs(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_string(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| GasolineError::Config(format!("Invalid value for {key}: {e}")))
        })
        .transpose()
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
