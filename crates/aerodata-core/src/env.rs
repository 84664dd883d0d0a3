//! Per-user environment: configuration directory, options file, logging.
//!
//! The toolkit keeps its state under `$AERODATA_HOME`, falling back to
//! `$HOME/.aerodata`. The directory holds a `settings.yaml` options file
//! (log level/path and user options), the log file, and the
//! `user_algorithms/` extension tree managed by the algorithms crate.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::{CoreError, CoreResult};

/// Name of the options file inside the configuration directory.
pub const SETTINGS_FILE: &str = "settings.yaml";

/// Logging section of the options file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Log level: trace, debug, info, warn or error.
    pub level: String,
    /// Log file path; defaults to `aerodata.log` in the config directory.
    pub path: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            level: "info".to_string(),
            path: None,
        }
    }
}

/// General options section of the options file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Whether the caller may run its update check worker.
    pub check_update: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options { check_update: false }
    }
}

/// The options file: a `log` section and an `options` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log: LogSettings,
    pub options: Options,
}

/// Resolve the per-user configuration directory.
///
/// `$AERODATA_HOME` wins, then `$HOME/.aerodata`, then a relative
/// `.aerodata` as the last resort.
pub fn config_dir() -> PathBuf {
    if let Ok(home) = std::env::var("AERODATA_HOME") {
        return PathBuf::from(home);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".aerodata");
    }
    PathBuf::from(".aerodata")
}

/// Create the configuration directory and options file when absent, then
/// load the settings. Safe to call repeatedly.
pub fn bootstrap(dir: &Path) -> CoreResult<Settings> {
    fs::create_dir_all(dir)
        .map_err(|e| CoreError::Config(format!("cannot create {}: {}", dir.display(), e)))?;

    let settings_path = dir.join(SETTINGS_FILE);
    if !settings_path.exists() {
        let defaults = Settings::default();
        let text = serde_yaml::to_string(&defaults)
            .map_err(|e| CoreError::Config(format!("cannot serialise default settings: {}", e)))?;
        fs::write(&settings_path, text).map_err(|e| {
            CoreError::Config(format!("cannot write {}: {}", settings_path.display(), e))
        })?;
    }

    let text = fs::read_to_string(&settings_path).map_err(|e| {
        CoreError::Config(format!("cannot read {}: {}", settings_path.display(), e))
    })?;
    serde_yaml::from_str(&text).map_err(|e| {
        CoreError::Config(format!("cannot parse {}: {}", settings_path.display(), e))
    })
}

/// Wire the global tracing subscriber to the configured level and log
/// file. When a subscriber is already installed the existing one is kept.
pub fn init_logging(settings: &LogSettings, dir: &Path) -> CoreResult<()> {
    let path = settings
        .path
        .clone()
        .unwrap_or_else(|| dir.join("aerodata.log"));
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| CoreError::Config(format!("cannot open log file {}: {}", path.display(), e)))?;

    let filter = EnvFilter::try_new(&settings.level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        info!(path = %path.display(), "logging initialised");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_creates_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("cfg");

        let settings = bootstrap(&base).unwrap();
        assert_eq!(settings.log.level, "info");
        assert!(!settings.options.check_update);
        assert!(base.join(SETTINGS_FILE).exists());

        // Second call is a pure reload.
        let again = bootstrap(&base).unwrap();
        assert_eq!(again.log.level, settings.log.level);
    }

    #[test]
    fn test_bootstrap_respects_edits() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().to_path_buf();
        bootstrap(&base).unwrap();
        fs::write(
            base.join(SETTINGS_FILE),
            "log:\n  level: debug\noptions:\n  check_update: true\n",
        )
        .unwrap();
        let settings = bootstrap(&base).unwrap();
        assert_eq!(settings.log.level, "debug");
        assert!(settings.options.check_update);
    }
}
