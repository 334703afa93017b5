//! Configuration loading from environment variables.

use crate::constants::{DEFAULT_AUTHOR, DEFAULT_AUTHOR_EMAIL, DEFAULT_EDITOR_FALLBACK_MS};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for dbedit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: String,
    pub author: String,
    pub author_email: String,
    pub editor_fallback_ms: u64,
    pub seed_reserved: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            author: DEFAULT_AUTHOR.to_string(),
            author_email: DEFAULT_AUTHOR_EMAIL.to_string(),
            editor_fallback_ms: DEFAULT_EDITOR_FALLBACK_MS,
            seed_reserved: true,
        }
    }
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: String) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = resolve_home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path
}

fn resolve_home_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        if !home.trim().is_empty() {
            return Some(PathBuf::from(home));
        }
    }

    // Windows USERPROFILE
    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.trim().is_empty() {
            return Some(PathBuf::from(profile));
        }
    }

    std::env::current_dir().ok()
}

fn default_db_path() -> String {
    let home = resolve_home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".cache")
        .join("dbedit")
        .join("db")
        .to_string_lossy()
        .to_string()
}

/// Parse a boolean-like environment flag value.
///
/// # Supported Values
/// - Truthy: `1`, `true`, `yes`, `on`
/// - Falsy: `0`, `false`, `no`, `off`, empty string
///
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Returns
/// `Some(bool)` when the value is recognized, otherwise `None`.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a boolean flag from the environment.
///
/// Missing or unrecognized values are treated as `false`.
pub fn env_flag_enabled(name: &str) -> bool {
    env_flag_or(name, false)
}

fn env_flag_or(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| parse_env_flag(&value))
        .unwrap_or(default)
}

fn env_string_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing.
    pub fn from_env() -> Self {
        Self {
            db_path: env::var("DB_PATH")
                .map(expand_tilde)
                .unwrap_or_else(|_| default_db_path()),
            author: env_string_or("DBEDIT_AUTHOR", DEFAULT_AUTHOR),
            author_email: env_string_or("DBEDIT_AUTHOR_EMAIL", DEFAULT_AUTHOR_EMAIL),
            editor_fallback_ms: env::var("DBEDIT_EDITOR_FALLBACK_MS")
                .ok()
                .and_then(|ms| ms.trim().parse().ok())
                .unwrap_or(DEFAULT_EDITOR_FALLBACK_MS),
            seed_reserved: env_flag_or("DBEDIT_SEED_RESERVED", true),
        }
    }

    /// Fallback timeout for the structured editor as a [`Duration`].
    pub fn editor_fallback_timeout(&self) -> Duration {
        Duration::from_millis(self.editor_fallback_ms)
    }
}
