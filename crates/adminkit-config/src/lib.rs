//! Shared configuration for adminkit tools.
//!
//! TOML profiles, environment overrides and translation to
//! `adminkit_core::AdminConfig`. The CLI adds `GlobalOpts`-aware wrappers
//! on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use adminkit_core::{AdminConfig, MutationMode};
use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named data profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() })
    }

    /// Profile names, sorted.
    pub fn profile_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.profiles.keys().cloned().collect();
        names.sort();
        names
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// `pessimistic`, `optimistic` or `undoable`.
    #[serde(default = "default_mutation_mode")]
    pub mutation_mode: String,

    /// Undo grace window in humantime form ("5s", "1m 30s"). "0s" leaves
    /// the window open until the user decides.
    #[serde(default = "default_undo_window")]
    pub undo_window: String,

    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            mutation_mode: default_mutation_mode(),
            undo_window: default_undo_window(),
            per_page: default_per_page(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_mutation_mode() -> String {
    "pessimistic".into()
}
fn default_undo_window() -> String {
    "5s".into()
}
fn default_per_page() -> u32 {
    25
}

/// A named data profile.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// JSON file backing the in-memory data provider.
    pub data_file: Option<PathBuf>,

    /// Override the default mutation mode.
    pub mutation_mode: Option<String>,

    /// Override the undo window.
    pub undo_window: Option<String>,

    /// Show undoable mutations locally while the window is open.
    pub undoable_optimistic: Option<bool>,

    /// Override the page size for `list`.
    pub per_page: Option<u32>,
}

// ── Paths ───────────────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("rs", "adminkit", "adminkit").map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default data file for profiles that do not set `data_file`.
pub fn default_data_path() -> PathBuf {
    ProjectDirs::from("rs", "adminkit", "adminkit").map_or_else(
        || dirs_fallback().join("data.json"),
        |dirs| dirs.data_dir().join("data.json"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("adminkit");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path`, then `ADMINKIT_`-prefixed environment variables.
///
/// Nested keys use a double underscore: `ADMINKIT_DEFAULTS__PER_PAGE=50`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("ADMINKIT_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation to runtime config ───────────────────────────────────

pub fn parse_mutation_mode(value: &str) -> Result<MutationMode, ConfigError> {
    value.parse().map_err(|_| ConfigError::Validation {
        field: "mutation_mode".into(),
        reason: format!("expected 'pessimistic', 'optimistic', or 'undoable', got '{value}'"),
    })
}

/// Parse an undo window. A zero duration means "no timer".
pub fn parse_undo_window(value: &str) -> Result<Option<Duration>, ConfigError> {
    let window = humantime::parse_duration(value.trim()).map_err(|e| ConfigError::Validation {
        field: "undo_window".into(),
        reason: format!("'{value}': {e}"),
    })?;
    Ok((!window.is_zero()).then_some(window))
}

/// Build an `AdminConfig` from defaults and an optional profile.
///
/// Profile values take priority over defaults.
pub fn to_admin_config(
    defaults: &Defaults,
    profile: Option<&Profile>,
) -> Result<AdminConfig, ConfigError> {
    let mode = profile
        .and_then(|p| p.mutation_mode.as_deref())
        .unwrap_or(&defaults.mutation_mode);
    let window = profile
        .and_then(|p| p.undo_window.as_deref())
        .unwrap_or(&defaults.undo_window);
    let per_page = profile.and_then(|p| p.per_page).unwrap_or(defaults.per_page);
    if per_page == 0 {
        return Err(ConfigError::Validation {
            field: "per_page".into(),
            reason: "must be at least 1".into(),
        });
    }

    Ok(AdminConfig {
        mutation_mode: parse_mutation_mode(mode)?,
        undo_timeout: parse_undo_window(window)?,
        undoable_optimistic: profile.and_then(|p| p.undoable_optimistic).unwrap_or(true),
        default_per_page: per_page,
        ..AdminConfig::default()
    })
}

/// Data file for `profile`, falling back to [`default_data_path`].
pub fn resolve_data_file(profile: Option<&Profile>) -> PathBuf {
    profile
        .and_then(|p| p.data_file.clone())
        .unwrap_or_else(default_data_path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_translate_to_pessimistic_with_window() {
        let config = to_admin_config(&Defaults::default(), None).unwrap();
        assert_eq!(config.mutation_mode, MutationMode::Pessimistic);
        assert_eq!(config.undo_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.default_per_page, 25);
    }

    #[test]
    fn profile_overrides_defaults() {
        let profile = Profile {
            mutation_mode: Some("Undoable".into()),
            undo_window: Some("0s".into()),
            undoable_optimistic: Some(false),
            per_page: Some(10),
            ..Profile::default()
        };
        let config = to_admin_config(&Defaults::default(), Some(&profile)).unwrap();
        assert_eq!(config.mutation_mode, MutationMode::Undoable);
        assert_eq!(config.undo_timeout, None);
        assert!(!config.undoable_optimistic);
        assert_eq!(config.default_per_page, 10);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            parse_mutation_mode("eager"),
            Err(ConfigError::Validation { .. })
        ));
        assert!(matches!(
            parse_undo_window("soon"),
            Err(ConfigError::Validation { .. })
        ));
        let profile = Profile {
            per_page: Some(0),
            ..Profile::default()
        };
        assert!(to_admin_config(&Defaults::default(), Some(&profile)).is_err());
    }

    #[test]
    fn save_then_load_round_trips_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert(
            "blog".into(),
            Profile {
                data_file: Some(dir.path().join("blog.json")),
                mutation_mode: Some("optimistic".into()),
                ..Profile::default()
            },
        );
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profile("blog").unwrap(), cfg.profile("blog").unwrap());
        assert_eq!(loaded.profile_names(), vec!["blog".to_string()]);
        assert!(matches!(
            loaded.profile("missing"),
            Err(ConfigError::ProfileNotFound { .. })
        ));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded.defaults, Defaults::default());
        assert_eq!(loaded.default_profile.as_deref(), Some("default"));
    }

    #[test]
    fn data_file_falls_back_to_default_path() {
        assert_eq!(resolve_data_file(None), default_data_path());
        let profile = Profile {
            data_file: Some(PathBuf::from("/tmp/x.json")),
            ..Profile::default()
        };
        assert_eq!(resolve_data_file(Some(&profile)), PathBuf::from("/tmp/x.json"));
    }
}
