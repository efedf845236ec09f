//! CLI configuration: thin wrapper around `adminkit_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--data-file, --mutation-mode, ...).

use std::path::PathBuf;
use std::time::Duration;

use adminkit_core::AdminConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use adminkit_config::{
    Config, Profile, config_path, load_config, parse_mutation_mode, parse_undo_window,
    save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Everything a record command needs, resolved from file, env and flags.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Handed to the runtime. Its `undo_timeout` is always `None`: the
    /// CLI runs the countdown itself so Ctrl-C can interrupt it.
    pub admin: AdminConfig,
    pub undo_window: Option<Duration>,
    pub data_file: PathBuf,
}

/// Resolve the active profile name: flag/env, then config, then "default".
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-joined profile names for error help text.
pub fn available_profiles(config: &Config) -> String {
    let names = config.profile_names();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

/// Look up the active profile.
///
/// A profile named explicitly with `--profile` must exist; an implicit
/// default that was never configured just means "use the defaults".
pub fn active_profile<'a>(
    global: &GlobalOpts,
    config: &'a Config,
) -> Result<Option<&'a Profile>, CliError> {
    let name = active_profile_name(global, config);
    match config.profiles.get(&name) {
        Some(profile) => Ok(Some(profile)),
        None if global.profile.is_some() => Err(CliError::ProfileNotFound {
            name,
            available: available_profiles(config),
        }),
        None => Ok(None),
    }
}

/// Translate config + profile + global flags into [`Settings`].
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_settings(config: &Config, global: &GlobalOpts) -> Result<Settings, CliError> {
    let profile = active_profile(global, config)?;
    let mut admin = adminkit_config::to_admin_config(&config.defaults, profile)?;

    if let Some(mode) = global.mutation_mode {
        admin.mutation_mode = mode.into();
    }
    let undo_window = match global.undo_window.as_deref() {
        Some(window) => parse_undo_window(window)?,
        None => admin.undo_timeout,
    };
    admin.undo_timeout = None;

    let data_file = global
        .data_file
        .clone()
        .unwrap_or_else(|| adminkit_config::resolve_data_file(profile));

    Ok(Settings {
        admin,
        undo_window,
        data_file,
    })
}
