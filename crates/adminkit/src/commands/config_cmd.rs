//! Config subcommand handlers.

use std::path::PathBuf;

use dialoguer::{Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Profile};
use crate::error::CliError;
use crate::output;

const MODES: [&str; 3] = ["pessimistic", "optimistic", "undoable"];

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn bool_value(key: &str, value: &str) -> Result<bool, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: key.into(),
        reason: "must be 'true' or 'false'".into(),
    })
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global),

        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let out = output::render_single(&global.output, &cfg, |cfg| {
                toml::to_string_pretty(cfg).unwrap_or_else(|e| format!("<unprintable: {e}>"))
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config()?;
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            set_key(profile, &key, value)?;
            config::save_config(&cfg)?;
            eprintln!("✓ Set {key} on profile '{profile_name}'");
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config()?;
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: adminkit config init");
            } else {
                for name in cfg.profile_names() {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }
    }
}

/// Apply one `config set` key to `profile`, validating the value.
fn set_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "data_file" | "data-file" => profile.data_file = Some(PathBuf::from(value)),
        "mutation_mode" | "mutation-mode" => {
            config::parse_mutation_mode(&value)?;
            profile.mutation_mode = Some(value.to_lowercase());
        }
        "undo_window" | "undo-window" => {
            config::parse_undo_window(&value)?;
            profile.undo_window = Some(value);
        }
        "undoable_optimistic" | "undoable-optimistic" => {
            profile.undoable_optimistic = Some(bool_value(key, &value)?);
        }
        "per_page" | "per-page" => {
            let per_page: u32 = value.parse().map_err(|_| CliError::Validation {
                field: "per_page".into(),
                reason: "must be a positive number".into(),
            })?;
            if per_page == 0 {
                return Err(CliError::Validation {
                    field: "per_page".into(),
                    reason: "must be at least 1".into(),
                });
            }
            profile.per_page = Some(per_page);
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: data_file, mutation_mode, \
                     undo_window, undoable_optimistic, per_page"
                ),
            });
        }
    }
    Ok(())
}

// ── Init: interactive wizard ────────────────────────────────────────

fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let config_path = config::config_path();
    let mut cfg = config::load_config()?;

    let (name, profile) = if global.yes {
        ("default".to_owned(), Profile::default())
    } else {
        eprintln!("adminkit configuration wizard");
        eprintln!("   Config path: {}\n", config_path.display());
        prompt_profile()?
    };

    cfg.default_profile = Some(name.clone());
    cfg.profiles.insert(name.clone(), profile);
    let path = config::save_config(&cfg)?;
    eprintln!("✓ Profile '{name}' saved to {}", path.display());
    Ok(())
}

fn prompt_profile() -> Result<(String, Profile), CliError> {
    let name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let data_file: String = Input::new()
        .with_prompt("Data file (JSON)")
        .default(adminkit_config::default_data_path().display().to_string())
        .interact_text()
        .map_err(prompt_err)?;

    let mode = Select::new()
        .with_prompt("Mutation mode")
        .items(&MODES)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let undo_window = if MODES[mode] == "undoable" {
        let window: String = Input::new()
            .with_prompt("Undo window (0s asks instead of counting down)")
            .default("5s".into())
            .validate_with(|input: &String| {
                config::parse_undo_window(input)
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            })
            .interact_text()
            .map_err(prompt_err)?;
        Some(window)
    } else {
        None
    };

    Ok((
        name,
        Profile {
            data_file: Some(PathBuf::from(data_file)),
            mutation_mode: Some(MODES[mode].to_owned()),
            undo_window,
            ..Profile::default()
        },
    ))
}
