//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use adminkit_config::ConfigError;
use adminkit_core::CoreError;
use miette::Diagnostic;
use thiserror::Error;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const REJECTED: i32 = 6;
    pub const CANCELLED: i32 = 130;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(code(adminkit::auth_failed))]
    AuthFailed { message: String },

    #[error("Access denied: {message}")]
    #[diagnostic(code(adminkit::forbidden))]
    Forbidden { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource} '{identifier}' not found")]
    #[diagnostic(
        code(adminkit::not_found),
        help("Run: adminkit list {resource} to see available records")
    )]
    NotFound {
        resource: String,
        identifier: String,
    },

    #[error("Unknown resource '{resource}'")]
    #[diagnostic(
        code(adminkit::unknown_resource),
        help("Resources are the top-level keys of the data file. Check --data-file.")
    )]
    UnknownResource { resource: String },

    #[error("Request rejected: {message}")]
    #[diagnostic(code(adminkit::rejected))]
    Rejected { message: String },

    // ── Data store ───────────────────────────────────────────────────
    #[error("Data store error: {message}")]
    #[diagnostic(code(adminkit::api_error))]
    ApiError { message: String },

    #[error("Could not read data file {path}")]
    #[diagnostic(
        code(adminkit::data_file),
        help("The data file must be a JSON object mapping resource names to record arrays.")
    )]
    DataFile {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Export failed: {message}")]
    #[diagnostic(code(adminkit::export))]
    Export { message: String },

    // ── Undo ─────────────────────────────────────────────────────────
    #[error("Operation cancelled")]
    #[diagnostic(code(adminkit::cancelled))]
    Cancelled,

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(adminkit::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(adminkit::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: adminkit config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(adminkit::config))]
    Config(ConfigError),

    // ── Internal ─────────────────────────────────────────────────────
    #[error("Internal error: {message}")]
    #[diagnostic(code(adminkit::internal))]
    Internal { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(adminkit::json), help("Check the JSON data and try again."))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::Forbidden { .. } => exit_code::PERMISSION,
            Self::NotFound { .. } | Self::UnknownResource { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Validation { .. } | Self::ProfileNotFound { .. } => exit_code::USAGE,
            Self::Cancelled => exit_code::CANCELLED,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::Forbidden { message } => CliError::Forbidden { message },
            CoreError::UnknownResource { resource } => CliError::UnknownResource { resource },
            // List-shaped requests carry no id; the resource itself is missing
            CoreError::NotFound { resource, id } if id.is_empty() => {
                CliError::UnknownResource { resource }
            }
            CoreError::NotFound { resource, id } => CliError::NotFound {
                resource,
                identifier: id,
            },
            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::Rejected { message } => CliError::Rejected { message },
            CoreError::Cancelled => CliError::Cancelled,
            CoreError::Api { message, .. } => CliError::ApiError { message },
            CoreError::Export { message } => CliError::Export { message },
            err @ (CoreError::VerbMismatch { .. }
            | CoreError::UndoTokenUnknown { .. }
            | CoreError::Internal(_)) => CliError::Internal {
                message: err.to_string(),
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::ProfileNotFound { name } => CliError::ProfileNotFound {
                name,
                available: String::new(),
            },
            other => CliError::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_exit_code_four() {
        let err = CliError::from(CoreError::NotFound {
            resource: "posts".into(),
            id: "9".into(),
        });
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
        assert_eq!(err.to_string(), "posts '9' not found");
    }

    #[test]
    fn config_validation_is_a_usage_error() {
        let err = CliError::from(ConfigError::Validation {
            field: "undo_window".into(),
            reason: "bad".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }
}
