// ── Core error types ──
//
// Errors surfaced by adminkit-core. Provider failures are translated
// from `adminkit_api::Error`; a failed provider call inside the action
// lifecycle is NOT an error here but a failure settlement.

use thiserror::Error;

use crate::action::FetchVerb;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Auth errors ──────────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Access denied: {message}")]
    Forbidden { message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Unknown resource: {resource}")]
    UnknownResource { resource: String },

    #[error("{resource} record not found: {id}")]
    NotFound { resource: String, id: String },

    // ── Request errors ───────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Request rejected by data provider: {message}")]
    Rejected { message: String },

    /// A settlement or payload does not belong to the request's verb.
    #[error("Verb mismatch: expected {expected}, got {got}")]
    VerbMismatch { expected: FetchVerb, got: FetchVerb },

    #[error("Request was cancelled")]
    Cancelled,

    #[error("No pending undoable mutation matches {token}")]
    UndoTokenUnknown { token: String },

    // ── Provider errors (wrapped, not exposed raw) ───────────────────
    #[error("Data provider error: {message}")]
    Api {
        message: String,
        /// HTTP-equivalent status (if applicable).
        status: Option<u16>,
    },

    // ── Export errors ────────────────────────────────────────────────
    #[error("Export failed: {message}")]
    Export { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// HTTP-equivalent status code for the error, if one applies.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthenticationFailed { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::UnknownResource { .. } | Self::NotFound { .. } => Some(404),
            Self::ValidationFailed { .. } | Self::Rejected { .. } => Some(400),
            Self::Api { status, .. } => *status,
            _ => None,
        }
    }
}

// ── Conversion from provider errors ──────────────────────────────────

impl From<adminkit_api::Error> for CoreError {
    fn from(err: adminkit_api::Error) -> Self {
        match err {
            adminkit_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            adminkit_api::Error::Forbidden { message } => CoreError::Forbidden { message },
            adminkit_api::Error::UnknownResource(resource) => {
                CoreError::UnknownResource { resource }
            }
            adminkit_api::Error::NotFound { resource, id } => CoreError::NotFound { resource, id },
            adminkit_api::Error::InvalidRequest { message } => CoreError::Rejected { message },
            adminkit_api::Error::Http {
                status, message, ..
            } => CoreError::Api {
                message,
                status: Some(status),
            },
            adminkit_api::Error::Deserialization { message } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
            adminkit_api::Error::Serialization(e) => {
                CoreError::Internal(format!("Serialization error: {e}"))
            }
        }
    }
}

impl From<csv::Error> for CoreError {
    fn from(err: csv::Error) -> Self {
        CoreError::Export {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::Export {
            message: err.to_string(),
        }
    }
}
