use thiserror::Error;

/// Top-level error type for the `adminkit-api` crate.
///
/// Every failure a data provider or auth provider can report. `adminkit-core`
/// maps these into its own `CoreError` and into failure actions.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// Non-success response from a remote API. `body` keeps the decoded
    /// payload when the backend sent one (validation details, etc.).
    #[error("HTTP error {status}: {message}")]
    Http {
        status: u16,
        message: String,
        body: Option<serde_json::Value>,
    },

    // ── Authentication ──────────────────────────────────────────────
    /// Credentials rejected or session missing.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Authenticated, but not allowed to perform the operation.
    #[error("Access denied: {message}")]
    Forbidden { message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// The provider does not know this resource.
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// No record with this id in the resource.
    #[error("{resource} record not found: {id}")]
    NotFound { resource: String, id: String },

    /// Parameters the provider refuses (duplicate id, non-object payload...).
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Payload could not be decoded into the expected shape.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Returns `true` if this error means the user must authenticate again.
    pub fn is_auth_error(&self) -> bool {
        match self {
            Self::Authentication { .. } | Self::Forbidden { .. } => true,
            Self::Http { status, .. } => matches!(status, 401 | 403),
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } | Self::UnknownResource(_) => true,
            Self::Http { status: 404, .. } => true,
            _ => false,
        }
    }

    /// HTTP-equivalent status code, if one applies.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Authentication { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::NotFound { .. } | Self::UnknownResource(_) => Some(404),
            Self::InvalidRequest { .. } => Some(400),
            Self::Deserialization { .. } | Self::Serialization(_) => None,
        }
    }
}
