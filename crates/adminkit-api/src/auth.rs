// ── Auth provider contract ──
//
// Consumed by the auth actions in adminkit-core. Every method is async;
// a rejected promise in the original contract maps to `Err(Error)`.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::types::Identifier;

/// The signed-in user as reported by `get_identity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub id: Identifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Authenticate with free-form credentials. Returns provider-specific data.
    async fn login(&self, params: Value) -> Result<Value, Error>;

    /// End the session. `Ok(Some(path))` asks the caller to redirect there.
    async fn logout(&self, params: Value) -> Result<Option<String>, Error>;

    /// Succeeds if the current session is valid.
    async fn check_auth(&self, params: Value) -> Result<(), Error>;

    /// Inspect a failed data-provider call. `Err` means the session is gone.
    async fn check_error(&self, error: &Error) -> Result<(), Error>;

    async fn get_permissions(&self, params: Value) -> Result<Value, Error>;

    async fn get_identity(&self) -> Result<Option<UserIdentity>, Error> {
        Ok(None)
    }
}

// ── In-memory implementation ────────────────────────────────────────

/// Single-user auth provider holding its credentials in memory.
pub struct MemoryAuthProvider {
    username: String,
    password: SecretString,
    permissions: Value,
    identity: Option<UserIdentity>,
    signed_in: AtomicBool,
}

impl MemoryAuthProvider {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
            permissions: Value::from("admin"),
            identity: None,
            signed_in: AtomicBool::new(false),
        }
    }

    pub fn with_permissions(mut self, permissions: Value) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_identity(mut self, identity: UserIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn is_signed_in(&self) -> bool {
        self.signed_in.load(Ordering::SeqCst)
    }

    fn require_session(&self) -> Result<(), Error> {
        if self.is_signed_in() {
            Ok(())
        } else {
            Err(Error::Authentication {
                message: "not signed in".into(),
            })
        }
    }
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn login(&self, params: Value) -> Result<Value, Error> {
        let username = params.get("username").and_then(Value::as_str);
        let password = params.get("password").and_then(Value::as_str);

        match (username, password) {
            (Some(u), Some(p)) if u == self.username && p == self.password.expose_secret() => {
                self.signed_in.store(true, Ordering::SeqCst);
                debug!(username = u, "login accepted");
                Ok(Value::Null)
            }
            _ => Err(Error::Authentication {
                message: "invalid username or password".into(),
            }),
        }
    }

    async fn logout(&self, _params: Value) -> Result<Option<String>, Error> {
        self.signed_in.store(false, Ordering::SeqCst);
        Ok(Some("/login".into()))
    }

    async fn check_auth(&self, _params: Value) -> Result<(), Error> {
        self.require_session()
    }

    async fn check_error(&self, error: &Error) -> Result<(), Error> {
        if error.is_auth_error() {
            self.signed_in.store(false, Ordering::SeqCst);
            return Err(Error::Authentication {
                message: error.to_string(),
            });
        }
        Ok(())
    }

    async fn get_permissions(&self, _params: Value) -> Result<Value, Error> {
        self.require_session()?;
        Ok(self.permissions.clone())
    }

    async fn get_identity(&self) -> Result<Option<UserIdentity>, Error> {
        self.require_session()?;
        Ok(self.identity.clone())
    }
}
