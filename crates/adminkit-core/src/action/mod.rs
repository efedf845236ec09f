// ── Action API ──
//
// Everything the core dispatches is one closed `Action` enum. The string
// tag (`ActionType`) is derived from the variant, never stored, so a
// variant and its tag cannot disagree. `Serialize` produces the
// `{type, payload, meta}` wire shape that hosts and logs match on.

pub mod auth;
pub mod crud;
pub mod types;
pub mod undo;

use adminkit_api::Identifier;
use serde::Serialize;
use serde_json::{Value, json};

pub use auth::{AuthRequest, LogoutRequest, user_check, user_login, user_logout};
pub use crud::{
    CrudMeta, CrudRequest, FailureInfo, Outcome, RequestId, RequestPayload, ResponseData,
    Settlement, crud_create, crud_delete, crud_delete_many, crud_get_list, crud_get_many,
    crud_get_many_reference, crud_get_one, crud_update, crud_update_many,
};
pub use types::{ActionType, FetchVerb, Phase};
pub use undo::{UndoToken, UndoableEnvelope};

/// All actions flowing through an `Admin`.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ── CRUD lifecycle ───────────────────────────────────────────────
    Crud(CrudRequest),
    CrudLoading(CrudRequest),
    Settled(Settlement),

    // ── Fetch lifecycle ──────────────────────────────────────────────
    FetchStart { request_id: RequestId },
    FetchEnd { request_id: RequestId },
    FetchError { request_id: RequestId },
    FetchCancel { request_id: RequestId },

    // ── Undo / optimistic ────────────────────────────────────────────
    Undoable(UndoableEnvelope),
    /// Discard pending envelopes: all of them, or only `token`.
    Undo { token: Option<UndoToken> },
    /// Release pending envelopes: all of them, or only `token`.
    Complete { token: Option<UndoToken> },
    StartOptimisticMode,
    StopOptimisticMode,

    // ── Auth ─────────────────────────────────────────────────────────
    UserLogin(AuthRequest),
    UserLoginLoading,
    UserLoginSuccess(Value),
    UserLoginFailure(FailureInfo),
    UserCheck(AuthRequest),
    UserCheckSuccess,
    UserLogout(LogoutRequest),

    // ── UI state ─────────────────────────────────────────────────────
    RefreshView,
    SetListSelectedIds {
        resource: String,
        ids: Vec<Identifier>,
    },
    ToggleListItem {
        resource: String,
        id: Identifier,
    },
    LocationChange { path: String },
}

impl Action {
    /// Wrap a mutation for deferred execution.
    pub fn undoable(action: Action) -> Self {
        Self::Undoable(UndoableEnvelope::new(action))
    }

    pub fn action_type(&self) -> ActionType {
        match self {
            Self::Crud(r) => ActionType::crud(r.verb(), Phase::Request),
            Self::CrudLoading(r) => ActionType::crud(r.verb(), Phase::Loading),
            Self::Settled(s) => {
                let phase = if s.is_success() {
                    Phase::Success
                } else {
                    Phase::Failure
                };
                ActionType::crud(s.request.verb(), phase)
            }
            Self::FetchStart { .. } => ActionType::FetchStart,
            Self::FetchEnd { .. } => ActionType::FetchEnd,
            Self::FetchError { .. } => ActionType::FetchError,
            Self::FetchCancel { .. } => ActionType::FetchCancel,
            Self::Undoable(_) => ActionType::Undoable,
            Self::Undo { .. } => ActionType::Undo,
            Self::Complete { .. } => ActionType::Complete,
            Self::StartOptimisticMode => ActionType::StartOptimisticMode,
            Self::StopOptimisticMode => ActionType::StopOptimisticMode,
            Self::UserLogin(_) => ActionType::UserLogin,
            Self::UserLoginLoading => ActionType::UserLoginLoading,
            Self::UserLoginSuccess(_) => ActionType::UserLoginSuccess,
            Self::UserLoginFailure(_) => ActionType::UserLoginFailure,
            Self::UserCheck(_) => ActionType::UserCheck,
            Self::UserCheckSuccess => ActionType::UserCheckSuccess,
            Self::UserLogout(_) => ActionType::UserLogout,
            Self::RefreshView => ActionType::RefreshView,
            Self::SetListSelectedIds { .. } => ActionType::SetListSelectedIds,
            Self::ToggleListItem { .. } => ActionType::ToggleListItem,
            Self::LocationChange { .. } => ActionType::LocationChange,
        }
    }

    /// The CRUD request carried by this action, if any.
    pub fn crud_request(&self) -> Option<&CrudRequest> {
        match self {
            Self::Crud(r) | Self::CrudLoading(r) => Some(r),
            Self::Settled(s) => Some(&s.request),
            _ => None,
        }
    }

    /// Build the `{type, payload, error, requestPayload, meta}` wire shape.
    pub fn to_wire(&self) -> WireAction {
        let mut wire = WireAction::new(self.action_type());
        match self {
            Self::Crud(r) | Self::CrudLoading(r) => {
                wire.payload = to_json(&r.payload);
                wire.meta = to_json(&r.meta);
            }
            Self::Settled(s) => {
                wire.request_payload = Some(to_json(&s.request.payload));
                let status = match &s.outcome {
                    Outcome::Success(data) => {
                        wire.payload = to_json(data);
                        "SUCCESS"
                    }
                    Outcome::Failure(failure) => {
                        wire.error = Some(to_json(failure));
                        "FAILURE"
                    }
                };
                wire.meta = json!({
                    "resource": s.request.meta.resource,
                    "fetchResponse": s.request.meta.fetch,
                    "fetchStatus": status,
                    "requestId": s.request_id,
                });
            }
            Self::FetchStart { request_id }
            | Self::FetchEnd { request_id }
            | Self::FetchError { request_id }
            | Self::FetchCancel { request_id } => {
                wire.meta = json!({ "requestId": request_id });
            }
            Self::Undoable(envelope) => {
                wire.payload = json!({
                    "token": envelope.token,
                    "action": envelope.action.to_wire(),
                });
                wire.meta = json!({ "requestId": envelope.request_id });
            }
            Self::Undo { token } | Self::Complete { token } => {
                if let Some(token) = token {
                    wire.payload = json!({ "token": token });
                }
            }
            Self::UserLogin(r) | Self::UserCheck(r) => {
                wire.payload = to_json(&r.payload);
                wire.meta = json!({
                    "auth": true,
                    "pathName": r.path_name,
                    "routeParams": r.route_params,
                });
            }
            Self::UserLoginSuccess(payload) => {
                wire.payload = payload.clone();
                wire.meta = json!({ "auth": true });
            }
            Self::UserLoginFailure(failure) => {
                wire.error = Some(to_json(failure));
                wire.meta = json!({ "auth": true });
            }
            Self::UserLogout(r) => {
                wire.payload = to_json(r);
                wire.meta = json!({ "auth": true });
            }
            Self::UserLoginLoading | Self::UserCheckSuccess => {
                wire.meta = json!({ "auth": true });
            }
            Self::SetListSelectedIds { resource, ids } => {
                wire.payload = to_json(ids);
                wire.meta = json!({ "resource": resource });
            }
            Self::ToggleListItem { resource, id } => {
                wire.payload = id.to_value();
                wire.meta = json!({ "resource": resource });
            }
            Self::LocationChange { path } => {
                wire.payload = json!({ "pathname": path });
            }
            Self::StartOptimisticMode | Self::StopOptimisticMode | Self::RefreshView => {}
        }
        wire
    }
}

impl Serialize for Action {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}

/// Serialized form of an [`Action`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAction {
    #[serde(rename = "type")]
    pub kind: ActionType,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub payload: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_payload: Option<Value>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub meta: Value,
}

impl WireAction {
    fn new(kind: ActionType) -> Self {
        Self {
            kind,
            payload: Value::Null,
            error: None,
            request_payload: None,
            meta: Value::Null,
        }
    }
}

// Serializing these plain data types into a `Value` cannot fail: every
// map key is a string.
fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
