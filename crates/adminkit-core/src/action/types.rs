// ── Action type vocabulary ──
//
// The fixed set of string tags exchanged between the core and whatever
// hosts it (reducers, middleware, tests, logs). Tags are parsed back
// with `FromStr`, so a recorded action log can be replayed.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Provider verb a CRUD action targets (`meta.fetch`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FetchVerb {
    GetList,
    GetOne,
    GetMany,
    GetManyReference,
    Create,
    Update,
    UpdateMany,
    Delete,
    DeleteMany,
}

impl FetchVerb {
    /// Writes are the verbs eligible for optimistic and undoable modes.
    pub fn is_mutation(self) -> bool {
        matches!(
            self,
            Self::Create | Self::Update | Self::UpdateMany | Self::Delete | Self::DeleteMany
        )
    }

    pub fn is_bulk(self) -> bool {
        matches!(self, Self::UpdateMany | Self::DeleteMany)
    }
}

/// Lifecycle phase of a CRUD action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Phase {
    Request,
    Loading,
    Success,
    Failure,
}

/// Every action tag the core emits or consumes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    // ── CRUD reads ───────────────────────────────────────────────────
    CrudGetList,
    CrudGetListLoading,
    CrudGetListSuccess,
    CrudGetListFailure,
    CrudGetOne,
    CrudGetOneLoading,
    CrudGetOneSuccess,
    CrudGetOneFailure,
    CrudGetMany,
    CrudGetManyLoading,
    CrudGetManySuccess,
    CrudGetManyFailure,
    CrudGetManyReference,
    CrudGetManyReferenceLoading,
    CrudGetManyReferenceSuccess,
    CrudGetManyReferenceFailure,

    // ── CRUD writes ──────────────────────────────────────────────────
    CrudCreate,
    CrudCreateLoading,
    CrudCreateSuccess,
    CrudCreateFailure,
    CrudUpdate,
    CrudUpdateLoading,
    CrudUpdateSuccess,
    CrudUpdateFailure,
    CrudUpdateMany,
    CrudUpdateManyLoading,
    CrudUpdateManySuccess,
    CrudUpdateManyFailure,
    CrudDelete,
    CrudDeleteLoading,
    CrudDeleteSuccess,
    CrudDeleteFailure,
    CrudDeleteMany,
    CrudDeleteManyLoading,
    CrudDeleteManySuccess,
    CrudDeleteManyFailure,

    // ── Fetch lifecycle ──────────────────────────────────────────────
    FetchStart,
    FetchEnd,
    FetchError,
    FetchCancel,

    // ── Undo / optimistic ────────────────────────────────────────────
    Undoable,
    Undo,
    Complete,
    StartOptimisticMode,
    StopOptimisticMode,

    // ── Auth ─────────────────────────────────────────────────────────
    UserLogin,
    UserLoginLoading,
    UserLoginSuccess,
    UserLoginFailure,
    UserCheck,
    UserCheckSuccess,
    UserLogout,

    // ── UI state ─────────────────────────────────────────────────────
    RefreshView,
    SetListSelectedIds,
    ToggleListItem,
    LocationChange,
}

impl ActionType {
    /// Tag for `verb` in lifecycle `phase`.
    pub fn crud(verb: FetchVerb, phase: Phase) -> Self {
        let [request, loading, success, failure] = crud_tags(verb);
        match phase {
            Phase::Request => request,
            Phase::Loading => loading,
            Phase::Success => success,
            Phase::Failure => failure,
        }
    }

    /// Inverse of [`ActionType::crud`]. `None` for non-CRUD tags.
    pub fn crud_parts(self) -> Option<(FetchVerb, Phase)> {
        use strum::IntoEnumIterator;

        FetchVerb::iter().find_map(|verb| {
            let [request, loading, success, failure] = crud_tags(verb);
            let phase = if self == request {
                Phase::Request
            } else if self == loading {
                Phase::Loading
            } else if self == success {
                Phase::Success
            } else if self == failure {
                Phase::Failure
            } else {
                return None;
            };
            Some((verb, phase))
        })
    }

    pub fn is_fetch_terminal(self) -> bool {
        matches!(self, Self::FetchEnd | Self::FetchError | Self::FetchCancel)
    }
}

fn crud_tags(verb: FetchVerb) -> [ActionType; 4] {
    match verb {
        FetchVerb::GetList => [
            ActionType::CrudGetList,
            ActionType::CrudGetListLoading,
            ActionType::CrudGetListSuccess,
            ActionType::CrudGetListFailure,
        ],
        FetchVerb::GetOne => [
            ActionType::CrudGetOne,
            ActionType::CrudGetOneLoading,
            ActionType::CrudGetOneSuccess,
            ActionType::CrudGetOneFailure,
        ],
        FetchVerb::GetMany => [
            ActionType::CrudGetMany,
            ActionType::CrudGetManyLoading,
            ActionType::CrudGetManySuccess,
            ActionType::CrudGetManyFailure,
        ],
        FetchVerb::GetManyReference => [
            ActionType::CrudGetManyReference,
            ActionType::CrudGetManyReferenceLoading,
            ActionType::CrudGetManyReferenceSuccess,
            ActionType::CrudGetManyReferenceFailure,
        ],
        FetchVerb::Create => [
            ActionType::CrudCreate,
            ActionType::CrudCreateLoading,
            ActionType::CrudCreateSuccess,
            ActionType::CrudCreateFailure,
        ],
        FetchVerb::Update => [
            ActionType::CrudUpdate,
            ActionType::CrudUpdateLoading,
            ActionType::CrudUpdateSuccess,
            ActionType::CrudUpdateFailure,
        ],
        FetchVerb::UpdateMany => [
            ActionType::CrudUpdateMany,
            ActionType::CrudUpdateManyLoading,
            ActionType::CrudUpdateManySuccess,
            ActionType::CrudUpdateManyFailure,
        ],
        FetchVerb::Delete => [
            ActionType::CrudDelete,
            ActionType::CrudDeleteLoading,
            ActionType::CrudDeleteSuccess,
            ActionType::CrudDeleteFailure,
        ],
        FetchVerb::DeleteMany => [
            ActionType::CrudDeleteMany,
            ActionType::CrudDeleteManyLoading,
            ActionType::CrudDeleteManySuccess,
            ActionType::CrudDeleteManyFailure,
        ],
    }
}
