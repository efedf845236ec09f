// adminkit-core: CRUD action lifecycle between a DataProvider and its hosts (CLI, UIs).

pub mod action;
pub mod admin;
pub mod config;
pub mod effects;
pub mod error;
pub mod export;
pub mod fetch;
pub mod side_effect;
pub mod state;
pub mod store;
pub mod stream;
pub mod undo;

// ── Primary re-exports ──────────────────────────────────────────────
pub use action::{
    Action, ActionType, CrudRequest, FetchVerb, Phase, RequestId, RequestPayload, ResponseData,
    Settlement, UndoToken,
};
pub use action::{
    crud_create, crud_delete, crud_delete_many, crud_get_list, crud_get_many,
    crud_get_many_reference, crud_get_one, crud_update, crud_update_many,
};
pub use admin::{Admin, MutationOutcome, PendingRequest};
pub use config::{AdminConfig, MutationMode};
pub use effects::{Effect, EffectExecutor, plan_effects};
pub use error::CoreError;
pub use export::{download_csv, to_csv};
pub use fetch::FetchCounter;
pub use side_effect::{Notification, NotificationLevel, Redirection, SideEffects};
pub use state::AdminState;
pub use store::{DataStore, ListState};
pub use stream::ResourceStream;
pub use undo::{Resolved, UndoController, UndoOutcome};
