use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use super::Action;
use super::crud::RequestId;

/// Handle on one pending undoable mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct UndoToken(Uuid);

impl UndoToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UndoToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UndoToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// `UNDOABLE` payload: a mutation held back until `UNDO` or `COMPLETE`.
///
/// `request_id` is assigned up front so that an optimistic application
/// made when the envelope is opened can be found again on undo.
#[derive(Debug, Clone, PartialEq)]
pub struct UndoableEnvelope {
    pub token: UndoToken,
    pub request_id: RequestId,
    pub action: Box<Action>,
}

impl UndoableEnvelope {
    pub fn new(action: Action) -> Self {
        Self {
            token: UndoToken::new(),
            request_id: RequestId::new(),
            action: Box::new(action),
        }
    }
}
