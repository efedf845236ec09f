// ── Undo envelope controller ──
//
// Holds undoable mutations until they are discarded (`UNDO`) or released
// (`COMPLETE`). Pure state: no timers, no provider calls. Grace-window
// timing belongs to whoever dispatches the terminal event.

use tracing::debug;

use crate::action::{Action, RequestId, UndoToken, UndoableEnvelope};

/// A pending mutation that reached a terminal transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub token: UndoToken,
    pub request_id: RequestId,
    pub action: Action,
}

impl From<UndoableEnvelope> for Resolved {
    fn from(envelope: UndoableEnvelope) -> Self {
        Self {
            token: envelope.token,
            request_id: envelope.request_id,
            action: *envelope.action,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UndoOutcome {
    /// Discarded by `UNDO`; must never reach the provider.
    Undone(Vec<Resolved>),
    /// Released by `COMPLETE`, unchanged and in dispatch order.
    Completed(Vec<Resolved>),
}

#[derive(Debug, Clone, Default)]
pub struct UndoController {
    pending: Vec<UndoableEnvelope>,
}

impl UndoController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suspend `action` behind a fresh envelope.
    pub fn start(&mut self, action: Action) -> UndoToken {
        let envelope = UndoableEnvelope::new(action);
        let token = envelope.token;
        self.hold(envelope);
        token
    }

    pub fn hold(&mut self, envelope: UndoableEnvelope) {
        debug!(token = %envelope.token, "undoable mutation pending");
        self.pending.push(envelope);
    }

    /// Discard every pending envelope.
    pub fn undo(&mut self) -> Vec<Resolved> {
        self.drain("undo")
    }

    /// Release every pending envelope in dispatch order.
    pub fn complete(&mut self) -> Vec<Resolved> {
        self.drain("complete")
    }

    pub fn undo_token(&mut self, token: UndoToken) -> Option<Resolved> {
        self.take(token, "undo")
    }

    pub fn complete_token(&mut self, token: UndoToken) -> Option<Resolved> {
        self.take(token, "complete")
    }

    pub fn is_pending(&self, token: UndoToken) -> bool {
        self.pending.iter().any(|e| e.token == token)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn pending_tokens(&self) -> Vec<UndoToken> {
        self.pending.iter().map(|e| e.token).collect()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn drain(&mut self, transition: &str) -> Vec<Resolved> {
        if self.pending.is_empty() {
            debug!(transition, "nothing pending");
        }
        self.pending.drain(..).map(Resolved::from).collect()
    }

    fn take(&mut self, token: UndoToken, transition: &str) -> Option<Resolved> {
        let Some(index) = self.pending.iter().position(|e| e.token == token) else {
            debug!(transition, %token, "token already resolved or unknown");
            return None;
        };
        Some(self.pending.remove(index).into())
    }
}
