// ── Admin state reducer ──
//
// The mutable lifecycle state owned by one `Admin`: fetch counter,
// optimistic flag, undo queue and navigation epoch. `reduce` is the only
// way it changes, one action at a time.

use crate::action::Action;
use crate::fetch::FetchCounter;
use crate::undo::{UndoController, UndoOutcome};

#[derive(Debug, Clone, Default)]
pub struct AdminState {
    fetch: FetchCounter,
    optimistic: bool,
    undo: UndoController,
    /// Bumped on every `LOCATION_CHANGE`; a request compares the value
    /// at dispatch and at settlement to detect explicit navigation.
    navigation_epoch: u64,
}

impl AdminState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one action. Returns the undo resolution for `UNDO`/`COMPLETE`.
    pub fn reduce(&mut self, action: &Action) -> Option<UndoOutcome> {
        match action {
            Action::FetchStart { .. }
            | Action::FetchEnd { .. }
            | Action::FetchError { .. }
            | Action::FetchCancel { .. } => {
                self.fetch.apply(action);
                None
            }
            Action::StartOptimisticMode => {
                self.optimistic = true;
                None
            }
            Action::StopOptimisticMode => {
                self.optimistic = false;
                None
            }
            Action::Undoable(envelope) => {
                self.undo.hold(envelope.clone());
                None
            }
            Action::Undo { token } => Some(UndoOutcome::Undone(match token {
                Some(token) => self.undo.undo_token(*token).into_iter().collect(),
                None => self.undo.undo(),
            })),
            Action::Complete { token } => Some(UndoOutcome::Completed(match token {
                Some(token) => self.undo.complete_token(*token).into_iter().collect(),
                None => self.undo.complete(),
            })),
            Action::LocationChange { .. } => {
                self.navigation_epoch += 1;
                None
            }
            Action::UserLogout(_) => {
                // Session state is reset; requests already in flight still
                // settle against the counter.
                let fetch = self.fetch;
                *self = Self {
                    fetch,
                    ..Self::default()
                };
                None
            }
            _ => None,
        }
    }

    pub fn fetch_count(&self) -> u32 {
        self.fetch.count()
    }

    pub fn is_loading(&self) -> bool {
        self.fetch.is_loading()
    }

    pub fn is_optimistic(&self) -> bool {
        self.optimistic
    }

    pub fn navigation_epoch(&self) -> u64 {
        self.navigation_epoch
    }

    pub fn undo(&self) -> &UndoController {
        &self.undo
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::action::{RequestId, crud_delete, user_logout};

    fn delete(id: i64) -> Action {
        Action::Crud(crud_delete("posts", id, None, "/posts").unwrap())
    }

    #[test]
    fn optimistic_flag_is_idempotent() {
        let mut state = AdminState::new();
        state.reduce(&Action::StartOptimisticMode);
        state.reduce(&Action::StartOptimisticMode);
        assert!(state.is_optimistic());

        state.reduce(&Action::StopOptimisticMode);
        assert!(!state.is_optimistic());
        state.reduce(&Action::StopOptimisticMode);
        assert!(!state.is_optimistic());
    }

    #[test]
    fn undoable_then_undo_never_releases() {
        let mut state = AdminState::new();
        state.reduce(&Action::undoable(delete(1)));
        assert_eq!(state.undo().pending_count(), 1);

        let outcome = state.reduce(&Action::Undo { token: None }).unwrap();
        assert!(matches!(outcome, UndoOutcome::Undone(ref r) if r.len() == 1));
        let outcome = state.reduce(&Action::Complete { token: None }).unwrap();
        assert_eq!(outcome, UndoOutcome::Completed(Vec::new()));
    }

    #[test]
    fn undoable_then_complete_releases_unchanged() {
        let mut state = AdminState::new();
        let action = delete(7);
        state.reduce(&Action::undoable(action.clone()));

        let Some(UndoOutcome::Completed(released)) =
            state.reduce(&Action::Complete { token: None })
        else {
            panic!("expected a completion");
        };
        assert_eq!(released.len(), 1);
        assert_eq!(released[0].action, action);
    }

    #[test]
    fn targeted_complete_leaves_others_pending() {
        let mut state = AdminState::new();
        let first = Action::undoable(delete(1));
        let Action::Undoable(ref envelope) = first else {
            unreachable!()
        };
        let token = envelope.token;
        state.reduce(&first);
        state.reduce(&Action::undoable(delete(2)));

        state.reduce(&Action::Complete { token: Some(token) });
        assert_eq!(state.undo().pending_count(), 1);
        assert!(!state.undo().is_pending(token));
    }

    #[test]
    fn navigation_bumps_epoch() {
        let mut state = AdminState::new();
        let before = state.navigation_epoch();
        state.reduce(&Action::LocationChange {
            path: "/posts".into(),
        });
        assert_eq!(state.navigation_epoch(), before + 1);
    }

    #[test]
    fn logout_resets_session_but_keeps_in_flight_count() {
        let mut state = AdminState::new();
        state.reduce(&Action::FetchStart {
            request_id: RequestId::new(),
        });
        state.reduce(&Action::StartOptimisticMode);
        state.reduce(&Action::undoable(delete(1)));

        state.reduce(&Action::UserLogout(user_logout(None)));
        assert!(!state.is_optimistic());
        assert_eq!(state.undo().pending_count(), 0);
        assert_eq!(state.fetch_count(), 1);
    }

    #[test]
    fn overlapping_requests_settle_to_zero_in_any_order() {
        let ids: Vec<RequestId> = (0..3).map(|_| RequestId::new()).collect();
        let terminals = |order: [usize; 3]| {
            order.map(|i| match i {
                0 => Action::FetchError { request_id: ids[0] },
                1 => Action::FetchEnd { request_id: ids[1] },
                _ => Action::FetchEnd { request_id: ids[2] },
            })
        };

        let orders = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        for order in orders {
            let mut state = AdminState::new();
            for request_id in &ids {
                state.reduce(&Action::FetchStart {
                    request_id: *request_id,
                });
            }
            assert_eq!(state.fetch_count(), 3);
            for action in terminals(order) {
                state.reduce(&action);
                assert!(state.fetch_count() <= 3);
            }
            assert_eq!(state.fetch_count(), 0);
            assert!(!state.is_loading());
        }
    }
}
