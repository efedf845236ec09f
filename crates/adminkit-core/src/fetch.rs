// ── Fetch lifecycle tracker ──
//
// Counts in-flight provider calls. Loading is exactly `in_flight > 0`.

use tracing::warn;

use crate::action::Action;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchCounter {
    in_flight: u32,
}

impl FetchCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `FETCH_START`.
    pub fn start(&mut self) -> u32 {
        self.in_flight = self.in_flight.saturating_add(1);
        self.in_flight
    }

    /// `FETCH_END`, `FETCH_ERROR` or `FETCH_CANCEL`. Never goes below zero.
    pub fn settle(&mut self) -> u32 {
        if self.in_flight == 0 {
            warn!("fetch settled with no request in flight, ignoring");
        } else {
            self.in_flight -= 1;
        }
        self.in_flight
    }

    /// Apply a fetch lifecycle action; other actions are ignored.
    /// Returns `true` if the counter changed.
    pub fn apply(&mut self, action: &Action) -> bool {
        let before = self.in_flight;
        match action {
            Action::FetchStart { .. } => {
                self.start();
            }
            Action::FetchEnd { .. } | Action::FetchError { .. } | Action::FetchCancel { .. } => {
                self.settle();
            }
            _ => {}
        }
        before != self.in_flight
    }

    pub fn count(&self) -> u32 {
        self.in_flight
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::RequestId;

    fn start() -> Action {
        Action::FetchStart {
            request_id: RequestId::new(),
        }
    }

    fn terminal(kind: usize) -> Action {
        let request_id = RequestId::new();
        match kind % 3 {
            0 => Action::FetchEnd { request_id },
            1 => Action::FetchError { request_id },
            _ => Action::FetchCancel { request_id },
        }
    }

    #[test]
    fn loading_follows_counter() {
        let mut counter = FetchCounter::new();
        assert!(!counter.is_loading());
        counter.start();
        counter.start();
        assert!(counter.is_loading());
        counter.settle();
        assert!(counter.is_loading());
        counter.settle();
        assert!(!counter.is_loading());
    }

    #[test]
    fn settle_at_zero_is_clamped() {
        let mut counter = FetchCounter::new();
        assert_eq!(counter.settle(), 0);
        assert!(!counter.apply(&terminal(2)));
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn interleavings_return_to_initial_value() {
        // Each pattern is a valid interleaving of N starts and N terminals:
        // `true` = start, `false` = terminal. Prefix counts never go negative.
        let patterns: [&[bool]; 5] = [
            &[true, false],
            &[true, true, true, false, false, false],
            &[true, false, true, false, true, false],
            &[true, true, false, true, false, false],
            &[true, true, false, false, true, true, true, false, false, false],
        ];

        for (offset, pattern) in patterns.iter().enumerate() {
            let mut counter = FetchCounter::new();
            counter.start();
            let initial = counter.count();

            for (i, is_start) in pattern.iter().enumerate() {
                let action = if *is_start {
                    start()
                } else {
                    terminal(i + offset)
                };
                assert!(counter.apply(&action));
                assert!(counter.count() >= initial.saturating_sub(1));
            }
            assert_eq!(counter.count(), initial);
        }
    }

    #[test]
    fn ignores_unrelated_actions() {
        let mut counter = FetchCounter::new();
        assert!(!counter.apply(&Action::StartOptimisticMode));
        assert_eq!(counter.count(), 0);
    }
}
