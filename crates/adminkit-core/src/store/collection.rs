// ── Reactive record collection ──
//
// Lock-free storage for one resource's records with push-based change
// notification via `watch` channels.

use std::cmp::Ordering;
use std::sync::Arc;

use adminkit_api::{Identifier, Record, ValidUntil};
use dashmap::DashMap;
use tokio::sync::watch;

use super::list::ListState;

/// Records of a single resource.
///
/// `DashMap` gives O(1) concurrent lookups. Every record mutation
/// rebuilds the snapshot that subscribers receive.
pub(crate) struct RecordCollection {
    by_id: DashMap<Identifier, Arc<Record>>,

    /// Cache deadline reported by the provider, per record.
    validity: DashMap<Identifier, ValidUntil>,

    list: watch::Sender<Arc<ListState>>,

    /// Full snapshot ordered by id, rebuilt on mutation.
    snapshot: watch::Sender<Arc<Vec<Arc<Record>>>>,
}

impl RecordCollection {
    pub(crate) fn new() -> Self {
        let (list, _) = watch::channel(Arc::new(ListState::default()));
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_id: DashMap::new(),
            validity: DashMap::new(),
            list,
            snapshot,
        }
    }

    /// Insert or replace records. Returns how many ids were new.
    pub(crate) fn upsert_many(&self, records: &[Record], valid_until: Option<ValidUntil>) -> usize {
        let mut added = 0;
        for record in records {
            if self
                .by_id
                .insert(record.id.clone(), Arc::new(record.clone()))
                .is_none()
            {
                added += 1;
            }
            match valid_until {
                Some(deadline) => {
                    self.validity.insert(record.id.clone(), deadline);
                }
                None => {
                    self.validity.remove(&record.id);
                }
            }
        }
        if !records.is_empty() {
            self.changed();
        }
        added
    }

    /// Remove records by id, returning those that existed.
    pub(crate) fn remove_many(&self, ids: &[Identifier]) -> Vec<Arc<Record>> {
        let removed: Vec<Arc<Record>> = ids
            .iter()
            .filter_map(|id| {
                self.validity.remove(id);
                self.by_id.remove(id).map(|(_, record)| record)
            })
            .collect();
        if !removed.is_empty() {
            self.changed();
        }
        removed
    }

    pub(crate) fn get(&self, id: &Identifier) -> Option<Arc<Record>> {
        self.by_id.get(id).map(|r| Arc::clone(r.value()))
    }

    pub(crate) fn valid_until(&self, id: &Identifier) -> Option<ValidUntil> {
        self.validity.get(id).map(|r| *r.value())
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<Record>>> {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<Record>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn list(&self) -> Arc<ListState> {
        self.list.borrow().clone()
    }

    pub(crate) fn subscribe_list(&self) -> watch::Receiver<Arc<ListState>> {
        self.list.subscribe()
    }

    pub(crate) fn update_list(&self, f: impl FnOnce(&mut ListState)) {
        self.list.send_modify(|list| f(Arc::make_mut(list)));
    }

    pub(crate) fn set_list(&self, list: Arc<ListState>) {
        self.list.send_modify(|current| *current = list);
    }

    /// Remove all records and reset the list state.
    pub(crate) fn clear(&self) {
        self.by_id.clear();
        self.validity.clear();
        self.list
            .send_modify(|list| *list = Arc::new(ListState::default()));
        self.changed();
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn changed(&self) {
        let mut values: Vec<Arc<Record>> =
            self.by_id.iter().map(|r| Arc::clone(r.value())).collect();
        values.sort_by(|a, b| compare_ids(&a.id, &b.id));
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }
}

/// Numeric ids first in numeric order, then string ids lexically.
pub(crate) fn compare_ids(a: &Identifier, b: &Identifier) -> Ordering {
    match (a, b) {
        (Identifier::Num(x), Identifier::Num(y)) => x.cmp(y),
        (Identifier::Num(_), Identifier::Str(_)) => Ordering::Less,
        (Identifier::Str(_), Identifier::Num(_)) => Ordering::Greater,
        (Identifier::Str(x), Identifier::Str(y)) => x.cmp(y),
    }
}
