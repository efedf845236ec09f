// ── Central reactive record store ──
//
// Thread-safe cache of every resource the admin has touched. Settlement
// effects write here; optimistic mutations are journaled so they can be
// rolled back when the provider rejects them or the user undoes them.

use std::sync::Arc;

use adminkit_api::{GetListParams, Identifier, Record, ValidUntil};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;

use super::collection::{RecordCollection, compare_ids};
use super::list::ListState;
use crate::action::{RequestId, RequestPayload};
use crate::stream::ResourceStream;

/// Result of a `GET_MANY_REFERENCE`, keyed by [`reference_key`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceState {
    pub ids: Vec<Identifier>,
    pub total: u64,
}

/// Key under which one-to-many reference results are stored:
/// `"<resource>_<target>@<id>"`.
pub fn reference_key(resource: &str, target: &str, id: &Identifier) -> String {
    format!("{resource}_{target}@{id}")
}

/// What an optimistic mutation replaced, for rollback.
#[derive(Debug, Clone)]
struct JournalEntry {
    resource: String,
    previous: Vec<Record>,
    list_before: Arc<ListState>,
}

/// Central reactive store for all resources.
///
/// Reads are wait-free snapshots; writes use the per-shard locks inside
/// `DashMap`. Mutations are broadcast to subscribers via `watch` channels.
pub struct DataStore {
    resources: DashMap<String, Arc<RecordCollection>>,
    references: DashMap<String, ReferenceState>,
    journal: DashMap<RequestId, JournalEntry>,
    /// Bumped by every refresh; views re-read when it changes.
    view_version: watch::Sender<u64>,
}

impl DataStore {
    pub fn new() -> Self {
        let (view_version, _) = watch::channel(0u64);
        Self {
            resources: DashMap::new(),
            references: DashMap::new(),
            journal: DashMap::new(),
            view_version,
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn record(&self, resource: &str, id: &Identifier) -> Option<Arc<Record>> {
        self.resources.get(resource)?.get(id)
    }

    /// Every cached record of `resource`, ordered by id.
    pub fn records(&self, resource: &str) -> Arc<Vec<Arc<Record>>> {
        self.resources
            .get(resource)
            .map(|c| c.snapshot())
            .unwrap_or_default()
    }

    /// Records on the current list page, in list order.
    pub fn list_records(&self, resource: &str) -> Vec<Arc<Record>> {
        let Some(collection) = self.resources.get(resource).map(|c| Arc::clone(c.value())) else {
            return Vec::new();
        };
        collection
            .list()
            .ids
            .iter()
            .filter_map(|id| collection.get(id))
            .collect()
    }

    pub fn list_state(&self, resource: &str) -> Arc<ListState> {
        self.resources
            .get(resource)
            .map(|c| c.list())
            .unwrap_or_default()
    }

    pub fn reference(&self, key: &str) -> Option<ReferenceState> {
        self.references.get(key).map(|r| r.value().clone())
    }

    /// `true` while the provider's cache deadline for the record is ahead of `now`.
    pub fn is_fresh(&self, resource: &str, id: &Identifier, now: DateTime<Utc>) -> bool {
        self.resources
            .get(resource)
            .and_then(|c| c.valid_until(id))
            .is_some_and(|deadline| deadline > now)
    }

    pub fn resources(&self) -> Vec<String> {
        let mut names: Vec<String> = self.resources.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    pub fn record_count(&self, resource: &str) -> usize {
        self.resources.get(resource).map_or(0, |c| c.len())
    }

    pub fn view_version(&self) -> u64 {
        *self.view_version.borrow()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe(&self, resource: &str) -> ResourceStream {
        ResourceStream::new(self.collection(resource).subscribe())
    }

    pub fn subscribe_list(&self, resource: &str) -> watch::Receiver<Arc<ListState>> {
        self.collection(resource).subscribe_list()
    }

    pub fn subscribe_view_version(&self) -> watch::Receiver<u64> {
        self.view_version.subscribe()
    }

    // ── Settlement writes ────────────────────────────────────────────

    pub fn upsert_records(&self, resource: &str, records: &[Record], valid_until: Option<ValidUntil>) {
        let added = self.collection(resource).upsert_many(records, valid_until);
        debug!(resource, count = records.len(), added, "stored records");
    }

    /// Store a `GET_LIST` page: the records, and the page's ids as list state.
    pub fn store_list(
        &self,
        resource: &str,
        records: &[Record],
        total: u64,
        params: GetListParams,
        valid_until: Option<ValidUntil>,
    ) {
        let collection = self.collection(resource);
        collection.upsert_many(records, valid_until);
        collection.update_list(|list| {
            list.ids = records.iter().map(|r| r.id.clone()).collect();
            list.total = total;
            list.loaded_once = true;
            list.params = params;
        });
    }

    pub fn store_reference(
        &self,
        resource: &str,
        key: String,
        records: &[Record],
        total: u64,
        valid_until: Option<ValidUntil>,
    ) {
        self.collection(resource).upsert_many(records, valid_until);
        let ids = records.iter().map(|r| r.id.clone()).collect();
        self.references.insert(key, ReferenceState { ids, total });
    }

    pub fn remove_records(&self, resource: &str, ids: &[Identifier]) {
        let collection = self.collection(resource);
        collection.remove_many(ids);
        collection.update_list(|list| list.remove_ids(ids));
    }

    /// Shallow-merge `patch` into each cached record in `ids`.
    pub fn patch_records(&self, resource: &str, ids: &[Identifier], patch: &Value) {
        let collection = self.collection(resource);
        let patched: Vec<Record> = ids
            .iter()
            .filter_map(|id| collection.get(id))
            .map(|record| {
                let mut record = Record::clone(&record);
                record.merge(patch);
                record
            })
            .collect();
        collection.upsert_many(&patched, None);
    }

    // ── List UI state ────────────────────────────────────────────────

    pub fn select(&self, resource: &str, ids: Vec<Identifier>) {
        self.collection(resource).update_list(|list| list.select(ids));
    }

    pub fn toggle_selection(&self, resource: &str, id: &Identifier) {
        self.collection(resource)
            .update_list(|list| list.toggle_selected(id));
    }

    pub fn unselect_all(&self, resource: &str) {
        self.collection(resource).update_list(ListState::unselect_all);
    }

    pub fn toggle_expanded(&self, resource: &str, id: &Identifier) {
        self.collection(resource)
            .update_list(|list| list.toggle_expanded(id));
    }

    pub fn refresh(&self) {
        self.view_version.send_modify(|v| *v += 1);
    }

    // ── Optimistic journal ───────────────────────────────────────────

    /// Apply a mutation locally before the provider confirms it.
    ///
    /// Returns `false` for payloads that cannot be applied ahead of the
    /// provider (reads, and creates whose id the provider assigns).
    pub fn apply_optimistic(&self, request_id: RequestId, resource: &str, payload: &RequestPayload) -> bool {
        let collection = self.collection(resource);
        let list_before = collection.list();

        let (ids, patch) = match payload {
            RequestPayload::Update(p) => (vec![p.id.clone()], Some(&p.data)),
            RequestPayload::UpdateMany(p) => (p.ids.clone(), Some(&p.data)),
            RequestPayload::Delete(p) => (vec![p.id.clone()], None),
            RequestPayload::DeleteMany(p) => (p.ids.clone(), None),
            _ => return false,
        };

        let mut previous: Vec<Record> = ids
            .iter()
            .filter_map(|id| collection.get(id))
            .map(|r| Record::clone(&r))
            .collect();
        if previous.is_empty() {
            if let Some(record) = payload.previous_data() {
                previous.push(record.clone());
            }
        }

        match patch {
            Some(patch) => {
                let patched: Vec<Record> = previous
                    .iter()
                    .cloned()
                    .map(|mut record| {
                        record.merge(patch);
                        record
                    })
                    .collect();
                collection.upsert_many(&patched, None);
            }
            None => {
                collection.remove_many(&ids);
                collection.update_list(|list| list.remove_ids(&ids));
            }
        }

        debug!(%request_id, resource, records = previous.len(), "applied optimistically");
        self.journal.insert(
            request_id,
            JournalEntry {
                resource: resource.to_owned(),
                previous,
                list_before,
            },
        );
        true
    }

    /// Restore what an optimistic mutation replaced.
    ///
    /// Returns `false` when nothing was applied ahead of the provider, in
    /// which case the store is left untouched.
    pub fn rollback(&self, request_id: RequestId) -> bool {
        let Some((_, entry)) = self.journal.remove(&request_id) else {
            return false;
        };
        let collection = self.collection(&entry.resource);
        collection.upsert_many(&entry.previous, None);
        collection.set_list(entry.list_before);
        debug!(%request_id, resource = %entry.resource, "rolled back");
        true
    }

    /// Forget the journal entry of a confirmed (or abandoned) mutation.
    pub fn commit(&self, request_id: RequestId) {
        self.journal.remove(&request_id);
    }

    pub fn has_pending_optimistic(&self, request_id: RequestId) -> bool {
        self.journal.contains_key(&request_id)
    }

    /// Drop everything: records, list state, references and journal.
    pub fn reset(&self) {
        for collection in &self.resources {
            collection.value().clear();
        }
        self.references.clear();
        self.journal.clear();
        self.refresh();
        debug!("store reset");
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn collection(&self, resource: &str) -> Arc<RecordCollection> {
        if let Some(existing) = self.resources.get(resource) {
            return Arc::clone(existing.value());
        }
        Arc::clone(
            self.resources
                .entry(resource.to_owned())
                .or_insert_with(|| Arc::new(RecordCollection::new()))
                .value(),
        )
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Sort ids the way snapshots are ordered.
pub fn sort_ids(ids: &mut [Identifier]) {
    ids.sort_by(compare_ids);
}
