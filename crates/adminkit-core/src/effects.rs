// ── Settlement effect planning ──
//
// `plan_effects` turns a settlement into an ordered list of commands;
// an `EffectExecutor` carries them out. Planning is pure so the order
// and content of effects can be checked without a runtime.
//
// Order: store writes (or rollback), notification, redirect, refresh,
// selection clearing.

use adminkit_api::{GetListParams, Identifier, Record, ValidUntil};
use serde::Serialize;
use serde_json::Value;

use crate::action::{Outcome, RequestId, RequestPayload, ResponseData, Settlement};
use crate::error::CoreError;
use crate::side_effect::Notification;
use crate::store::{DataStore, reference_key};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Effect {
    // ── Store writes ─────────────────────────────────────────────────
    StoreRecords {
        resource: String,
        records: Vec<Record>,
        valid_until: Option<ValidUntil>,
    },
    StoreList {
        resource: String,
        records: Vec<Record>,
        total: u64,
        params: GetListParams,
        valid_until: Option<ValidUntil>,
    },
    StoreReference {
        resource: String,
        key: String,
        records: Vec<Record>,
        total: u64,
        valid_until: Option<ValidUntil>,
    },
    PatchRecords {
        resource: String,
        ids: Vec<Identifier>,
        data: Value,
    },
    RemoveRecords {
        resource: String,
        ids: Vec<Identifier>,
    },
    /// Undo any optimistic application of a failed mutation.
    Rollback {
        resource: String,
        request_id: RequestId,
    },

    // ── User-facing ──────────────────────────────────────────────────
    Notify(Notification),
    Redirect {
        path: String,
    },
    Refresh,
    UnselectAll {
        resource: String,
    },
}

impl Effect {
    /// Position in the execution order; plans are sorted by this.
    pub fn stage(&self) -> u8 {
        match self {
            Self::StoreRecords { .. }
            | Self::StoreList { .. }
            | Self::StoreReference { .. }
            | Self::PatchRecords { .. }
            | Self::RemoveRecords { .. }
            | Self::Rollback { .. } => 0,
            Self::Notify(_) => 1,
            Self::Redirect { .. } => 2,
            Self::Refresh => 3,
            Self::UnselectAll { .. } => 4,
        }
    }
}

/// Plan the effects of `settlement`.
///
/// `navigated` is `true` when explicit navigation happened while the
/// request was in flight; the declared redirect is then skipped.
pub fn plan_effects(settlement: &Settlement, navigated: bool) -> Vec<Effect> {
    let request = &settlement.request;
    let resource = request.resource().to_owned();
    let side = settlement.side_effects();
    let mut effects = Vec::new();

    let affected_id: Option<Identifier> = match &settlement.outcome {
        Outcome::Success(data) => {
            effects.extend(store_effects(&resource, &request.payload, data));
            match data {
                ResponseData::Created(r) => Some(r.data.id.clone()),
                ResponseData::Updated(r) => Some(r.data.id.clone()),
                _ => request.payload.id().cloned(),
            }
        }
        Outcome::Failure(_) => {
            if request.verb().is_mutation() {
                effects.push(Effect::Rollback {
                    resource: resource.clone(),
                    request_id: settlement.request_id,
                });
            }
            request.payload.id().cloned()
        }
    };

    if let Some(notification) = &side.notification {
        effects.push(Effect::Notify(notification.clone()));
    }

    if !navigated {
        let path = side
            .redirect_to
            .as_ref()
            .and_then(|target| target.resolve(side.base_path.as_deref(), affected_id.as_ref()));
        if let Some(path) = path {
            effects.push(Effect::Redirect { path });
        }
    }

    if side.refresh {
        effects.push(Effect::Refresh);
    }
    if side.unselect_all {
        effects.push(Effect::UnselectAll { resource });
    }
    effects
}

fn store_effects(resource: &str, payload: &RequestPayload, data: &ResponseData) -> Vec<Effect> {
    let resource = resource.to_owned();
    let effect = match data {
        ResponseData::List(r) => {
            let params = match payload {
                RequestPayload::GetList(p) => p.clone(),
                _ => GetListParams::default(),
            };
            Effect::StoreList {
                resource,
                records: r.data.clone(),
                total: r.total,
                params,
                valid_until: r.valid_until,
            }
        }
        ResponseData::ManyReference(r) => {
            let RequestPayload::GetManyReference(p) = payload else {
                return Vec::new();
            };
            Effect::StoreReference {
                key: reference_key(&resource, &p.target, &p.id),
                resource,
                records: r.data.clone(),
                total: r.total,
                valid_until: r.valid_until,
            }
        }
        ResponseData::One(r) => store(resource, vec![r.data.clone()], r.valid_until),
        ResponseData::Many(r) => store(resource, r.data.clone(), r.valid_until),
        ResponseData::Created(r) => store(resource, vec![r.data.clone()], r.valid_until),
        ResponseData::Updated(r) => store(resource, vec![r.data.clone()], r.valid_until),
        ResponseData::UpdatedMany(r) => {
            let RequestPayload::UpdateMany(p) = payload else {
                return Vec::new();
            };
            Effect::PatchRecords {
                resource,
                ids: r.data.clone().unwrap_or_else(|| p.ids.clone()),
                data: p.data.clone(),
            }
        }
        ResponseData::Deleted(r) => Effect::RemoveRecords {
            resource,
            ids: vec![r.data.id.clone()],
        },
        ResponseData::DeletedMany(r) => Effect::RemoveRecords {
            resource,
            ids: r.data.clone().unwrap_or_else(|| payload.ids()),
        },
    };
    vec![effect]
}

fn store(resource: String, records: Vec<Record>, valid_until: Option<ValidUntil>) -> Effect {
    Effect::StoreRecords {
        resource,
        records,
        valid_until,
    }
}

// ── Execution ────────────────────────────────────────────────────────

/// Carries out planned effects.
pub trait EffectExecutor {
    fn execute(&self, effect: &Effect) -> Result<(), CoreError>;

    /// Execute in order, stopping at the first failure.
    fn execute_all(&self, effects: &[Effect]) -> Result<(), CoreError> {
        effects.iter().try_for_each(|effect| self.execute(effect))
    }
}

/// Applies the store-facing effects. Notifications and redirects have no
/// store counterpart and are accepted as no-ops.
impl EffectExecutor for DataStore {
    fn execute(&self, effect: &Effect) -> Result<(), CoreError> {
        match effect {
            Effect::StoreRecords {
                resource,
                records,
                valid_until,
            } => self.upsert_records(resource, records, *valid_until),
            Effect::StoreList {
                resource,
                records,
                total,
                params,
                valid_until,
            } => self.store_list(resource, records, *total, params.clone(), *valid_until),
            Effect::StoreReference {
                resource,
                key,
                records,
                total,
                valid_until,
            } => self.store_reference(resource, key.clone(), records, *total, *valid_until),
            Effect::PatchRecords {
                resource,
                ids,
                data,
            } => self.patch_records(resource, ids, data),
            Effect::RemoveRecords { resource, ids } => self.remove_records(resource, ids),
            Effect::Rollback { request_id, .. } => {
                self.rollback(*request_id);
            }
            Effect::Refresh => self.refresh(),
            Effect::UnselectAll { resource } => self.unselect_all(resource),
            Effect::Notify(_) | Effect::Redirect { .. } => {}
        }
        Ok(())
    }
}
