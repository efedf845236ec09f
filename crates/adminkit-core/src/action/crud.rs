// ── CRUD requests, creators and settlements ──
//
// A `CrudRequest` is the immutable description of one provider call plus
// the side effects declared for each outcome. Creators are pure value
// constructors; `Settlement` pairs a request with its result and echoes
// the request payload for rollback and correlation.

use std::fmt;

use adminkit_api::{
    CreateParams, CreateResult, DeleteManyParams, DeleteManyResult, DeleteParams, DeleteResult,
    FilterPayload, GetListParams, GetListResult, GetManyParams, GetManyReferenceParams,
    GetManyReferenceResult, GetManyResult, GetOneParams, GetOneResult, Identifier,
    PaginationPayload, Record, SortPayload, UpdateManyParams, UpdateManyResult, UpdateParams,
    UpdateResult,
};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::types::FetchVerb;
use crate::error::CoreError;
use crate::side_effect::{Notification, Redirection, SideEffects};

pub const NOTIFICATION_CREATED: &str = "notification.created";
pub const NOTIFICATION_UPDATED: &str = "notification.updated";
pub const NOTIFICATION_DELETED: &str = "notification.deleted";
pub const NOTIFICATION_HTTP_ERROR: &str = "notification.http_error";

// ── RequestId ────────────────────────────────────────────────────────

/// Correlates the fetch lifecycle actions and settlement of one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ── RequestPayload ───────────────────────────────────────────────────

/// Verb-specific parameters. Serializes as the bare params object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RequestPayload {
    GetList(GetListParams),
    GetOne(GetOneParams),
    GetMany(GetManyParams),
    GetManyReference(GetManyReferenceParams),
    Create(CreateParams),
    Update(UpdateParams),
    UpdateMany(UpdateManyParams),
    Delete(DeleteParams),
    DeleteMany(DeleteManyParams),
}

impl RequestPayload {
    pub fn verb(&self) -> FetchVerb {
        match self {
            Self::GetList(_) => FetchVerb::GetList,
            Self::GetOne(_) => FetchVerb::GetOne,
            Self::GetMany(_) => FetchVerb::GetMany,
            Self::GetManyReference(_) => FetchVerb::GetManyReference,
            Self::Create(_) => FetchVerb::Create,
            Self::Update(_) => FetchVerb::Update,
            Self::UpdateMany(_) => FetchVerb::UpdateMany,
            Self::Delete(_) => FetchVerb::Delete,
            Self::DeleteMany(_) => FetchVerb::DeleteMany,
        }
    }

    /// Identifiers named by the payload, in request order.
    pub fn ids(&self) -> Vec<Identifier> {
        match self {
            Self::GetOne(p) => vec![p.id.clone()],
            Self::Update(p) => vec![p.id.clone()],
            Self::Delete(p) => vec![p.id.clone()],
            Self::GetMany(p) => p.ids.clone(),
            Self::UpdateMany(p) => p.ids.clone(),
            Self::DeleteMany(p) => p.ids.clone(),
            Self::GetManyReference(p) => vec![p.id.clone()],
            Self::GetList(_) | Self::Create(_) => Vec::new(),
        }
    }

    /// The single record this payload targets, if any.
    pub fn id(&self) -> Option<&Identifier> {
        match self {
            Self::GetOne(p) => Some(&p.id),
            Self::Update(p) => Some(&p.id),
            Self::Delete(p) => Some(&p.id),
            _ => None,
        }
    }

    /// Record state captured before the mutation, for rollback.
    pub fn previous_data(&self) -> Option<&Record> {
        match self {
            Self::Update(p) => p.previous_data.as_ref(),
            Self::Delete(p) => p.previous_data.as_ref(),
            _ => None,
        }
    }
}

// ── CrudMeta / CrudRequest ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrudMeta {
    pub resource: String,
    pub fetch: FetchVerb,
    pub on_success: SideEffects,
    pub on_failure: SideEffects,
}

/// A CRUD request action (`CRUD_<VERB>`).
#[derive(Debug, Clone, PartialEq)]
pub struct CrudRequest {
    pub payload: RequestPayload,
    pub meta: CrudMeta,
}

impl CrudRequest {
    fn new(
        resource: &str,
        payload: RequestPayload,
        on_success: SideEffects,
        on_failure: SideEffects,
    ) -> Result<Self, CoreError> {
        let resource = require_resource(resource)?;
        Ok(Self {
            meta: CrudMeta {
                resource,
                fetch: payload.verb(),
                on_success,
                on_failure,
            },
            payload,
        })
    }

    pub fn verb(&self) -> FetchVerb {
        self.meta.fetch
    }

    pub fn resource(&self) -> &str {
        &self.meta.resource
    }

    /// Override the success redirect target.
    pub fn with_redirect(mut self, redirect_to: impl Into<Redirection>) -> Self {
        self.meta.on_success.redirect_to = Some(redirect_to.into());
        self
    }

    /// Override whether the view refreshes on success.
    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.meta.on_success.refresh = refresh;
        self
    }

    /// Checks that `meta` still agrees with the payload. Requests built by
    /// the creators always pass; hand-assembled ones may not.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.meta.resource.trim().is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "resource must not be empty".into(),
            });
        }
        let got = self.payload.verb();
        if got != self.meta.fetch {
            return Err(CoreError::VerbMismatch {
                expected: self.meta.fetch,
                got,
            });
        }
        Ok(())
    }

    /// Number of records the request affects, as used for `smart_count`.
    pub fn affected_count(&self) -> usize {
        match &self.payload {
            RequestPayload::UpdateMany(p) => p.ids.len(),
            RequestPayload::DeleteMany(p) => p.ids.len(),
            RequestPayload::GetMany(p) => p.ids.len(),
            _ => 1,
        }
    }
}

fn require_resource(resource: &str) -> Result<String, CoreError> {
    if resource.trim().is_empty() {
        return Err(CoreError::ValidationFailed {
            message: "resource must not be empty".into(),
        });
    }
    Ok(resource.to_owned())
}

fn http_error() -> SideEffects {
    SideEffects::notify(Notification::warning(NOTIFICATION_HTTP_ERROR))
}

fn non_empty(base_path: &str) -> Option<String> {
    (!base_path.is_empty()).then(|| base_path.to_owned())
}

// ── Creators: reads ──────────────────────────────────────────────────

pub fn crud_get_list(
    resource: &str,
    pagination: PaginationPayload,
    sort: SortPayload,
    filter: FilterPayload,
) -> Result<CrudRequest, CoreError> {
    CrudRequest::new(
        resource,
        RequestPayload::GetList(GetListParams {
            pagination,
            sort,
            filter,
        }),
        SideEffects::default(),
        http_error(),
    )
}

pub fn crud_get_one(
    resource: &str,
    id: impl Into<Identifier>,
    base_path: &str,
) -> Result<CrudRequest, CoreError> {
    let on_failure = SideEffects {
        base_path: non_empty(base_path),
        ..http_error()
    };
    CrudRequest::new(
        resource,
        RequestPayload::GetOne(GetOneParams { id: id.into() }),
        SideEffects::default(),
        on_failure,
    )
}

pub fn crud_get_many(resource: &str, ids: Vec<Identifier>) -> Result<CrudRequest, CoreError> {
    CrudRequest::new(
        resource,
        RequestPayload::GetMany(GetManyParams { ids }),
        SideEffects::default(),
        http_error(),
    )
}

pub fn crud_get_many_reference(
    resource: &str,
    target: &str,
    id: impl Into<Identifier>,
    pagination: PaginationPayload,
    sort: SortPayload,
    filter: FilterPayload,
) -> Result<CrudRequest, CoreError> {
    if target.trim().is_empty() {
        return Err(CoreError::ValidationFailed {
            message: "reference target must not be empty".into(),
        });
    }
    CrudRequest::new(
        resource,
        RequestPayload::GetManyReference(GetManyReferenceParams {
            target: target.to_owned(),
            id: id.into(),
            pagination,
            sort,
            filter,
        }),
        SideEffects::default(),
        http_error(),
    )
}

// ── Creators: writes ─────────────────────────────────────────────────

/// `CRUD_CREATE`; redirects to the new record's edit page by default.
pub fn crud_create(resource: &str, data: Value, base_path: &str) -> Result<CrudRequest, CoreError> {
    let on_success = SideEffects {
        notification: Some(Notification::info(NOTIFICATION_CREATED).with_count(1)),
        redirect_to: Some(Redirection::Edit),
        base_path: non_empty(base_path),
        ..SideEffects::default()
    };
    CrudRequest::new(
        resource,
        RequestPayload::Create(CreateParams { data }),
        on_success,
        http_error(),
    )
}

/// `CRUD_UPDATE`; redirects to the show page and refreshes by default.
pub fn crud_update(
    resource: &str,
    id: impl Into<Identifier>,
    data: Value,
    previous_data: Option<Record>,
    base_path: &str,
) -> Result<CrudRequest, CoreError> {
    let on_success = SideEffects {
        notification: Some(Notification::info(NOTIFICATION_UPDATED).with_count(1)),
        redirect_to: Some(Redirection::Show),
        refresh: true,
        base_path: non_empty(base_path),
        ..SideEffects::default()
    };
    CrudRequest::new(
        resource,
        RequestPayload::Update(UpdateParams {
            id: id.into(),
            data,
            previous_data,
        }),
        on_success,
        http_error(),
    )
}

/// `CRUD_UPDATE_MANY`; refreshes and clears the selection by default.
pub fn crud_update_many(
    resource: &str,
    ids: Vec<Identifier>,
    data: Value,
    base_path: &str,
) -> Result<CrudRequest, CoreError> {
    let on_success = SideEffects {
        notification: Some(Notification::info(NOTIFICATION_UPDATED).with_count(ids.len())),
        refresh: true,
        unselect_all: true,
        base_path: non_empty(base_path),
        ..SideEffects::default()
    };
    CrudRequest::new(
        resource,
        RequestPayload::UpdateMany(UpdateManyParams { ids, data }),
        on_success,
        http_error(),
    )
}

/// `CRUD_DELETE`; redirects to the list and refreshes by default.
pub fn crud_delete(
    resource: &str,
    id: impl Into<Identifier>,
    previous_data: Option<Record>,
    base_path: &str,
) -> Result<CrudRequest, CoreError> {
    let on_success = SideEffects {
        notification: Some(Notification::info(NOTIFICATION_DELETED).with_count(1)),
        redirect_to: Some(Redirection::List),
        refresh: true,
        base_path: non_empty(base_path),
        ..SideEffects::default()
    };
    CrudRequest::new(
        resource,
        RequestPayload::Delete(DeleteParams {
            id: id.into(),
            previous_data,
        }),
        on_success,
        http_error(),
    )
}

/// `CRUD_DELETE_MANY`; refreshes and clears the selection by default.
pub fn crud_delete_many(
    resource: &str,
    ids: Vec<Identifier>,
    base_path: &str,
) -> Result<CrudRequest, CoreError> {
    let on_success = SideEffects {
        notification: Some(Notification::info(NOTIFICATION_DELETED).with_count(ids.len())),
        refresh: true,
        unselect_all: true,
        base_path: non_empty(base_path),
        ..SideEffects::default()
    };
    CrudRequest::new(
        resource,
        RequestPayload::DeleteMany(DeleteManyParams { ids }),
        on_success,
        http_error(),
    )
}

// ── Settlement ───────────────────────────────────────────────────────

/// Provider result, one variant per verb. Serializes as the bare result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseData {
    List(GetListResult),
    One(GetOneResult),
    Many(GetManyResult),
    ManyReference(GetManyReferenceResult),
    Created(CreateResult),
    Updated(UpdateResult),
    UpdatedMany(UpdateManyResult),
    Deleted(DeleteResult),
    DeletedMany(DeleteManyResult),
}

impl ResponseData {
    pub fn verb(&self) -> FetchVerb {
        match self {
            Self::List(_) => FetchVerb::GetList,
            Self::One(_) => FetchVerb::GetOne,
            Self::Many(_) => FetchVerb::GetMany,
            Self::ManyReference(_) => FetchVerb::GetManyReference,
            Self::Created(_) => FetchVerb::Create,
            Self::Updated(_) => FetchVerb::Update,
            Self::UpdatedMany(_) => FetchVerb::UpdateMany,
            Self::Deleted(_) => FetchVerb::Delete,
            Self::DeletedMany(_) => FetchVerb::DeleteMany,
        }
    }

    /// Records carried by the result, if the verb returns any.
    pub fn records(&self) -> &[Record] {
        match self {
            Self::List(r) => &r.data,
            Self::Many(r) => &r.data,
            Self::ManyReference(r) => &r.data,
            Self::One(r) => std::slice::from_ref(&r.data),
            Self::Created(r) => std::slice::from_ref(&r.data),
            Self::Updated(r) => std::slice::from_ref(&r.data),
            Self::Deleted(r) => std::slice::from_ref(&r.data),
            Self::UpdatedMany(_) | Self::DeletedMany(_) => &[],
        }
    }
}

/// Failure reported by the provider, flattened for the action log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureInfo {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl From<&adminkit_api::Error> for FailureInfo {
    fn from(err: &adminkit_api::Error) -> Self {
        Self {
            message: err.to_string(),
            status: err.status(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(ResponseData),
    Failure(FailureInfo),
}

/// The success or failure action concluding a request.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub request_id: RequestId,
    pub request: CrudRequest,
    pub outcome: Outcome,
}

impl Settlement {
    /// Rejects a response that does not belong to the request's verb.
    pub fn success(
        request_id: RequestId,
        request: CrudRequest,
        response: ResponseData,
    ) -> Result<Self, CoreError> {
        if response.verb() != request.verb() {
            return Err(CoreError::VerbMismatch {
                expected: request.verb(),
                got: response.verb(),
            });
        }
        Ok(Self {
            request_id,
            request,
            outcome: Outcome::Success(response),
        })
    }

    pub fn failure(request_id: RequestId, request: CrudRequest, error: FailureInfo) -> Self {
        Self {
            request_id,
            request,
            outcome: Outcome::Failure(error),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }

    pub fn side_effects(&self) -> &SideEffects {
        match self.outcome {
            Outcome::Success(_) => &self.request.meta.on_success,
            Outcome::Failure(_) => &self.request.meta.on_failure,
        }
    }

    /// Collapse into the response, mapping a failure back to a `CoreError`.
    pub fn into_result(self) -> Result<ResponseData, CoreError> {
        match self.outcome {
            Outcome::Success(data) => Ok(data),
            Outcome::Failure(FailureInfo { message, status }) => Err(match status {
                Some(401) => CoreError::AuthenticationFailed { message },
                Some(403) => CoreError::Forbidden { message },
                Some(404) => CoreError::NotFound {
                    resource: self.request.meta.resource,
                    id: self
                        .request
                        .payload
                        .id()
                        .map(ToString::to_string)
                        .unwrap_or_default(),
                },
                Some(400) => CoreError::Rejected { message },
                status => CoreError::Api { message, status },
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::side_effect::NotificationLevel;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ids(raw: &[i64]) -> Vec<Identifier> {
        raw.iter().copied().map(Identifier::Num).collect()
    }

    fn every_creator() -> Vec<(FetchVerb, CrudRequest)> {
        vec![
            (
                FetchVerb::GetList,
                crud_get_list(
                    "posts",
                    PaginationPayload::default(),
                    SortPayload::default(),
                    FilterPayload::new(),
                )
                .unwrap(),
            ),
            (FetchVerb::GetOne, crud_get_one("posts", 1, "/posts").unwrap()),
            (FetchVerb::GetMany, crud_get_many("posts", ids(&[1, 2])).unwrap()),
            (
                FetchVerb::GetManyReference,
                crud_get_many_reference(
                    "posts",
                    "author_id",
                    1,
                    PaginationPayload::default(),
                    SortPayload::default(),
                    FilterPayload::new(),
                )
                .unwrap(),
            ),
            (
                FetchVerb::Create,
                crud_create("posts", json!({"title": "Hi"}), "/posts").unwrap(),
            ),
            (
                FetchVerb::Update,
                crud_update("posts", 1, json!({"title": "Yo"}), None, "/posts").unwrap(),
            ),
            (
                FetchVerb::UpdateMany,
                crud_update_many("posts", ids(&[1, 2]), json!({"views": 0}), "/posts").unwrap(),
            ),
            (FetchVerb::Delete, crud_delete("posts", 1, None, "/posts").unwrap()),
            (
                FetchVerb::DeleteMany,
                crud_delete_many("posts", ids(&[1, 2, 3]), "/posts").unwrap(),
            ),
        ]
    }

    #[test]
    fn every_creator_sets_fetch_and_resource() {
        for (verb, request) in every_creator() {
            assert_eq!(request.meta.fetch, verb);
            assert_eq!(request.payload.verb(), verb);
            assert_eq!(request.meta.resource, "posts");
            assert!(request.validate().is_ok());
        }
    }

    #[test]
    fn smart_count_is_one_for_singular_mutations() {
        let singular = [
            crud_create("posts", json!({"title": "Hi"}), "/posts").unwrap(),
            crud_update("posts", 1, json!({}), None, "/posts").unwrap(),
            crud_delete("posts", 1, None, "/posts").unwrap(),
        ];
        for request in singular {
            let notification = request.meta.on_success.notification.unwrap();
            assert_eq!(notification.message_args.smart_count, Some(1));
        }
    }

    #[test]
    fn smart_count_matches_ids_for_bulk_mutations() {
        for n in [0_i64, 1, 4, 17] {
            let batch: Vec<i64> = (0..n).collect();
            let update = crud_update_many("posts", ids(&batch), json!({}), "/posts").unwrap();
            let delete = crud_delete_many("posts", ids(&batch), "/posts").unwrap();
            for request in [update, delete] {
                let count = request.meta.on_success.notification.unwrap().message_args.smart_count;
                assert_eq!(count, Some(batch.len()));
            }
        }
    }

    #[test]
    fn create_scenario() {
        let request = crud_create("posts", json!({"title": "Hi"}), "/posts").unwrap();
        assert_eq!(
            serde_json::to_value(&request.payload).unwrap(),
            json!({"data": {"title": "Hi"}})
        );
        assert_eq!(request.meta.on_success.redirect_to, Some(Redirection::Edit));
        let notification = request.meta.on_success.notification.unwrap();
        assert_eq!(notification.body, "notification.created");
        assert_eq!(notification.level, NotificationLevel::Info);
    }

    #[test]
    fn delete_many_scenario() {
        let request = crud_delete_many("posts", ids(&[1, 2, 3]), "/posts").unwrap();
        assert!(request.meta.on_success.unselect_all);
        assert!(request.meta.on_success.refresh);
        assert_eq!(
            request.meta.on_success.notification.unwrap().message_args.smart_count,
            Some(3)
        );
    }

    #[test]
    fn failure_side_effects_default_to_http_error_warning() {
        for (_, request) in every_creator() {
            let notification = request.meta.on_failure.notification.unwrap();
            assert_eq!(notification.body, NOTIFICATION_HTTP_ERROR);
            assert_eq!(notification.level, NotificationLevel::Warning);
            assert_eq!(request.meta.on_failure.redirect_to, None);
        }
    }

    #[test]
    fn default_redirects_per_verb() {
        let update = crud_update("posts", 1, json!({}), None, "/posts").unwrap();
        let delete = crud_delete("posts", 1, None, "/posts").unwrap();
        assert_eq!(update.meta.on_success.redirect_to, Some(Redirection::Show));
        assert_eq!(delete.meta.on_success.redirect_to, Some(Redirection::List));
        assert_eq!(delete.meta.on_success.base_path.as_deref(), Some("/posts"));
    }

    #[test]
    fn overrides_replace_defaults() {
        let request = crud_create("posts", json!({}), "/posts")
            .unwrap()
            .with_redirect(Redirection::Disabled)
            .with_refresh(true);
        assert_eq!(request.meta.on_success.redirect_to, Some(Redirection::Disabled));
        assert!(request.meta.on_success.refresh);
    }

    #[test]
    fn empty_resource_is_rejected() {
        let err = crud_create("  ", json!({}), "/posts").unwrap_err();
        assert!(matches!(err, CoreError::ValidationFailed { .. }));
        assert!(crud_get_many_reference(
            "posts",
            "",
            1,
            PaginationPayload::default(),
            SortPayload::default(),
            FilterPayload::new(),
        )
        .is_err());
    }

    #[test]
    fn validate_catches_hand_edited_meta() {
        let mut request = crud_delete("posts", 1, None, "/posts").unwrap();
        request.meta.fetch = FetchVerb::Update;
        assert!(matches!(
            request.validate(),
            Err(CoreError::VerbMismatch { .. })
        ));
    }

    #[test]
    fn settlement_rejects_verb_mismatch() {
        let request = crud_delete("posts", 1, None, "/posts").unwrap();
        let response = ResponseData::Created(CreateResult {
            data: Record::new(1),
            valid_until: None,
        });
        let err = Settlement::success(RequestId::new(), request, response).unwrap_err();
        assert!(matches!(
            err,
            CoreError::VerbMismatch {
                expected: FetchVerb::Delete,
                got: FetchVerb::Create
            }
        ));
    }

    #[test]
    fn failed_settlement_maps_back_to_core_error() {
        let request = crud_get_one("posts", 9, "/posts").unwrap();
        let settlement = Settlement::failure(
            RequestId::new(),
            request,
            FailureInfo {
                message: "gone".into(),
                status: Some(404),
            },
        );
        assert!(!settlement.is_success());
        assert!(matches!(
            settlement.into_result(),
            Err(CoreError::NotFound { ref id, .. }) if id == "9"
        ));
    }
}
