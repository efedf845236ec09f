// ── Admin runtime ──
//
// Full lifecycle management for CRUD requests against a `DataProvider`:
// action dispatch, fetch accounting, optimistic and undoable mutations,
// effect execution and auth. Cheaply cloneable via `Arc<AdminInner>`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use adminkit_api::{
    AuthProvider, DataProvider, GetListParams, GetListResult, GetManyReferenceParams,
    GetManyReferenceResult, Identifier, Record, UserIdentity,
};
use futures_util::future::join_all;
use serde_json::Value;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::action::auth::{AUTH_CHECK_ERROR, AUTH_SIGN_IN_ERROR, LOGIN_PATH, NOTIFICATION_LOGGED_OUT};
use crate::action::{
    Action, CrudRequest, FailureInfo, RequestId, RequestPayload, ResponseData, Settlement,
    UndoToken, UndoableEnvelope, crud_get_list, crud_get_many, crud_get_many_reference,
    crud_get_one, user_check, user_login, user_logout,
};
use crate::config::{AdminConfig, MutationMode};
use crate::effects::{Effect, EffectExecutor, plan_effects};
use crate::error::CoreError;
use crate::side_effect::Notification;
use crate::state::AdminState;
use crate::store::{DataStore, sort_ids};
use crate::undo::{Resolved, UndoOutcome};

/// What became of a mutation handed to [`Admin::mutate`].
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    /// The provider answered (successfully or not).
    Settled(Settlement),
    /// Held behind an undo window until `undo`/`complete` resolves it.
    Pending(UndoToken),
}

/// A request running on its own task.
pub struct PendingRequest {
    request_id: RequestId,
    cancel: CancellationToken,
    handle: JoinHandle<Result<Option<Settlement>, CoreError>>,
}

impl PendingRequest {
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Abandon the request. A response arriving later is ignored.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the request. `Ok(None)` means it was cancelled.
    pub async fn wait(self) -> Result<Option<Settlement>, CoreError> {
        self.handle
            .await
            .map_err(|e| CoreError::Internal(format!("request task failed: {e}")))?
    }
}

/// Per-execution flags carried from `mutate`/`complete` into `execute`.
#[derive(Debug, Clone, Copy, Default)]
struct Execution {
    /// The success notification was already shown when the envelope opened.
    notified: bool,
}

// ── Admin ────────────────────────────────────────────────────────────

/// The main entry point for hosts.
///
/// Cheaply cloneable via `Arc<AdminInner>`. Every action passes through
/// [`Admin::dispatch`], which reduces it into [`AdminState`] and
/// broadcasts it to subscribers.
#[derive(Clone)]
pub struct Admin {
    inner: Arc<AdminInner>,
}

struct AdminInner {
    config: AdminConfig,
    data_provider: Arc<dyn DataProvider>,
    auth_provider: Option<Arc<dyn AuthProvider>>,
    store: Arc<DataStore>,
    state: Mutex<AdminState>,
    loading: watch::Sender<u32>,
    optimistic: watch::Sender<bool>,
    actions: broadcast::Sender<Arc<Action>>,
    effects: broadcast::Sender<Arc<Effect>>,
    cancel: CancellationToken,
    undo_timers: Mutex<Vec<JoinHandle<()>>>,
}

impl Admin {
    /// Create an admin without an auth provider: every session is valid.
    pub fn new(config: AdminConfig, data_provider: Arc<dyn DataProvider>) -> Self {
        Self::build(config, data_provider, None)
    }

    pub fn with_auth(
        config: AdminConfig,
        data_provider: Arc<dyn DataProvider>,
        auth_provider: Arc<dyn AuthProvider>,
    ) -> Self {
        Self::build(config, data_provider, Some(auth_provider))
    }

    fn build(
        config: AdminConfig,
        data_provider: Arc<dyn DataProvider>,
        auth_provider: Option<Arc<dyn AuthProvider>>,
    ) -> Self {
        let capacity = config.channel_capacity.max(1);
        let (loading, _) = watch::channel(0);
        let (optimistic, _) = watch::channel(false);
        let (actions, _) = broadcast::channel(capacity);
        let (effects, _) = broadcast::channel(capacity);

        Self {
            inner: Arc::new(AdminInner {
                config,
                data_provider,
                auth_provider,
                store: Arc::new(DataStore::new()),
                state: Mutex::new(AdminState::new()),
                loading,
                optimistic,
                actions,
                effects,
                cancel: CancellationToken::new(),
                undo_timers: Mutex::new(Vec::new()),
            }),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    /// Number of requests in flight. Zero means idle.
    pub fn loading(&self) -> watch::Receiver<u32> {
        self.inner.loading.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        *self.inner.loading.borrow() > 0
    }

    pub fn optimistic_mode(&self) -> watch::Receiver<bool> {
        self.inner.optimistic.subscribe()
    }

    pub fn is_optimistic(&self) -> bool {
        *self.inner.optimistic.borrow()
    }

    /// Every dispatched action, in dispatch order.
    pub fn actions(&self) -> broadcast::Receiver<Arc<Action>> {
        self.inner.actions.subscribe()
    }

    /// Every executed effect. Notifications and redirects are the host's
    /// to render.
    pub fn effects(&self) -> broadcast::Receiver<Arc<Effect>> {
        self.inner.effects.subscribe()
    }

    pub async fn pending_undo_tokens(&self) -> Vec<UndoToken> {
        self.inner.state.lock().await.undo().pending_tokens()
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    /// Reduce `action` into the admin state and broadcast it.
    pub async fn dispatch(&self, action: Action) -> Option<UndoOutcome> {
        let outcome = {
            let mut state = self.inner.state.lock().await;
            let outcome = state.reduce(&action);
            let (fetch_count, optimistic) = (state.fetch_count(), state.is_optimistic());

            // Published under the lock so watchers never see a stale count.
            self.inner.loading.send_if_modified(|count| {
                let changed = *count != fetch_count;
                *count = fetch_count;
                changed
            });
            self.inner.optimistic.send_if_modified(|flag| {
                let changed = *flag != optimistic;
                *flag = optimistic;
                changed
            });
            outcome
        };

        debug!(action = %action.action_type(), "dispatch");
        // No subscribers is fine.
        let _ = self.inner.actions.send(Arc::new(action));
        outcome
    }

    /// Record a navigation. Requests started before it skip their redirect.
    pub async fn navigate(&self, path: &str) {
        self.dispatch(Action::LocationChange {
            path: path.to_owned(),
        })
        .await;
    }

    pub async fn start_optimistic_mode(&self) {
        self.dispatch(Action::StartOptimisticMode).await;
    }

    pub async fn stop_optimistic_mode(&self) {
        self.dispatch(Action::StopOptimisticMode).await;
    }

    /// Ask views to reload.
    pub async fn refresh_view(&self) {
        self.dispatch(Action::RefreshView).await;
        self.inner.store.refresh();
    }

    pub async fn select(&self, resource: &str, ids: Vec<Identifier>) {
        self.inner.store.select(resource, ids.clone());
        self.dispatch(Action::SetListSelectedIds {
            resource: resource.to_owned(),
            ids,
        })
        .await;
    }

    pub async fn toggle_item(&self, resource: &str, id: Identifier) {
        self.inner.store.toggle_selection(resource, &id);
        self.dispatch(Action::ToggleListItem {
            resource: resource.to_owned(),
            id,
        })
        .await;
    }

    // ── Requests ─────────────────────────────────────────────────────

    /// Run a request to completion and return its settlement.
    ///
    /// Provider failures come back as a failed `Settlement`, not as `Err`.
    pub async fn run_request(&self, request: CrudRequest) -> Result<Settlement, CoreError> {
        let cancel = self.inner.cancel.child_token();
        self.execute_request(request, RequestId::new(), cancel, Execution::default())
            .await?
            .ok_or(CoreError::Cancelled)
    }

    /// Run a request on its own task, returning a cancellable handle.
    pub fn spawn_request(&self, request: CrudRequest) -> PendingRequest {
        let request_id = RequestId::new();
        let cancel = self.inner.cancel.child_token();
        let admin = self.clone();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            admin
                .execute_request(request, request_id, token, Execution::default())
                .await
        });
        PendingRequest {
            request_id,
            cancel,
            handle,
        }
    }

    /// Submit a mutation using the configured [`MutationMode`].
    pub async fn mutate(&self, request: CrudRequest) -> Result<MutationOutcome, CoreError> {
        self.mutate_with(request, self.inner.config.mutation_mode)
            .await
    }

    pub async fn mutate_with(
        &self,
        request: CrudRequest,
        mode: MutationMode,
    ) -> Result<MutationOutcome, CoreError> {
        request.validate()?;
        if !request.verb().is_mutation() {
            return self.run_request(request).await.map(MutationOutcome::Settled);
        }

        match mode {
            MutationMode::Pessimistic | MutationMode::Optimistic => {
                let request_id = RequestId::new();
                // Optimistic mode, once on, covers every mutation.
                if mode == MutationMode::Optimistic || self.is_optimistic() {
                    self.inner.store.apply_optimistic(
                        request_id,
                        request.resource(),
                        &request.payload,
                    );
                }
                let cancel = self.inner.cancel.child_token();
                self.execute_request(request, request_id, cancel, Execution::default())
                    .await?
                    .map(MutationOutcome::Settled)
                    .ok_or(CoreError::Cancelled)
            }
            MutationMode::Undoable => self.hold_undoable(request).await,
        }
    }

    async fn hold_undoable(&self, request: CrudRequest) -> Result<MutationOutcome, CoreError> {
        let envelope = UndoableEnvelope::new(Action::Crud(request.clone()));
        let token = envelope.token;

        if self.inner.config.undoable_optimistic {
            self.dispatch(Action::StartOptimisticMode).await;
            self.inner
                .store
                .apply_optimistic(envelope.request_id, request.resource(), &request.payload);
        }
        self.dispatch(Action::Undoable(envelope)).await;

        // Shown now, with the undo affordance, not when the provider answers.
        if let Some(notification) = &request.meta.on_success.notification {
            let notification = Notification {
                undoable: true,
                ..notification.clone()
            };
            self.emit(Effect::Notify(notification));
        }

        if let Some(timeout) = self.inner.config.undo_timeout {
            self.spawn_undo_timer(token, timeout).await;
        }
        info!(%token, resource = request.resource(), verb = %request.verb(), "mutation held for undo");
        Ok(MutationOutcome::Pending(token))
    }

    async fn spawn_undo_timer(&self, token: UndoToken, timeout: Duration) {
        let admin = self.clone();
        let cancel = self.inner.cancel.child_token();
        let handle = tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(timeout) => {
                    if let Err(e) = admin.complete_token(token).await {
                        debug!(%token, error = %e, "undo window closed on a resolved mutation");
                    }
                }
            }
        });
        let mut timers = self.inner.undo_timers.lock().await;
        timers.retain(|h| !h.is_finished());
        timers.push(handle);
    }

    // ── Undo / complete ──────────────────────────────────────────────

    /// Discard every pending undoable mutation. None reach the provider.
    pub async fn undo(&self) -> Vec<Resolved> {
        self.resolve_undo(None).await
    }

    pub async fn undo_token(&self, token: UndoToken) -> Result<Resolved, CoreError> {
        self.resolve_undo(Some(token))
            .await
            .pop()
            .ok_or_else(|| CoreError::UndoTokenUnknown {
                token: token.to_string(),
            })
    }

    /// Release every pending undoable mutation, in dispatch order.
    pub async fn complete(&self) -> Vec<Result<Settlement, CoreError>> {
        self.resolve_complete(None).await
    }

    pub async fn complete_token(&self, token: UndoToken) -> Result<Settlement, CoreError> {
        self.resolve_complete(Some(token))
            .await
            .pop()
            .unwrap_or_else(|| {
                Err(CoreError::UndoTokenUnknown {
                    token: token.to_string(),
                })
            })
    }

    async fn resolve_undo(&self, token: Option<UndoToken>) -> Vec<Resolved> {
        let Some(UndoOutcome::Undone(discarded)) = self.dispatch(Action::Undo { token }).await
        else {
            return Vec::new();
        };
        for resolved in &discarded {
            self.inner.store.rollback(resolved.request_id);
        }
        self.stop_optimistic_if_idle().await;
        discarded
    }

    async fn resolve_complete(&self, token: Option<UndoToken>) -> Vec<Result<Settlement, CoreError>> {
        let Some(UndoOutcome::Completed(released)) =
            self.dispatch(Action::Complete { token }).await
        else {
            return Vec::new();
        };
        self.stop_optimistic_if_idle().await;

        let mut runs = Vec::with_capacity(released.len());
        for resolved in released {
            match resolved.action {
                Action::Crud(request) => {
                    let cancel = self.inner.cancel.child_token();
                    let execution = Execution { notified: true };
                    runs.push(self.execute_request(request, resolved.request_id, cancel, execution));
                }
                other => {
                    self.dispatch(other).await;
                }
            }
        }

        join_all(runs)
            .await
            .into_iter()
            .map(|result| result?.ok_or(CoreError::Cancelled))
            .collect()
    }

    async fn stop_optimistic_if_idle(&self) {
        let idle = {
            let state = self.inner.state.lock().await;
            state.is_optimistic() && state.undo().pending_count() == 0
        };
        if idle {
            self.dispatch(Action::StopOptimisticMode).await;
        }
    }

    // ── Execution ────────────────────────────────────────────────────

    async fn execute_request(
        &self,
        request: CrudRequest,
        request_id: RequestId,
        cancel: CancellationToken,
        execution: Execution,
    ) -> Result<Option<Settlement>, CoreError> {
        if let Err(e) = request.validate() {
            self.inner.store.commit(request_id);
            return Err(e);
        }
        let epoch = self.inner.state.lock().await.navigation_epoch();

        self.dispatch(Action::Crud(request.clone())).await;
        self.dispatch(Action::CrudLoading(request.clone())).await;
        self.dispatch(Action::FetchStart { request_id }).await;

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            result = call_provider(self.inner.data_provider.as_ref(), &request) => Some(result),
        };
        let Some(result) = result.filter(|_| !cancel.is_cancelled()) else {
            self.dispatch(Action::FetchCancel { request_id }).await;
            // Whatever was applied locally stays; only the journal goes.
            self.inner.store.commit(request_id);
            debug!(%request_id, resource = request.resource(), "request cancelled");
            return Ok(None);
        };

        let mut provider_error = None;
        let settlement = match result {
            Ok(data) => {
                self.dispatch(Action::FetchEnd { request_id }).await;
                self.inner.store.commit(request_id);
                Settlement::success(request_id, request, data)?
            }
            Err(err) => {
                self.dispatch(Action::FetchError { request_id }).await;
                warn!(
                    %request_id,
                    resource = request.resource(),
                    verb = %request.verb(),
                    error = %err,
                    "provider request failed"
                );
                let failure = FailureInfo::from(&err);
                provider_error = Some(err);
                Settlement::failure(request_id, request, failure)
            }
        };

        let navigated = self.inner.state.lock().await.navigation_epoch() != epoch;
        self.dispatch(Action::Settled(settlement.clone())).await;

        let mut effects = plan_effects(&settlement, navigated);
        if execution.notified && settlement.is_success() {
            effects.retain(|effect| !matches!(effect, Effect::Notify(_)));
        }
        self.execute_all(&effects)?;

        if let Some(err) = provider_error {
            self.check_provider_error(&err).await;
        }
        Ok(Some(settlement))
    }

    fn emit(&self, effect: Effect) {
        if let Err(e) = self.execute(&effect) {
            warn!(error = %e, "effect failed");
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub async fn get_list(
        &self,
        resource: &str,
        params: GetListParams,
    ) -> Result<GetListResult, CoreError> {
        let request = crud_get_list(resource, params.pagination, params.sort, params.filter)?;
        match self.run_request(request).await?.into_result()? {
            ResponseData::List(result) => Ok(result),
            other => Err(unexpected(&other)),
        }
    }

    pub async fn get_one(&self, resource: &str, id: Identifier) -> Result<Record, CoreError> {
        let request = crud_get_one(resource, id, "")?;
        match self.run_request(request).await?.into_result()? {
            ResponseData::One(result) => Ok(result.data),
            other => Err(unexpected(&other)),
        }
    }

    pub async fn get_many(
        &self,
        resource: &str,
        ids: Vec<Identifier>,
    ) -> Result<Vec<Record>, CoreError> {
        let request = crud_get_many(resource, ids)?;
        match self.run_request(request).await?.into_result()? {
            ResponseData::Many(result) => Ok(result.data),
            other => Err(unexpected(&other)),
        }
    }

    pub async fn get_many_reference(
        &self,
        resource: &str,
        params: GetManyReferenceParams,
    ) -> Result<GetManyReferenceResult, CoreError> {
        let request = crud_get_many_reference(
            resource,
            &params.target,
            params.id,
            params.pagination,
            params.sort,
            params.filter,
        )?;
        match self.run_request(request).await?.into_result()? {
            ResponseData::ManyReference(result) => Ok(result),
            other => Err(unexpected(&other)),
        }
    }

    /// Fetch the records of `resource` that `field` points at across
    /// `records`. Scalar and array fields are both followed; each id is
    /// requested once.
    pub async fn fetch_related_records(
        &self,
        records: &[Record],
        field: &str,
        resource: &str,
    ) -> Result<HashMap<Identifier, Record>, CoreError> {
        let mut ids: Vec<Identifier> = records
            .iter()
            .filter_map(|record| record.field(field))
            .flat_map(|value| match value {
                Value::Array(items) => items.iter().filter_map(Identifier::from_value).collect(),
                other => Identifier::from_value(&other).into_iter().collect::<Vec<_>>(),
            })
            .collect();
        sort_ids(&mut ids);
        ids.dedup();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let related = self.get_many(resource, ids).await?;
        Ok(related.into_iter().map(|r| (r.id.clone(), r)).collect())
    }

    // ── Auth ─────────────────────────────────────────────────────────

    /// Sign in. On success the host is redirected back to `path_name`.
    pub async fn login(&self, credentials: Value, path_name: Option<&str>) -> Result<Value, CoreError> {
        let request = user_login(credentials, path_name);
        self.dispatch(Action::UserLogin(request.clone())).await;
        self.dispatch(Action::UserLoginLoading).await;

        let Some(auth) = self.inner.auth_provider.clone() else {
            self.dispatch(Action::UserLoginSuccess(Value::Null)).await;
            return Ok(Value::Null);
        };

        match auth.login(request.payload).await {
            Ok(payload) => {
                self.dispatch(Action::UserLoginSuccess(payload.clone())).await;
                let path = request.path_name.unwrap_or_else(|| "/".into());
                info!(redirect = %path, "login succeeded");
                self.emit(Effect::Redirect { path });
                Ok(payload)
            }
            Err(err) => {
                warn!(error = %err, "login failed");
                self.dispatch(Action::UserLoginFailure(FailureInfo::from(&err)))
                    .await;
                self.emit(Effect::Notify(Notification::warning(AUTH_SIGN_IN_ERROR)));
                Err(err.into())
            }
        }
    }

    /// Verify the session. A rejection notifies, logs out and redirects to
    /// the login page.
    pub async fn check_auth(&self, params: Value, path_name: Option<&str>) -> Result<(), CoreError> {
        self.dispatch(Action::UserCheck(user_check(params.clone(), path_name, None)))
            .await;
        let Some(auth) = self.inner.auth_provider.clone() else {
            self.dispatch(Action::UserCheckSuccess).await;
            return Ok(());
        };

        match auth.check_auth(params).await {
            Ok(()) => {
                self.dispatch(Action::UserCheckSuccess).await;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "session check rejected");
                self.emit(Effect::Notify(Notification::warning(AUTH_CHECK_ERROR)));
                if let Err(e) = self.logout(Some(LOGIN_PATH)).await {
                    warn!(error = %e, "logout after failed session check failed");
                }
                Err(err.into())
            }
        }
    }

    /// Sign out, clear every cached record and redirect.
    ///
    /// The provider's target wins over `redirect_to`; the login page is
    /// the fallback.
    pub async fn logout(&self, redirect_to: Option<&str>) -> Result<(), CoreError> {
        let provider_target = match &self.inner.auth_provider {
            Some(auth) => auth.logout(Value::Null).await?,
            None => None,
        };
        let request = user_logout(redirect_to);
        let path = provider_target
            .or_else(|| request.redirect_to.clone())
            .unwrap_or_else(|| LOGIN_PATH.into());

        self.dispatch(Action::UserLogout(request)).await;
        self.inner.store.reset();
        info!(redirect = %path, "logged out");
        self.emit(Effect::Redirect { path });
        Ok(())
    }

    pub async fn get_permissions(&self, params: Value) -> Result<Value, CoreError> {
        match &self.inner.auth_provider {
            Some(auth) => Ok(auth.get_permissions(params).await?),
            None => Ok(Value::Null),
        }
    }

    pub async fn get_identity(&self) -> Result<Option<UserIdentity>, CoreError> {
        match &self.inner.auth_provider {
            Some(auth) => Ok(auth.get_identity().await?),
            None => Ok(None),
        }
    }

    async fn check_provider_error(&self, err: &adminkit_api::Error) {
        let Some(auth) = self.inner.auth_provider.clone() else {
            return;
        };
        if let Err(rejection) = auth.check_error(err).await {
            warn!(error = %rejection, "session rejected after provider error");
            self.emit(Effect::Notify(Notification::warning(NOTIFICATION_LOGGED_OUT)));
            if let Err(e) = self.logout(Some(LOGIN_PATH)).await {
                warn!(error = %e, "logout after session rejection failed");
            }
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Cancel in-flight requests and pending undo timers.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let timers: Vec<JoinHandle<()>> = self.inner.undo_timers.lock().await.drain(..).collect();
        for handle in timers {
            let _ = handle.await;
        }
        debug!("admin shut down");
    }
}

/// Store effects go to the `DataStore`; every effect is then broadcast.
impl EffectExecutor for Admin {
    fn execute(&self, effect: &Effect) -> Result<(), CoreError> {
        self.inner.store.execute(effect)?;
        if let Effect::Redirect { path } = effect {
            debug!(path = %path, "redirect");
        }
        // No subscribers is fine.
        let _ = self.inner.effects.send(Arc::new(effect.clone()));
        Ok(())
    }
}

// ── Provider dispatch ────────────────────────────────────────────────

async fn call_provider(
    provider: &dyn DataProvider,
    request: &CrudRequest,
) -> Result<ResponseData, adminkit_api::Error> {
    let resource = request.resource();
    Ok(match request.payload.clone() {
        RequestPayload::GetList(p) => ResponseData::List(provider.get_list(resource, p).await?),
        RequestPayload::GetOne(p) => ResponseData::One(provider.get_one(resource, p).await?),
        RequestPayload::GetMany(p) => ResponseData::Many(provider.get_many(resource, p).await?),
        RequestPayload::GetManyReference(p) => {
            ResponseData::ManyReference(provider.get_many_reference(resource, p).await?)
        }
        RequestPayload::Create(p) => ResponseData::Created(provider.create(resource, p).await?),
        RequestPayload::Update(p) => ResponseData::Updated(provider.update(resource, p).await?),
        RequestPayload::UpdateMany(p) => {
            ResponseData::UpdatedMany(provider.update_many(resource, p).await?)
        }
        RequestPayload::Delete(p) => ResponseData::Deleted(provider.delete(resource, p).await?),
        RequestPayload::DeleteMany(p) => {
            ResponseData::DeletedMany(provider.delete_many(resource, p).await?)
        }
    })
}

fn unexpected(data: &ResponseData) -> CoreError {
    CoreError::Internal(format!("unexpected {} response", data.verb()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::action::{ActionType, crud_create, crud_delete, crud_update};
    use adminkit_api::MemoryDataProvider;
    use serde_json::json;

    fn admin(config: AdminConfig) -> Admin {
        let provider = MemoryDataProvider::from_json(json!({
            "posts": [
                {"id": 1, "title": "Hello", "author_id": 10},
                {"id": 2, "title": "World", "author_id": [10, 11]},
            ],
            "authors": [
                {"id": 10, "name": "Ann"},
                {"id": 11, "name": "Bob"},
            ],
        }))
        .unwrap();
        Admin::new(config, Arc::new(provider))
    }

    fn drain(rx: &mut broadcast::Receiver<Arc<Action>>) -> Vec<ActionType> {
        let mut types = Vec::new();
        while let Ok(action) = rx.try_recv() {
            types.push(action.action_type());
        }
        types
    }

    #[tokio::test]
    async fn run_request_dispatches_the_full_lifecycle() {
        let admin = admin(AdminConfig::default());
        let mut rx = admin.actions();

        let request = crud_get_one("posts", 1, "/posts").unwrap();
        let settlement = admin.run_request(request).await.unwrap();
        assert!(settlement.is_success());

        assert_eq!(
            drain(&mut rx),
            vec![
                ActionType::CrudGetOne,
                ActionType::CrudGetOneLoading,
                ActionType::FetchStart,
                ActionType::FetchEnd,
                ActionType::CrudGetOneSuccess,
            ]
        );
        assert!(!admin.is_loading());
        assert!(admin.store().record("posts", &Identifier::Num(1)).is_some());
    }

    #[tokio::test]
    async fn pessimistic_failure_settles_as_failure() {
        let admin = admin(AdminConfig::default());
        let request = crud_update("posts", 99, json!({"title": "x"}), None, "/posts").unwrap();

        let MutationOutcome::Settled(settlement) = admin.mutate(request).await.unwrap() else {
            panic!("pessimistic mutations settle immediately");
        };
        assert!(!settlement.is_success());
        assert_eq!(*admin.loading().borrow(), 0);
    }

    #[tokio::test]
    async fn undoable_mutation_waits_for_complete() {
        let admin = admin(AdminConfig {
            mutation_mode: MutationMode::Undoable,
            ..AdminConfig::default()
        });
        let request = crud_delete("posts", 1, None, "/posts").unwrap();

        let MutationOutcome::Pending(token) = admin.mutate(request).await.unwrap() else {
            panic!("undoable mutations are held");
        };
        assert!(admin.is_optimistic());
        assert_eq!(admin.pending_undo_tokens().await, vec![token]);

        let settlement = admin.complete_token(token).await.unwrap();
        assert!(settlement.is_success());
        assert!(!admin.is_optimistic());
        assert!(matches!(
            admin.complete_token(token).await,
            Err(CoreError::UndoTokenUnknown { .. })
        ));
    }

    #[tokio::test]
    async fn create_through_mutate_reaches_the_provider() {
        let admin = admin(AdminConfig::default());
        let request = crud_create("posts", json!({"title": "New"}), "/posts").unwrap();
        let MutationOutcome::Settled(settlement) = admin.mutate(request).await.unwrap() else {
            panic!("settled");
        };
        let ResponseData::Created(created) = settlement.into_result().unwrap() else {
            panic!("create result");
        };
        assert_eq!(created.data.id, Identifier::Num(3));
    }

    #[tokio::test]
    async fn related_records_follow_scalar_and_array_fields() {
        let admin = admin(AdminConfig::default());
        let posts = admin
            .get_many("posts", vec![Identifier::Num(1), Identifier::Num(2)])
            .await
            .unwrap();

        let authors = admin
            .fetch_related_records(&posts, "author_id", "authors")
            .await
            .unwrap();
        assert_eq!(authors.len(), 2);
        assert_eq!(authors[&Identifier::Num(11)].field("name"), Some(json!("Bob")));
    }

    #[tokio::test]
    async fn navigation_before_request_keeps_redirect() {
        let admin = admin(AdminConfig::default());
        let mut effects = admin.effects();

        admin.navigate("/elsewhere").await;
        let request = crud_create("posts", json!({"title": "x"}), "/posts").unwrap();
        admin.mutate(request).await.unwrap();

        let mut saw_redirect = false;
        while let Ok(effect) = effects.try_recv() {
            saw_redirect |= matches!(*effect, Effect::Redirect { .. });
        }
        assert!(saw_redirect);
    }
}
