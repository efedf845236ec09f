#![allow(clippy::unwrap_used)]

// Integration tests for the Admin runtime: mutation modes, undo windows,
// cancellation, overlapping requests and auth.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use adminkit_api::params::{
    CreateParams, CreateResult, DeleteManyParams, DeleteManyResult, DeleteParams, DeleteResult,
    GetListParams, GetListResult, GetManyParams, GetManyReferenceParams, GetManyReferenceResult,
    GetManyResult, GetOneParams, GetOneResult, UpdateManyParams, UpdateManyResult, UpdateParams,
    UpdateResult,
};
use adminkit_api::{
    DataProvider, Error, Identifier, MemoryAuthProvider, MemoryDataProvider,
};
use adminkit_core::action::auth::{AUTH_SIGN_IN_ERROR, NOTIFICATION_LOGGED_OUT};
use adminkit_core::{
    ActionType, Admin, AdminConfig, CoreError, Effect, MutationMode, MutationOutcome,
    crud_create, crud_delete, crud_get_list, crud_get_one, crud_update,
};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use tokio::sync::broadcast;

// ── Scripted provider ───────────────────────────────────────────────

/// Memory provider with an optional delay and injected write failures.
struct ScriptedProvider {
    inner: MemoryDataProvider,
    delay: Duration,
    fail_writes_with: Option<u16>,
    fail_reads_with: Option<u16>,
    writes: AtomicUsize,
}

impl ScriptedProvider {
    fn new() -> Self {
        let inner = MemoryDataProvider::from_json(json!({
            "posts": [
                {"id": 1, "title": "Hello"},
                {"id": 2, "title": "World"},
            ],
        }))
        .unwrap();
        Self {
            inner,
            delay: Duration::ZERO,
            fail_writes_with: None,
            fail_reads_with: None,
            writes: AtomicUsize::new(0),
        }
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn failing_writes(mut self, status: u16) -> Self {
        self.fail_writes_with = Some(status);
        self
    }

    fn failing_reads(mut self, status: u16) -> Self {
        self.fail_reads_with = Some(status);
        self
    }

    fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    async fn read(&self) -> Result<(), Error> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.fail_reads_with {
            Some(status) => Err(http(status)),
            None => Ok(()),
        }
    }

    async fn write(&self) -> Result<(), Error> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.fail_writes_with {
            Some(status) => Err(http(status)),
            None => Ok(()),
        }
    }
}

fn http(status: u16) -> Error {
    Error::Http {
        status,
        message: "scripted failure".into(),
        body: None,
    }
}

#[async_trait]
impl DataProvider for ScriptedProvider {
    async fn get_list(&self, resource: &str, params: GetListParams) -> Result<GetListResult, Error> {
        self.read().await?;
        self.inner.get_list(resource, params).await
    }

    async fn get_one(&self, resource: &str, params: GetOneParams) -> Result<GetOneResult, Error> {
        self.read().await?;
        self.inner.get_one(resource, params).await
    }

    async fn get_many(&self, resource: &str, params: GetManyParams) -> Result<GetManyResult, Error> {
        self.read().await?;
        self.inner.get_many(resource, params).await
    }

    async fn get_many_reference(
        &self,
        resource: &str,
        params: GetManyReferenceParams,
    ) -> Result<GetManyReferenceResult, Error> {
        self.read().await?;
        self.inner.get_many_reference(resource, params).await
    }

    async fn update(&self, resource: &str, params: UpdateParams) -> Result<UpdateResult, Error> {
        self.write().await?;
        self.inner.update(resource, params).await
    }

    async fn update_many(
        &self,
        resource: &str,
        params: UpdateManyParams,
    ) -> Result<UpdateManyResult, Error> {
        self.write().await?;
        self.inner.update_many(resource, params).await
    }

    async fn create(&self, resource: &str, params: CreateParams) -> Result<CreateResult, Error> {
        self.write().await?;
        self.inner.create(resource, params).await
    }

    async fn delete(&self, resource: &str, params: DeleteParams) -> Result<DeleteResult, Error> {
        self.write().await?;
        self.inner.delete(resource, params).await
    }

    async fn delete_many(
        &self,
        resource: &str,
        params: DeleteManyParams,
    ) -> Result<DeleteManyResult, Error> {
        self.write().await?;
        self.inner.delete_many(resource, params).await
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn admin_with(provider: ScriptedProvider, mode: MutationMode) -> (Admin, Arc<ScriptedProvider>) {
    let provider = Arc::new(provider);
    let config = AdminConfig {
        mutation_mode: mode,
        ..AdminConfig::default()
    };
    (Admin::new(config, provider.clone()), provider)
}

async fn load_posts(admin: &Admin) {
    let request = crud_get_list(
        "posts",
        Default::default(),
        Default::default(),
        Default::default(),
    )
    .unwrap();
    assert!(admin.run_request(request).await.unwrap().is_success());
}

fn title(admin: &Admin, id: i64) -> Option<serde_json::Value> {
    admin
        .store()
        .record("posts", &Identifier::Num(id))
        .and_then(|r| r.field("title"))
}

fn drain_effects(rx: &mut broadcast::Receiver<Arc<Effect>>) -> Vec<Effect> {
    let mut effects = Vec::new();
    while let Ok(effect) = rx.try_recv() {
        effects.push((*effect).clone());
    }
    effects
}

fn drain_actions(rx: &mut broadcast::Receiver<Arc<adminkit_core::Action>>) -> Vec<ActionType> {
    let mut types = Vec::new();
    while let Ok(action) = rx.try_recv() {
        types.push(action.action_type());
    }
    types
}

// ── Mutation modes ──────────────────────────────────────────────────

#[tokio::test]
async fn optimistic_failure_rolls_back_the_store() {
    let (admin, provider) = admin_with(ScriptedProvider::new().failing_writes(500), MutationMode::Optimistic);
    load_posts(&admin).await;
    let mut effects = admin.effects();

    let request = crud_update("posts", 1, json!({"title": "Changed"}), None, "/posts").unwrap();
    let MutationOutcome::Settled(settlement) = admin.mutate(request).await.unwrap() else {
        panic!("optimistic mutations settle");
    };

    assert!(!settlement.is_success());
    assert_eq!(provider.writes(), 1);
    assert_eq!(title(&admin, 1), Some(json!("Hello")));
    let effects = drain_effects(&mut effects);
    assert!(matches!(effects[0], Effect::Rollback { .. }));
    assert!(effects.iter().any(|e| matches!(e, Effect::Notify(n) if n.body == "notification.http_error")));
}

#[tokio::test]
async fn optimistic_success_keeps_the_local_write() {
    let (admin, _provider) = admin_with(ScriptedProvider::new(), MutationMode::Optimistic);
    load_posts(&admin).await;

    let request = crud_delete("posts", 2, None, "/posts").unwrap();
    admin.mutate(request).await.unwrap();

    assert_eq!(title(&admin, 2), None);
    assert_eq!(admin.store().list_state("posts").total, 1);
}

#[tokio::test]
async fn undo_discards_without_calling_the_provider() {
    let (admin, provider) = admin_with(ScriptedProvider::new(), MutationMode::Undoable);
    load_posts(&admin).await;
    let mut effects = admin.effects();

    let request = crud_update("posts", 1, json!({"title": "Changed"}), None, "/posts").unwrap();
    let MutationOutcome::Pending(token) = admin.mutate(request).await.unwrap() else {
        panic!("undoable mutations are held");
    };
    // Shown locally and announced while the window is open.
    assert_eq!(title(&admin, 1), Some(json!("Changed")));
    let shown = drain_effects(&mut effects);
    assert!(matches!(&shown[..], [Effect::Notify(n)] if n.undoable));

    let discarded = admin.undo().await;
    assert_eq!(discarded.len(), 1);
    assert_eq!(discarded[0].token, token);
    assert_eq!(provider.writes(), 0);
    assert_eq!(title(&admin, 1), Some(json!("Hello")));
    assert!(!admin.is_optimistic());
}

#[tokio::test]
async fn complete_releases_once_without_a_second_notification() {
    let (admin, provider) = admin_with(ScriptedProvider::new(), MutationMode::Undoable);
    load_posts(&admin).await;

    let request = crud_delete("posts", 1, None, "/posts").unwrap();
    admin.mutate(request).await.unwrap();
    let mut effects = admin.effects();

    let settled = admin.complete().await;
    assert_eq!(settled.len(), 1);
    assert!(settled[0].as_ref().unwrap().is_success());
    assert_eq!(provider.writes(), 1);

    let effects = drain_effects(&mut effects);
    assert!(!effects.iter().any(|e| matches!(e, Effect::Notify(_))));
    assert!(effects.iter().any(|e| matches!(e, Effect::Redirect { path } if path == "/posts")));

    // Nothing left to release.
    assert!(admin.complete().await.is_empty());
    assert_eq!(provider.writes(), 1);
}

#[tokio::test]
async fn token_targeted_undo_leaves_other_mutations_pending() {
    let (admin, provider) = admin_with(ScriptedProvider::new(), MutationMode::Undoable);
    load_posts(&admin).await;

    let MutationOutcome::Pending(first) = admin
        .mutate(crud_delete("posts", 1, None, "/posts").unwrap())
        .await
        .unwrap()
    else {
        panic!("held");
    };
    let MutationOutcome::Pending(second) = admin
        .mutate(crud_delete("posts", 2, None, "/posts").unwrap())
        .await
        .unwrap()
    else {
        panic!("held");
    };

    admin.undo_token(first).await.unwrap();
    assert_eq!(admin.pending_undo_tokens().await, vec![second]);
    assert_eq!(title(&admin, 1), Some(json!("Hello")));
    assert!(admin.is_optimistic());

    admin.complete_token(second).await.unwrap();
    assert_eq!(provider.writes(), 1);
    assert_eq!(title(&admin, 2), None);
    assert!(matches!(
        admin.undo_token(first).await,
        Err(CoreError::UndoTokenUnknown { .. })
    ));
}

fn held_out_of_store(provider: ScriptedProvider) -> (Admin, Arc<ScriptedProvider>) {
    let provider = Arc::new(provider);
    let config = AdminConfig {
        mutation_mode: MutationMode::Undoable,
        undoable_optimistic: false,
        ..AdminConfig::default()
    };
    (Admin::new(config, provider.clone()), provider)
}

#[tokio::test]
async fn held_mutation_leaves_the_store_alone_until_completed() {
    let (admin, provider) = held_out_of_store(ScriptedProvider::new());
    load_posts(&admin).await;

    let previous = admin.store().record("posts", &Identifier::Num(1)).unwrap();
    let request = crud_update(
        "posts",
        1,
        json!({"title": "Changed"}),
        Some(adminkit_api::Record::clone(&previous)),
        "/posts",
    )
    .unwrap();
    assert!(matches!(admin.mutate(request).await.unwrap(), MutationOutcome::Pending(_)));
    assert_eq!(title(&admin, 1), Some(json!("Hello")));
    assert!(!admin.is_optimistic());

    assert_eq!(admin.undo().await.len(), 1);
    assert_eq!(title(&admin, 1), Some(json!("Hello")));
    assert_eq!(provider.writes(), 0);

    let request = crud_update("posts", 1, json!({"title": "Changed"}), None, "/posts").unwrap();
    admin.mutate(request).await.unwrap();
    assert_eq!(title(&admin, 1), Some(json!("Hello")));

    let settled = admin.complete().await;
    assert!(settled[0].as_ref().unwrap().is_success());
    assert_eq!(provider.writes(), 1);
    assert_eq!(title(&admin, 1), Some(json!("Changed")));
}

#[tokio::test]
async fn undo_never_writes_previous_data_into_the_store() {
    let (admin, _provider) = held_out_of_store(ScriptedProvider::new());
    let stale = adminkit_api::Record::new(5).with("title", "stale copy");

    admin
        .mutate(crud_delete("posts", 5, Some(stale.clone()), "/posts").unwrap())
        .await
        .unwrap();
    admin.undo().await;
    assert!(admin.store().record("posts", &Identifier::Num(5)).is_none());

    // A failed commit has nothing to roll back either.
    admin
        .mutate(crud_delete("posts", 5, Some(stale), "/posts").unwrap())
        .await
        .unwrap();
    let settled = admin.complete().await;
    assert!(!settled[0].as_ref().unwrap().is_success());
    assert!(admin.store().record("posts", &Identifier::Num(5)).is_none());
    assert_eq!(admin.store().record_count("posts"), 0);
}

#[tokio::test]
async fn failed_pessimistic_write_leaves_the_cache_unchanged() {
    let (admin, _provider) = admin_with(ScriptedProvider::new().failing_writes(500), MutationMode::Pessimistic);
    let stale = adminkit_api::Record::new(1).with("title", "stale copy");

    let request = crud_update("posts", 1, json!({"title": "Changed"}), Some(stale), "/posts").unwrap();
    let MutationOutcome::Settled(settlement) = admin.mutate(request).await.unwrap() else {
        panic!("pessimistic mutations settle");
    };
    assert!(!settlement.is_success());
    assert!(admin.store().record("posts", &Identifier::Num(1)).is_none());
}

#[tokio::test(start_paused = true)]
async fn undo_timeout_completes_automatically() {
    let provider = Arc::new(ScriptedProvider::new());
    let config = AdminConfig {
        mutation_mode: MutationMode::Undoable,
        undo_timeout: Some(Duration::from_secs(5)),
        ..AdminConfig::default()
    };
    let admin = Admin::new(config, provider.clone());

    admin
        .mutate(crud_delete("posts", 1, None, "/posts").unwrap())
        .await
        .unwrap();
    assert_eq!(provider.writes(), 0);

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(provider.writes(), 1);
    assert!(admin.pending_undo_tokens().await.is_empty());
    admin.shutdown().await;
}

// ── Fetch accounting ────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn cancelled_request_ignores_its_late_response() {
    let (admin, _provider) = admin_with(
        ScriptedProvider::new().delayed(Duration::from_secs(1)),
        MutationMode::Pessimistic,
    );
    let mut actions = admin.actions();

    let pending = admin.spawn_request(crud_get_one("posts", 1, "/posts").unwrap());
    admin.loading().wait_for(|count| *count == 1).await.unwrap();
    pending.cancel();

    assert_eq!(pending.wait().await.unwrap(), None);
    assert!(!admin.is_loading());
    assert!(admin.store().record("posts", &Identifier::Num(1)).is_none());

    let types = drain_actions(&mut actions);
    assert!(types.contains(&ActionType::FetchCancel));
    assert!(!types.contains(&ActionType::CrudGetOneSuccess));
    assert!(!types.contains(&ActionType::FetchEnd));
}

#[tokio::test(start_paused = true)]
async fn overlapping_requests_return_to_idle() {
    let (admin, _provider) = admin_with(
        ScriptedProvider::new().delayed(Duration::from_millis(100)),
        MutationMode::Pessimistic,
    );

    let requests: Vec<_> = [1, 2, 99]
        .into_iter()
        .map(|id| admin.spawn_request(crud_get_one("posts", id, "/posts").unwrap()))
        .collect();
    admin.loading().wait_for(|count| *count == 3).await.unwrap();
    assert!(admin.is_loading());

    let mut successes = 0;
    for request in requests {
        if request.wait().await.unwrap().unwrap().is_success() {
            successes += 1;
        }
    }
    assert_eq!(successes, 2);
    assert_eq!(*admin.loading().borrow(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_publish_a_final_idle_count() {
    let (admin, _provider) = admin_with(ScriptedProvider::new(), MutationMode::Pessimistic);

    for _ in 0..50 {
        let requests: Vec<_> = (0..8_i64)
            .map(|i| admin.spawn_request(crud_get_one("posts", 1 + i % 2, "/posts").unwrap()))
            .collect();
        for request in requests {
            request.wait().await.unwrap();
        }
        assert_eq!(*admin.loading().borrow(), 0);
        assert!(!admin.is_loading());
    }
}

#[tokio::test(start_paused = true)]
async fn navigation_while_in_flight_skips_the_redirect() {
    let (admin, _provider) = admin_with(
        ScriptedProvider::new().delayed(Duration::from_millis(100)),
        MutationMode::Pessimistic,
    );
    let mut effects = admin.effects();

    let pending = admin.spawn_request(crud_create("posts", json!({"title": "New"}), "/posts").unwrap());
    admin.loading().wait_for(|count| *count == 1).await.unwrap();
    admin.navigate("/comments").await;

    let settlement = pending.wait().await.unwrap().unwrap();
    assert!(settlement.is_success());

    let effects = drain_effects(&mut effects);
    assert!(effects.iter().any(|e| matches!(e, Effect::Notify(_))));
    assert!(!effects.iter().any(|e| matches!(e, Effect::Redirect { .. })));
}

// ── Auth ────────────────────────────────────────────────────────────

fn auth() -> Arc<MemoryAuthProvider> {
    Arc::new(MemoryAuthProvider::new(
        "admin",
        SecretString::from("s3cret".to_string()),
    ))
}

#[tokio::test]
async fn login_redirects_back_and_failure_notifies() {
    let admin = Admin::with_auth(
        AdminConfig::default(),
        Arc::new(ScriptedProvider::new()),
        auth(),
    );
    let mut effects = admin.effects();

    assert!(
        admin
            .login(json!({"username": "admin", "password": "wrong"}), None)
            .await
            .is_err()
    );
    admin
        .login(json!({"username": "admin", "password": "s3cret"}), Some("/posts"))
        .await
        .unwrap();

    let effects = drain_effects(&mut effects);
    assert_eq!(effects.len(), 2);
    assert!(matches!(&effects[0], Effect::Notify(n) if n.body == AUTH_SIGN_IN_ERROR));
    assert_eq!(effects[1], Effect::Redirect { path: "/posts".into() });
}

#[tokio::test]
async fn auth_failure_from_provider_logs_out() {
    let auth = auth();
    let admin = Admin::with_auth(
        AdminConfig::default(),
        Arc::new(ScriptedProvider::new()),
        auth.clone(),
    );
    admin
        .login(json!({"username": "admin", "password": "s3cret"}), None)
        .await
        .unwrap();
    load_posts(&admin).await;

    // Swap in a provider whose reads are rejected with 401.
    let rejecting = Admin::with_auth(
        AdminConfig::default(),
        Arc::new(ScriptedProvider::new().failing_reads(401)),
        auth.clone(),
    );
    let mut effects = rejecting.effects();
    let settlement = rejecting
        .run_request(crud_get_one("posts", 1, "/posts").unwrap())
        .await
        .unwrap();
    assert!(!settlement.is_success());
    assert!(!auth.is_signed_in());

    let effects = drain_effects(&mut effects);
    assert!(effects.iter().any(|e| matches!(e, Effect::Notify(n) if n.body == NOTIFICATION_LOGGED_OUT)));
    assert_eq!(effects.last(), Some(&Effect::Redirect { path: "/login".into() }));
}

#[tokio::test]
async fn failed_session_check_clears_the_store() {
    let admin = Admin::with_auth(
        AdminConfig::default(),
        Arc::new(ScriptedProvider::new()),
        auth(),
    );
    load_posts(&admin).await;
    assert_eq!(admin.store().record_count("posts"), 2);

    assert!(admin.check_auth(json!({}), Some("/posts")).await.is_err());
    assert_eq!(admin.store().record_count("posts"), 0);
}
