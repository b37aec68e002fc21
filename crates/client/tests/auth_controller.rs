use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::sync::Semaphore;

use erpdash_auth::catalog::{INVOICES_VIEW, ORDERS_VIEW, USERS_DELETE};
use erpdash_auth::{PermissionSnapshot, User};
use erpdash_client::{
    ApiError, AuthApi, AuthController, AuthStatus, Collaborators, Credentials, FetchKind, FetchOutcome,
    LoginError, MemoryStorage, Navigator, PermissionCheck, Routes, SessionCache,
    TokenAccessor, TokenPair, TokenStore, UnavailableStorage,
};
use erpdash_core::{Clock, ManualClock, UserId};

fn user(email: &str) -> User {
    User {
        id: UserId::new(),
        email: email.to_string(),
        phone: None,
        first_name: "Dana".into(),
        last_name: "Reyes".into(),
        is_active: true,
        roles: vec![],
    }
}

fn start() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(1_760_000_000_000).unwrap()
}

struct FakeApi {
    tokens: Arc<TokenStore>,
    user: Mutex<Result<User, ApiError>>,
    permissions: Mutex<Result<PermissionSnapshot, ApiError>>,
    login: Mutex<Result<(), ApiError>>,
    user_calls: AtomicUsize,
    permission_calls: AtomicUsize,
    logout_calls: AtomicUsize,
    /// When set, each `me`/`permissions` response waits for one permit.
    gate: Option<Arc<Semaphore>>,
    /// When set, the login response waits for one permit.
    login_gate: Option<Arc<Semaphore>>,
}

impl FakeApi {
    fn new(tokens: Arc<TokenStore>, user: User, permissions: PermissionSnapshot) -> Self {
        Self {
            tokens,
            user: Mutex::new(Ok(user)),
            permissions: Mutex::new(Ok(permissions)),
            login: Mutex::new(Ok(())),
            user_calls: AtomicUsize::new(0),
            permission_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            gate: None,
            login_gate: None,
        }
    }

    fn set_permissions(&self, permissions: Result<PermissionSnapshot, ApiError>) {
        *self.permissions.lock().unwrap() = permissions;
    }

    fn fetch_calls(&self) -> (usize, usize) {
        (
            self.user_calls.load(Ordering::SeqCst),
            self.permission_calls.load(Ordering::SeqCst),
        )
    }

    async fn wait_for_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
    }
}

#[async_trait::async_trait]
impl AuthApi for FakeApi {
    async fn current_user(&self) -> Result<User, ApiError> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_for_gate().await;
        self.user.lock().unwrap().clone()
    }

    async fn current_permissions(&self) -> Result<PermissionSnapshot, ApiError> {
        self.permission_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_for_gate().await;
        self.permissions.lock().unwrap().clone()
    }

    async fn login(&self, _credentials: &Credentials) -> Result<(), ApiError> {
        if let Some(gate) = &self.login_gate {
            gate.acquire().await.unwrap().forget();
        }
        let result = self.login.lock().unwrap().clone();
        if result.is_ok() {
            self.tokens.store(TokenPair {
                access_token: "issued-token".into(),
                refresh_token: None,
            });
        }
        result
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        self.tokens.clear();
        Err(ApiError::Network("connection reset".into()))
    }
}

#[derive(Default)]
struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    fn routes(&self) -> Vec<String> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str) {
        self.routes.lock().unwrap().push(route.to_string());
    }
}

struct Harness {
    controller: AuthController,
    api: Arc<FakeApi>,
    tokens: Arc<TokenStore>,
    storage: Arc<MemoryStorage>,
    clock: Arc<ManualClock>,
    navigator: Arc<RecordingNavigator>,
}

impl Harness {
    fn new(with_token: bool, configure: impl FnOnce(&mut FakeApi)) -> Self {
        let tokens = Arc::new(if with_token {
            TokenStore::with_access_token("existing-token")
        } else {
            TokenStore::new()
        });
        let mut api = FakeApi::new(
            tokens.clone(),
            user("fresh@example.com"),
            PermissionSnapshot::from_codes([ORDERS_VIEW, INVOICES_VIEW]),
        );
        configure(&mut api);
        let api = Arc::new(api);

        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(start()));
        let navigator = Arc::new(RecordingNavigator::default());

        let controller = AuthController::new(
            Collaborators {
                api: api.clone(),
                tokens: tokens.clone(),
                storage: storage.clone(),
                navigator: navigator.clone(),
                clock: clock.clone(),
            },
            Routes::default(),
        );

        Self {
            controller,
            api,
            tokens,
            storage,
            clock,
            navigator,
        }
    }

    fn cache(&self) -> SessionCache {
        SessionCache::new(self.storage.clone(), self.clock.clone())
    }

    fn seed_cache(&self, user: &User, permissions: &PermissionSnapshot) {
        self.cache().write(user, permissions);
    }
}

#[tokio::test]
async fn no_token_means_unauthenticated_and_no_requests() {
    let h = Harness::new(false, |_| {});

    assert!(h.controller.mount().is_none());
    assert_eq!(h.controller.status(), AuthStatus::Unauthenticated);
    assert!(!h.controller.is_authenticated());
    assert!(!h.controller.is_loading());
    assert_eq!(h.api.fetch_calls(), (0, 0));
}

#[tokio::test]
async fn fresh_cache_authenticates_synchronously_then_revalidates() {
    let h = Harness::new(true, |_| {});
    let cached_user = user("cached@example.com");
    h.seed_cache(&cached_user, &PermissionSnapshot::from_codes([ORDERS_VIEW]));

    let pending = h.controller.mount().expect("token present");
    assert_eq!(pending.kind(), FetchKind::Revalidate);
    assert!(h.controller.is_authenticated());
    assert!(!h.controller.is_loading());
    assert_eq!(h.controller.status(), AuthStatus::Revalidating);
    assert!(h.controller.has_permission(&ORDERS_VIEW));
    assert!(!h.controller.has_permission(&INVOICES_VIEW));
    assert_eq!(h.controller.user().unwrap().email, "cached@example.com");
    assert_eq!(h.api.fetch_calls(), (0, 0));

    assert_eq!(pending.run().await, FetchOutcome::Applied);
    assert_eq!(h.controller.status(), AuthStatus::Authenticated);
    assert!(h.controller.has_permission(&INVOICES_VIEW));
    assert_eq!(h.controller.user().unwrap().email, "fresh@example.com");
    assert_eq!(h.api.fetch_calls(), (1, 1));
}

#[tokio::test]
async fn stale_cache_blocks_on_fetch_and_rewrites_cache() {
    let h = Harness::new(true, |_| {});
    h.seed_cache(&user("cached@example.com"), &PermissionSnapshot::default());
    h.clock.advance(ChronoDuration::seconds(5 * 60 + 1));

    let pending = h.controller.mount().unwrap();
    assert_eq!(pending.kind(), FetchKind::Load);
    assert!(h.controller.is_loading());
    assert!(!h.controller.is_authenticated());
    assert!(h.controller.user().is_none());

    assert_eq!(pending.run().await, FetchOutcome::Applied);
    assert!(h.controller.is_authenticated());

    let entry = h.cache().read_fresh().expect("cache rewritten");
    assert_eq!(entry.user.email, "fresh@example.com");
    assert_eq!(entry.timestamp, h.clock.now());
}

#[tokio::test]
async fn partial_success_does_not_persist() {
    let h = Harness::new(true, |api| {
        api.set_permissions(Err(ApiError::Status(500, "boom".into())));
    });

    assert_eq!(h.controller.initialize().await, AuthStatus::Unauthenticated);
    assert!(h.controller.user().is_none());
    assert!(h.controller.permissions().is_none());
    assert!(h.storage.is_empty());
    assert_eq!(h.api.fetch_calls(), (1, 1));
}

#[tokio::test]
async fn failed_revalidation_signs_out() {
    let h = Harness::new(true, |api| {
        api.set_permissions(Err(ApiError::Unauthorized));
    });
    h.seed_cache(&user("cached@example.com"), &PermissionSnapshot::from_codes([ORDERS_VIEW]));

    let pending = h.controller.mount().unwrap();
    assert!(h.controller.is_authenticated());

    assert_eq!(pending.run().await, FetchOutcome::Failed);
    assert_eq!(h.controller.status(), AuthStatus::Unauthenticated);
    assert!(!h.controller.has_permission(&ORDERS_VIEW));
    assert!(h.cache().read().is_none());
}

#[tokio::test]
async fn unavailable_storage_still_loads_the_session() {
    let tokens = Arc::new(TokenStore::with_access_token("t"));
    let api = Arc::new(FakeApi::new(
        tokens.clone(),
        user("fresh@example.com"),
        PermissionSnapshot::super_admin(),
    ));
    let controller = AuthController::new(
        Collaborators {
            api: api.clone(),
            tokens,
            storage: Arc::new(UnavailableStorage),
            navigator: Arc::new(RecordingNavigator::default()),
            clock: Arc::new(ManualClock::new(start())),
        },
        Routes::default(),
    );

    assert_eq!(controller.initialize().await, AuthStatus::Authenticated);
    assert!(controller.has_permission(&USERS_DELETE));
}

#[tokio::test]
async fn logout_twice_is_harmless() {
    let h = Harness::new(true, |_| {});
    assert_eq!(h.controller.initialize().await, AuthStatus::Authenticated);
    assert!(!h.storage.is_empty());

    h.controller.logout().await;
    assert_eq!(h.controller.status(), AuthStatus::Unauthenticated);
    assert!(h.storage.is_empty());

    h.controller.logout().await;
    assert_eq!(h.controller.status(), AuthStatus::Unauthenticated);
    assert!(h.controller.user().is_none());
    assert_eq!(h.api.logout_calls.load(Ordering::SeqCst), 2);
    assert_eq!(h.navigator.routes(), vec!["/login", "/login"]);
}

#[tokio::test]
async fn logout_during_revalidation_discards_the_late_response() {
    let gate = Arc::new(Semaphore::new(0));
    let h = Harness::new(true, |api| api.gate = Some(gate.clone()));
    h.seed_cache(&user("cached@example.com"), &PermissionSnapshot::from_codes([ORDERS_VIEW]));

    let pending = h.controller.mount().unwrap();
    let revalidation = tokio::spawn(pending.run());
    tokio::task::yield_now().await;
    assert_eq!(h.api.fetch_calls(), (1, 1));

    h.controller.logout().await;
    assert_eq!(h.controller.status(), AuthStatus::Unauthenticated);

    gate.add_permits(2);
    assert_eq!(revalidation.await.unwrap(), FetchOutcome::Superseded);

    assert_eq!(h.controller.status(), AuthStatus::Unauthenticated);
    assert!(h.controller.user().is_none());
    assert!(!h.controller.has_permission(&ORDERS_VIEW));
    assert!(h.storage.is_empty(), "late response must not repopulate the cache");
}

#[tokio::test]
async fn logout_during_login_discards_the_issued_tokens() {
    let gate = Arc::new(Semaphore::new(0));
    let h = Harness::new(false, |api| api.login_gate = Some(gate.clone()));

    let controller = h.controller.clone();
    let login = tokio::spawn(async move {
        controller
            .login(&Credentials::new("fresh@example.com", "correct horse"))
            .await
    });
    tokio::task::yield_now().await;
    assert_eq!(h.controller.status(), AuthStatus::Loading);

    h.controller.logout().await;
    gate.add_permits(1);
    let result = login.await.unwrap();

    assert!(matches!(result, Err(LoginError::Superseded)));
    assert_eq!(h.controller.status(), AuthStatus::Unauthenticated);
    assert!(!h.tokens.has_token(), "tokens issued after logout must be dropped");
    assert_eq!(h.api.fetch_calls(), (0, 0));
    assert_eq!(h.api.logout_calls.load(Ordering::SeqCst), 2);
    assert!(h.storage.is_empty());
    assert_eq!(h.navigator.routes(), vec!["/login"]);
    assert!(h.controller.mount().is_none());
}

#[tokio::test]
async fn login_clears_cache_loads_session_and_redirects() {
    let h = Harness::new(false, |_| {});
    h.seed_cache(&user("someone-else@example.com"), &PermissionSnapshot::super_admin());
    assert!(h.controller.mount().is_none());

    let credentials = Credentials::new("fresh@example.com", "correct horse");
    h.controller.login(&credentials).await.unwrap();

    assert!(h.tokens.has_token());
    assert_eq!(h.controller.status(), AuthStatus::Authenticated);
    assert_eq!(h.controller.user().unwrap().email, "fresh@example.com");
    assert!(!h.controller.has_permission(&USERS_DELETE));
    assert_eq!(h.cache().read().unwrap().user.email, "fresh@example.com");
    assert_eq!(h.navigator.routes(), vec!["/"]);
}

#[tokio::test]
async fn rejected_login_stays_signed_out() {
    let h = Harness::new(false, |api| {
        *api.login.get_mut().unwrap() = Err(ApiError::Unauthorized);
    });

    let err = h
        .controller
        .login(&Credentials::new("fresh@example.com", "wrong"))
        .await
        .unwrap_err();

    assert_eq!(err, LoginError::Rejected(ApiError::Unauthorized));
    assert_eq!(h.controller.status(), AuthStatus::Unauthenticated);
    assert_eq!(h.api.fetch_calls(), (0, 0));
    assert!(h.navigator.routes().is_empty());
}

#[tokio::test]
async fn login_with_unloadable_session_reports_it() {
    let h = Harness::new(false, |api| {
        api.set_permissions(Err(ApiError::Decode("missing field".into())));
    });

    let err = h
        .controller
        .login(&Credentials::new("fresh@example.com", "pw"))
        .await
        .unwrap_err();

    assert_eq!(err, LoginError::SessionUnavailable);
    assert!(!h.controller.is_authenticated());
    assert!(h.navigator.routes().is_empty());
}

#[tokio::test]
async fn refresh_user_ignores_a_fresh_cache() {
    let h = Harness::new(true, |_| {});
    assert_eq!(h.controller.initialize().await, AuthStatus::Authenticated);
    assert!(!h.controller.has_permission(&USERS_DELETE));

    h.api.set_permissions(Ok(PermissionSnapshot::from_codes([USERS_DELETE])));
    assert_eq!(h.controller.refresh_user().await, FetchOutcome::Applied);

    assert!(h.controller.has_permission(&USERS_DELETE));
    assert!(!h.controller.has_permission(&ORDERS_VIEW));
    assert_eq!(h.api.fetch_calls(), (2, 2));
    assert!(h.cache().read().unwrap().permissions.has_permission(&USERS_DELETE));
}

#[tokio::test]
async fn refresh_keeps_current_data_visible_while_in_flight() {
    let gate = Arc::new(Semaphore::new(2));
    let h = Harness::new(true, |api| api.gate = Some(gate.clone()));
    assert_eq!(h.controller.initialize().await, AuthStatus::Authenticated);

    let controller = h.controller.clone();
    let refresh = tokio::spawn(async move { controller.refresh_user().await });
    tokio::task::yield_now().await;

    assert_eq!(h.controller.status(), AuthStatus::Revalidating);
    assert!(h.controller.is_authenticated());
    assert!(h.controller.has_permission(&ORDERS_VIEW));

    gate.add_permits(2);
    assert_eq!(refresh.await.unwrap(), FetchOutcome::Applied);
    assert_eq!(h.controller.status(), AuthStatus::Authenticated);
}

#[tokio::test]
async fn refresh_without_token_signs_out_without_requests() {
    let h = Harness::new(false, |_| {});
    assert_eq!(h.controller.refresh_user().await, FetchOutcome::Failed);
    assert_eq!(h.controller.status(), AuthStatus::Unauthenticated);
    assert_eq!(h.api.fetch_calls(), (0, 0));
}

#[tokio::test]
async fn listeners_see_every_transition() {
    let h = Harness::new(true, |_| {});
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    h.controller.subscribe(move |status| sink.lock().unwrap().push(status));

    h.controller.initialize().await;
    h.controller.logout().await;

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            AuthStatus::Loading,
            AuthStatus::Authenticated,
            AuthStatus::Unauthenticated
        ]
    );
}

#[tokio::test]
async fn predicates_are_false_before_anything_loads() {
    let h = Harness::new(true, |_| {});

    assert!(!h.controller.has_permission(&ORDERS_VIEW));
    assert!(!h.controller.has_any_permission(&[ORDERS_VIEW, INVOICES_VIEW]));
    assert!(!h.controller.has_all_permissions(&[]));

    h.controller.initialize().await;
    assert!(h.controller.has_any_permission(&[USERS_DELETE, ORDERS_VIEW]));
    assert!(h.controller.has_all_permissions(&[ORDERS_VIEW, INVOICES_VIEW]));
    assert!(!h.controller.has_all_permissions(&[ORDERS_VIEW, USERS_DELETE]));
}

#[tokio::test]
async fn super_admin_snapshot_grants_everything() {
    let h = Harness::new(true, |api| {
        api.set_permissions(Ok(PermissionSnapshot::super_admin()));
    });
    h.controller.initialize().await;

    assert!(h.controller.has_permission(&USERS_DELETE));
    assert!(h.controller.has_all_permissions(&[USERS_DELETE, ORDERS_VIEW, INVOICES_VIEW]));
    assert!(h.controller.snapshot().has_permission(&USERS_DELETE));
}
