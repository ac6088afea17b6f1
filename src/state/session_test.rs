use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use futures::channel::oneshot;
use futures::executor::{LocalPool, block_on};
use futures::task::LocalSpawnExt;

use super::*;
use crate::net::types::User;
use crate::util::token_storage::MemoryTokenStore;

type Reply<T> = oneshot::Receiver<Result<T, ApiError>>;
type Session = SessionManager<FakeApi, MemoryTokenStore>;

fn ready<T>(result: Result<T, ApiError>) -> Reply<T> {
    let (tx, rx) = oneshot::channel();
    let _ = tx.send(result);
    rx
}

/// Scripted auth endpoints. Replies are queued per endpoint and may be
/// deferred so tests control when a call resolves.
#[derive(Clone, Default)]
struct FakeApi {
    inner: Rc<FakeApiInner>,
}

#[derive(Default)]
struct FakeApiInner {
    login: RefCell<VecDeque<Reply<AuthResponse>>>,
    register: RefCell<VecDeque<Reply<AuthResponse>>>,
    logout: RefCell<VecDeque<Reply<()>>>,
    current_user: RefCell<VecDeque<Reply<User>>>,
    calls: RefCell<Vec<String>>,
}

impl FakeApi {
    fn on_login(&self, result: Result<AuthResponse, ApiError>) {
        self.inner.login.borrow_mut().push_back(ready(result));
    }

    fn on_register(&self, result: Result<AuthResponse, ApiError>) {
        self.inner.register.borrow_mut().push_back(ready(result));
    }

    fn on_logout(&self, result: Result<(), ApiError>) {
        self.inner.logout.borrow_mut().push_back(ready(result));
    }

    fn on_current_user(&self, result: Result<User, ApiError>) {
        self.inner.current_user.borrow_mut().push_back(ready(result));
    }

    fn defer_current_user(&self) -> oneshot::Sender<Result<User, ApiError>> {
        let (tx, rx) = oneshot::channel();
        self.inner.current_user.borrow_mut().push_back(rx);
        tx
    }

    fn defer_login(&self) -> oneshot::Sender<Result<AuthResponse, ApiError>> {
        let (tx, rx) = oneshot::channel();
        self.inner.login.borrow_mut().push_back(rx);
        tx
    }

    fn calls(&self) -> Vec<String> {
        self.inner.calls.borrow().clone()
    }

    fn record(&self, call: String) {
        self.inner.calls.borrow_mut().push(call);
    }
}

async fn settle<T>(queue: &RefCell<VecDeque<Reply<T>>>, endpoint: &str) -> Result<T, ApiError> {
    let reply = queue
        .borrow_mut()
        .pop_front()
        .unwrap_or_else(|| panic!("unexpected {endpoint} call"));
    reply
        .await
        .unwrap_or_else(|_| Err(ApiError::Transport("reply dropped".to_owned())))
}

impl AuthApi for FakeApi {
    async fn login(&self, payload: &LoginPayload) -> Result<AuthResponse, ApiError> {
        self.record(format!("login {}", serde_json::to_string(payload).unwrap()));
        settle(&self.inner.login, "login").await
    }

    async fn register(&self, payload: &RegisterPayload) -> Result<AuthResponse, ApiError> {
        self.record(format!("register {}", payload.username));
        settle(&self.inner.register, "register").await
    }

    async fn logout(&self, token: &str) -> Result<(), ApiError> {
        self.record(format!("logout {token}"));
        settle(&self.inner.logout, "logout").await
    }

    async fn current_user(&self, token: &str) -> Result<User, ApiError> {
        self.record(format!("current_user {token}"));
        settle(&self.inner.current_user, "current_user").await
    }
}

fn user(name: &str) -> User {
    User { username: name.to_owned(), email: None }
}

fn key(token: &str) -> AuthResponse {
    AuthResponse { key: token.to_owned() }
}

fn rejected(message: &str) -> ApiError {
    ApiError::Status { status: 400, message: message.to_owned() }
}

fn credentials() -> LoginPayload {
    LoginPayload::from_identifier("bob", "pw")
}

fn registration() -> RegisterPayload {
    RegisterPayload {
        username: "alice".to_owned(),
        email: "alice@mail.com".to_owned(),
        password1: "123456".to_owned(),
        password2: "123456".to_owned(),
    }
}

fn session_with(store: MemoryTokenStore) -> (Session, FakeApi, MemoryTokenStore) {
    let api = FakeApi::default();
    let session = SessionManager::new(api.clone(), store.clone());
    (session, api, store)
}

fn spawn_restore(pool: &LocalPool, session: &Session) {
    let session = session.clone();
    pool.spawner()
        .spawn_local(async move { session.restore().await })
        .unwrap();
}

// =============================================================
// restore
// =============================================================

#[test]
fn new_session_without_stored_token_is_idle() {
    let (session, _api, _store) = session_with(MemoryTokenStore::default());
    assert_eq!(session.state(), AuthState::default());
}

#[test]
fn new_session_with_stored_token_starts_loading() {
    let (session, _api, _store) = session_with(MemoryTokenStore::with_token("T"));
    let state = session.state();
    assert_eq!(state.token.as_deref(), Some("T"));
    assert!(state.loading);
    assert!(state.user.is_none());
}

#[test]
fn restore_without_token_settles_immediately() {
    let (session, api, _store) = session_with(MemoryTokenStore::default());

    block_on(session.restore());

    assert_eq!(session.state(), AuthState::default());
    assert!(api.calls().is_empty());
}

#[test]
fn restore_with_valid_token_loads_user() {
    let (session, api, store) = session_with(MemoryTokenStore::with_token("T"));
    api.on_current_user(Ok(user("alice")));

    block_on(session.restore());

    assert_eq!(
        session.state(),
        AuthState { token: Some("T".to_owned()), user: Some(user("alice")), loading: false, error: None }
    );
    assert_eq!(store.peek().as_deref(), Some("T"));
    assert_eq!(api.calls(), vec!["current_user T".to_owned()]);
}

#[test]
fn restore_failure_clears_token_without_reporting_error() {
    let (session, api, store) = session_with(MemoryTokenStore::with_token("T"));
    api.on_current_user(Err(rejected("Invalid token.")));

    block_on(session.restore());

    assert_eq!(session.state(), AuthState::default());
    assert_eq!(store.peek(), None);
}

#[test]
fn restore_resolving_after_dispose_is_discarded() {
    let (session, api, store) = session_with(MemoryTokenStore::with_token("T"));
    let reply = api.defer_current_user();
    let mut pool = LocalPool::new();

    spawn_restore(&pool, &session);
    pool.run_until_stalled();
    let before = session.state();
    assert!(before.loading);

    session.dispose();
    reply.send(Err(rejected("Invalid token."))).unwrap();
    pool.run_until_stalled();

    assert_eq!(session.state(), before);
    assert_eq!(store.peek().as_deref(), Some("T"));
}

#[test]
fn newer_restore_supersedes_older_one() {
    let (session, api, _store) = session_with(MemoryTokenStore::with_token("T"));
    let slow = api.defer_current_user();
    api.on_current_user(Ok(user("bob")));
    let mut pool = LocalPool::new();

    spawn_restore(&pool, &session);
    pool.run_until_stalled();
    spawn_restore(&pool, &session);
    pool.run_until_stalled();
    assert_eq!(session.state().user, Some(user("bob")));

    slow.send(Ok(user("alice"))).unwrap();
    pool.run_until_stalled();

    let state = session.state();
    assert_eq!(state.user, Some(user("bob")));
    assert!(!state.loading);
}

#[test]
fn stale_restore_failure_does_not_clobber_fresh_login() {
    let (session, api, store) = session_with(MemoryTokenStore::with_token("T"));
    let slow = api.defer_current_user();
    let mut pool = LocalPool::new();

    spawn_restore(&pool, &session);
    pool.run_until_stalled();

    api.on_login(Ok(key("L")));
    api.on_current_user(Ok(user("bob")));
    pool.run_until(session.login(credentials())).unwrap();

    slow.send(Err(rejected("Invalid token."))).unwrap();
    pool.run_until_stalled();

    let state = session.state();
    assert_eq!(state.token.as_deref(), Some("L"));
    assert_eq!(state.user, Some(user("bob")));
    assert_eq!(store.peek().as_deref(), Some("L"));
}

// =============================================================
// login
// =============================================================

#[test]
fn login_success_persists_token_and_loads_user() {
    let (session, api, store) = session_with(MemoryTokenStore::default());
    api.on_login(Ok(key("abc")));
    api.on_current_user(Ok(user("bob")));

    block_on(session.login(credentials())).unwrap();

    assert_eq!(
        session.state(),
        AuthState { token: Some("abc".to_owned()), user: Some(user("bob")), loading: false, error: None }
    );
    assert_eq!(store.peek().as_deref(), Some("abc"));
    assert_eq!(
        api.calls(),
        vec![r#"login {"username":"bob","password":"pw"}"#.to_owned(), "current_user abc".to_owned()]
    );
}

#[test]
fn login_rejection_records_error_and_propagates() {
    let (session, api, store) = session_with(MemoryTokenStore::default());
    api.on_login(Err(rejected("fail")));

    let err = block_on(session.login(credentials())).unwrap_err();

    assert_eq!(err.to_string(), "fail");
    let state = session.state();
    assert!(state.user.is_none());
    assert!(state.token.is_none());
    assert!(!state.loading);
    assert_eq!(state.error.as_deref(), Some("fail"));
    assert_eq!(store.peek(), None);
}

#[test]
fn login_plain_text_rejection_surfaces_verbatim() {
    let (session, api, _store) = session_with(MemoryTokenStore::default());
    api.on_login(Err(ApiError::from_status(500, "server down")));

    let err = block_on(session.login(credentials())).unwrap_err();

    assert_eq!(err.to_string(), "server down");
    assert_eq!(session.state().error.as_deref(), Some("server down"));
}

#[test]
fn login_profile_lookup_failure_rolls_back_token() {
    let (session, api, store) = session_with(MemoryTokenStore::default());
    api.on_login(Ok(key("abc")));
    api.on_current_user(Err(ApiError::Transport("offline".to_owned())));

    let err = block_on(session.login(credentials())).unwrap_err();

    assert!(matches!(err, ApiError::Transport(_)));
    let state = session.state();
    assert!(state.token.is_none());
    assert!(state.user.is_none());
    assert_eq!(state.error, Some(err.to_string()));
    assert_eq!(store.peek(), None);
}

#[test]
fn login_failure_while_authenticated_signs_out() {
    let (session, api, store) = session_with(MemoryTokenStore::with_token("T"));
    api.on_current_user(Ok(user("alice")));
    block_on(session.restore());
    api.on_login(Err(rejected("fail")));

    let _ = block_on(session.login(credentials()));

    let state = session.state();
    assert!(state.token.is_none());
    assert!(state.user.is_none());
    assert_eq!(store.peek(), None);
}

#[test]
fn login_clears_previous_error_and_sets_loading_while_pending() {
    let (session, api, _store) = session_with(MemoryTokenStore::default());
    api.on_login(Err(rejected("fail")));
    let _ = block_on(session.login(credentials()));
    assert!(session.state().error.is_some());

    let reply = api.defer_login();
    api.on_current_user(Ok(user("bob")));
    let mut pool = LocalPool::new();
    let pending = session.clone();
    pool.spawner()
        .spawn_local(async move {
            let _ = pending.login(credentials()).await;
        })
        .unwrap();
    pool.run_until_stalled();

    let state = session.state();
    assert!(state.error.is_none());
    assert!(state.loading);

    reply.send(Ok(key("abc"))).unwrap();
    pool.run_until_stalled();
    assert!(!session.state().loading);
    assert_eq!(session.state().user, Some(user("bob")));
}

fn spawn_login(pool: &LocalPool, session: &Session) {
    let session = session.clone();
    pool.spawner()
        .spawn_local(async move {
            let _ = session.login(credentials()).await;
        })
        .unwrap();
}

#[test]
fn profile_arriving_after_logout_is_dropped() {
    let (session, api, store) = session_with(MemoryTokenStore::default());
    api.on_login(Ok(key("A")));
    let profile = api.defer_current_user();
    let mut pool = LocalPool::new();

    spawn_login(&pool, &session);
    pool.run_until_stalled();
    assert_eq!(session.state().token.as_deref(), Some("A"));

    api.on_logout(Ok(()));
    pool.run_until(session.logout());

    profile.send(Ok(user("bob"))).unwrap();
    pool.run_until_stalled();

    let state = session.state();
    assert_eq!(state.token, None);
    assert_eq!(state.user, None);
    assert_eq!(store.peek(), None);
}

#[test]
fn profile_for_replaced_token_is_dropped() {
    let (session, api, store) = session_with(MemoryTokenStore::default());
    api.on_login(Ok(key("A")));
    api.on_login(Ok(key("B")));
    let slow = api.defer_current_user();
    api.on_current_user(Ok(user("alice")));
    let mut pool = LocalPool::new();

    spawn_login(&pool, &session);
    pool.run_until_stalled();
    pool.run_until(session.login(credentials())).unwrap();

    slow.send(Ok(user("bob"))).unwrap();
    pool.run_until_stalled();

    let state = session.state();
    assert_eq!(state.token.as_deref(), Some("B"));
    assert_eq!(state.user, Some(user("alice")));
    assert_eq!(store.peek().as_deref(), Some("B"));
}

#[test]
fn profile_failure_for_replaced_token_keeps_newer_session() {
    let (session, api, store) = session_with(MemoryTokenStore::default());
    api.on_login(Ok(key("A")));
    api.on_login(Ok(key("B")));
    let slow = api.defer_current_user();
    api.on_current_user(Ok(user("alice")));
    let mut pool = LocalPool::new();

    spawn_login(&pool, &session);
    pool.run_until_stalled();
    pool.run_until(session.login(credentials())).unwrap();

    slow.send(Err(rejected("Invalid token."))).unwrap();
    pool.run_until_stalled();

    let state = session.state();
    assert_eq!(state.token.as_deref(), Some("B"));
    assert_eq!(state.user, Some(user("alice")));
    assert_eq!(state.error, None);
    assert_eq!(store.peek().as_deref(), Some("B"));
}

// =============================================================
// register
// =============================================================

#[test]
fn register_success_signs_in() {
    let (session, api, store) = session_with(MemoryTokenStore::default());
    api.on_register(Ok(key("new")));
    api.on_current_user(Ok(user("alice")));

    block_on(session.register(registration())).unwrap();

    assert_eq!(session.state().user, Some(user("alice")));
    assert_eq!(store.peek().as_deref(), Some("new"));
    assert_eq!(api.calls(), vec!["register alice".to_owned(), "current_user new".to_owned()]);
}

#[test]
fn register_field_errors_surface_flattened() {
    let (session, api, store) = session_with(MemoryTokenStore::default());
    api.on_register(Err(ApiError::from_status(
        400,
        r#"{"username":["taken"],"password":["weak","short"]}"#,
    )));

    let err = block_on(session.register(registration())).unwrap_err();

    assert_eq!(err.to_string(), "username: taken | password: weak | short");
    assert_eq!(session.state().error.as_deref(), Some("username: taken | password: weak | short"));
    assert_eq!(store.peek(), None);
}

// =============================================================
// logout
// =============================================================

fn signed_in() -> (Session, FakeApi, MemoryTokenStore) {
    let (session, api, store) = session_with(MemoryTokenStore::with_token("T"));
    api.on_current_user(Ok(user("carol")));
    block_on(session.restore());
    assert!(session.state().is_authenticated());
    (session, api, store)
}

#[test]
fn logout_clears_session_and_storage() {
    let (session, api, store) = signed_in();
    api.on_logout(Ok(()));

    block_on(session.logout());

    assert_eq!(session.state(), AuthState::default());
    assert_eq!(store.peek(), None);
    assert!(api.calls().contains(&"logout T".to_owned()));
}

#[test]
fn logout_remote_failure_still_clears_locally() {
    let (session, api, store) = signed_in();
    api.on_logout(Err(ApiError::Transport("offline".to_owned())));

    block_on(session.logout());

    assert_eq!(session.state(), AuthState::default());
    assert_eq!(store.peek(), None);
}

#[test]
fn logout_without_token_skips_remote_call() {
    let (session, api, _store) = session_with(MemoryTokenStore::default());

    block_on(session.logout());

    assert!(api.calls().is_empty());
    assert!(!session.state().loading);
}

// =============================================================
// clear_error / persistence / subscribers
// =============================================================

#[test]
fn clear_error_touches_only_error() {
    let (session, api, _store) = session_with(MemoryTokenStore::default());
    api.on_login(Err(rejected("fail")));
    let _ = block_on(session.login(credentials()));
    let before = session.state();

    session.clear_error();

    assert_eq!(session.state(), AuthState { error: None, ..before });
}

#[test]
fn persisting_same_token_twice_is_idempotent() {
    let (session, _api, store) = signed_in();
    let before = session.state();

    session.persist_token(Some("T"));
    session.persist_token(Some("T"));

    assert_eq!(session.state(), before);
    assert_eq!(store.peek().as_deref(), Some("T"));
}

#[test]
fn persisting_different_token_drops_stale_user() {
    let (session, _api, store) = signed_in();

    session.persist_token(Some("U"));

    let state = session.state();
    assert_eq!(state.token.as_deref(), Some("U"));
    assert!(state.user.is_none());
    assert_eq!(store.peek().as_deref(), Some("U"));
}

#[test]
fn subscribers_observe_latest_snapshot() {
    let (session, api, _store) = session_with(MemoryTokenStore::default());
    let seen = Rc::new(RefCell::new(Vec::<AuthState>::new()));
    let sink = Rc::clone(&seen);
    session.subscribe(move |state| sink.borrow_mut().push(state.clone()));
    api.on_login(Ok(key("abc")));
    api.on_current_user(Ok(user("bob")));

    block_on(session.login(credentials())).unwrap();

    let seen = seen.borrow();
    assert!(seen.first().is_some_and(|state| state.loading));
    assert_eq!(seen.last(), Some(&session.state()));
}

#[test]
fn dispose_silences_subscribers_and_freezes_state() {
    let (session, api, store) = session_with(MemoryTokenStore::default());
    let notified = Rc::new(Cell::new(0_usize));
    let counter = Rc::clone(&notified);
    session.subscribe(move |_| counter.set(counter.get() + 1));

    session.dispose();
    api.on_login(Ok(key("abc")));
    api.on_current_user(Ok(user("bob")));
    let result = block_on(session.login(credentials()));

    assert!(result.is_ok());
    assert!(session.is_disposed());
    assert_eq!(notified.get(), 0);
    assert_eq!(session.state(), AuthState::default());
    assert_eq!(store.peek(), None);
}
