mod common;

use std::{
    io::{self, BufRead, Cursor, Read},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration as StdDuration,
};

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post},
};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use sunoplayer::{
    auth::{
        AcquireError, Acquirer, AuthError, AuthOrchestrator, AuthState, BrowserBackend,
        LivenessProbe, ManualBackend, PollPolicy, Rejection, TokenAcquisitionBackend,
        TokenValidator, check_offline,
    },
    config::{DEFAULT_DEVICE_ID, Settings},
    management::TokenStore,
    suno::SessionProbe,
    types::Credential,
};

#[derive(Clone)]
struct CountingProbe {
    calls: Arc<AtomicUsize>,
    accept: bool,
}

impl CountingProbe {
    fn new(accept: bool) -> Self {
        CountingProbe {
            calls: Arc::new(AtomicUsize::new(0)),
            accept,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LivenessProbe for CountingProbe {
    async fn is_accepted(&self, _credential: &Credential) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.accept
    }
}

/// Wraps a backend and counts how often it is asked for a token.
struct Counted<B> {
    inner: B,
    calls: Arc<AtomicUsize>,
}

impl<B> Counted<B> {
    fn new(inner: B) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Counted {
                inner,
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

#[async_trait]
impl<B: TokenAcquisitionBackend> TokenAcquisitionBackend for Counted<B> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn acquire(&self) -> Result<Option<Credential>, AcquireError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.acquire().await
    }
}

/// Hands out a fixed answer.
struct Canned(Option<String>);

#[async_trait]
impl TokenAcquisitionBackend for Canned {
    fn name(&self) -> &str {
        "Canned"
    }

    async fn acquire(&self) -> Result<Option<Credential>, AcquireError> {
        Ok(self.0.clone().map(Credential::new))
    }
}

struct Broken;

#[async_trait]
impl TokenAcquisitionBackend for Broken {
    fn name(&self) -> &str {
        "Broken"
    }

    async fn acquire(&self) -> Result<Option<Credential>, AcquireError> {
        Err(AcquireError::WebDriver("chrome crashed".to_string()))
    }
}

fn manual(input: &str) -> ManualBackend {
    ManualBackend::new(
        "https://suno.com/create".to_string(),
        Box::new(Cursor::new(input.to_string().into_bytes())),
    )
}

fn fast_poll() -> PollPolicy {
    PollPolicy {
        interval: StdDuration::from_millis(10),
        attempts: 3,
    }
}

#[derive(Clone, Default)]
struct DriverState {
    polls: Arc<AtomicUsize>,
    deletes: Arc<AtomicUsize>,
    /// Poll number (1-based) at which the token shows up; 0 = never.
    token_after: usize,
    token: String,
}

async fn new_session() -> Json<Value> {
    Json(json!({ "value": { "sessionId": "s-1", "capabilities": {} } }))
}

async fn navigate() -> Json<Value> {
    Json(json!({ "value": null }))
}

async fn execute(State(state): State<DriverState>) -> Json<Value> {
    let n = state.polls.fetch_add(1, Ordering::SeqCst) + 1;
    if state.token_after != 0 && n >= state.token_after {
        Json(json!({ "value": state.token }))
    } else {
        Json(json!({ "value": null }))
    }
}

async fn delete_session(State(state): State<DriverState>) -> Json<Value> {
    state.deletes.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "value": null }))
}

async fn mock_webdriver(state: DriverState) -> String {
    let router = Router::new()
        .route("/session", post(new_session))
        .route("/session/{id}/url", post(navigate))
        .route("/session/{id}/execute/sync", post(execute))
        .route("/session/{id}", delete(delete_session))
        .with_state(state);
    common::serve(router).await
}

fn browser(home: &std::path::Path, webdriver_url: &str) -> BrowserBackend {
    let mut settings = Settings::with_home(home.to_path_buf());
    settings.webdriver_url = webdriver_url.to_string();
    BrowserBackend::new(&settings).unwrap().with_poll(fast_poll())
}

#[tokio::test]
async fn test_expired_token_fails_without_network() {
    let probe = CountingProbe::new(true);
    let validator = TokenValidator::new(probe.clone());

    let expired = Credential::new(common::jwt_expiring_in(Duration::hours(-1)));
    assert!(!validator.is_valid(&expired).await);
    assert_eq!(probe.calls(), 0);

    assert!(matches!(
        check_offline(&expired, Utc::now()),
        Err(Rejection::Expired(_))
    ));
}

#[tokio::test]
async fn test_short_token_fails_immediately() {
    let probe = CountingProbe::new(true);
    let validator = TokenValidator::new(probe.clone());

    assert!(!validator.is_valid(&Credential::new("")).await);
    assert!(!validator.is_valid(&Credential::new("abc.def.ghi")).await);
    assert_eq!(probe.calls(), 0);
    assert_eq!(
        check_offline(&Credential::new("abc"), Utc::now()),
        Err(Rejection::Malformed)
    );
}

#[tokio::test]
async fn test_undecodable_token_is_rejected_offline() {
    let probe = CountingProbe::new(true);
    let validator = TokenValidator::new(probe.clone());

    assert!(!validator.is_valid(&Credential::new("x".repeat(200))).await);
    assert_eq!(probe.calls(), 0);
}

#[tokio::test]
async fn test_liveness_decides_for_fresh_tokens() {
    let fresh = Credential::new(common::jwt_expiring_in(Duration::hours(1)));

    let accepting = CountingProbe::new(true);
    assert!(TokenValidator::new(accepting.clone()).is_valid(&fresh).await);
    assert_eq!(accepting.calls(), 1);

    let refusing = CountingProbe::new(false);
    let validator = TokenValidator::new(refusing.clone());
    assert_eq!(
        validator.check(&fresh, Utc::now()).await,
        Err(Rejection::Refused)
    );
    assert_eq!(refusing.calls(), 1);
}

#[tokio::test]
async fn test_token_without_exp_goes_to_liveness() {
    let probe = CountingProbe::new(true);
    let token = Credential::new(common::make_jwt(json!({ "sub": "user_1" })));

    assert!(TokenValidator::new(probe.clone()).is_valid(&token).await);
    assert_eq!(probe.calls(), 1);
}

#[tokio::test]
async fn test_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = TokenStore::new(dir.path());
    assert!(store.load().await.is_none());

    let credential = Credential::new(common::jwt_expiring_in(Duration::hours(1)));
    store.save(&credential).await.unwrap();
    assert_eq!(store.load().await, Some(credential.clone()));

    let raw: Value =
        serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
    assert_eq!(raw["token"], credential.as_str());
    assert!(raw["saved_at"].is_string());
}

#[tokio::test]
async fn test_clear_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = TokenStore::new(dir.path());
    store.save(&Credential::new("token")).await.unwrap();

    store.clear().await.unwrap();
    store.clear().await.unwrap();
    assert!(store.load().await.is_none());
}

#[tokio::test]
async fn test_warm_start_uses_cache() {
    let dir = tempfile::tempdir().unwrap();
    let store = TokenStore::new(dir.path());
    let cached = Credential::new(common::jwt_expiring_in(Duration::hours(1)));
    store.save(&cached).await.unwrap();

    let probe = CountingProbe::new(true);
    let (backend, calls) = Counted::new(Canned(Some("other".to_string())));
    let mut auth = AuthOrchestrator::new(
        store,
        TokenValidator::new(probe.clone()),
        Acquirer::new(vec![Box::new(backend)]),
    );

    assert_eq!(auth.state(), AuthState::NoToken);
    assert_eq!(auth.get_usable_credential().await.unwrap(), cached);
    assert_eq!(auth.state(), AuthState::Valid);
    assert_eq!(probe.calls(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_expired_cache_skips_liveness_and_acquires() {
    let dir = tempfile::tempdir().unwrap();
    let store = TokenStore::new(dir.path());
    store
        .save(&Credential::new(common::jwt_expiring_in(Duration::hours(-1))))
        .await
        .unwrap();

    let fresh = common::jwt_expiring_in(Duration::hours(2));
    let probe = CountingProbe::new(true);
    let (backend, calls) = Counted::new(Canned(Some(fresh.clone())));
    let mut auth = AuthOrchestrator::new(
        store.clone(),
        TokenValidator::new(probe.clone()),
        Acquirer::new(vec![Box::new(backend)]),
    );

    let credential = auth.get_usable_credential().await.unwrap();
    assert_eq!(credential.as_str(), fresh);
    assert_eq!(probe.calls(), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    // the new token replaced the expired one on disk
    assert_eq!(store.load().await, Some(credential));
}

#[tokio::test]
async fn test_browser_timeout_falls_back_to_manual_once() {
    let dir = tempfile::tempdir().unwrap();
    let driver = DriverState::default();
    let webdriver_url = mock_webdriver(driver.clone()).await;

    let (auto, auto_calls) = Counted::new(browser(dir.path(), &webdriver_url));
    let (paste, manual_calls) = Counted::new(manual("Bearer short-token\n"));

    let probe = CountingProbe::new(false);
    let mut auth = AuthOrchestrator::new(
        TokenStore::new(dir.path()),
        TokenValidator::new(probe.clone()),
        Acquirer::new(vec![Box::new(auto), Box::new(paste)]),
    );

    let credential = auth.get_usable_credential().await.unwrap();

    // pasted value comes back as is, without any validation
    assert_eq!(credential.as_str(), "short-token");
    assert_eq!(probe.calls(), 0);
    assert_eq!(auto_calls.load(Ordering::SeqCst), 1);
    assert_eq!(manual_calls.load(Ordering::SeqCst), 1);

    // every poll was used up and the browser session was closed
    assert_eq!(driver.polls.load(Ordering::SeqCst), 3);
    assert_eq!(driver.deletes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_browser_captures_token_from_storage() {
    let dir = tempfile::tempdir().unwrap();
    let token = common::jwt_expiring_in(Duration::hours(1));
    let driver = DriverState {
        token_after: 2,
        token: token.clone(),
        ..Default::default()
    };
    let webdriver_url = mock_webdriver(driver.clone()).await;

    let backend = browser(dir.path(), &webdriver_url);
    let credential = backend.acquire().await.unwrap().unwrap();

    assert_eq!(credential.as_str(), token);
    assert_eq!(driver.polls.load(Ordering::SeqCst), 2);
    assert_eq!(driver.deletes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unreachable_webdriver_falls_through() {
    let dir = tempfile::tempdir().unwrap();
    let backend = browser(dir.path(), "http://127.0.0.1:1");
    assert!(backend.acquire().await.is_err());

    let (paste, manual_calls) = Counted::new(manual("pasted-token\n"));
    let acquirer = Acquirer::new(vec![
        Box::new(browser(dir.path(), "http://127.0.0.1:1")),
        Box::new(paste),
    ]);
    let credential = acquirer.acquire().await.unwrap();
    assert_eq!(credential.as_str(), "pasted-token");
    assert_eq!(manual_calls.load(Ordering::SeqCst), 1);
}

/// Line source that takes a while before handing out each buffer.
struct SlowInput(Cursor<Vec<u8>>);

impl Read for SlowInput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl BufRead for SlowInput {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        std::thread::sleep(StdDuration::from_millis(150));
        self.0.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.0.consume(amt)
    }
}

#[tokio::test(flavor = "current_thread")]
async fn test_manual_entry_does_not_stall_the_runtime() {
    let ticks = Arc::new(AtomicUsize::new(0));
    let ticker = {
        let ticks = Arc::clone(&ticks);
        tokio::spawn(async move {
            loop {
                ticks.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(StdDuration::from_millis(10)).await;
            }
        })
    };

    let backend = ManualBackend::new(
        "https://suno.com/create".to_string(),
        Box::new(SlowInput(Cursor::new(b"typed-token\n".to_vec()))),
    );
    let credential = backend.acquire().await.unwrap().unwrap();
    ticker.abort();

    assert_eq!(credential.as_str(), "typed-token");
    // other tasks kept running while the line was being read
    assert!(ticks.load(Ordering::SeqCst) >= 5);
}

#[tokio::test]
async fn test_exhausted_acquisition_fails() {
    let dir = tempfile::tempdir().unwrap();
    let store = TokenStore::new(dir.path());
    let mut auth = AuthOrchestrator::new(
        store.clone(),
        TokenValidator::new(CountingProbe::new(true)),
        Acquirer::new(vec![Box::new(Broken), Box::new(manual("\n"))]),
    );

    assert!(matches!(
        auth.get_usable_credential().await,
        Err(AuthError::Exhausted)
    ));
    assert_eq!(auth.state(), AuthState::Failed);
    assert!(store.load().await.is_none());
}

#[tokio::test]
async fn test_logout_clears_without_reacquiring() {
    let dir = tempfile::tempdir().unwrap();
    let store = TokenStore::new(dir.path());
    store.save(&Credential::new("old-token")).await.unwrap();

    let (backend, calls) = Counted::new(Canned(Some("new-token".to_string())));
    let mut auth = AuthOrchestrator::new(
        store.clone(),
        TokenValidator::new(CountingProbe::new(true)),
        Acquirer::new(vec![Box::new(backend)]),
    );

    auth.logout().await.unwrap();
    auth.logout().await.unwrap();
    assert_eq!(auth.state(), AuthState::NoToken);
    assert!(store.load().await.is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

async fn session_endpoint(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    let bearer_ok = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "Bearer good-token");
    let device_ok = headers
        .get("device-id")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == DEFAULT_DEVICE_ID);

    if bearer_ok && device_ok {
        (StatusCode::OK, Json(json!({ "user": { "name": "Ada" } })))
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Unauthorized" })))
    }
}

#[tokio::test]
async fn test_session_probe_against_api() {
    let dir = tempfile::tempdir().unwrap();
    let api = common::serve(Router::new().route("/api/session/", get(session_endpoint))).await;
    let probe = SessionProbe::new(&common::settings(dir.path(), &api)).unwrap();

    assert!(probe.is_accepted(&Credential::new("good-token")).await);
    assert!(!probe.is_accepted(&Credential::new("bad-token")).await);

    let dead = SessionProbe::new(&common::settings(dir.path(), "http://127.0.0.1:1")).unwrap();
    assert!(!dead.is_accepted(&Credential::new("good-token")).await);
}
