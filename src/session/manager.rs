//! Session manager: the single owner of authenticated-user state.
//!
//! State transitions:
//!
//! ```text
//! UNINITIALIZED --check_auth--> AUTHENTICATED | UNAUTHENTICATED
//! AUTHENTICATED --(every refresh interval)--> refresh_token (soft failure)
//! AUTHENTICATED --logout | failed check_auth--> UNAUTHENTICATED
//! ```
//!
//! Only `login` returns errors to its caller. Verify failures clear local state,
//! refresh failures leave it untouched, and logout always cleans up locally.

use super::{
    client::{AuthClient, Credentials},
    config::SessionConfig,
    cookie::{AUTH_COOKIE_NAME, CookiePolicy, CookieStore, MemoryCookieStore},
    errors::AppError,
    events::AuthEvents,
    types::{LoginRequest, LoginResponse, SessionState, User},
};
use axum_extra::extract::cookie::Cookie;
use chrono::Utc;
use secrecy::SecretString;
use std::{
    future::Future,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tracing::{debug, info, instrument, warn};

/// Shared handle to the session. Cloning is cheap and every clone observes the
/// same state.
#[derive(Clone, Debug)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    client: AuthClient,
    config: SessionConfig,
    cookie_policy: CookiePolicy,
    cookies: Arc<dyn CookieStore>,
    cached_token: RwLock<Option<SecretString>>,
    state: watch::Sender<SessionState>,
    events: AuthEvents,
    /// Bumped at every session boundary (login, adopt, clear). In-flight
    /// verify and refresh results are applied only if it has not moved.
    generation: AtomicU64,
    /// Also serializes generation checks with the state writes they guard.
    refresh_timer: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self
            .refresh_timer
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}

impl SessionManager {
    /// Build a manager with an in-memory cookie store and a fresh event channel.
    ///
    /// # Errors
    /// Returns `AppError::Config` if the backend client cannot be built.
    pub fn new(config: SessionConfig) -> Result<Self, AppError> {
        Self::with_parts(config, Arc::new(MemoryCookieStore::new()), AuthEvents::new())
    }

    /// Build a manager around an existing cookie store and event channel.
    ///
    /// # Errors
    /// Returns `AppError::Config` if the backend client cannot be built.
    pub fn with_parts(
        config: SessionConfig,
        cookies: Arc<dyn CookieStore>,
        events: AuthEvents,
    ) -> Result<Self, AppError> {
        let client = AuthClient::new(config.api_base_url(), config.request_timeout())?;
        let cookie_policy = CookiePolicy::for_host(config.app_host(), config.cookie_domain());
        let (state, _) = watch::channel(SessionState::default());

        Ok(Self {
            inner: Arc::new(Inner {
                client,
                config,
                cookie_policy,
                cookies,
                cached_token: RwLock::new(None),
                state,
                events,
                generation: AtomicU64::new(0),
                refresh_timer: Mutex::new(None),
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn events(&self) -> &AuthEvents {
        &self.inner.events
    }

    /// Current session snapshot.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Watch session changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.inner.state.borrow().user.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.inner
            .state
            .borrow()
            .user
            .as_ref()
            .is_some_and(|user| user.permissions.contains(permission))
    }

    /// The auth cookie as currently stored, if any.
    #[must_use]
    pub fn auth_cookie(&self) -> Option<Cookie<'static>> {
        self.inner.cookies.get(AUTH_COOKIE_NAME)
    }

    #[must_use]
    pub fn cookie_policy(&self) -> &CookiePolicy {
        &self.inner.cookie_policy
    }

    /// Seed the locally cached bearer token, e.g. from a magic link.
    pub fn set_cached_token(&self, token: SecretString) {
        *self
            .inner
            .cached_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    #[must_use]
    pub fn has_cached_token(&self) -> bool {
        self.inner
            .cached_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Authenticate with the backend.
    ///
    /// Without a pending two-factor challenge the token is stored in the auth
    /// cookie and the session is re-verified before returning, so `user()`
    /// reflects the server's view rather than the raw login payload.
    ///
    /// # Errors
    /// Propagates the backend rejection (invalid credentials, locked account)
    /// or transport failure. Never retries.
    #[instrument(skip_all)]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        two_factor_token: Option<&str>,
    ) -> Result<LoginResponse, AppError> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
            two_factor_token: two_factor_token
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_string),
        };

        let response = self.inner.client.login(&request).await.inspect_err(|err| {
            warn!("Login rejected: {err}");
        })?;

        if response.requires_two_factor {
            info!("Login requires a two-factor token");
            return Ok(response);
        }

        let Some(token) = response
            .access_token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
        else {
            return Err(AppError::Parse(
                "Login response did not include an access token.".to_string(),
            ));
        };

        self.start_session(token);
        self.check_auth().await;

        Ok(response)
    }

    /// Verify the session with the backend and reconcile local state.
    ///
    /// Any outcome other than an OK response carrying a user clears the auth
    /// cookie, the cached token and the user. `loading` is always cleared.
    /// A result that arrives after logout, a new login or an adopted user is
    /// discarded.
    #[instrument(skip_all)]
    pub async fn check_auth(&self) {
        let generation = self.generation();
        let credentials = self.credentials();
        let result = self
            .inner
            .client
            .verify(&credentials, self.inner.config.verify_timeout())
            .await;

        {
            let mut timer = self.lock_timer();
            if self.generation() == generation {
                match result {
                    Ok(Some(user)) => {
                        debug!("Session verified");
                        self.inner.state.send_modify(|state| {
                            state.user = Some(user);
                            state.last_refreshed_at = Some(Utc::now());
                        });
                        self.arm_locked(&mut timer);
                    }
                    Ok(None) => {
                        warn!("Session verification returned no user");
                        self.reset_locked(&mut timer);
                    }
                    Err(err) if err.is_unauthorized() => {
                        debug!("Session rejected by backend: {err}");
                        self.reset_locked(&mut timer);
                    }
                    Err(err) => {
                        warn!("Session verification failed: {err}");
                        self.reset_locked(&mut timer);
                    }
                }
            } else {
                debug!("Session changed during verification, discarding result");
            }
        }

        self.inner.state.send_modify(|state| state.loading = false);
    }

    /// Request a fresh bearer token.
    ///
    /// On failure nothing is cleared; the periodic caller decides what to do.
    /// A token that arrives after the session ended is dropped and `None` is
    /// returned.
    #[instrument(skip_all)]
    pub async fn refresh_token(&self) -> Option<String> {
        let generation = self.generation();
        match self.inner.client.refresh_token(&self.credentials()).await {
            Ok(token) => {
                let _timer = self.lock_timer();
                if self.generation() != generation {
                    debug!("Session changed during refresh, discarding token");
                    return None;
                }
                debug!("Access token refreshed");
                self.store_token(&token);
                Some(token)
            }
            Err(err) => {
                warn!("Token refresh failed, keeping current session: {err}");
                None
            }
        }
    }

    /// End the session. The backend call is best-effort; local state is always
    /// cleared.
    #[instrument(skip_all)]
    pub async fn logout(&self) {
        let credentials = self.credentials();
        best_effort("logout", self.inner.client.logout(&credentials)).await;
        self.clear_local();
        info!("Signed out");
    }

    /// Adopt a user announced by an out-of-band login, skipping verification.
    ///
    /// Starts a new session: verify or refresh results still in flight from
    /// before are discarded.
    ///
    /// # Panics
    /// Arms the refresh timer with `tokio::spawn`, so it panics when called
    /// outside a Tokio runtime.
    pub fn adopt_user(&self, user: User) {
        debug!("Adopting user from auth event");
        let mut timer = self.lock_timer();
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.state.send_modify(|state| {
            state.user = Some(user);
            state.loading = false;
        });
        self.arm_locked(&mut timer);
    }

    #[must_use]
    pub fn refresh_timer_armed(&self) -> bool {
        self.inner
            .refresh_timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    fn lock_timer(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.inner
            .refresh_timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Start the periodic refresh unless one is already running.
    fn arm_locked(&self, timer: &mut Option<JoinHandle<()>>) {
        if timer.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }
        let period = self.inner.config.refresh_interval();
        *timer = Some(tokio::spawn(refresh_loop(
            Arc::downgrade(&self.inner),
            period,
        )));
    }

    pub(crate) fn disarm_refresh_timer(&self) {
        if let Some(handle) = self.lock_timer().take() {
            handle.abort();
        }
    }

    fn store_token(&self, token: &str) {
        self.inner
            .cookies
            .set(self.inner.cookie_policy.auth_cookie(token));
        self.set_cached_token(SecretString::from(token.to_string()));
    }

    /// Store the token from a fresh login as a new session.
    fn start_session(&self, token: &str) {
        let _timer = self.lock_timer();
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.store_token(token);
    }

    fn clear_local(&self) {
        let mut timer = self.lock_timer();
        self.reset_locked(&mut timer);
    }

    /// End the current session: stop the timer, expire the auth cookie, drop
    /// the cached token and the user.
    fn reset_locked(&self, timer: &mut Option<JoinHandle<()>>) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = timer.take() {
            handle.abort();
        }
        self.inner
            .cookies
            .set(self.inner.cookie_policy.removal_cookie());
        *self
            .inner
            .cached_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.inner.state.send_modify(|state| state.user = None);
    }

    fn credentials(&self) -> Credentials {
        let cookie = self
            .inner
            .cookies
            .get(AUTH_COOKIE_NAME)
            .map(|cookie| format!("{}={}", cookie.name(), cookie.value()));
        let bearer = self
            .inner
            .cached_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Credentials { cookie, bearer }
    }
}

/// Attempt a remote operation, log its failure, and never surface it.
async fn best_effort<F>(operation: &str, call: F)
where
    F: Future<Output = Result<(), AppError>>,
{
    if let Err(err) = call.await {
        warn!(operation, "Best-effort call failed: {err}");
    }
}

async fn refresh_loop(inner: Weak<Inner>, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Some(inner) = inner.upgrade() else {
            break;
        };
        let manager = SessionManager { inner };
        if !manager.is_authenticated() {
            break;
        }
        if manager.refresh_token().await.is_none() {
            debug!("Scheduled refresh failed; retrying next interval");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::{
        client::{LOGIN_PATH, LOGOUT_PATH, REFRESH_TOKEN_PATH, VERIFY_PATH},
        cookie::AUTH_COOKIE_MAX_AGE,
    };
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn user_json() -> serde_json::Value {
        json!({
            "id": 1,
            "email": "ada@papercut.dev",
            "firstName": "Ada",
            "role": "admin",
            "permissions": ["records.read"]
        })
    }

    #[derive(Debug, Default)]
    struct RecordingStore {
        store: MemoryCookieStore,
        written: Mutex<Vec<Cookie<'static>>>,
    }

    impl CookieStore for RecordingStore {
        fn get(&self, name: &str) -> Option<Cookie<'static>> {
            self.store.get(name)
        }

        fn set(&self, cookie: Cookie<'static>) {
            self.written.lock().unwrap().push(cookie.clone());
            self.store.set(cookie);
        }

        fn remove(&self, name: &str) {
            self.store.remove(name);
        }
    }

    fn manager_for(server: &MockServer) -> SessionManager {
        SessionManager::new(SessionConfig::new(server.uri())).unwrap()
    }

    async fn mount_verify_ok(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path(VERIFY_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user": user_json()})))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn login_sets_cookie_and_verifies() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .and(body_json(json!({"email": "ada@papercut.dev", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accessToken": "tok-1",
                "user": user_json(),
                "requiresTwoFactor": false
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(VERIFY_PATH))
            .and(header("cookie", "access_token_w=tok-1"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user": user_json()})))
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager_for(&server);
        let response = manager.login(" ada@papercut.dev ", "pw", None).await.unwrap();

        assert!(!response.requires_two_factor);
        let state = manager.state();
        assert!(!state.loading);
        assert!(state.last_refreshed_at.is_some());
        assert_eq!(state.user.map(|u| u.email), Some("ada@papercut.dev".to_string()));
        assert!(manager.has_permission("records.read"));
        assert!(!manager.has_permission("records.delete"));

        let cookie = manager.auth_cookie().unwrap();
        assert_eq!(cookie.value(), "tok-1");
        assert_eq!(cookie.max_age(), Some(AUTH_COOKIE_MAX_AGE));
        assert!(manager.refresh_timer_armed());
    }

    #[tokio::test]
    async fn login_with_pending_two_factor_writes_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"requiresTwoFactor": true})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(VERIFY_PATH))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let manager = manager_for(&server);
        let response = manager.login("ada@papercut.dev", "pw", None).await.unwrap();

        assert!(response.requires_two_factor);
        assert!(manager.auth_cookie().is_none());
        assert!(!manager.has_cached_token());
        assert!(manager.user().is_none());
    }

    #[tokio::test]
    async fn login_forwards_two_factor_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .and(body_json(json!({
                "email": "ada@papercut.dev",
                "password": "pw",
                "twoFactorToken": "123456"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accessToken": "tok-2",
                "user": user_json()
            })))
            .mount(&server)
            .await;
        mount_verify_ok(&server).await;

        let manager = manager_for(&server);
        manager
            .login("ada@papercut.dev", "pw", Some("123456"))
            .await
            .unwrap();
        assert!(manager.is_authenticated());
    }

    #[tokio::test]
    async fn login_propagates_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(423).set_body_string("Account locked"))
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager_for(&server);
        let err = manager
            .login("ada@papercut.dev", "pw", None)
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(423));
        assert!(manager.auth_cookie().is_none());
        assert!(manager.user().is_none());
    }

    #[tokio::test]
    async fn check_auth_failure_clears_state() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(VERIFY_PATH))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let manager = manager_for(&server);
        manager.store_token("stale");
        manager.adopt_user(serde_json::from_value(user_json()).unwrap());
        assert!(manager.refresh_timer_armed());

        manager.check_auth().await;

        assert!(manager.user().is_none());
        assert!(manager.auth_cookie().is_none());
        assert!(!manager.has_cached_token());
        assert!(!manager.is_loading());
        assert!(!manager.refresh_timer_armed());
    }

    #[tokio::test]
    async fn check_auth_without_user_payload_clears_state() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(VERIFY_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let manager = manager_for(&server);
        manager.store_token("tok");
        manager.check_auth().await;

        assert!(manager.user().is_none());
        assert!(manager.auth_cookie().is_none());
        assert!(!manager.is_loading());
    }

    #[tokio::test]
    async fn check_auth_timeout_clears_state() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(VERIFY_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"user": user_json()}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let config =
            SessionConfig::new(server.uri()).with_verify_timeout(Duration::from_millis(100));
        let manager = SessionManager::new(config).unwrap();
        manager.store_token("tok");
        manager.check_auth().await;

        assert!(manager.user().is_none());
        assert!(manager.auth_cookie().is_none());
        assert!(!manager.is_loading());
    }

    #[tokio::test]
    async fn check_auth_network_failure_clears_state() {
        // Nothing listens on the discard port of the loopback interface.
        let manager = SessionManager::new(SessionConfig::new("http://127.0.0.1:9")).unwrap();
        manager.store_token("tok");
        manager.check_auth().await;

        assert!(manager.user().is_none());
        assert!(manager.auth_cookie().is_none());
        assert!(!manager.is_loading());
    }

    #[tokio::test]
    async fn refresh_updates_cookie() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(REFRESH_TOKEN_PATH))
            .and(header("cookie", "access_token_w=old"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accessToken": "new"})))
            .mount(&server)
            .await;

        let manager = manager_for(&server);
        manager.store_token("old");

        assert_eq!(manager.refresh_token().await, Some("new".to_string()));
        let cookie = manager.auth_cookie().unwrap();
        assert_eq!(cookie.value(), "new");
        assert_eq!(cookie.max_age(), Some(AUTH_COOKIE_MAX_AGE));
    }

    #[tokio::test]
    async fn refresh_failure_is_soft() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(REFRESH_TOKEN_PATH))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let manager = manager_for(&server);
        manager.store_token("keep");
        manager.adopt_user(serde_json::from_value(user_json()).unwrap());

        assert_eq!(manager.refresh_token().await, None);
        assert!(manager.is_authenticated());
        assert_eq!(manager.auth_cookie().map(|c| c.value().to_string()), Some("keep".to_string()));
        assert!(manager.refresh_timer_armed());
    }

    #[tokio::test]
    async fn logout_clears_state_when_backend_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGOUT_PATH))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager_for(&server);
        manager.store_token("tok");
        manager.adopt_user(serde_json::from_value(user_json()).unwrap());

        manager.logout().await;

        assert!(manager.user().is_none());
        assert!(manager.auth_cookie().is_none());
        assert!(!manager.has_cached_token());
        assert!(!manager.refresh_timer_armed());
    }

    #[tokio::test]
    async fn logout_clears_state_on_network_error() {
        let manager = SessionManager::new(SessionConfig::new("http://127.0.0.1:9")).unwrap();
        manager.store_token("tok");
        manager.adopt_user(serde_json::from_value(user_json()).unwrap());

        manager.logout().await;

        assert!(manager.user().is_none());
        assert!(manager.auth_cookie().is_none());
    }

    #[tokio::test]
    async fn arming_twice_keeps_a_single_timer() {
        let server = MockServer::start().await;
        let manager = manager_for(&server);

        // Each live timer task holds one weak reference to the manager.
        manager.adopt_user(serde_json::from_value(user_json()).unwrap());
        manager.adopt_user(serde_json::from_value(user_json()).unwrap());
        assert!(manager.refresh_timer_armed());
        assert_eq!(Arc::weak_count(&manager.inner), 1);

        manager.logout().await;
        assert!(!manager.refresh_timer_armed());
    }

    #[tokio::test]
    async fn timer_refreshes_periodically_while_authenticated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(REFRESH_TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accessToken": "fresh"})))
            .mount(&server)
            .await;

        let config =
            SessionConfig::new(server.uri()).with_refresh_interval(Duration::from_millis(50));
        let manager = SessionManager::new(config).unwrap();
        manager.store_token("stale");
        manager.adopt_user(serde_json::from_value(user_json()).unwrap());

        let deadline = Instant::now() + Duration::from_secs(5);
        while manager.auth_cookie().map(|c| c.value().to_string()) != Some("fresh".to_string()) {
            assert!(Instant::now() < deadline, "refresh timer never fired");
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(manager.is_authenticated());
    }

    #[tokio::test]
    async fn logout_sends_expired_auth_cookie() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGOUT_PATH))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let store = Arc::new(RecordingStore::default());
        let manager = SessionManager::with_parts(
            SessionConfig::new(server.uri()),
            store.clone(),
            AuthEvents::new(),
        )
        .unwrap();
        manager.store_token("tok");

        manager.logout().await;

        let written = store.written.lock().unwrap();
        let last = written.last().unwrap();
        assert_eq!(last.name(), AUTH_COOKIE_NAME);
        assert_eq!(last.value(), "");
        assert_eq!(last.max_age(), Some(time::Duration::ZERO));
        assert!(manager.auth_cookie().is_none());
    }

    #[tokio::test]
    async fn logout_during_verify_keeps_session_cleared() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(VERIFY_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"user": user_json()}))
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(LOGOUT_PATH))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let manager = manager_for(&server);
        manager.store_token("tok");

        let verifying = tokio::spawn({
            let manager = manager.clone();
            async move { manager.check_auth().await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        manager.logout().await;
        verifying.await.unwrap();

        assert!(manager.user().is_none(), "user restored after logout");
        assert!(manager.auth_cookie().is_none());
        assert!(!manager.has_cached_token());
        assert!(!manager.is_loading());
        assert!(!manager.refresh_timer_armed(), "timer armed after logout");
    }

    #[tokio::test]
    async fn logout_during_refresh_keeps_cookie_cleared() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(REFRESH_TOKEN_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"accessToken": "new"}))
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(LOGOUT_PATH))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let manager = manager_for(&server);
        manager.store_token("old");
        manager.adopt_user(serde_json::from_value(user_json()).unwrap());

        let refreshing = tokio::spawn({
            let manager = manager.clone();
            async move { manager.refresh_token().await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        manager.logout().await;

        assert_eq!(refreshing.await.unwrap(), None);
        assert!(manager.auth_cookie().is_none(), "cookie rewritten after logout");
        assert!(!manager.has_cached_token());
        assert!(manager.user().is_none());
        assert!(!manager.refresh_timer_armed());
    }

    #[tokio::test]
    async fn stale_verify_failure_keeps_adopted_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(VERIFY_PATH))
            .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(300)))
            .mount(&server)
            .await;

        let manager = manager_for(&server);
        manager.store_token("tok");

        let verifying = tokio::spawn({
            let manager = manager.clone();
            async move { manager.check_auth().await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        manager.adopt_user(serde_json::from_value(user_json()).unwrap());
        verifying.await.unwrap();

        assert!(manager.is_authenticated());
        assert_eq!(manager.auth_cookie().map(|c| c.value().to_string()), Some("tok".to_string()));
        assert!(manager.refresh_timer_armed());
    }
}
