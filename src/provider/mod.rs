//! Provider module - the coordinator in front of the backend
//!
//! `MusicProvider` owns the session state machine, the single-slot
//! catalog cache, and the keep-alive task, and funnels every
//! asynchronous failure into the error callback registered with the
//! current login cycle. It is organized into submodules by
//! responsibility:
//!
//! - `browse`: category fetch, listing, search and track lookup calls

mod browse;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;

use crate::gate;
use crate::model::{
    AmpacheBackend, BackendError, CatalogCache, Category, Readiness, SessionPhase, StateGate,
};
use crate::profiles::ConnectionProfile;

/// Receives every asynchronous failure of the current login cycle:
/// a human-readable message plus the backend fault when there is one.
pub type ErrorCallback = Arc<dyn Fn(&str, Option<&BackendError>) + Send + Sync>;

pub(crate) const DEFAULT_SONGS_TITLE: &str = "All songs shuffled";
pub(crate) const DEFAULT_SONGS_KEY: &str = "random";

/// Tunables for one provider instance
#[derive(Clone, Copy, Debug)]
pub struct ProviderConfig {
    /// Upper bound on waiting out an in-flight login or retrieval
    pub wait_timeout: Duration,
    /// Cadence of the session keep-alive ping once logged in
    pub ping_interval: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::from_secs(30),
            ping_interval: Duration::from_secs(300),
        }
    }
}

/// Coordinates logins and catalog fetches against a backend.
///
/// Cloning is cheap and every clone shares the same session, cache and
/// keep-alive task; independent instances are built with [`Self::new`].
#[derive(Clone)]
pub struct MusicProvider {
    backend: Arc<dyn AmpacheBackend>,
    state: StateGate,
    cache: CatalogCache,
    error_cb: Arc<RwLock<Option<ErrorCallback>>>,
    ping_task: Arc<Mutex<Option<JoinHandle<()>>>>,
    config: ProviderConfig,
}

impl MusicProvider {
    pub fn new(backend: Arc<dyn AmpacheBackend>) -> Self {
        Self::with_config(backend, ProviderConfig::default())
    }

    pub fn with_config(backend: Arc<dyn AmpacheBackend>, config: ProviderConfig) -> Self {
        Self {
            backend,
            state: StateGate::new(),
            cache: CatalogCache::new(),
            error_cb: Arc::new(RwLock::new(None)),
            ping_task: Arc::new(Mutex::new(None)),
            config,
        }
    }

    pub fn readiness(&self) -> Readiness {
        self.state.readiness()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    /// Receiver for observing session phase changes as they happen.
    pub fn subscribe(&self) -> watch::Receiver<SessionPhase> {
        self.state.subscribe()
    }

    /// Start a login cycle with `profile`, waiting out a login that is
    /// already in flight before this one begins.
    ///
    /// `on_error` replaces the previously registered callback and
    /// receives every asynchronous failure until the next cycle. The
    /// call returns once the cycle is underway; progress is observed
    /// through [`Self::subscribe`] or [`Self::readiness`].
    pub async fn request_login(
        &self,
        profile: Option<ConnectionProfile>,
        on_error: ErrorCallback,
    ) {
        self.login_inner(profile, on_error, false).await;
    }

    /// Like [`Self::request_login`], but takes over immediately instead
    /// of waiting out an in-flight login.
    pub async fn request_login_preempting(
        &self,
        profile: Option<ConnectionProfile>,
        on_error: ErrorCallback,
    ) {
        self.login_inner(profile, on_error, true).await;
    }

    /// Tear the session down: stop the keep-alive, drop the cache and
    /// return to the initial phase.
    pub async fn logout(&self) {
        self.stop_keepalive().await;
        self.cache.invalidate().await;
        *self.error_cb.write().await = None;
        self.state.advance(SessionPhase::Initial);
        tracing::info!("logged out");
    }

    async fn login_inner(
        &self,
        profile: Option<ConnectionProfile>,
        on_error: ErrorCallback,
        preempt: bool,
    ) {
        *self.error_cb.write().await = Some(on_error);

        let Some(profile) = profile else {
            self.state.advance(SessionPhase::NoLoginInformation);
            self.report("No connection profile in login request", None)
                .await;
            return;
        };

        // A fresh cycle never serves results fetched under the old session.
        self.cache.invalidate().await;

        let claimed = if preempt {
            self.state.advance(SessionPhase::LoggingIn);
            true
        } else {
            self.state.try_begin_login()
        };

        let provider = self.clone();
        let gate_state = self.state.clone();
        gate::run_then(
            async move {
                if !claimed {
                    // Wait the in-flight cycle out, then take the slot.
                    loop {
                        if provider.state.settled(provider.config.wait_timeout).await.is_err() {
                            provider
                                .report("Timed out waiting for a previous login", None)
                                .await;
                            return;
                        }
                        if provider.state.try_begin_login() {
                            break;
                        }
                    }
                }

                provider.stop_keepalive().await;

                tracing::info!(url = %profile.url, login = %profile.login, "logging in");
                match provider.run_login(&profile).await {
                    Ok(()) => {
                        provider.state.advance(SessionPhase::Ready);
                        provider.start_keepalive().await;
                    }
                    Err(err) => {
                        provider.state.advance(SessionPhase::Failure);
                        provider.report_backend(&err).await;
                    }
                }
            },
            move |outcome| {
                if outcome.is_none() {
                    // A panicked login must not leave waiters stuck in a
                    // busy phase.
                    gate_state.advance(SessionPhase::Failure);
                }
            },
        );
    }

    /// Handshake with the backend and warm the default song catalog.
    async fn run_login(&self, profile: &ConnectionProfile) -> Result<(), BackendError> {
        self.backend
            .init_user(&profile.url, &profile.login, &profile.password)
            .await?;
        let handshake = self.backend.handshake().await?;
        match handshake.session_expire {
            Some(expire) => tracing::info!(session_expire = %expire, "handshake complete"),
            None => tracing::info!("handshake complete, no session expiry reported"),
        }

        self.state.advance(SessionPhase::Retrieving);
        let songs = self.backend.get_songs().await?;
        let page = browse::shuffled_page(songs);
        tracing::info!(count = page.tracks.len(), "catalog retrieved");
        self.cache
            .store(Category::Songs, DEFAULT_SONGS_KEY, page)
            .await;
        Ok(())
    }

    async fn start_keepalive(&self) {
        let backend = self.backend.clone();
        let interval = self.config.ping_interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // the first tick of an interval fires immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match backend.ping().await {
                    Ok(()) => tracing::trace!("keep-alive ping"),
                    Err(err) => tracing::warn!(error = %err, "keep-alive ping failed"),
                }
            }
        });
        if let Some(previous) = self.ping_task.lock().await.replace(handle) {
            previous.abort();
        }
    }

    async fn stop_keepalive(&self) {
        if let Some(task) = self.ping_task.lock().await.take() {
            task.abort();
        }
    }

    /// Funnel a failure to the callback of the current login cycle.
    pub(crate) async fn report(&self, message: &str, source: Option<&BackendError>) {
        match source {
            Some(err) => tracing::error!(error = %err, "{}", message),
            None => tracing::error!("{}", message),
        }
        let callback = self.error_cb.read().await.clone();
        if let Some(callback) = callback {
            callback(message, source);
        }
    }

    pub(crate) async fn report_backend(&self, err: &BackendError) {
        let message = err.to_string();
        self.report(&message, Some(err)).await;
    }
}
