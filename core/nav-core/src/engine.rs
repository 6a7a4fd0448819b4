//! NavEngine - the host-facing entry point for HealthChat clients.
//!
//! Wraps a [`NavigationCore`] for Swift/Kotlin. The engine is:
//! - **Synchronous**: every call applies its change before returning
//! - **Host-driven sync**: the host performs the profile request and resolves
//!   the [`SyncTicket`] handed to `NavigationObserver::on_sync_requested`
//! - **Re-entrancy safe**: observers are called after the internal lock is
//!   released, so they may call straight back into the engine
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use nav_core::NavEngine;
//!
//! let engine = NavEngine::new(true)?;
//! engine.add_observer(observer);
//! engine.start();
//! ```

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::app::{NavContext, NavigationCore, Outbound};
use crate::bus::{AppEvent, EventBus};
use crate::config::load_config;
use crate::error::{NavError, NavFfiError};
use crate::patterns::parse_deep_link;
use crate::session::{SessionStore, SyncTicket};
use crate::sync::SyncDriver;
use crate::types::{AuthSession, DeepLinkEvent, NavigationSnapshot, Tab, TopLevelScreen, UserProfile};

/// Receives navigation updates on the host side.
///
/// Called on the thread that made the engine call that caused the update.
#[uniffi::export(callback_interface)]
pub trait NavigationObserver: Send + Sync {
    fn on_state_changed(&self, snapshot: NavigationSnapshot);

    /// The core wants a profile sync. Resolve the ticket with `complete_sync`.
    ///
    /// Only the first registered observer is asked; it owns profile syncs.
    fn on_sync_requested(&self, ticket: Arc<SyncTicket>);
}

/// Result of a host-performed profile request.
#[derive(Debug, Clone, uniffi::Enum)]
pub enum SyncOutcome {
    Success { profile: UserProfile },
    AuthRejected { message: String },
    NetworkFailed { message: String },
}

impl From<SyncOutcome> for Result<UserProfile, NavError> {
    fn from(outcome: SyncOutcome) -> Self {
        match outcome {
            SyncOutcome::Success { profile } => Ok(profile),
            SyncOutcome::AuthRejected { message } => Err(NavError::Auth(message)),
            SyncOutcome::NetworkFailed { message } => Err(NavError::Network(message)),
        }
    }
}

/// Failure of a screen-level fetch, reported by the host.
#[derive(Debug, Clone, uniffi::Enum)]
pub enum ScreenFetchError {
    NotFound { what: String },
    Validation { details: String },
    Network { details: String },
}

impl From<ScreenFetchError> for NavError {
    fn from(err: ScreenFetchError) -> Self {
        match err {
            ScreenFetchError::NotFound { what } => NavError::NotFound(what),
            ScreenFetchError::Validation { details } => NavError::Validation(details),
            ScreenFetchError::Network { details } => NavError::Network(details),
        }
    }
}

#[derive(uniffi::Object)]
pub struct NavEngine {
    core: Mutex<NavigationCore>,
    bus: Arc<EventBus>,
    scheme: String,
    observers: Mutex<Vec<Arc<dyn NavigationObserver>>>,
}

impl NavEngine {
    /// Creates an engine around an explicit context.
    ///
    /// Used by tests and Rust hosts. Not exposed to FFI - use `new()`.
    pub fn with_context(context: NavContext, driver: SyncDriver, session: SessionStore) -> Self {
        let bus = Arc::clone(&context.bus);
        let scheme = context.config.deep_links.scheme.clone();
        Self {
            core: Mutex::new(NavigationCore::new(context, driver, session)),
            bus,
            scheme,
            observers: Mutex::new(Vec::new()),
        }
    }

    /// The bus shared with other components of the app.
    pub fn bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.bus)
    }

    fn lock_core(&self) -> MutexGuard<'_, NavigationCore> {
        self.core.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Runs `f` against the core, then delivers the outbox with the lock released.
    fn with_core<T>(&self, f: impl FnOnce(&mut NavigationCore) -> T) -> T {
        let (value, outbox) = {
            let mut core = self.lock_core();
            let value = f(&mut core);
            core.pump();
            (value, core.take_outbox())
        };
        self.deliver(outbox);
        value
    }

    fn deliver(&self, outbox: Vec<Outbound>) {
        if outbox.is_empty() {
            return;
        }
        let observers: Vec<Arc<dyn NavigationObserver>> = self
            .observers
            .lock()
            .map(|observers| observers.clone())
            .unwrap_or_default();

        for item in outbox {
            match item {
                Outbound::StateChanged(snapshot) => {
                    for observer in &observers {
                        observer.on_state_changed(snapshot.clone());
                    }
                }
                Outbound::SyncRequested(ticket) => match observers.first() {
                    Some(handler) => handler.on_sync_requested(ticket),
                    None => warn!(
                        attempt = ticket.attempt(),
                        "Sync requested with no observer; it will be abandoned"
                    ),
                },
            }
        }
    }

    fn publish(&self, event: AppEvent) {
        self.bus.publish(event);
        self.with_core(|_| ());
    }
}

#[uniffi::export]
impl NavEngine {
    /// Creates an engine with the config from the default location.
    ///
    /// `restored_login` is the host's persisted "signed in" flag.
    #[uniffi::constructor]
    pub fn new(restored_login: bool) -> Result<Self, NavFfiError> {
        let config = load_config(None)?;
        Ok(Self::with_context(
            NavContext::new(config),
            SyncDriver::Host,
            SessionStore::restored(restored_login),
        ))
    }

    /// Creates an engine with the config at `config_path`.
    #[uniffi::constructor]
    pub fn with_config_path(config_path: String, restored_login: bool) -> Result<Self, NavFfiError> {
        let config = load_config(Some(PathBuf::from(config_path)))?;
        Ok(Self::with_context(
            NavContext::new(config),
            SyncDriver::Host,
            SessionStore::restored(restored_login),
        ))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Observers
    // ─────────────────────────────────────────────────────────────────────────────

    /// Registers an observer. It immediately receives the current snapshot.
    /// The first observer registered also handles sync requests.
    pub fn add_observer(&self, observer: Box<dyn NavigationObserver>) {
        let observer: Arc<dyn NavigationObserver> = Arc::from(observer);
        let snapshot = self.snapshot();
        if let Ok(mut observers) = self.observers.lock() {
            observers.push(Arc::clone(&observer));
        }
        observer.on_state_changed(snapshot);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Session API
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn start(&self) {
        self.with_core(|core| core.start());
    }

    pub fn login(&self) {
        self.with_core(|core| core.login());
    }

    pub fn logout(&self) {
        self.with_core(|core| core.logout());
    }

    pub fn publish_login_state(&self) {
        self.with_core(|core| core.publish_login_state());
    }

    /// Returns true if a new sync was started.
    pub fn sync_user(&self) -> bool {
        self.with_core(|core| core.sync_user())
    }

    pub fn retry_sync(&self) -> bool {
        self.with_core(|core| core.retry_sync())
    }

    /// Resolves a ticket from `on_sync_requested`. Returns false if it was
    /// already resolved.
    pub fn complete_sync(&self, ticket: Arc<SyncTicket>, outcome: SyncOutcome) -> bool {
        let resolved = ticket.resolve(outcome.into());
        self.with_core(|_| ());
        resolved
    }

    pub fn auth_session(&self) -> AuthSession {
        self.lock_core().session().auth_session()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Navigation API
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> NavigationSnapshot {
        self.lock_core().snapshot()
    }

    pub fn screen(&self) -> TopLevelScreen {
        self.lock_core().screen()
    }

    pub fn active_tab(&self) -> Tab {
        self.lock_core().active_tab()
    }

    pub fn change_tab(&self, tab: Tab) {
        self.with_core(|core| core.change_tab(tab));
    }

    /// Applies any background deliveries. Hosts call this from the UI thread.
    pub fn pump(&self) {
        self.with_core(|_| ());
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Notifications and Deep Links
    // ─────────────────────────────────────────────────────────────────────────────

    /// Handles a tapped push notification's JSON payload.
    pub fn open_notification(&self, payload: String) -> Result<DeepLinkEvent, NavFfiError> {
        let parsed = nav_protocol::parse_notification(&payload).map_err(NavError::from)?;
        let target = parsed
            .target()
            .ok_or_else(|| NavFfiError::from("notification has no navigation target"))?;
        let link = DeepLinkEvent::from(target);
        debug!(link = ?link, "Notification opened");
        self.publish(AppEvent::DeepLink(link.clone()));
        Ok(link)
    }

    /// Handles an app URL such as `healthchat://conversations/42`.
    pub fn open_url(&self, url: String) -> Result<DeepLinkEvent, NavFfiError> {
        let link = parse_deep_link(&url, &self.scheme)?;
        self.publish(AppEvent::DeepLink(link.clone()));
        Ok(link)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Onboarding API
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn complete_first_run_onboarding(&self) {
        self.publish(AppEvent::FirstRunOnboardingCompleted);
    }

    pub fn complete_device_onboarding(&self) {
        self.publish(AppEvent::DeviceOnboardingCompleted);
    }

    pub fn complete_assistant_onboarding(&self) {
        self.publish(AppEvent::AssistantOnboardingCompleted);
    }

    /// Returns the assistant introduction session id; the same id until completion.
    pub fn start_assistant_onboarding(&self) -> Option<String> {
        self.with_core(|core| core.start_assistant_onboarding())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Screen Fetch API
    // ─────────────────────────────────────────────────────────────────────────────

    /// Returns a request id; only the latest id per screen is accepted later.
    pub fn begin_screen_fetch(&self, screen: String) -> u64 {
        self.lock_core().begin_screen_fetch(&screen).request_id
    }

    pub fn finish_screen_fetch(
        &self,
        screen: String,
        request_id: u64,
        error: Option<ScreenFetchError>,
    ) -> bool {
        let result = match error {
            Some(err) => Err(NavError::from(err)),
            None => Ok(()),
        };
        self.with_core(|core| core.finish_screen_fetch(&screen, request_id, result))
    }

    pub fn dismiss_message(&self, id: String) -> bool {
        self.with_core(|core| core.dismiss_message(&id))
    }
}
