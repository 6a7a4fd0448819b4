//! The navigation core: one owner for session, root screen, tabs and overlays.
//!
//! `NavigationCore` is confined to the coordination thread (the UI thread on
//! mobile). Background work reports back through channels and is applied in
//! [`NavigationCore::pump`], so all state changes happen here, in order.
//!
//! ```text
//! login publishes ─┐                      ┌─> RootState (screen, loading)
//! sync deliveries ─┼─> NavigationCore ────┼─> TabController (tab, sheets)
//! bus events ──────┘                      └─> observers / outbox
//! ```

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use ulid::Ulid;

use crate::bus::{AppEvent, EventBus};
use crate::config::NavConfig;
use crate::coordinator::{next_root, RootEffect, RootSignal, RootState, SyncFailure};
use crate::error::{ErrorScope, NavError};
use crate::navigation::{TabController, TabTrigger};
use crate::onboarding::{OnboardingPolicy, OnboardingProgress};
use crate::screens::{FetchToken, ScreenFetchTracker};
use crate::session::{SessionStore, SyncApplied, SyncDelivery, SyncTicket};
use crate::sync::{spawn_sync, SyncDriver};
use crate::types::{
    DeepLinkEvent, MessageScope, NavigationSnapshot, Tab, TopLevelScreen, UserMessage,
};

/// Process-lifetime dependencies, built once at startup and passed in.
#[derive(Clone)]
pub struct NavContext {
    pub config: NavConfig,
    pub bus: Arc<EventBus>,
}

impl NavContext {
    pub fn new(config: NavConfig) -> Self {
        Self {
            config,
            bus: Arc::new(EventBus::new()),
        }
    }
}

impl Default for NavContext {
    fn default() -> Self {
        Self::new(NavConfig::default())
    }
}

/// Work the core wants done outside its own thread of control.
#[derive(Debug)]
pub enum Outbound {
    StateChanged(NavigationSnapshot),
    SyncRequested(Arc<SyncTicket>),
}

pub struct NavigationCore {
    context: NavContext,
    driver: SyncDriver,
    session: SessionStore,
    root: RootState,
    tabs: TabController,
    onboarding: OnboardingProgress,
    pending_deep_link: Option<DeepLinkEvent>,
    pending_sync_error: Option<String>,
    /// First-run completion arrived while a sync was outstanding.
    first_run_deferred: bool,
    messages: Vec<UserMessage>,
    screen_fetches: ScreenFetchTracker,
    bus_events: Receiver<AppEvent>,
    observers: Vec<Sender<NavigationSnapshot>>,
    outbox: Vec<Outbound>,
    last_published: Option<NavigationSnapshot>,
    started: bool,
}

impl NavigationCore {
    pub fn new(context: NavContext, driver: SyncDriver, session: SessionStore) -> Self {
        let bus_events = context.bus.subscribe();
        let tabs = TabController::new(context.config.default_tab);
        let onboarding = OnboardingProgress::new(OnboardingPolicy::from(&context.config));
        Self {
            context,
            driver,
            session,
            root: RootState::default(),
            tabs,
            onboarding,
            pending_deep_link: None,
            pending_sync_error: None,
            first_run_deferred: false,
            messages: Vec::new(),
            screen_fetches: ScreenFetchTracker::new(),
            bus_events,
            observers: Vec::new(),
            outbox: Vec::new(),
            last_published: None,
            started: false,
        }
    }

    pub fn context(&self) -> &NavContext {
        &self.context
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn watch_login(&mut self) -> Receiver<bool> {
        self.session.watch_login()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn screen(&self) -> TopLevelScreen {
        self.root.screen
    }

    pub fn active_tab(&self) -> Tab {
        self.tabs.active_tab()
    }

    pub fn is_loading(&self) -> bool {
        self.root.loading
    }

    pub fn snapshot(&self) -> NavigationSnapshot {
        let in_main = self.root.screen == TopLevelScreen::Main;
        NavigationSnapshot {
            screen: self.root.screen,
            active_tab: self.tabs.active_tab(),
            show_device_onboarding_sheet: in_main && self.tabs.show_device_onboarding_sheet(),
            show_assistant_onboarding: in_main && self.tabs.show_assistant_onboarding(),
            is_loading: self.root.loading,
            can_retry_sync: self.root.retry_available,
            messages: self.messages.clone(),
        }
    }

    /// Subscribes to snapshots. The current snapshot is delivered immediately.
    pub fn subscribe(&mut self) -> Receiver<NavigationSnapshot> {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(self.snapshot());
        self.observers.push(tx);
        rx
    }

    pub fn take_outbox(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbox)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Session Signals
    // ─────────────────────────────────────────────────────────────────────────────

    /// Runs the launch decision with the restored login state. Later calls are no-ops.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        info!(logged_in = self.session.is_logged_in(), "Navigation core starting");
        let value = self.session.publish();
        self.dispatch(RootSignal::LoginPublished(value));
    }

    pub fn login(&mut self) {
        let value = self.session.login();
        self.dispatch(RootSignal::LoginPublished(value));
    }

    pub fn logout(&mut self) {
        let value = self.session.logout();
        self.dispatch(RootSignal::LoginPublished(value));
    }

    /// Re-publishes the current login state. Every publish re-enters the
    /// decision; the in-flight guard keeps repeats from double-fetching.
    pub fn publish_login_state(&mut self) {
        let value = self.session.publish();
        self.dispatch(RootSignal::LoginPublished(value));
    }

    /// Requests a profile sync. Returns true if a new sync was started, false
    /// if one was already outstanding or nobody is signed in.
    pub fn sync_user(&mut self) -> bool {
        let was_syncing = self.session.is_syncing();
        self.dispatch(RootSignal::LoginPublished(self.session.is_logged_in()));
        !was_syncing && self.session.is_syncing()
    }

    /// Manual retry after a transient sync failure.
    pub fn retry_sync(&mut self) -> bool {
        if !self.root.retry_available {
            return false;
        }
        self.sync_user()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Deliveries
    // ─────────────────────────────────────────────────────────────────────────────

    /// Applies every sync result and bus event that has arrived, in arrival order.
    pub fn pump(&mut self) {
        for delivery in self.session.take_deliveries() {
            self.apply_delivery(delivery);
        }
        let events: Vec<AppEvent> = self.bus_events.try_iter().collect();
        for event in events {
            self.handle_event(event);
        }
        self.notify();
    }

    fn apply_delivery(&mut self, delivery: SyncDelivery) {
        let attempt = delivery.attempt;
        match self.session.apply_sync(delivery) {
            SyncApplied::Updated(profile) => {
                debug!(attempt, user_id = %profile.id, "Profile sync applied");
                self.dispatch(RootSignal::SyncSucceeded {
                    onboarded: profile.has_completed_onboarding,
                });
            }
            SyncApplied::Failed(err) => {
                warn!(attempt, error = %err, "Profile sync failed");
                let failure = match err.scope() {
                    ErrorScope::Session => SyncFailure::Auth,
                    _ => SyncFailure::Network,
                };
                self.pending_sync_error = Some(err.user_message());
                self.dispatch(RootSignal::SyncFailed(failure));
            }
            SyncApplied::Stale => self.dispatch(RootSignal::SyncDiscarded),
        }

        if self.first_run_deferred && !self.session.is_syncing() {
            self.first_run_deferred = false;
            self.complete_first_run();
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Onboarding and Deep Links
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::DeepLink(link) => self.handle_deep_link(link),
            AppEvent::DeviceOnboardingCompleted => {
                if !self.session.is_logged_in() {
                    debug!("Device onboarding completion ignored while signed out");
                    return;
                }
                self.onboarding.complete_device();
                if self.root.screen == TopLevelScreen::Main {
                    self.tabs.apply(&TabTrigger::DeviceOnboarding {
                        complete: self.onboarding.device_complete(),
                    });
                }
            }
            AppEvent::AssistantOnboardingCompleted => {
                if self.onboarding.complete_assistant() && self.root.screen == TopLevelScreen::Main
                {
                    self.tabs
                        .apply(&TabTrigger::AssistantOnboarding { active: false });
                }
            }
            AppEvent::FirstRunOnboardingCompleted => self.complete_first_run(),
        }
        self.notify();
    }

    fn handle_deep_link(&mut self, link: DeepLinkEvent) {
        if self.root.screen == TopLevelScreen::Main {
            self.tabs.apply(&TabTrigger::DeepLink(link));
        } else if self.session.is_logged_in() {
            debug!(link = ?link, "Deep link held until main interface is shown");
            self.pending_deep_link = Some(link);
        } else {
            debug!(link = ?link, "Deep link dropped while signed out");
        }
    }

    fn complete_first_run(&mut self) {
        if self.root.screen != TopLevelScreen::FirstRunOnboarding {
            debug!(screen = ?self.root.screen, "First-run completion outside first-run onboarding");
            return;
        }
        if self.session.is_syncing() {
            // The outstanding snapshot predates completion and would overwrite it.
            debug!("First-run completion deferred until outstanding sync resolves");
            self.first_run_deferred = true;
            return;
        }
        if let Some(profile) = self.session.current_user() {
            self.session.replace_user(profile.with_onboarding_completed());
        }
        self.dispatch(RootSignal::LoginPublished(self.session.is_logged_in()));
    }

    /// Starts the assistant introduction, or returns the one already running.
    /// `None` when the introduction isn't due.
    pub fn start_assistant_onboarding(&mut self) -> Option<String> {
        if self.root.screen != TopLevelScreen::Main || !self.onboarding.assistant_active() {
            return None;
        }
        Some(self.onboarding.start_assistant())
    }

    pub fn change_tab(&mut self, target: Tab) {
        self.tabs.change_tab(target);
        self.notify();
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Screen Fetches and Messages
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn begin_screen_fetch(&mut self, screen: &str) -> FetchToken {
        self.screen_fetches.begin(screen)
    }

    /// Records the outcome of a screen-level fetch. Returns false for results
    /// superseded by a newer request. Errors become screen-scoped messages and
    /// never touch navigation state.
    pub fn finish_screen_fetch(
        &mut self,
        screen: &str,
        request_id: u64,
        result: Result<(), NavError>,
    ) -> bool {
        if !self.screen_fetches.finish(screen, request_id) {
            debug!(screen, request_id, "Superseded screen fetch ignored");
            return false;
        }
        if let Err(err) = result {
            debug!(screen, error = %err, "Screen fetch failed");
            self.push_message(
                MessageScope::Screen {
                    key: screen.to_string(),
                },
                err.user_message(),
            );
            self.notify();
        }
        true
    }

    pub fn dismiss_message(&mut self, id: &str) -> bool {
        let before = self.messages.len();
        self.messages.retain(|message| message.id != id);
        let removed = self.messages.len() != before;
        if removed {
            self.notify();
        }
        removed
    }

    fn push_message(&mut self, scope: MessageScope, text: String) {
        self.messages.retain(|message| message.scope != scope);
        self.messages.push(UserMessage {
            id: Ulid::new().to_string(),
            scope,
            text,
            created_at: Utc::now().to_rfc3339(),
        });
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Root State Machine
    // ─────────────────────────────────────────────────────────────────────────────

    fn dispatch(&mut self, signal: RootSignal) {
        let previous = self.root.screen;
        let decision = next_root(self.root, signal, self.session.is_syncing());
        self.root = decision.state;

        if previous != self.root.screen {
            info!(
                from = previous.as_str(),
                to = self.root.screen.as_str(),
                "Screen transition"
            );
            self.on_screen_changed(previous);
        }

        for effect in decision.effects {
            self.perform(effect);
        }
        self.notify();
    }

    fn perform(&mut self, effect: RootEffect) {
        match effect {
            RootEffect::StartSync => match self.session.begin_sync() {
                Some(ticket) => match &self.driver {
                    SyncDriver::Worker(source) => spawn_sync(Arc::clone(source), ticket),
                    SyncDriver::Host => self.outbox.push(Outbound::SyncRequested(Arc::new(ticket))),
                },
                None => {
                    debug!("Sync not started; clearing loading state");
                    self.root.loading = false;
                }
            },
            RootEffect::ClearSession => {
                self.session.logout();
            }
            RootEffect::ReportSyncError(failure) => {
                let text = self.pending_sync_error.take().unwrap_or_else(|| {
                    let err = match failure {
                        SyncFailure::Auth => NavError::Auth(String::new()),
                        SyncFailure::Network => NavError::Network(String::new()),
                    };
                    err.user_message()
                });
                self.push_message(MessageScope::Session, text);
            }
            RootEffect::Reevaluate => {
                self.dispatch(RootSignal::LoginPublished(self.session.is_logged_in()));
            }
        }
    }

    fn on_screen_changed(&mut self, previous: TopLevelScreen) {
        match self.root.screen {
            TopLevelScreen::Main => self.enter_main(),
            TopLevelScreen::LoggedOut => {
                self.tabs.reset();
                self.onboarding.reset();
                self.pending_deep_link = None;
                self.first_run_deferred = false;
                self.screen_fetches.clear();
                self.messages
                    .retain(|message| message.scope == MessageScope::Session);
            }
            TopLevelScreen::Launching | TopLevelScreen::FirstRunOnboarding => {
                if previous == TopLevelScreen::Main {
                    self.tabs.reset();
                }
            }
        }
    }

    fn enter_main(&mut self) {
        let Some(profile) = self.session.current_user() else {
            warn!("Entered main interface without a profile");
            return;
        };
        self.onboarding.refresh(&profile);
        self.tabs.enter_main();

        if let Some(link) = self.pending_deep_link.take() {
            self.tabs.apply(&TabTrigger::DeepLink(link));
        }
        self.tabs.apply(&TabTrigger::DeviceOnboarding {
            complete: self.onboarding.device_complete(),
        });
        self.tabs.apply(&TabTrigger::AssistantOnboarding {
            active: self.onboarding.assistant_active(),
        });
    }

    fn notify(&mut self) {
        let snapshot = self.snapshot();
        if self.last_published.as_ref() == Some(&snapshot) {
            return;
        }
        self.observers.retain(|tx| tx.send(snapshot.clone()).is_ok());
        self.outbox.push(Outbound::StateChanged(snapshot.clone()));
        self.last_published = Some(snapshot);
    }
}
