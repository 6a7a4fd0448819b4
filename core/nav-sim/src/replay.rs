//! Replays a JSON-lines script of signals against a [`NavEngine`].
//!
//! Each non-empty line is one step, e.g.
//!
//! ```text
//! {"signal":"start"}
//! {"signal":"sync_success","profile":{"has_completed_onboarding":true}}
//! {"signal":"notification","payload":{"kind":"lab_order_opened"}}
//! ```
//!
//! Syncs are resolved by the script itself: `sync_success`,
//! `sync_auth_failed` and `sync_network_failed` complete the oldest pending
//! ticket. After every step one JSON report line is written.

use std::collections::VecDeque;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use nav_core::{
    NavConfig, NavContext, NavEngine, NavigationObserver, NavigationSnapshot, SessionStore,
    SyncDriver, SyncOutcome, SyncTicket, Tab, UserProfile,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::SimError;

#[derive(Debug, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum Step {
    Start,
    Login,
    Logout,
    PublishLogin,
    SyncUser,
    RetrySync,
    SyncSuccess {
        #[serde(default)]
        profile: UserProfile,
    },
    SyncAuthFailed {
        #[serde(default)]
        message: String,
    },
    SyncNetworkFailed {
        #[serde(default)]
        message: String,
    },
    FirstRunCompleted,
    DeviceOnboardingCompleted,
    AssistantOnboardingCompleted,
    StartAssistant,
    Notification {
        payload: serde_json::Value,
    },
    DeepLinkUrl {
        url: String,
    },
    ChangeTab {
        tab: Tab,
    },
    DismissMessage {
        id: String,
    },
}

#[derive(Debug, Serialize)]
pub struct StepReport {
    pub line: usize,
    pub signal: String,
    pub snapshot: NavigationSnapshot,
    pub pending_syncs: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Queues sync tickets until the script resolves them.
#[derive(Clone, Default)]
struct ScriptObserver {
    tickets: Arc<Mutex<VecDeque<Arc<SyncTicket>>>>,
}

impl ScriptObserver {
    fn next_ticket(&self) -> Option<Arc<SyncTicket>> {
        self.tickets.lock().ok()?.pop_front()
    }

    fn pending(&self) -> usize {
        self.tickets.lock().map(|t| t.len()).unwrap_or(0)
    }
}

impl NavigationObserver for ScriptObserver {
    fn on_state_changed(&self, snapshot: NavigationSnapshot) {
        debug!(screen = ?snapshot.screen, tab = ?snapshot.active_tab, "State changed");
    }

    fn on_sync_requested(&self, ticket: Arc<SyncTicket>) {
        if let Ok(mut tickets) = self.tickets.lock() {
            tickets.push_back(ticket);
        }
    }
}

pub struct Replayer {
    engine: NavEngine,
    observer: ScriptObserver,
}

impl Replayer {
    pub fn new(config: NavConfig, logged_in: bool) -> Self {
        let engine = NavEngine::with_context(
            NavContext::new(config),
            SyncDriver::Host,
            SessionStore::restored(logged_in),
        );
        let observer = ScriptObserver::default();
        engine.add_observer(Box::new(observer.clone()));
        Self { engine, observer }
    }

    /// Applies one step. `Ok(Some(_))` carries a non-fatal rejection, such as
    /// an invalid notification payload.
    pub fn apply(&self, line: usize, step: Step) -> Result<Option<String>, SimError> {
        match step {
            Step::Start => self.engine.start(),
            Step::Login => self.engine.login(),
            Step::Logout => self.engine.logout(),
            Step::PublishLogin => self.engine.publish_login_state(),
            Step::SyncUser => {
                self.engine.sync_user();
            }
            Step::RetrySync => {
                self.engine.retry_sync();
            }
            Step::SyncSuccess { profile } => {
                self.resolve(line, "sync_success", SyncOutcome::Success { profile })?
            }
            Step::SyncAuthFailed { message } => self.resolve(
                line,
                "sync_auth_failed",
                SyncOutcome::AuthRejected { message },
            )?,
            Step::SyncNetworkFailed { message } => self.resolve(
                line,
                "sync_network_failed",
                SyncOutcome::NetworkFailed { message },
            )?,
            Step::FirstRunCompleted => self.engine.complete_first_run_onboarding(),
            Step::DeviceOnboardingCompleted => self.engine.complete_device_onboarding(),
            Step::AssistantOnboardingCompleted => self.engine.complete_assistant_onboarding(),
            Step::StartAssistant => {
                self.engine.start_assistant_onboarding();
            }
            Step::Notification { payload } => {
                if let Err(err) = self.engine.open_notification(payload.to_string()) {
                    return Ok(Some(err.to_string()));
                }
            }
            Step::DeepLinkUrl { url } => {
                if let Err(err) = self.engine.open_url(url) {
                    return Ok(Some(err.to_string()));
                }
            }
            Step::ChangeTab { tab } => self.engine.change_tab(tab),
            Step::DismissMessage { id } => {
                self.engine.dismiss_message(id);
            }
        }
        Ok(None)
    }

    fn resolve(&self, line: usize, signal: &str, outcome: SyncOutcome) -> Result<(), SimError> {
        let ticket = self
            .observer
            .next_ticket()
            .ok_or_else(|| SimError::NoPendingSync {
                line,
                signal: signal.to_string(),
            })?;
        self.engine.complete_sync(ticket, outcome);
        Ok(())
    }

    pub fn report(&self, line: usize, signal: String, error: Option<String>) -> StepReport {
        StepReport {
            line,
            signal,
            snapshot: self.engine.snapshot(),
            pending_syncs: self.observer.pending(),
            error,
        }
    }
}

fn parse_step(line: usize, text: &str) -> Result<(String, Step), SimError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|source| SimError::Script { line, source })?;
    let signal = value
        .get("signal")
        .and_then(|s| s.as_str())
        .unwrap_or_default()
        .to_string();
    let step = serde_json::from_value(value).map_err(|source| SimError::Script { line, source })?;
    Ok((signal, step))
}

/// Runs `script` and writes one report per step to `out`. Lines that are
/// blank or start with `#` are skipped. Returns the number of steps applied.
pub fn run_script(
    script: &str,
    config: NavConfig,
    logged_in: bool,
    out: &mut impl Write,
) -> Result<usize, SimError> {
    let replayer = Replayer::new(config, logged_in);
    let mut steps = 0;

    for (index, raw) in script.lines().enumerate() {
        let line = index + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }

        let (signal, step) = parse_step(line, text)?;
        let error = replayer.apply(line, step)?;
        let report = replayer.report(line, signal, error);
        serde_json::to_writer(&mut *out, &report).map_err(SimError::Output)?;
        writeln!(out)?;
        steps += 1;
    }

    info!(steps, "Replay finished");
    Ok(steps)
}

pub fn run(path: &Path, config: NavConfig, logged_in: bool) -> Result<usize, SimError> {
    let script = fs_err::read_to_string(path)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_script(&script, config, logged_in, &mut out)
}
