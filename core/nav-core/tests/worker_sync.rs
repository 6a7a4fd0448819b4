//! Profile sync on worker threads, with results delivered back through `pump`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use nav_core::{
    NavContext, NavError, NavigationCore, ProfileSource, SessionStore, SyncDriver, TopLevelScreen,
    UserProfile,
};

const WAIT: Duration = Duration::from_secs(5);

/// Blocks each fetch until the test releases a result through `release`.
struct GatedSource {
    results: Mutex<Receiver<Result<UserProfile, NavError>>>,
    calls: AtomicUsize,
}

impl GatedSource {
    fn new() -> (Arc<Self>, Sender<Result<UserProfile, NavError>>) {
        let (tx, rx) = mpsc::channel();
        let source = Arc::new(Self {
            results: Mutex::new(rx),
            calls: AtomicUsize::new(0),
        });
        (source, tx)
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ProfileSource for GatedSource {
    fn fetch_user(&self) -> Result<UserProfile, NavError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let results = self.results.lock().expect("results lock");
        results
            .recv_timeout(WAIT)
            .unwrap_or_else(|_| Err(NavError::Network("test source timed out".into())))
    }
}

struct PanickingSource;

impl ProfileSource for PanickingSource {
    fn fetch_user(&self) -> Result<UserProfile, NavError> {
        panic!("backend client blew up");
    }
}

fn onboarded() -> UserProfile {
    UserProfile {
        id: "user-1".to_string(),
        has_completed_onboarding: true,
        has_completed_assistant_onboarding: true,
        ..UserProfile::default()
    }
}

/// Pumps until the outstanding sync has been applied. False on timeout.
fn pump_until_synced(core: &mut NavigationCore, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        core.pump();
        if !core.session().is_syncing() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
}

fn worker_core(source: Arc<dyn ProfileSource>, logged_in: bool) -> NavigationCore {
    NavigationCore::new(
        NavContext::default(),
        SyncDriver::Worker(source),
        SessionStore::restored(logged_in),
    )
}

#[test]
fn worker_result_is_applied_on_pump() {
    let (source, release) = GatedSource::new();
    let mut core = worker_core(source.clone(), true);
    core.start();
    assert!(core.is_loading());

    release.send(Ok(onboarded())).expect("release result");
    assert!(pump_until_synced(&mut core, WAIT));
    assert_eq!(core.screen(), TopLevelScreen::Main);
    assert_eq!(source.calls(), 1);
}

#[test]
fn rapid_publishes_issue_one_network_call() {
    let (source, release) = GatedSource::new();
    let mut core = worker_core(source.clone(), true);
    core.start();
    for _ in 0..10 {
        core.publish_login_state();
        core.pump();
    }

    release.send(Ok(onboarded())).expect("release result");
    assert!(pump_until_synced(&mut core, WAIT));
    assert_eq!(source.calls(), 1);
}

#[test]
fn logout_while_worker_runs_keeps_logged_out() {
    let (source, release) = GatedSource::new();
    let mut core = worker_core(source.clone(), true);
    core.start();
    core.logout();

    release.send(Ok(onboarded())).expect("release result");
    assert!(pump_until_synced(&mut core, WAIT));
    assert_eq!(core.screen(), TopLevelScreen::LoggedOut);
    assert!(core.session().current_user().is_none());
}

#[test]
fn panicking_source_releases_guard() {
    let mut core = worker_core(Arc::new(PanickingSource), true);
    core.start();

    assert!(pump_until_synced(&mut core, WAIT));
    assert!(!core.is_loading());
    assert!(core.snapshot().can_retry_sync);
    assert_eq!(core.screen(), TopLevelScreen::Launching);
}
