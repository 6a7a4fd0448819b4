//! Maps login and sync signals to the top-level screen.
//!
//! `next_root` is pure: the screen depends only on the current root state, the
//! signal, and whether a sync is already outstanding. Side effects come back as
//! [`RootEffect`]s for the caller to perform.

use crate::types::TopLevelScreen;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootState {
    pub screen: TopLevelScreen,
    pub loading: bool,
    /// Last sync failed transiently; a manual retry may be offered.
    pub retry_available: bool,
}

impl Default for RootState {
    fn default() -> Self {
        Self {
            screen: TopLevelScreen::Launching,
            loading: false,
            retry_available: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncFailure {
    Auth,
    Network,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootSignal {
    /// Every published login value, repeats included.
    LoginPublished(bool),
    SyncSucceeded { onboarded: bool },
    SyncFailed(SyncFailure),
    /// A sync resolved for a session that has since ended.
    SyncDiscarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootEffect {
    StartSync,
    /// Session was rejected by the backend; sign out locally.
    ClearSession,
    ReportSyncError(SyncFailure),
    /// Re-run the decision with the current login value.
    Reevaluate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootDecision {
    pub state: RootState,
    pub effects: Vec<RootEffect>,
}

pub fn next_root(current: RootState, signal: RootSignal, sync_in_flight: bool) -> RootDecision {
    match signal {
        RootSignal::LoginPublished(false) => RootDecision {
            state: RootState {
                screen: TopLevelScreen::LoggedOut,
                loading: false,
                retry_available: false,
            },
            effects: Vec::new(),
        },
        RootSignal::LoginPublished(true) => {
            // The outstanding sync resolves first; a stale one re-enters via Reevaluate.
            if sync_in_flight {
                return RootDecision {
                    state: RootState {
                        loading: true,
                        ..current
                    },
                    effects: Vec::new(),
                };
            }
            RootDecision {
                state: RootState {
                    loading: true,
                    retry_available: false,
                    ..current
                },
                effects: vec![RootEffect::StartSync],
            }
        }
        RootSignal::SyncSucceeded { onboarded } => RootDecision {
            state: RootState {
                screen: if onboarded {
                    TopLevelScreen::Main
                } else {
                    TopLevelScreen::FirstRunOnboarding
                },
                loading: false,
                retry_available: false,
            },
            effects: Vec::new(),
        },
        RootSignal::SyncFailed(SyncFailure::Auth) => RootDecision {
            state: RootState {
                screen: TopLevelScreen::LoggedOut,
                loading: false,
                retry_available: false,
            },
            effects: vec![
                RootEffect::ClearSession,
                RootEffect::ReportSyncError(SyncFailure::Auth),
            ],
        },
        RootSignal::SyncFailed(SyncFailure::Network) => RootDecision {
            state: RootState {
                loading: false,
                retry_available: true,
                ..current
            },
            effects: vec![RootEffect::ReportSyncError(SyncFailure::Network)],
        },
        RootSignal::SyncDiscarded => RootDecision {
            state: RootState {
                loading: false,
                ..current
            },
            effects: vec![RootEffect::Reevaluate],
        },
    }
}

/// Folds a sequence of signals from the launch state. Used to check that the
/// screen is a function of the signal history alone.
pub fn replay(signals: &[(RootSignal, bool)]) -> RootState {
    signals
        .iter()
        .fold(RootState::default(), |state, (signal, in_flight)| {
            next_root(state, *signal, *in_flight).state
        })
}
