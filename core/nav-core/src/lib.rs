//! # nav-core
//!
//! Navigation and session coordinator shared by the HealthChat mobile clients.
//! Decides which top-level screen the user sees (launch, login, first-run
//! onboarding, main tabs) and which tab and overlays are active, from login
//! state, profile sync results, onboarding completions and notification deep
//! links.
//!
//! ## Design Principles
//!
//! - **Explicit state machine**: the top-level screen only changes through
//!   [`coordinator::next_root`]; tabs and overlays only through
//!   [`navigation::TabController`].
//! - **Single coordination thread**: background results arrive over channels
//!   and are applied in order by [`NavigationCore::pump`].
//! - **Injected context**: the event bus and config are built once and passed
//!   in ([`NavContext`]); nothing is a global.
//! - **FFI-ready**: UniFFI annotations enable Swift and Kotlin bindings.
//!   Prefer additive public API changes; removing or renaming breaks FFI clients.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nav_core::{NavContext, NavigationCore, SessionStore, SyncDriver};
//!
//! let mut core = NavigationCore::new(NavContext::default(), SyncDriver::Worker(source), SessionStore::restored(true));
//! core.start();
//! core.pump();
//! ```

// UniFFI scaffolding for Swift/Kotlin bindings
uniffi::setup_scaffolding!();

pub mod app;
pub mod bus;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod navigation;
pub mod onboarding;
pub mod patterns;
pub mod screens;
pub mod session;
pub mod sync;
pub mod types;

pub use app::{NavContext, NavigationCore, Outbound};
pub use bus::{AppEvent, EventBus};
pub use config::{load_config, NavConfig};
pub use engine::{NavEngine, NavigationObserver, ScreenFetchError, SyncOutcome};
pub use error::{ErrorScope, NavError, NavFfiError, Result};
pub use session::{SessionStore, SyncTicket};
pub use sync::{ProfileSource, SyncDriver};
pub use types::*;
