//! Session store: login state, the current profile snapshot, and the
//! single-flight guard around profile sync.
//!
//! The store lives on the coordination thread. Sync work happens elsewhere
//! (a worker thread or the host's networking stack) and comes back as a
//! [`SyncDelivery`] over a channel, so every mutation here is serialized
//! without locks.
//!
//! # Generations
//!
//! Every login and logout bumps the session generation. A [`SyncTicket`]
//! remembers the generation it was issued under; a delivery whose generation
//! no longer matches is stale and is dropped without touching the profile.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::NavError;
use crate::types::{AuthSession, UserProfile};

/// A finished (or abandoned) sync, waiting to be applied on the coordination thread.
#[derive(Debug)]
pub struct SyncDelivery {
    pub attempt: u64,
    pub generation: u64,
    pub result: Result<UserProfile, NavError>,
}

/// What applying a delivery did to the session.
#[derive(Debug)]
pub enum SyncApplied {
    Updated(Arc<UserProfile>),
    Failed(NavError),
    /// The session that requested the sync has ended; nothing changed.
    Stale,
}

/// Handle for one outstanding profile sync.
///
/// Resolve it exactly once with the fetch result. Dropping an unresolved
/// ticket reports the sync as abandoned, so the in-flight guard is always
/// released.
#[derive(Debug, uniffi::Object)]
pub struct SyncTicket {
    attempt: u64,
    generation: u64,
    resolved: AtomicBool,
    deliveries: Sender<SyncDelivery>,
}

impl SyncTicket {
    /// Hands the fetch result back to the coordinator. Returns false if the
    /// ticket was already resolved.
    pub fn resolve(&self, result: Result<UserProfile, NavError>) -> bool {
        if self.resolved.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.send(result);
        true
    }

    fn send(&self, result: Result<UserProfile, NavError>) {
        let delivery = SyncDelivery {
            attempt: self.attempt,
            generation: self.generation,
            result,
        };
        if self.deliveries.send(delivery).is_err() {
            debug!(attempt = self.attempt, "Sync delivery dropped; session store is gone");
        }
    }
}

#[uniffi::export]
impl SyncTicket {
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.load(Ordering::Acquire)
    }
}

impl Drop for SyncTicket {
    fn drop(&mut self) {
        if !self.resolved.swap(true, Ordering::AcqRel) {
            warn!(attempt = self.attempt, "Sync ticket dropped without a result");
            self.send(Err(NavError::Network(
                "sync abandoned before completion".to_string(),
            )));
        }
    }
}

pub struct SessionStore {
    logged_in: bool,
    current_user: Option<Arc<UserProfile>>,
    generation: u64,
    next_attempt: u64,
    in_flight: Option<u64>,
    deliveries_tx: Sender<SyncDelivery>,
    deliveries_rx: Receiver<SyncDelivery>,
    login_watchers: Vec<Sender<bool>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (deliveries_tx, deliveries_rx) = mpsc::channel();
        Self {
            logged_in: false,
            current_user: None,
            generation: 0,
            next_attempt: 1,
            in_flight: None,
            deliveries_tx,
            deliveries_rx,
            login_watchers: Vec::new(),
        }
    }

    /// Restores a persisted "signed in" flag at process start without publishing.
    pub fn restored(logged_in: bool) -> Self {
        let mut store = Self::new();
        store.logged_in = logged_in;
        store
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    pub fn current_user(&self) -> Option<Arc<UserProfile>> {
        self.current_user.clone()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_syncing(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn auth_session(&self) -> AuthSession {
        AuthSession {
            is_logged_in: self.logged_in,
            current_user: self.current_user.as_deref().cloned(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Login State
    // ─────────────────────────────────────────────────────────────────────────────

    /// Subscribes to login-state publishes. The current value is sent first.
    pub fn watch_login(&mut self) -> Receiver<bool> {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(self.logged_in);
        self.login_watchers.push(tx);
        rx
    }

    /// Marks the session signed in and publishes `true`.
    pub fn login(&mut self) -> bool {
        if !self.logged_in {
            self.generation += 1;
            info!(generation = self.generation, "Session signed in");
        }
        self.logged_in = true;
        self.publish()
    }

    /// Clears the session and publishes `false`.
    ///
    /// Bumps the generation so a sync started for the old session is ignored
    /// when it resolves.
    pub fn logout(&mut self) -> bool {
        if self.logged_in {
            self.generation += 1;
            info!(generation = self.generation, "Session signed out");
        }
        self.logged_in = false;
        self.current_user = None;
        self.publish()
    }

    /// Publishes the current login state again, even if unchanged.
    pub fn publish(&mut self) -> bool {
        let value = self.logged_in;
        self.login_watchers.retain(|tx| tx.send(value).is_ok());
        value
    }

    /// Swaps in a new profile snapshot outside of a sync (first-run completion).
    pub fn replace_user(&mut self, profile: UserProfile) {
        if self.logged_in {
            self.current_user = Some(Arc::new(profile));
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Profile Sync
    // ─────────────────────────────────────────────────────────────────────────────

    /// Claims the in-flight slot. Returns `None` if a sync is already outstanding
    /// or nobody is signed in.
    pub fn begin_sync(&mut self) -> Option<SyncTicket> {
        if !self.logged_in {
            return None;
        }
        if let Some(attempt) = self.in_flight {
            debug!(attempt, "Sync already in flight; suppressing");
            return None;
        }

        let attempt = self.next_attempt;
        self.next_attempt += 1;
        self.in_flight = Some(attempt);
        debug!(attempt, generation = self.generation, "Sync started");

        Some(SyncTicket {
            attempt,
            generation: self.generation,
            resolved: AtomicBool::new(false),
            deliveries: self.deliveries_tx.clone(),
        })
    }

    /// Returns deliveries that have arrived since the last call, in arrival order.
    pub fn take_deliveries(&self) -> Vec<SyncDelivery> {
        self.deliveries_rx.try_iter().collect()
    }

    /// Applies a delivery and releases the in-flight slot it held.
    pub fn apply_sync(&mut self, delivery: SyncDelivery) -> SyncApplied {
        if self.in_flight != Some(delivery.attempt) {
            debug!(attempt = delivery.attempt, "Ignoring delivery for unknown sync attempt");
            return SyncApplied::Stale;
        }
        self.in_flight = None;

        if delivery.generation != self.generation || !self.logged_in {
            let stale = NavError::StaleSession {
                ticket: delivery.generation,
                current: self.generation,
            };
            debug!(attempt = delivery.attempt, reason = %stale, "Discarding sync result");
            return SyncApplied::Stale;
        }

        match delivery.result {
            Ok(profile) => {
                let profile = Arc::new(profile);
                self.current_user = Some(Arc::clone(&profile));
                SyncApplied::Updated(profile)
            }
            Err(err) => SyncApplied::Failed(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(onboarded: bool) -> UserProfile {
        UserProfile {
            id: "u-1".to_string(),
            has_completed_onboarding: onboarded,
            ..UserProfile::default()
        }
    }

    fn deliver(store: &mut SessionStore) -> SyncApplied {
        let delivery = store
            .take_deliveries()
            .into_iter()
            .next()
            .expect("delivery");
        store.apply_sync(delivery)
    }

    #[test]
    fn begin_sync_requires_login() {
        let mut store = SessionStore::new();
        assert!(store.begin_sync().is_none());
    }

    #[test]
    fn second_begin_sync_is_suppressed_while_in_flight() {
        let mut store = SessionStore::new();
        store.login();
        let ticket = store.begin_sync().expect("first ticket");
        assert!(store.begin_sync().is_none());
        assert!(store.is_syncing());

        ticket.resolve(Ok(profile(true)));
        assert!(matches!(deliver(&mut store), SyncApplied::Updated(_)));
        assert!(!store.is_syncing());
        assert!(store.begin_sync().is_some());
    }

    #[test]
    fn successful_sync_replaces_profile_wholesale() {
        let mut store = SessionStore::new();
        store.login();
        let ticket = store.begin_sync().expect("ticket");
        ticket.resolve(Ok(profile(false)));
        deliver(&mut store);
        let first = store.current_user().expect("first profile");

        let ticket = store.begin_sync().expect("ticket");
        ticket.resolve(Ok(profile(true)));
        deliver(&mut store);
        let second = store.current_user().expect("second profile");

        assert!(!first.has_completed_onboarding);
        assert!(second.has_completed_onboarding);
        assert!(store.is_logged_in());
    }

    #[test]
    fn result_after_logout_is_stale() {
        let mut store = SessionStore::new();
        store.login();
        let ticket = store.begin_sync().expect("ticket");
        store.logout();

        ticket.resolve(Ok(profile(true)));
        assert!(matches!(deliver(&mut store), SyncApplied::Stale));
        assert!(store.current_user().is_none());
        assert!(!store.is_syncing());
    }

    #[test]
    fn result_from_previous_login_is_stale() {
        let mut store = SessionStore::new();
        store.login();
        let ticket = store.begin_sync().expect("ticket");
        store.logout();
        store.login();

        ticket.resolve(Ok(profile(true)));
        assert!(matches!(deliver(&mut store), SyncApplied::Stale));
        assert!(store.current_user().is_none());
    }

    #[test]
    fn dropped_ticket_releases_guard_with_network_error() {
        let mut store = SessionStore::new();
        store.login();
        drop(store.begin_sync().expect("ticket"));

        match deliver(&mut store) {
            SyncApplied::Failed(NavError::Network(_)) => {}
            other => panic!("expected network failure, got {:?}", other),
        }
        assert!(!store.is_syncing());
    }

    #[test]
    fn resolve_is_single_use() {
        let mut store = SessionStore::new();
        store.login();
        let ticket = store.begin_sync().expect("ticket");
        assert!(ticket.resolve(Ok(profile(true))));
        assert!(!ticket.resolve(Ok(profile(false))));
        drop(ticket);
        assert_eq!(store.take_deliveries().len(), 1);
    }

    #[test]
    fn watchers_receive_current_value_then_every_publish() {
        let mut store = SessionStore::new();
        let rx = store.watch_login();
        store.login();
        store.publish();
        store.logout();

        let seen: Vec<bool> = rx.try_iter().collect();
        assert_eq!(seen, vec![false, true, true, false]);
    }

    #[test]
    fn logout_clears_user_synchronously() {
        let mut store = SessionStore::new();
        store.login();
        let ticket = store.begin_sync().expect("ticket");
        ticket.resolve(Ok(profile(true)));
        deliver(&mut store);

        store.logout();
        let session = store.auth_session();
        assert!(!session.is_logged_in);
        assert!(session.current_user.is_none());
    }
}
