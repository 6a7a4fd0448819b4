//! Off-thread profile sync for Rust-native hosts.
//!
//! Mobile hosts usually run the request in their own networking stack and
//! resolve the [`SyncTicket`] themselves. Rust hosts hand the core a
//! [`ProfileSource`] instead; each sync then runs on a short-lived worker
//! thread and the result travels back through the ticket.

use std::sync::Arc;
use std::thread;

use tracing::warn;

use crate::error::NavError;
use crate::session::SyncTicket;
use crate::types::UserProfile;

/// Fetches the signed-in user's profile. Called off the coordination thread.
pub trait ProfileSource: Send + Sync {
    fn fetch_user(&self) -> Result<UserProfile, NavError>;
}

/// Who performs the network request when the coordinator asks for a sync.
#[derive(Clone)]
pub enum SyncDriver {
    /// Spawn a worker thread calling the source.
    Worker(Arc<dyn ProfileSource>),
    /// Hand the ticket to the host through the outbox.
    Host,
}

/// Runs one fetch on a worker thread and resolves `ticket` with the result.
///
/// If the thread cannot be spawned, or the source panics, the ticket is
/// dropped unresolved and the coordinator sees an abandoned sync.
pub fn spawn_sync(source: Arc<dyn ProfileSource>, ticket: SyncTicket) {
    let attempt = ticket.attempt();
    let spawned = thread::Builder::new()
        .name(format!("profile-sync-{}", attempt))
        .spawn(move || {
            let result = source.fetch_user();
            ticket.resolve(result);
        });

    if let Err(err) = spawned {
        warn!(error = %err, attempt, "Failed to spawn profile sync worker");
    }
}
