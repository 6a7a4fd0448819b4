//! App-wide event bus.
//!
//! Broadcasts cross-screen events (notification deep links, onboarding
//! completions) to every subscriber. One bus lives for the whole process, but
//! it is constructed explicitly and handed to whoever needs it.
//!
//! Each subscriber gets its own channel, so events reach a subscriber in
//! publish order. Subscribers that have gone away are pruned on publish.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

use tracing::debug;

use crate::types::DeepLinkEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    DeepLink(DeepLinkEvent),
    DeviceOnboardingCompleted,
    AssistantOnboardingCompleted,
    FirstRunOnboardingCompleted,
}

#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Sender<AppEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<AppEvent> {
        let (tx, rx) = mpsc::channel();
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(tx);
        }
        rx
    }

    /// Sends `event` to every live subscriber. Returns how many received it.
    pub fn publish(&self, event: AppEvent) -> usize {
        let Ok(mut subscribers) = self.subscribers.lock() else {
            return 0;
        };
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        debug!(event = ?event, subscribers = subscribers.len(), "Event published");
        subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .map(|subscribers| subscribers.len())
            .unwrap_or(0)
    }
}
