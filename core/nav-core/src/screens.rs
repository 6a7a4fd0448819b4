//! Latest-request-wins bookkeeping for screen-level fetches.
//!
//! Search and filter screens may fire a request per keystroke. Each request
//! gets an id; only the most recent id for a screen is accepted when results
//! come back, so older responses can never overwrite newer ones.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchToken {
    pub screen: String,
    pub request_id: u64,
}

#[derive(Debug, Default)]
pub struct ScreenFetchTracker {
    latest: HashMap<String, u64>,
    next_id: u64,
}

impl ScreenFetchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, screen: &str) -> FetchToken {
        self.next_id += 1;
        self.latest.insert(screen.to_string(), self.next_id);
        FetchToken {
            screen: screen.to_string(),
            request_id: self.next_id,
        }
    }

    /// True if `request_id` is still the newest request for `screen`.
    pub fn is_current(&self, screen: &str, request_id: u64) -> bool {
        self.latest.get(screen) == Some(&request_id)
    }

    /// Accepts a finished request if it is current and retires it.
    pub fn finish(&mut self, screen: &str, request_id: u64) -> bool {
        if !self.is_current(screen, request_id) {
            return false;
        }
        self.latest.remove(screen);
        true
    }

    pub fn clear(&mut self) {
        self.latest.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_latest_request_is_accepted() {
        let mut tracker = ScreenFetchTracker::new();
        let first = tracker.begin("immunizations");
        let second = tracker.begin("immunizations");

        assert!(!tracker.finish(&first.screen, first.request_id));
        assert!(tracker.finish(&second.screen, second.request_id));
    }

    #[test]
    fn screens_are_tracked_independently() {
        let mut tracker = ScreenFetchTracker::new();
        let immunizations = tracker.begin("immunizations");
        let procedures = tracker.begin("procedures");

        assert!(tracker.finish(&immunizations.screen, immunizations.request_id));
        assert!(tracker.finish(&procedures.screen, procedures.request_id));
    }

    #[test]
    fn finished_request_cannot_be_accepted_twice() {
        let mut tracker = ScreenFetchTracker::new();
        let token = tracker.begin("notifications");
        assert!(tracker.finish(&token.screen, token.request_id));
        assert!(!tracker.finish(&token.screen, token.request_id));
    }
}
