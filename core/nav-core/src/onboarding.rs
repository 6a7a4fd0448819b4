//! Onboarding progress for the main interface.
//!
//! Two overlays can sit on top of `Main`:
//!
//! - **Device onboarding**: complete once the host reports device registration
//!   finished during the current login session.
//! - **Assistant introduction**: a one-time flow; while active the chat tab is
//!   forced so the introduction is visible.
//!
//! Flags are re-derived on every entry into `Main` from the profile plus the
//! session-local completion flags, and reset on logout.

use tracing::debug;
use ulid::Ulid;

use crate::config::NavConfig;
use crate::types::UserProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnboardingPolicy {
    pub device_enabled: bool,
    pub assistant_enabled: bool,
}

impl From<&NavConfig> for OnboardingPolicy {
    fn from(config: &NavConfig) -> Self {
        Self {
            device_enabled: config.device_onboarding_enabled,
            assistant_enabled: config.assistant_onboarding_enabled,
        }
    }
}

impl Default for OnboardingPolicy {
    fn default() -> Self {
        Self {
            device_enabled: true,
            assistant_enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnboardingProgress {
    policy: OnboardingPolicy,
    device_completed_this_session: bool,
    assistant_completed_this_session: bool,
    assistant_required: bool,
    assistant_session: Option<String>,
}

impl OnboardingProgress {
    pub fn new(policy: OnboardingPolicy) -> Self {
        Self {
            policy,
            device_completed_this_session: false,
            assistant_completed_this_session: false,
            assistant_required: false,
            assistant_session: None,
        }
    }

    /// Re-derives the flags from the current profile. Called on `Main` entry.
    pub fn refresh(&mut self, profile: &UserProfile) {
        self.assistant_required = self.policy.assistant_enabled
            && !profile.has_completed_assistant_onboarding
            && !self.assistant_completed_this_session;
        debug!(
            device_complete = self.device_complete(),
            assistant_active = self.assistant_active(),
            "Onboarding progress derived"
        );
    }

    /// Forgets everything learned during the session. Called on logout.
    pub fn reset(&mut self) {
        *self = Self::new(self.policy);
    }

    pub fn device_complete(&self) -> bool {
        !self.policy.device_enabled || self.device_completed_this_session
    }

    pub fn assistant_active(&self) -> bool {
        self.assistant_required
    }

    pub fn assistant_session(&self) -> Option<&str> {
        self.assistant_session.as_deref()
    }

    /// Records device onboarding completion. Returns true if this changed anything.
    pub fn complete_device(&mut self) -> bool {
        let was_complete = self.device_complete();
        self.device_completed_this_session = true;
        !was_complete
    }

    /// Starts (or rejoins) the assistant introduction and returns its session id.
    ///
    /// Repeated calls before completion return the same id.
    pub fn start_assistant(&mut self) -> String {
        if let Some(existing) = &self.assistant_session {
            return existing.clone();
        }
        let session_id = Ulid::new().to_string();
        debug!(session_id = %session_id, "Assistant onboarding started");
        self.assistant_session = Some(session_id.clone());
        session_id
    }

    /// Records assistant introduction completion. Returns true if this changed anything.
    pub fn complete_assistant(&mut self) -> bool {
        let was_active = self.assistant_required;
        self.assistant_completed_this_session = true;
        self.assistant_required = false;
        self.assistant_session = None;
        was_active
    }
}
