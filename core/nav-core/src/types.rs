//! Core types shared across all HealthChat clients.
//!
//! iOS and Android hosts, the `nav-sim` harness, and the core itself use these
//! exact types, so a screen decision means the same thing everywhere.
//!
//! **FFI Support:** All types are annotated with UniFFI macros for Swift/Kotlin bindings.

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// Screens and Tabs
// ═══════════════════════════════════════════════════════════════════════════════

/// The top-level screen the host should present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "snake_case")]
pub enum TopLevelScreen {
    /// Launch splash, shown until the first decision resolves.
    Launching,
    LoggedOut,
    FirstRunOnboarding,
    /// The tabbed interface. Only reachable with an onboarded, logged-in user.
    Main,
}

impl TopLevelScreen {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopLevelScreen::Launching => "launching",
            TopLevelScreen::LoggedOut => "logged_out",
            TopLevelScreen::FirstRunOnboarding => "first_run_onboarding",
            TopLevelScreen::Main => "main",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, uniffi::Enum,
)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    #[default]
    Overview,
    Chat,
    Account,
}

impl Tab {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Overview => "overview",
            Tab::Chat => "chat",
            Tab::Account => "account",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Session Types
// ═══════════════════════════════════════════════════════════════════════════════

/// Snapshot of the signed-in user as returned by the profile sync.
///
/// Never mutated in place: the session store swaps in a new snapshot on every
/// successful sync so observers never see a half-updated profile.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, uniffi::Record)]
pub struct UserProfile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub has_completed_onboarding: bool,
    #[serde(default)]
    pub has_completed_assistant_onboarding: bool,
    #[serde(default)]
    pub conversation_count: u32,
    #[serde(default)]
    pub immunization_count: u32,
    #[serde(default)]
    pub procedure_count: u32,
}

impl UserProfile {
    /// Returns a copy with first-run onboarding marked complete.
    pub fn with_onboarding_completed(&self) -> Self {
        Self {
            has_completed_onboarding: true,
            ..self.clone()
        }
    }
}

/// Read-only view of the authentication state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, uniffi::Record)]
pub struct AuthSession {
    pub is_logged_in: bool,
    pub current_user: Option<UserProfile>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Deep Links
// ═══════════════════════════════════════════════════════════════════════════════

/// A notification-driven jump to a specific part of the app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeepLinkEvent {
    ConversationOpened { id: String },
    LabOrderOpened,
}

impl DeepLinkEvent {
    /// The tab this link lands on.
    pub fn target_tab(&self) -> Tab {
        match self {
            DeepLinkEvent::ConversationOpened { .. } => Tab::Chat,
            DeepLinkEvent::LabOrderOpened => Tab::Overview,
        }
    }
}

impl From<nav_protocol::DeepLinkTarget> for DeepLinkEvent {
    fn from(target: nav_protocol::DeepLinkTarget) -> Self {
        match target {
            nav_protocol::DeepLinkTarget::Conversation { id } => {
                DeepLinkEvent::ConversationOpened { id }
            }
            nav_protocol::DeepLinkTarget::LabOrders => DeepLinkEvent::LabOrderOpened,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Messages
// ═══════════════════════════════════════════════════════════════════════════════

/// Where a dismissible message belongs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, uniffi::Enum)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum MessageScope {
    /// Login or profile sync failure; shown over whatever top-level screen is active.
    Session,
    /// A screen-level fetch failure; only that screen shows it.
    Screen { key: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, uniffi::Record)]
pub struct UserMessage {
    pub id: String,
    pub scope: MessageScope,
    pub text: String,
    pub created_at: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Navigation Snapshot
// ═══════════════════════════════════════════════════════════════════════════════

/// Everything a host needs to render navigation, copied out of the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, uniffi::Record)]
pub struct NavigationSnapshot {
    pub screen: TopLevelScreen,
    pub active_tab: Tab,
    pub show_device_onboarding_sheet: bool,
    pub show_assistant_onboarding: bool,
    /// A profile sync started by the coordinator is outstanding.
    pub is_loading: bool,
    /// The last sync failed transiently and `retry_sync` may be offered.
    pub can_retry_sync: bool,
    pub messages: Vec<UserMessage>,
}
