//! Tab and overlay state for the main interface.
//!
//! Single writer: only the coordinator feeds triggers in, in the order they
//! arrive. Nothing is batched; each trigger is applied on its own.

use tracing::debug;

use crate::types::{DeepLinkEvent, Tab};

/// An input that can move the active tab or toggle an overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabTrigger {
    DeviceOnboarding { complete: bool },
    AssistantOnboarding { active: bool },
    DeepLink(DeepLinkEvent),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabController {
    default_tab: Tab,
    active_tab: Tab,
    show_device_onboarding_sheet: bool,
    show_assistant_onboarding: bool,
}

impl TabController {
    pub fn new(default_tab: Tab) -> Self {
        Self {
            default_tab,
            active_tab: default_tab,
            show_device_onboarding_sheet: false,
            show_assistant_onboarding: false,
        }
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    pub fn show_device_onboarding_sheet(&self) -> bool {
        self.show_device_onboarding_sheet
    }

    pub fn show_assistant_onboarding(&self) -> bool {
        self.show_assistant_onboarding
    }

    /// Selects `target`. Returns true if the tab changed.
    pub fn change_tab(&mut self, target: Tab) -> bool {
        if self.active_tab == target {
            return false;
        }
        debug!(from = self.active_tab.as_str(), to = target.as_str(), "Tab changed");
        self.active_tab = target;
        true
    }

    /// Applies one trigger. Returns true if any visible state changed.
    pub fn apply(&mut self, trigger: &TabTrigger) -> bool {
        match trigger {
            TabTrigger::DeviceOnboarding { complete } => {
                let show = !complete;
                let changed = self.show_device_onboarding_sheet != show;
                self.show_device_onboarding_sheet = show;
                changed
            }
            TabTrigger::AssistantOnboarding { active } => {
                let changed = self.show_assistant_onboarding != *active;
                self.show_assistant_onboarding = *active;
                if *active {
                    self.change_tab(Tab::Chat) || changed
                } else {
                    changed
                }
            }
            TabTrigger::DeepLink(event) => {
                let target = event.target_tab();
                if self.active_tab == target {
                    debug!(tab = target.as_str(), "Deep link already on target tab");
                    return false;
                }
                self.change_tab(target)
            }
        }
    }

    /// Puts the controller into its entry state for a fresh visit to `Main`.
    pub fn enter_main(&mut self) {
        self.active_tab = self.default_tab;
        self.show_device_onboarding_sheet = false;
        self.show_assistant_onboarding = false;
    }

    /// Hides every overlay. Used when leaving `Main`.
    pub fn reset(&mut self) {
        self.enter_main();
    }
}
