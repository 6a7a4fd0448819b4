//! Compiled patterns for deep-link URLs.
//!
//! Compiled once on first use. The scheme is checked separately so staging
//! builds can register their own scheme through config.

use crate::error::{NavError, Result};
use crate::types::DeepLinkEvent;
use once_cell::sync::Lazy;
use regex::Regex;

pub static RE_DEEP_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<scheme>[a-z][a-z0-9+.-]*)://(?P<host>[a-z-]+)(?:/(?P<id>[A-Za-z0-9_-]{1,128}))?/?$")
        .unwrap()
});

/// Parses `<scheme>://conversations/<id>` or `<scheme>://lab-orders`.
pub fn parse_deep_link(url: &str, expected_scheme: &str) -> Result<DeepLinkEvent> {
    let invalid = || NavError::InvalidDeepLink(url.to_string());
    let caps = RE_DEEP_LINK.captures(url.trim()).ok_or_else(invalid)?;

    if &caps["scheme"] != expected_scheme {
        return Err(invalid());
    }

    let id = caps.name("id").map(|m| m.as_str().to_string());
    match (&caps["host"], id) {
        ("conversations", Some(id)) => Ok(DeepLinkEvent::ConversationOpened { id }),
        ("lab-orders", None) => Ok(DeepLinkEvent::LabOrderOpened),
        _ => Err(invalid()),
    }
}
