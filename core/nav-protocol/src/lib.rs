//! Notification payload types and validation for the navigation core.
//!
//! Host push handlers hand the raw JSON payload to the core. This crate is
//! shared by the core and its hosts so both sides agree on the schema; the core
//! remains the authority on validation.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

pub const PAYLOAD_VERSION: u32 = 1;
pub const MAX_PAYLOAD_BYTES: usize = 4 * 1024; // APNs caps payloads at 4KB
pub const MAX_CONVERSATION_ID_LEN: usize = 128;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum NotificationKind {
    ConversationOpened,
    LabOrderOpened,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct NotificationPayload {
    #[serde(default = "default_version")]
    pub version: u32,
    pub kind: NotificationKind,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub received_at: Option<String>,
}

fn default_version() -> u32 {
    PAYLOAD_VERSION
}

/// What a validated payload asks the app to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeepLinkTarget {
    Conversation { id: String },
    LabOrders,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ProtocolError {
    pub code: String,
    pub message: String,
}

impl ProtocolError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ProtocolError {}

impl NotificationPayload {
    pub fn conversation(id: impl Into<String>) -> Self {
        Self {
            version: PAYLOAD_VERSION,
            kind: NotificationKind::ConversationOpened,
            conversation_id: Some(id.into()),
            received_at: None,
        }
    }

    pub fn lab_order() -> Self {
        Self {
            version: PAYLOAD_VERSION,
            kind: NotificationKind::LabOrderOpened,
            conversation_id: None,
            received_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.version != PAYLOAD_VERSION {
            return Err(ProtocolError::new(
                "unsupported_version",
                format!(
                    "payload version {} is not supported (expected {})",
                    self.version, PAYLOAD_VERSION
                ),
            ));
        }

        if let Some(received_at) = &self.received_at {
            if DateTime::parse_from_rfc3339(received_at).is_err() {
                return Err(ProtocolError::new(
                    "invalid_timestamp",
                    "received_at must be RFC3339",
                ));
            }
        }

        match self.kind {
            NotificationKind::ConversationOpened => {
                let id = require_string(&self.conversation_id, "conversation_id")?;
                if id.len() > MAX_CONVERSATION_ID_LEN {
                    return Err(ProtocolError::new(
                        "invalid_conversation_id",
                        format!(
                            "conversation_id must be {} characters or fewer",
                            MAX_CONVERSATION_ID_LEN
                        ),
                    ));
                }
            }
            NotificationKind::LabOrderOpened => {
                if self.conversation_id.is_some() {
                    return Err(ProtocolError::new(
                        "unexpected_field",
                        "lab_order_opened does not carry a conversation_id",
                    ));
                }
            }
        }

        Ok(())
    }

    /// Resolves a payload into its navigation target. Call after `validate`.
    pub fn target(&self) -> Option<DeepLinkTarget> {
        match self.kind {
            NotificationKind::ConversationOpened => self
                .conversation_id
                .as_ref()
                .map(|id| DeepLinkTarget::Conversation {
                    id: id.trim().to_string(),
                }),
            NotificationKind::LabOrderOpened => Some(DeepLinkTarget::LabOrders),
        }
    }
}

pub fn parse_notification(raw: &str) -> Result<NotificationPayload, ProtocolError> {
    if raw.len() > MAX_PAYLOAD_BYTES {
        return Err(ProtocolError::new(
            "payload_too_large",
            format!("payload exceeds {} bytes", MAX_PAYLOAD_BYTES),
        ));
    }

    let payload: NotificationPayload = serde_json::from_str(raw).map_err(|err| {
        ProtocolError::new(
            "invalid_payload",
            format!("notification payload is invalid JSON: {}", err),
        )
    })?;
    payload.validate()?;
    Ok(payload)
}

fn require_string<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, ProtocolError> {
    if let Some(candidate) = value {
        let trimmed = candidate.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed);
        }
    }
    Err(ProtocolError::new(
        "missing_field",
        format!("{} is required", field),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_conversation_payload() {
        let payload = parse_notification(
            r#"{"kind":"conversation_opened","conversation_id":"42","received_at":"2026-01-30T12:00:00Z"}"#,
        )
        .expect("parse payload");
        assert_eq!(
            payload.target(),
            Some(DeepLinkTarget::Conversation {
                id: "42".to_string()
            })
        );
    }

    #[test]
    fn parses_lab_order_payload() {
        let payload = parse_notification(r#"{"kind":"lab_order_opened"}"#).expect("parse payload");
        assert_eq!(payload.target(), Some(DeepLinkTarget::LabOrders));
    }

    #[test]
    fn conversation_requires_id() {
        let err = parse_notification(r#"{"kind":"conversation_opened"}"#).unwrap_err();
        assert_eq!(err.code, "missing_field");
    }

    #[test]
    fn conversation_rejects_blank_id() {
        let mut payload = NotificationPayload::conversation("   ");
        payload.received_at = None;
        assert!(payload.validate().is_err());
    }

    #[test]
    fn lab_order_rejects_conversation_id() {
        let err =
            parse_notification(r#"{"kind":"lab_order_opened","conversation_id":"1"}"#).unwrap_err();
        assert_eq!(err.code, "unexpected_field");
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = parse_notification(r#"{"kind":"lab_order_opened","badge":3}"#).unwrap_err();
        assert_eq!(err.code, "invalid_payload");
    }

    #[test]
    fn rejects_unknown_kind() {
        assert!(parse_notification(r#"{"kind":"billing_opened"}"#).is_err());
    }

    #[test]
    fn rejects_bad_timestamp() {
        let mut payload = NotificationPayload::lab_order();
        payload.received_at = Some("yesterday".to_string());
        assert_eq!(payload.validate().unwrap_err().code, "invalid_timestamp");
    }

    #[test]
    fn rejects_future_version() {
        let mut payload = NotificationPayload::lab_order();
        payload.version = 2;
        assert_eq!(payload.validate().unwrap_err().code, "unsupported_version");
    }

    #[test]
    fn rejects_oversized_payload() {
        let raw = format!(
            r#"{{"kind":"conversation_opened","conversation_id":"{}"}}"#,
            "a".repeat(MAX_PAYLOAD_BYTES)
        );
        assert_eq!(parse_notification(&raw).unwrap_err().code, "payload_too_large");
    }

    #[test]
    fn rejects_long_conversation_id() {
        let payload = NotificationPayload::conversation("a".repeat(MAX_CONVERSATION_ID_LEN + 1));
        assert_eq!(
            payload.validate().unwrap_err().code,
            "invalid_conversation_id"
        );
    }
}
