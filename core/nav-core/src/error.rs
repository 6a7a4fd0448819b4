//! Error types for nav-core operations.
//! Keep NavFfiError minimal and stable to avoid breaking FFI clients.

use std::path::PathBuf;

// ═══════════════════════════════════════════════════════════════════════════════
// FFI-Compatible Error (for Swift/Kotlin)
// ═══════════════════════════════════════════════════════════════════════════════

/// FFI-safe error type for use across language boundaries.
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum NavFfiError {
    #[error("{message}")]
    General { message: String },
}

impl From<String> for NavFfiError {
    fn from(message: String) -> Self {
        NavFfiError::General { message }
    }
}

impl From<&str> for NavFfiError {
    fn from(message: &str) -> Self {
        NavFfiError::General {
            message: message.to_string(),
        }
    }
}

impl From<NavError> for NavFfiError {
    fn from(err: NavError) -> Self {
        NavFfiError::General {
            message: err.to_string(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Internal Error (for Rust-only use)
// ═══════════════════════════════════════════════════════════════════════════════

/// How far an error is allowed to travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorScope {
    /// Session rejected; the coordinator must fall back to `LoggedOut`.
    Session,
    /// Retryable; the coordinator stays on the last known screen.
    Transient,
    /// Belongs to the screen that made the request; never touches navigation.
    Screen,
    /// Local setup problem (config, payload parsing). Logged, never fatal.
    Internal,
}

/// All errors that can occur in nav-core operations.
///
/// For FFI boundaries, use `NavFfiError` instead.
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    // ─────────────────────────────────────────────────────────────────────
    // Session / Sync Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Session rejected: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Sync result belongs to an ended session (generation {ticket}, current {current})")]
    StaleSession { ticket: u64, current: u64 },

    // ─────────────────────────────────────────────────────────────────────
    // Screen Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    // ─────────────────────────────────────────────────────────────────────
    // Configuration / Input Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    #[error("Invalid notification payload: {0}")]
    InvalidPayload(#[from] nav_protocol::ProtocolError),

    #[error("Unrecognized deep link: {0}")]
    InvalidDeepLink(String),

    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl NavError {
    pub fn scope(&self) -> ErrorScope {
        match self {
            NavError::Auth(_) => ErrorScope::Session,
            NavError::Network(_) | NavError::StaleSession { .. } => ErrorScope::Transient,
            NavError::NotFound(_) | NavError::Validation(_) => ErrorScope::Screen,
            NavError::ConfigMalformed { .. }
            | NavError::InvalidPayload(_)
            | NavError::InvalidDeepLink(_)
            | NavError::Io { .. } => ErrorScope::Internal,
        }
    }

    /// Text suitable for a dismissible message.
    pub fn user_message(&self) -> String {
        match self {
            NavError::Auth(_) => "Your session has ended. Please sign in again.".to_string(),
            NavError::Network(_) | NavError::StaleSession { .. } => {
                "We couldn't reach the server. Check your connection and try again.".to_string()
            }
            NavError::NotFound(what) => format!("{} could not be found.", what),
            NavError::Validation(details) => details.clone(),
            other => other.to_string(),
        }
    }
}

/// Convenience type alias for Results using NavError.
pub type Result<T> = std::result::Result<T, NavError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_errors_are_scoped_to_session_or_transient() {
        assert_eq!(NavError::Auth("expired".into()).scope(), ErrorScope::Session);
        assert_eq!(
            NavError::Network("offline".into()).scope(),
            ErrorScope::Transient
        );
    }

    #[test]
    fn screen_errors_never_escalate() {
        assert_eq!(NavError::NotFound("Lab order".into()).scope(), ErrorScope::Screen);
        assert_eq!(NavError::Validation("bad".into()).scope(), ErrorScope::Screen);
    }

    #[test]
    fn ffi_error_keeps_message() {
        let ffi: NavFfiError = NavError::Network("offline".into()).into();
        assert_eq!(ffi.to_string(), "Network error: offline");
    }

    #[test]
    fn not_found_user_message_names_the_record() {
        assert_eq!(
            NavError::NotFound("Lab order".into()).user_message(),
            "Lab order could not be found."
        );
    }
}
