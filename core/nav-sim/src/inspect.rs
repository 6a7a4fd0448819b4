//! `parse-notification` and `check-config`: one-shot inspection commands.

use std::io::{Read, Write};
use std::path::PathBuf;

use nav_core::config::default_config_path;
use nav_core::{load_config, DeepLinkEvent, NavConfig};
use nav_protocol::NotificationPayload;
use serde::Serialize;

use crate::error::SimError;

#[derive(Debug, Serialize)]
pub struct NotificationReport {
    pub payload: NotificationPayload,
    pub link: Option<DeepLinkEvent>,
}

pub fn inspect_notification(input: &str) -> Result<NotificationReport, SimError> {
    let payload = nav_protocol::parse_notification(input)?;
    let link = payload.target().map(DeepLinkEvent::from);
    Ok(NotificationReport { payload, link })
}

/// Reads a payload from stdin and prints the deep link it resolves to.
pub fn parse_notification() -> Result<(), SimError> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    let report = inspect_notification(&input)?;
    print_json(&report)
}

#[derive(Debug, Serialize)]
pub struct ConfigReport {
    pub path: Option<PathBuf>,
    pub exists: bool,
    pub config: NavConfig,
}

pub fn inspect_config(path: Option<PathBuf>) -> Result<ConfigReport, SimError> {
    let resolved = path.or_else(default_config_path);
    let exists = resolved.as_ref().is_some_and(|p| p.exists());
    let config = load_config(resolved.clone())?;
    Ok(ConfigReport {
        path: resolved,
        exists,
        config,
    })
}

pub fn check_config(path: Option<PathBuf>) -> Result<(), SimError> {
    let report = inspect_config(path)?;
    if !report.exists {
        tracing::info!("No config file found; showing defaults");
    }
    print_json(&report)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), SimError> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value).map_err(SimError::Output)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nav_core::Tab;
    use tempfile::tempdir;

    #[test]
    fn notification_resolves_to_conversation_link() {
        let report = inspect_notification(r#"{"kind":"conversation_opened","conversation_id":"42"}"#)
            .expect("valid payload");
        assert_eq!(
            report.link,
            Some(DeepLinkEvent::ConversationOpened {
                id: "42".to_string()
            })
        );
    }

    #[test]
    fn malformed_notification_is_an_error() {
        assert!(matches!(
            inspect_notification("not json"),
            Err(SimError::Protocol(_))
        ));
    }

    #[test]
    fn config_report_reads_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("navigation.toml");
        fs_err::write(&path, "default_tab = \"chat\"\n").expect("write config");

        let report = inspect_config(Some(path)).expect("config loads");
        assert!(report.exists);
        assert_eq!(report.config.default_tab, Tab::Chat);
    }

    #[test]
    fn missing_config_reports_defaults() {
        let dir = tempdir().expect("tempdir");
        let report =
            inspect_config(Some(dir.path().join("absent.toml"))).expect("defaults load");
        assert!(!report.exists);
        assert_eq!(report.config, NavConfig::default());
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("navigation.toml");
        fs_err::write(&path, "default_tab = 3\n").expect("write config");
        assert!(matches!(inspect_config(Some(path)), Err(SimError::Nav(_))));
    }
}
