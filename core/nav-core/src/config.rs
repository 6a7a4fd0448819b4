//! Navigation configuration loading.
//!
//! Reads `navigation.toml` from the platform config directory
//! (`~/.config/healthchat/` on Linux). A missing file yields defaults.

use crate::error::{NavError, Result};
use crate::types::Tab;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_DIR_NAME: &str = "healthchat";
pub const CONFIG_FILE_NAME: &str = "navigation.toml";
pub const DEFAULT_DEEP_LINK_SCHEME: &str = "healthchat";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NavConfig {
    /// Tab selected on every entry into the main interface.
    pub default_tab: Tab,
    /// When false, device onboarding counts as complete from the start.
    pub device_onboarding_enabled: bool,
    /// When false, the assistant introduction is never forced.
    pub assistant_onboarding_enabled: bool,
    pub deep_links: DeepLinkConfig,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            default_tab: Tab::Overview,
            device_onboarding_enabled: true,
            assistant_onboarding_enabled: true,
            deep_links: DeepLinkConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeepLinkConfig {
    pub scheme: String,
}

impl Default for DeepLinkConfig {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_DEEP_LINK_SCHEME.to_string(),
        }
    }
}

/// Returns the default config path, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Loads configuration from `path`, or from the default location when `None`.
pub fn load_config(path: Option<PathBuf>) -> Result<NavConfig> {
    let config_path = match path.or_else(default_config_path) {
        Some(path) => path,
        None => return Ok(NavConfig::default()),
    };

    if !config_path.exists() {
        return Ok(NavConfig::default());
    }

    let content = fs_err::read_to_string(&config_path).map_err(|source| NavError::Io {
        context: format!("reading {}", config_path.display()),
        source,
    })?;
    parse_config(&config_path, &content)
}

fn parse_config(path: &Path, content: &str) -> Result<NavConfig> {
    let config: NavConfig = toml::from_str(content).map_err(|err| NavError::ConfigMalformed {
        path: path.to_path_buf(),
        details: err.to_string(),
    })?;

    if !is_valid_scheme(&config.deep_links.scheme) {
        return Err(NavError::ConfigMalformed {
            path: path.to_path_buf(),
            details: format!("invalid deep link scheme: {:?}", config.deep_links.scheme),
        });
    }

    Ok(config)
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_config_defaults_when_file_missing() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("missing.toml");
        let config = load_config(Some(path)).expect("load config");
        assert_eq!(config, NavConfig::default());
    }

    #[test]
    fn load_config_parses_all_sections() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        fs_err::write(
            &path,
            r#"
default_tab = "account"
device_onboarding_enabled = false
assistant_onboarding_enabled = true

[deep_links]
scheme = "hc-staging"
"#,
        )
        .expect("write config");

        let config = load_config(Some(path)).expect("load config");
        assert_eq!(config.default_tab, Tab::Account);
        assert!(!config.device_onboarding_enabled);
        assert!(config.assistant_onboarding_enabled);
        assert_eq!(config.deep_links.scheme, "hc-staging");
    }

    #[test]
    fn partial_config_keeps_remaining_defaults() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        fs_err::write(&path, "assistant_onboarding_enabled = false\n").expect("write config");

        let config = load_config(Some(path)).expect("load config");
        assert!(!config.assistant_onboarding_enabled);
        assert!(config.device_onboarding_enabled);
        assert_eq!(config.deep_links.scheme, DEFAULT_DEEP_LINK_SCHEME);
    }

    #[test]
    fn rejects_unknown_keys() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        fs_err::write(&path, "default_screen = \"main\"\n").expect("write config");

        let err = load_config(Some(path)).unwrap_err();
        assert!(matches!(err, NavError::ConfigMalformed { .. }));
    }

    #[test]
    fn rejects_invalid_scheme() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        fs_err::write(&path, "[deep_links]\nscheme = \"Health Chat\"\n").expect("write config");

        let err = load_config(Some(path)).unwrap_err();
        assert!(matches!(err, NavError::ConfigMalformed { .. }));
    }
}
