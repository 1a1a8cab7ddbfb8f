//! Share configuration.
//!
//! Every tunable has a compiled-in default; a TOML file can override any
//! subset of them:
//!
//! ```toml
//! base_url = "https://wishes.example.org/"
//! budget_chars = 1800
//! enforce_policy_on_open = true
//!
//! [image]
//! max_width = 640
//! quality = 0.8
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decoder::DecoderConfig;
use crate::encoder::{EncoderConfig, DEFAULT_BASE_URL};
use crate::photo::ImageConfig;
use crate::LINK_BUDGET_CHARS;

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for building and opening share links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    /// Origin and path that share links point at.
    pub base_url: String,

    /// Recommended maximum link length in characters.
    pub budget_chars: usize,

    /// Re-check the message rules when opening a link.
    pub enforce_policy_on_open: bool,

    /// Photo compression settings.
    pub image: ImageConfig,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            budget_chars: LINK_BUDGET_CHARS,
            enforce_policy_on_open: false,
            image: ImageConfig::default(),
        }
    }
}

impl ShareConfig {
    /// Loads configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Loads configuration from `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Parses and checks TOML configuration text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ShareConfig = toml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url is empty".to_string()));
        }
        if self.image.max_width == 0 || self.image.max_height == 0 {
            return Err(ConfigError::Invalid(
                "image.max_width and image.max_height must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.image.quality) {
            return Err(ConfigError::Invalid(format!(
                "image.quality must be between 0.0 and 1.0, got {}",
                self.image.quality
            )));
        }
        Ok(())
    }

    pub fn encoder_config(&self) -> EncoderConfig {
        EncoderConfig {
            base_url: self.base_url.clone(),
            budget_chars: self.budget_chars,
        }
    }

    pub fn decoder_config(&self) -> DecoderConfig {
        DecoderConfig {
            enforce_policy: self.enforce_policy_on_open,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ShareConfig::default();
        assert_eq!(config.budget_chars, 2000);
        assert_eq!(config.image.max_width, 800);
        assert_eq!(config.image.max_height, 800);
        assert_eq!(config.image.quality, 0.85);
        assert_eq!(config.image.target_bytes, 200 * 1024);
        assert_eq!(config.image.max_input_bytes, 5 * 1024 * 1024);
        assert!(!config.decoder_config().enforce_policy);
    }

    #[test]
    fn test_partial_toml() {
        let config = ShareConfig::from_toml(
            r#"
            base_url = "https://party.example/wish"
            enforce_policy_on_open = true

            [image]
            max_width = 640
            "#,
        )
        .unwrap();

        assert_eq!(config.base_url, "https://party.example/wish");
        assert_eq!(config.budget_chars, 2000);
        assert_eq!(config.image.max_width, 640);
        assert_eq!(config.image.max_height, 800);
        assert!(config.decoder_config().enforce_policy);
        assert_eq!(config.encoder_config().base_url, "https://party.example/wish");
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            ShareConfig::from_toml("base_url = \"  \""),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ShareConfig::from_toml("[image]\nquality = 1.5"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ShareConfig::from_toml("[image]\nmax_height = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ShareConfig::from_toml("budget_chars = \"lots\""),
            Err(ConfigError::TomlParseError(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wishlink.toml");
        let written = ShareConfig {
            budget_chars: 1500,
            ..Default::default()
        };
        fs::write(&path, toml::to_string_pretty(&written).unwrap()).unwrap();

        let loaded = ShareConfig::load(&path).unwrap();
        assert_eq!(loaded, written);
    }

    #[test]
    fn test_load_or_default() {
        assert_eq!(ShareConfig::load_or_default(None).unwrap(), ShareConfig::default());

        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            ShareConfig::load_or_default(Some(&missing)),
            Err(ConfigError::IoError(_))
        ));
    }
}
