//! Configuration for the transcription manager.
//!
//! Configuration is loaded from a YAML file (see [`yaml`]) or built directly
//! in code. It names a default provider, maps provider and detector names to
//! driver configuration blocks, and tunes the confirmation scheduler.
//!
//! # Example
//! ```rust,no_run
//! use polyscribe::config::TranscriptionConfig;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TranscriptionConfig::from_file(Path::new("transcription.yaml"))?;
//! println!("default provider: {:?}", config.default_provider);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

mod yaml;

pub use yaml::YamlConfig;

use crate::core::transcription::{TranscriptionError, TranscriptionResult};

/// Default delay before the first confirmation attempt, and the base unit of
/// the linear backoff between attempts.
const DEFAULT_INTERVAL_SECS: u64 = 10;

/// Default maximum number of confirmation attempts per job.
const DEFAULT_TRIES: u32 = 5;

/// Default queue label for confirmation tasks.
const DEFAULT_QUEUE: &str = "transcriptions";

/// Default path prefix for the inbound callback surface.
const DEFAULT_CALLBACK_PREFIX: &str = "transcription";

/// A named driver configuration block.
///
/// `driver` selects the registered factory; the remaining options are opaque
/// to the core and interpreted only by the factory that receives them
/// (region, credentials reference, cost flags, and so on).
#[derive(Debug, Clone)]
pub struct DriverSettings {
    pub driver: String,
    pub options: HashMap<String, serde_yaml::Value>,
}

impl DriverSettings {
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            options: HashMap::new(),
        }
    }

    /// Add an option, builder style.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<serde_yaml::Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Look up a string option.
    pub fn str_option(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(|v| v.as_str())
    }

    /// Look up a boolean option.
    pub fn bool_option(&self, key: &str) -> Option<bool> {
        self.options.get(key).and_then(|v| v.as_bool())
    }

    /// Look up a string option, failing with a configuration error when the
    /// key is absent or not a string.
    pub fn require_str(&self, key: &str) -> TranscriptionResult<&str> {
        self.str_option(key).ok_or_else(|| {
            TranscriptionError::Configuration(format!(
                "missing required option [{key}] for driver [{}]",
                self.driver
            ))
        })
    }
}

/// Confirmation scheduler tuning.
#[derive(Debug, Clone)]
pub struct ConfirmationConfig {
    /// Delay before the first attempt; also the base unit of the linear
    /// backoff (attempt k waits k × interval before attempt k + 1).
    pub interval: Duration,
    /// Maximum number of confirmation attempts before the task is abandoned.
    pub tries: u32,
    /// Queue label attached to confirmation task spans.
    pub queue: String,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            tries: DEFAULT_TRIES,
            queue: DEFAULT_QUEUE.to_string(),
        }
    }
}

/// Inbound callback surface configuration.
#[derive(Debug, Clone)]
pub struct CallbackConfig {
    /// Path prefix the callback routes are nested under.
    pub prefix: String,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_CALLBACK_PREFIX.to_string(),
        }
    }
}

/// Top-level transcription configuration.
#[derive(Debug, Clone, Default)]
pub struct TranscriptionConfig {
    /// Provider name used when the caller does not pass one explicitly.
    pub default_provider: Option<String>,
    /// Provider name → driver configuration block.
    pub providers: HashMap<String, DriverSettings>,
    /// Detector name → driver configuration block.
    pub detectors: HashMap<String, DriverSettings>,
    pub confirmation: ConfirmationConfig,
    pub callback: CallbackConfig,
}

impl TranscriptionConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> TranscriptionResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            TranscriptionError::Configuration(format!(
                "failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml_str(contents: &str) -> TranscriptionResult<Self> {
        let raw: YamlConfig = serde_yaml::from_str(contents)
            .map_err(|e| TranscriptionError::Configuration(format!("invalid YAML config: {e}")))?;
        Ok(Self::from_yaml(raw))
    }

    fn from_yaml(raw: YamlConfig) -> Self {
        let mut config = Self {
            default_provider: raw.default,
            ..Default::default()
        };

        for (name, block) in raw.providers.unwrap_or_default() {
            config.providers.insert(
                name,
                DriverSettings {
                    driver: block.driver,
                    options: block.options,
                },
            );
        }

        for (name, block) in raw.detectors.unwrap_or_default() {
            config.detectors.insert(
                name,
                DriverSettings {
                    driver: block.driver,
                    options: block.options,
                },
            );
        }

        if let Some(confirmation) = raw.confirmation {
            if let Some(secs) = confirmation.interval_secs {
                config.confirmation.interval = Duration::from_secs(secs);
            }
            if let Some(tries) = confirmation.tries {
                config.confirmation.tries = tries;
            }
            if let Some(queue) = confirmation.queue {
                config.confirmation.queue = queue;
            }
        }

        if let Some(callback) = raw.callback
            && let Some(prefix) = callback.prefix
        {
            config.callback.prefix = prefix;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TranscriptionConfig::default();
        assert_eq!(config.confirmation.interval, Duration::from_secs(10));
        assert_eq!(config.confirmation.tries, 5);
        assert_eq!(config.confirmation.queue, "transcriptions");
        assert_eq!(config.callback.prefix, "transcription");
        assert!(config.default_provider.is_none());
        assert!(config.providers.is_empty());
    }

    #[test]
    fn test_from_yaml_str() {
        let yaml = r#"
default: assembly_ai

providers:
  assembly_ai:
    driver: assembly_ai
    api_key: "secret"
    detector: pii

detectors:
  pii:
    driver: regex

confirmation:
  interval_secs: 30
  tries: 3
  queue: "audio"

callback:
  prefix: "hooks"
"#;
        let config = TranscriptionConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.default_provider.as_deref(), Some("assembly_ai"));

        let settings = config.providers.get("assembly_ai").unwrap();
        assert_eq!(settings.driver, "assembly_ai");
        assert_eq!(settings.str_option("api_key"), Some("secret"));
        assert_eq!(settings.str_option("detector"), Some("pii"));

        assert_eq!(config.detectors.get("pii").unwrap().driver, "regex");
        assert_eq!(config.confirmation.interval, Duration::from_secs(30));
        assert_eq!(config.confirmation.tries, 3);
        assert_eq!(config.confirmation.queue, "audio");
        assert_eq!(config.callback.prefix, "hooks");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = TranscriptionConfig::from_yaml_str("default: foo\n").unwrap();
        assert_eq!(config.default_provider.as_deref(), Some("foo"));
        assert_eq!(config.confirmation.tries, 5);
    }

    #[test]
    fn test_invalid_yaml_is_configuration_error() {
        let err = TranscriptionConfig::from_yaml_str(": not yaml :").unwrap_err();
        assert!(err.to_string().contains("invalid YAML config"));
    }

    #[test]
    fn test_require_str_missing() {
        let settings = DriverSettings::new("assembly_ai");
        let err = settings.require_str("api_key").unwrap_err();
        assert!(err.to_string().contains("api_key"));
    }

    #[test]
    fn test_with_option() {
        let settings = DriverSettings::new("assembly_ai")
            .with_option("api_key", "secret")
            .with_option("entity_detection", true);
        assert_eq!(settings.str_option("api_key"), Some("secret"));
        assert_eq!(settings.bool_option("entity_detection"), Some(true));
    }
}
