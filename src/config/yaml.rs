use std::collections::HashMap;

use serde::Deserialize;

/// Complete YAML configuration structure.
///
/// All fields are optional to allow partial configuration; unset values fall
/// back to the defaults in [`super::TranscriptionConfig`].
///
/// # Example YAML structure
/// ```yaml
/// default: assembly_ai
///
/// providers:
///   assembly_ai:
///     driver: assembly_ai
///     api_key: "your-api-key"
///     detector: pii
///   assembly_ai_eu:
///     driver: assembly_ai
///     api_key: "your-eu-api-key"
///     base_url: "https://api.eu.assemblyai.com"
///
/// detectors:
///   pii:
///     driver: regex
///
/// confirmation:
///   interval_secs: 10
///   tries: 5
///   queue: "transcriptions"
///
/// callback:
///   prefix: "transcription"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub default: Option<String>,
    pub providers: Option<HashMap<String, DriverSettingsYaml>>,
    pub detectors: Option<HashMap<String, DriverSettingsYaml>>,
    pub confirmation: Option<ConfirmationYaml>,
    pub callback: Option<CallbackYaml>,
}

/// A named driver configuration block from YAML.
///
/// Everything besides `driver` is opaque to the core and handed to the
/// driver factory untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct DriverSettingsYaml {
    pub driver: String,
    #[serde(flatten)]
    pub options: HashMap<String, serde_yaml::Value>,
}

/// Confirmation tuning from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ConfirmationYaml {
    pub interval_secs: Option<u64>,
    pub tries: Option<u32>,
    pub queue: Option<String>,
}

/// Callback surface configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CallbackYaml {
    pub prefix: Option<String>,
}
