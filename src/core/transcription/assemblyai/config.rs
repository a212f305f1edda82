//! Configuration types for the AssemblyAI transcription provider.

use crate::config::DriverSettings;
use crate::core::transcription::TranscriptionResult;

/// Default API base URL.
pub const ASSEMBLYAI_BASE_URL: &str = "https://api.assemblyai.com";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`super::AssemblyAIProvider`].
#[derive(Debug, Clone)]
pub struct AssemblyAIConfig {
    /// API key sent in the `authorization` header
    pub api_key: String,
    /// API base URL, overridable for regional endpoints and tests
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl AssemblyAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: ASSEMBLYAI_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Override the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build from a named driver configuration block.
    ///
    /// Requires `api_key`; honors optional `base_url` and `timeout_secs`.
    pub fn from_settings(settings: &DriverSettings) -> TranscriptionResult<Self> {
        let mut config = Self::new(settings.require_str("api_key")?);

        if let Some(base_url) = settings.str_option("base_url") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(timeout) = settings.options.get("timeout_secs").and_then(|v| v.as_u64()) {
            config.timeout_secs = timeout;
        }

        Ok(config)
    }
}
