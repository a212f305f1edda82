//! Driver registries for transcription providers and PII detectors.
//!
//! A registry maps a driver name to a factory that builds an instance from a
//! named configuration block. Registries are built once at process start,
//! handed to the [`crate::manager::TranscriptionManager`], and treated as
//! read-only afterwards; registration is additive and idempotent per name
//! (the last registration for a name wins, which is the supported way to
//! override a built-in driver).
//!
//! Factories, not instances, are stored: configuration binding is deferred
//! until resolution, so two provider names sharing a driver each get an
//! instance bound to their own configuration block.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::DriverSettings;
use crate::core::detector::{PiiEntityDetector, RegexPiiDetector};
use crate::core::transcription::assemblyai::AssemblyAIProvider;
use crate::core::transcription::{TranscriptionError, TranscriptionProvider, TranscriptionResult};

/// Factory function type for transcription providers.
///
/// Receives the provider's configuration block and the detector resolved from
/// that block's `detector` option, if any.
pub type ProviderFactory = Arc<
    dyn Fn(
            &DriverSettings,
            Option<Arc<dyn PiiEntityDetector>>,
        ) -> TranscriptionResult<Arc<dyn TranscriptionProvider>>
        + Send
        + Sync,
>;

/// Factory function type for PII entity detectors.
pub type DetectorFactory =
    Arc<dyn Fn(&DriverSettings) -> TranscriptionResult<Arc<dyn PiiEntityDetector>> + Send + Sync>;

/// Registry of transcription provider drivers.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: HashMap<String, ProviderFactory>,
}

impl ProviderRegistry {
    /// Empty registry with no drivers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the drivers shipped in this crate.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.add("assembly_ai", |settings, detector| {
            Ok(Arc::new(AssemblyAIProvider::from_settings(settings, detector)?) as _)
        });
        registry
    }

    /// Register a driver factory. Re-registering a name replaces the previous
    /// factory.
    pub fn add<F>(&mut self, driver_name: impl Into<String>, factory: F)
    where
        F: Fn(
                &DriverSettings,
                Option<Arc<dyn PiiEntityDetector>>,
            ) -> TranscriptionResult<Arc<dyn TranscriptionProvider>>
            + Send
            + Sync
            + 'static,
    {
        let driver_name = driver_name.into();
        debug!(driver = %driver_name, "registered transcription driver");
        self.factories.insert(driver_name, Arc::new(factory));
    }

    /// Look up the factory for a driver name.
    pub fn get(&self, driver_name: &str) -> TranscriptionResult<ProviderFactory> {
        self.factories
            .get(driver_name)
            .cloned()
            .ok_or_else(|| TranscriptionError::UnknownDriver(driver_name.to_string()))
    }

    /// Names of all registered drivers.
    pub fn driver_names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

/// Registry of PII entity detector drivers.
#[derive(Default)]
pub struct DetectorRegistry {
    factories: HashMap<String, DetectorFactory>,
}

impl DetectorRegistry {
    /// Empty registry with no drivers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the drivers shipped in this crate.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.add("regex", |_settings| Ok(Arc::new(RegexPiiDetector::new()) as _));
        registry
    }

    /// Register a detector factory. Re-registering a name replaces the
    /// previous factory.
    pub fn add<F>(&mut self, driver_name: impl Into<String>, factory: F)
    where
        F: Fn(&DriverSettings) -> TranscriptionResult<Arc<dyn PiiEntityDetector>>
            + Send
            + Sync
            + 'static,
    {
        let driver_name = driver_name.into();
        debug!(driver = %driver_name, "registered PII detector driver");
        self.factories.insert(driver_name, Arc::new(factory));
    }

    /// Look up the factory for a driver name.
    pub fn get(&self, driver_name: &str) -> TranscriptionResult<DetectorFactory> {
        self.factories
            .get(driver_name)
            .cloned()
            .ok_or_else(|| TranscriptionError::UnknownDetector(driver_name.to_string()))
    }
}
