//! Transcription manager: submission and reconciliation orchestration.
//!
//! The manager owns the provider and detector registries, the transcript
//! store, and the confirmation scheduler. [`TranscriptionManager::make`]
//! submits a job and creates the durable record;
//! [`TranscriptionManager::confirm`] reconciles one record against remote
//! truth and is safe to call from the scheduler or an inbound callback.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::config::{DriverSettings, TranscriptionConfig};
use crate::core::detector::PiiEntityDetector;
use crate::core::transcription::{
    TranscriptionError, TranscriptionProvider, TranscriptionResult, TranscriptionStatus,
};
use crate::registry::{DetectorRegistry, ProviderRegistry};
use crate::scheduler::{ConfirmationScheduler, JobKey};
use crate::store::{Transcript, TranscriptStore};

/// Orchestrates transcription submission and confirmation.
pub struct TranscriptionManager {
    config: TranscriptionConfig,
    store: TranscriptStore,
    providers: ProviderRegistry,
    detectors: DetectorRegistry,
    scheduler: ConfirmationScheduler,
}

impl TranscriptionManager {
    /// Build a manager with the built-in drivers registered.
    pub fn new(config: TranscriptionConfig, store: TranscriptStore) -> Self {
        Self::with_registries(
            config,
            store,
            ProviderRegistry::builtin(),
            DetectorRegistry::builtin(),
        )
    }

    /// Build a manager with caller-supplied registries.
    pub fn with_registries(
        config: TranscriptionConfig,
        store: TranscriptStore,
        providers: ProviderRegistry,
        detectors: DetectorRegistry,
    ) -> Self {
        let scheduler = ConfirmationScheduler::new(config.confirmation.clone());
        Self {
            config,
            store,
            providers,
            detectors,
            scheduler,
        }
    }

    /// Register a transcription driver. Call before sharing the manager;
    /// the registries are read-only once it is running.
    pub fn add_provider<F>(&mut self, driver_name: impl Into<String>, factory: F)
    where
        F: Fn(
                &DriverSettings,
                Option<Arc<dyn PiiEntityDetector>>,
            ) -> TranscriptionResult<Arc<dyn TranscriptionProvider>>
            + Send
            + Sync
            + 'static,
    {
        self.providers.add(driver_name, factory);
    }

    /// Register a PII detector driver.
    pub fn add_detector<F>(&mut self, driver_name: impl Into<String>, factory: F)
    where
        F: Fn(&DriverSettings) -> TranscriptionResult<Arc<dyn PiiEntityDetector>>
            + Send
            + Sync
            + 'static,
    {
        self.detectors.add(driver_name, factory);
    }

    pub fn config(&self) -> &TranscriptionConfig {
        &self.config
    }

    pub fn store(&self) -> &TranscriptStore {
        &self.store
    }

    pub fn scheduler(&self) -> &ConfirmationScheduler {
        &self.scheduler
    }

    /// Submit a transcription job for an audio file in a specific language.
    ///
    /// Resolves the provider (explicit name or configured default), performs
    /// the single remote submission call, and creates exactly one durable
    /// record carrying the provider's reported initial status. When that
    /// status is not already terminal, exactly one confirmation task is
    /// scheduled with the configured initial interval.
    #[instrument(skip(self), fields(provider = provider_name.unwrap_or("<default>")))]
    pub async fn make(
        self: &Arc<Self>,
        audio_url: &str,
        language_code: &str,
        provider_name: Option<&str>,
    ) -> TranscriptionResult<Transcript> {
        let (name, provider) = self.resolve_provider(provider_name)?;
        let transcription = provider.transcribe(audio_url, language_code).await?;

        // The configured provider name is stored verbatim so confirmation can
        // resolve the identical provider without reversing any naming scheme.
        let transcript = Transcript::new(
            name.clone(),
            transcription.id.clone(),
            transcription.status,
            audio_url,
            language_code,
        );
        self.store.create(&transcript).await?;

        info!(
            transcript_id = %transcript.id,
            provider_type = %name,
            external_id = %transcript.external_id,
            status = %transcript.status,
            "transcription job created"
        );

        if !transcription.status.is_terminal() {
            self.scheduler.schedule(
                Arc::clone(self),
                JobKey::new(name, transcription.id),
            );
        }

        Ok(transcript)
    }

    /// Confirm the current state of an in-flight transcription job.
    ///
    /// Performs exactly one remote status fetch, parses the result when the
    /// remote job has completed, and always persists the fetched status back
    /// onto the record. Retrying is the scheduler's concern, which keeps this
    /// method idempotent and re-entrant for callback-driven confirmation.
    ///
    /// A record that already reached a terminal status is returned as-is
    /// without touching the remote API: terminal is final, and a late or
    /// replayed confirmation must not overwrite the settled outcome.
    #[instrument(skip(self))]
    pub async fn confirm(
        &self,
        provider_type: &str,
        external_id: &str,
    ) -> TranscriptionResult<Transcript> {
        let mut transcript = self
            .store
            .find_by_job(provider_type, external_id)
            .await?
            .ok_or_else(|| TranscriptionError::NotFound {
                provider_type: provider_type.to_string(),
                external_id: external_id.to_string(),
            })?;

        if transcript.is_finished() {
            debug!(
                transcript_id = %transcript.id,
                status = %transcript.status,
                "record already settled, skipping confirmation"
            );
            return Ok(transcript);
        }

        let (_, provider) = self.resolve_provider(Some(&transcript.provider_type))?;
        let transcription = provider.fetch(&transcript.external_id).await?;

        if transcription.status == TranscriptionStatus::Completed {
            provider.parse(&transcription, &mut transcript).await?;
        }

        transcript.status = transcription.status;
        self.store.save(&mut transcript).await?;

        info!(
            transcript_id = %transcript.id,
            status = %transcript.status,
            segments = transcript.segments.len(),
            "transcription confirmed"
        );

        Ok(transcript)
    }

    /// Resolve a provider name into a configured provider instance.
    fn resolve_provider(
        &self,
        provider_name: Option<&str>,
    ) -> TranscriptionResult<(String, Arc<dyn TranscriptionProvider>)> {
        let name = match provider_name {
            Some(name) => name,
            None => self.config.default_provider.as_deref().ok_or_else(|| {
                TranscriptionError::Configuration(
                    "no provider name given and no default provider configured".to_string(),
                )
            })?,
        };

        let settings = self
            .config
            .providers
            .get(name)
            .ok_or_else(|| TranscriptionError::UnconfiguredProvider(name.to_string()))?;

        let detector = self.resolve_detector(settings)?;
        let factory = self.providers.get(&settings.driver)?;
        let provider = factory(settings, detector)?;

        Ok((name.to_string(), provider))
    }

    /// Resolve the detector named by a provider's `detector` option, if any.
    fn resolve_detector(
        &self,
        settings: &DriverSettings,
    ) -> TranscriptionResult<Option<Arc<dyn PiiEntityDetector>>> {
        let Some(name) = settings.str_option("detector") else {
            return Ok(None);
        };

        let detector_settings = self
            .config
            .detectors
            .get(name)
            .ok_or_else(|| TranscriptionError::UnknownDetector(name.to_string()))?;

        let factory = self.detectors.get(&detector_settings.driver)?;
        Ok(Some(factory(detector_settings)?))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{StubProvider, manager_with_stub};
    use super::*;

    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_make_creates_record_and_schedules_confirmation() {
        let stub = StubProvider::submitting("abc", TranscriptionStatus::Processing);
        let manager = manager_with_stub(Arc::clone(&stub)).await;

        let transcript = manager
            .make("https://x/audio.wav", "en-US", None)
            .await
            .unwrap();

        assert_eq!(transcript.provider_type, "stub_provider");
        assert_eq!(transcript.external_id, "abc");
        assert_eq!(transcript.status, TranscriptionStatus::Processing);
        assert!(transcript.segments.is_empty());
        assert_eq!(stub.transcribe_calls.load(Ordering::SeqCst), 1);

        // Exactly one durable record, exactly one scheduled confirmation
        let stored = manager
            .store()
            .find_by_job("stub_provider", "abc")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.id, transcript.id);
        assert_eq!(manager.scheduler().pending(), 1);
    }

    #[tokio::test]
    async fn test_make_with_terminal_initial_status_schedules_nothing() {
        let stub = StubProvider::submitting("abc", TranscriptionStatus::Completed);
        let manager = manager_with_stub(stub).await;

        let transcript = manager
            .make("https://x/audio.wav", "en-US", None)
            .await
            .unwrap();

        assert_eq!(transcript.status, TranscriptionStatus::Completed);
        assert!(transcript.segments.is_empty());
        assert_eq!(manager.scheduler().pending(), 0);
    }

    #[tokio::test]
    async fn test_make_unconfigured_provider_creates_no_record() {
        let stub = StubProvider::submitting("abc", TranscriptionStatus::Processing);
        let manager = manager_with_stub(Arc::clone(&stub)).await;

        let err = manager
            .make("https://x/audio.wav", "en-US", Some("nonexistent"))
            .await
            .unwrap_err();

        assert!(
            matches!(err, TranscriptionError::UnconfiguredProvider(name) if name == "nonexistent")
        );
        assert_eq!(stub.transcribe_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_make_unknown_driver() {
        let mut config = TranscriptionConfig::default();
        config.default_provider = Some("misconfigured".to_string());
        config.providers.insert(
            "misconfigured".to_string(),
            DriverSettings::new("no_such_driver"),
        );

        let store = TranscriptStore::in_memory().await.unwrap();
        let manager = Arc::new(TranscriptionManager::new(config, store));

        let err = manager
            .make("https://x/audio.wav", "en-US", None)
            .await
            .unwrap_err();
        assert!(matches!(err, TranscriptionError::UnknownDriver(name) if name == "no_such_driver"));
    }

    #[tokio::test]
    async fn test_make_without_default_or_explicit_provider() {
        let store = TranscriptStore::in_memory().await.unwrap();
        let manager = Arc::new(TranscriptionManager::new(
            TranscriptionConfig::default(),
            store,
        ));

        let err = manager
            .make("https://x/audio.wav", "en-US", None)
            .await
            .unwrap_err();
        assert!(matches!(err, TranscriptionError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_make_submission_failure_creates_no_record() {
        let stub = Arc::new(StubProvider::default()); // no scripted submission
        let manager = manager_with_stub(stub).await;

        let err = manager
            .make("https://x/audio.wav", "en-US", None)
            .await
            .unwrap_err();
        assert!(matches!(err, TranscriptionError::Submission(_)));
        assert_eq!(manager.scheduler().pending(), 0);
    }

    #[tokio::test]
    async fn test_confirm_updates_status_and_parses_on_completion() {
        let stub = StubProvider::submitting("abc", TranscriptionStatus::Processing)
            .with_fetches(&[TranscriptionStatus::Completed]);
        let manager = manager_with_stub(Arc::clone(&stub)).await;

        manager.make("https://x/audio.wav", "en-US", None).await.unwrap();

        let transcript = manager.confirm("stub_provider", "abc").await.unwrap();
        assert_eq!(transcript.status, TranscriptionStatus::Completed);
        assert_eq!(transcript.segments.len(), 1);
        assert_eq!(stub.parse_calls.load(Ordering::SeqCst), 1);

        let stored = manager
            .store()
            .find_by_job("stub_provider", "abc")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, TranscriptionStatus::Completed);
        assert_eq!(stored.segments.len(), 1);
    }

    #[tokio::test]
    async fn test_confirm_is_idempotent_on_completed_record() {
        let stub = StubProvider::submitting("abc", TranscriptionStatus::Processing)
            .with_fetches(&[TranscriptionStatus::Completed]);
        let manager = manager_with_stub(Arc::clone(&stub)).await;

        manager.make("https://x/audio.wav", "en-US", None).await.unwrap();

        let first = manager.confirm("stub_provider", "abc").await.unwrap();
        let second = manager.confirm("stub_provider", "abc").await.unwrap();

        assert_eq!(first.status, second.status);
        assert_eq!(first.segments, second.segments);
        assert_eq!(second.segments.len(), 1);
    }

    #[tokio::test]
    async fn test_confirm_never_regresses_a_terminal_record() {
        // Even if the remote would now report a non-terminal status, a
        // settled record must stay settled and skip the fetch entirely
        let stub = StubProvider::submitting("abc", TranscriptionStatus::Processing)
            .with_fetches(&[TranscriptionStatus::Completed, TranscriptionStatus::Processing]);
        let manager = manager_with_stub(Arc::clone(&stub)).await;

        manager.make("https://x/audio.wav", "en-US", None).await.unwrap();

        let settled = manager.confirm("stub_provider", "abc").await.unwrap();
        assert_eq!(settled.status, TranscriptionStatus::Completed);

        let replayed = manager.confirm("stub_provider", "abc").await.unwrap();
        assert_eq!(replayed.status, TranscriptionStatus::Completed);
        assert_eq!(replayed.segments, settled.segments);
        assert_eq!(stub.fetch_calls.load(Ordering::SeqCst), 1);

        let stored = manager
            .store()
            .find_by_job("stub_provider", "abc")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, TranscriptionStatus::Completed);
        assert_eq!(stored.segments.len(), 1);
    }

    #[tokio::test]
    async fn test_confirm_persists_unchanged_status() {
        let stub = StubProvider::submitting("abc", TranscriptionStatus::Processing)
            .with_fetches(&[TranscriptionStatus::Processing]);
        let manager = manager_with_stub(Arc::clone(&stub)).await;

        manager.make("https://x/audio.wav", "en-US", None).await.unwrap();

        let transcript = manager.confirm("stub_provider", "abc").await.unwrap();
        assert_eq!(transcript.status, TranscriptionStatus::Processing);
        assert!(transcript.segments.is_empty());
        assert_eq!(stub.parse_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_confirm_unknown_job_is_not_found() {
        let stub = StubProvider::submitting("abc", TranscriptionStatus::Processing);
        let manager = manager_with_stub(stub).await;

        let err = manager.confirm("stub_provider", "ghost").await.unwrap_err();
        assert!(matches!(err, TranscriptionError::NotFound { .. }));
    }
}
