//! AssemblyAI provider implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, info, warn};

use super::config::AssemblyAIConfig;
use super::messages::{CreateTranscriptRequest, ErrorResponse, SentencesResponse, TranscriptResponse};
use crate::config::DriverSettings;
use crate::core::detector::{PiiEntityDetector, redact};
use crate::core::transcription::{
    Transcription, TranscriptionError, TranscriptionProvider, TranscriptionResult,
};
use crate::store::{Transcript, TranscriptSegment};

/// Transcription provider backed by the AssemblyAI v2 transcript API.
pub struct AssemblyAIProvider {
    config: AssemblyAIConfig,
    client: Client,
    detector: Option<Arc<dyn PiiEntityDetector>>,
}

impl AssemblyAIProvider {
    pub fn new(config: AssemblyAIConfig, detector: Option<Arc<dyn PiiEntityDetector>>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            config,
            client,
            detector,
        }
    }

    /// Build from a named driver configuration block.
    pub fn from_settings(
        settings: &DriverSettings,
        detector: Option<Arc<dyn PiiEntityDetector>>,
    ) -> TranscriptionResult<Self> {
        Ok(Self::new(AssemblyAIConfig::from_settings(settings)?, detector))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Extract the API error message from a non-2xx response.
    async fn error_message(response: Response) -> String {
        let status = response.status();
        match response.json::<ErrorResponse>().await {
            Ok(body) => body.error,
            Err(_) => format!("HTTP {status}"),
        }
    }

    async fn build_segments(
        &self,
        sentences: SentencesResponse,
        language_code: &str,
    ) -> TranscriptionResult<Vec<TranscriptSegment>> {
        let mut segments = Vec::with_capacity(sentences.sentences.len());

        for sentence in sentences.sentences {
            let mut segment = TranscriptSegment {
                start_ms: sentence.start,
                end_ms: sentence.end,
                text: sentence.text,
                pii_flagged: false,
                redacted_text: None,
            };

            if let Some(detector) = &self.detector {
                let entities = detector.detect(&segment.text, language_code).await?;
                if !entities.is_empty() {
                    segment.redacted_text = Some(redact(&segment.text, &entities));
                    segment.pii_flagged = true;
                }
            }

            segments.push(segment);
        }

        Ok(segments)
    }
}

#[async_trait]
impl TranscriptionProvider for AssemblyAIProvider {
    async fn transcribe(
        &self,
        audio_url: &str,
        language_code: &str,
    ) -> TranscriptionResult<Transcription> {
        let request = CreateTranscriptRequest {
            audio_url,
            language_code,
        };

        let response = self
            .client
            .post(self.endpoint("/v2/transcript"))
            .header("authorization", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| TranscriptionError::Submission(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TranscriptionError::Submission(
                Self::error_message(response).await,
            ));
        }

        let body: TranscriptResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::Submission(e.to_string()))?;

        info!(external_id = %body.id, status = ?body.status, "transcription job submitted");
        Ok(Transcription::new(body.id, body.status.into()))
    }

    async fn fetch(&self, external_id: &str) -> TranscriptionResult<Transcription> {
        let response = self
            .client
            .get(self.endpoint(&format!("/v2/transcript/{external_id}")))
            .header("authorization", &self.config.api_key)
            .send()
            .await
            .map_err(|e| TranscriptionError::Transport(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(TranscriptionError::Lookup(external_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(TranscriptionError::Transport(
                Self::error_message(response).await,
            ));
        }

        let body: TranscriptResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::Transport(e.to_string()))?;

        if let Some(error) = &body.error {
            warn!(external_id = %body.id, %error, "remote transcription reported an error");
        }

        debug!(external_id = %body.id, status = ?body.status, "fetched remote job status");
        Ok(Transcription::new(body.id, body.status.into()))
    }

    async fn parse(
        &self,
        transcription: &Transcription,
        transcript: &mut Transcript,
    ) -> TranscriptionResult<()> {
        let response = self
            .client
            .get(self.endpoint(&format!("/v2/transcript/{}/sentences", transcription.id)))
            .header("authorization", &self.config.api_key)
            .send()
            .await
            .map_err(|e| TranscriptionError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TranscriptionError::Parse(
                Self::error_message(response).await,
            ));
        }

        let sentences: SentencesResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::Parse(e.to_string()))?;

        // Replace, never append: a second parse of the same job must yield
        // the same segment set.
        let language_code = transcript.language_code.clone();
        transcript.segments = self.build_segments(sentences, &language_code).await?;

        info!(
            external_id = %transcription.id,
            segments = transcript.segments.len(),
            "parsed transcription result"
        );
        Ok(())
    }
}
