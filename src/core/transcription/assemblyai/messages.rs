//! Wire types for the AssemblyAI v2 transcript API.

use serde::{Deserialize, Serialize};

use crate::core::transcription::TranscriptionStatus;

/// `POST /v2/transcript` request body.
#[derive(Debug, Serialize)]
pub struct CreateTranscriptRequest<'a> {
    pub audio_url: &'a str,
    pub language_code: &'a str,
}

/// Remote job status as reported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteStatus {
    Queued,
    Processing,
    Completed,
    Error,
}

impl From<RemoteStatus> for TranscriptionStatus {
    fn from(status: RemoteStatus) -> Self {
        match status {
            RemoteStatus::Queued => Self::Queued,
            RemoteStatus::Processing => Self::Processing,
            RemoteStatus::Completed => Self::Completed,
            RemoteStatus::Error => Self::Failed,
        }
    }
}

/// Subset of the transcript resource returned by submission and status
/// endpoints.
#[derive(Debug, Deserialize)]
pub struct TranscriptResponse {
    pub id: String,
    pub status: RemoteStatus,
    /// Populated when `status` is `error`
    pub error: Option<String>,
}

/// `GET /v2/transcript/{id}/sentences` response body.
#[derive(Debug, Deserialize)]
pub struct SentencesResponse {
    pub sentences: Vec<Sentence>,
}

/// One sentence of the completed transcript. `start` and `end` are
/// milliseconds from the beginning of the audio.
#[derive(Debug, Deserialize)]
pub struct Sentence {
    pub text: String,
    pub start: i64,
    pub end: i64,
}

/// Error envelope returned with non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
