//! Base traits and types for asynchronous transcription providers.
//!
//! This module defines the foundational abstractions for backends that accept
//! a transcription job, report its remote status, and deliver the parsed
//! result once the job completes.
//!
//! # Provider lifecycle
//!
//! 1. `transcribe` submits the job and returns the backend's tracking id
//! 2. `fetch` reports the current remote status for that id
//! 3. `parse` retrieves the completed result and fills the transcript record
//!
//! Providers never poll internally; the confirmation scheduler owns retry
//! and backoff.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::Transcript;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during transcription operations.
#[derive(Debug, Error)]
pub enum TranscriptionError {
    /// A provider name was requested that has no configuration block
    #[error("The [{0}] transcription provider has not been configured")]
    UnconfiguredProvider(String),

    /// A configuration block names a driver with no registered factory
    #[error("No transcription driver registered for [{0}]")]
    UnknownDriver(String),

    /// A configuration block names a PII detector driver with no registered factory
    #[error("No PII entity detector registered for [{0}]")]
    UnknownDetector(String),

    /// Job submission was rejected by the backend
    #[error("Transcription submission failed: {0}")]
    Submission(String),

    /// The backend does not know the requested job id
    #[error("Unknown transcription job: {0}")]
    Lookup(String),

    /// Connectivity failure talking to the backend
    #[error("Provider transport error: {0}")]
    Transport(String),

    /// The backend returned a result this crate could not interpret
    #[error("Failed to parse transcription result: {0}")]
    Parse(String),

    /// PII entity detection failed
    #[error("PII entity detection failed: {0}")]
    Detection(String),

    /// Invalid provider or detector configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// No local transcript record exists for the given job key
    #[error("No transcript found for [{provider_type}/{external_id}]")]
    NotFound {
        provider_type: String,
        external_id: String,
    },

    /// Durable storage error
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Result type for transcription operations.
pub type TranscriptionResult<T> = Result<T, TranscriptionError>;

// =============================================================================
// Status
// =============================================================================

/// Processing status of a transcription job.
///
/// Jobs progress `Queued` → `Processing` → `Completed` or `Failed`.
/// The two terminal states are final: once a record reaches one of them
/// no further reconciliation occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptionStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl TranscriptionStatus {
    /// Convert to the canonical string stored in the database.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether this status is terminal (`Completed` or `Failed`).
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for TranscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TranscriptionStatus {
    type Err = TranscriptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "queued" => Ok(Self::Queued),
            "processing" | "in_progress" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" | "error" => Ok(Self::Failed),
            other => Err(TranscriptionError::Parse(format!(
                "unknown transcription status: {other}"
            ))),
        }
    }
}

// =============================================================================
// Transcription value object
// =============================================================================

/// Remote view of a transcription job as reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcription {
    /// Backend-assigned tracking id for the job
    pub id: String,
    /// Current remote status
    pub status: TranscriptionStatus,
}

impl Transcription {
    pub fn new(id: impl Into<String>, status: TranscriptionStatus) -> Self {
        Self {
            id: id.into(),
            status,
        }
    }
}

// =============================================================================
// Provider trait
// =============================================================================

/// Capability set implemented by each transcription backend.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// Submit a new transcription job to the backend.
    ///
    /// Must be a single remote call with no local polling. Returns the
    /// backend's own tracking id and initial status. Fails with
    /// [`TranscriptionError::Submission`] on transport or validation failure;
    /// the caller does not retry internally.
    async fn transcribe(
        &self,
        audio_url: &str,
        language_code: &str,
    ) -> TranscriptionResult<Transcription>;

    /// Query the current remote status for a previously submitted job.
    ///
    /// Fails with [`TranscriptionError::Lookup`] if the id is unknown to the
    /// backend, [`TranscriptionError::Transport`] for connectivity failures.
    async fn fetch(&self, external_id: &str) -> TranscriptionResult<Transcription>;

    /// Retrieve the full result for a completed job and populate
    /// `transcript.segments`.
    ///
    /// Only called when `transcription.status` is `Completed`. Must be
    /// idempotent: parsing the same completed transcription twice yields the
    /// same segment set, never duplicates.
    async fn parse(
        &self,
        transcription: &Transcription,
        transcript: &mut Transcript,
    ) -> TranscriptionResult<()>;
}
