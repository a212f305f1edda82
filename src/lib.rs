//! polyscribe: multi-provider asynchronous audio transcription tracking.
//!
//! A caller submits an audio URL and language code; the manager dispatches
//! the job to a configured provider, persists a durable transcript record,
//! and reconciles it against the provider's remote state on a linear backoff
//! schedule until the job reaches a terminal outcome, at which point the
//! parsed segments (optionally PII-redacted) are stored alongside the record.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use polyscribe::{TranscriptionConfig, TranscriptionManager, TranscriptStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TranscriptionConfig::from_file("transcription.yaml".as_ref())?;
//!     let store = TranscriptStore::connect("sqlite://transcripts.db").await?;
//!     let manager = Arc::new(TranscriptionManager::new(config, store));
//!
//!     let transcript = manager
//!         .make("https://example.com/audio.wav", "en-US", None)
//!         .await?;
//!     println!("tracking job {} as {}", transcript.external_id, transcript.id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod handlers;
pub mod manager;
pub mod registry;
pub mod scheduler;
pub mod store;

// Re-export the public surface for convenience
pub use config::{CallbackConfig, ConfirmationConfig, DriverSettings, TranscriptionConfig};
pub use core::detector::{PiiEntity, PiiEntityDetector, PiiEntityType, RegexPiiDetector, redact};
pub use core::transcription::{
    Transcription, TranscriptionError, TranscriptionProvider, TranscriptionResult,
    TranscriptionStatus,
};
pub use handlers::callback_router;
pub use manager::TranscriptionManager;
pub use registry::{DetectorFactory, DetectorRegistry, ProviderFactory, ProviderRegistry};
pub use scheduler::{ConfirmationScheduler, JobKey};
pub use store::{Transcript, TranscriptSegment, TranscriptStore};
