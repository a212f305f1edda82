pub mod detector;
pub mod transcription;

// Re-export commonly used types for convenience
pub use detector::{PiiEntity, PiiEntityDetector, PiiEntityType, RegexPiiDetector, redact};
pub use transcription::{
    Transcription, TranscriptionError, TranscriptionProvider, TranscriptionResult,
    TranscriptionStatus,
};
