pub mod assemblyai;
mod base;

// Re-export public types and traits
pub use base::{
    Transcription, TranscriptionError, TranscriptionProvider, TranscriptionResult,
    TranscriptionStatus,
};

// Re-export AssemblyAI implementation
pub use assemblyai::{ASSEMBLYAI_BASE_URL, AssemblyAIConfig, AssemblyAIProvider};
