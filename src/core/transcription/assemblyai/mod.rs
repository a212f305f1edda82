//! AssemblyAI asynchronous transcription provider.
//!
//! Batch REST backend over the AssemblyAI v2 transcript API. A job is
//! submitted with `POST /v2/transcript`, its status polled with
//! `GET /v2/transcript/{id}`, and the sentence-level result retrieved with
//! `GET /v2/transcript/{id}/sentences` once the job completes.
//!
//! Registered under the `assembly_ai` driver name.

mod client;
mod config;
mod messages;


pub use client::AssemblyAIProvider;
pub use config::{ASSEMBLYAI_BASE_URL, AssemblyAIConfig};
