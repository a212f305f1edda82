//! PII/entity detection for parsed transcript text.
//!
//! Detectors post-process the text a provider parsed out of a completed job,
//! flagging sensitive spans so the provider can store a redacted rendition
//! alongside the original. The core never calls a detector directly; a
//! provider implementation does, when its configuration names one.

mod regex;

pub use regex::RegexPiiDetector;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::transcription::TranscriptionResult;

/// Category of a detected sensitive span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiEntityType {
    Email,
    PhoneNumber,
    Ssn,
    /// Provider-specific category not modelled above
    Other,
}

impl PiiEntityType {
    /// Token substituted for the span when redacting.
    pub fn redaction_token(&self) -> &'static str {
        match self {
            Self::Email => "[EMAIL]",
            Self::PhoneNumber => "[PHONE_NUMBER]",
            Self::Ssn => "[SSN]",
            Self::Other => "[PII]",
        }
    }
}

impl fmt::Display for PiiEntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Email => "email",
            Self::PhoneNumber => "phone_number",
            Self::Ssn => "ssn",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// A sensitive span found in a piece of text.
///
/// `offset` and `length` are byte positions into the original text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiiEntity {
    pub entity_type: PiiEntityType,
    pub offset: usize,
    pub length: usize,
}

/// Capability set implemented by each PII/entity detection backend.
#[async_trait]
pub trait PiiEntityDetector: Send + Sync {
    /// Detect sensitive spans in `text`.
    ///
    /// Entities are returned in ascending offset order and never overlap.
    async fn detect(
        &self,
        text: &str,
        language_code: &str,
    ) -> TranscriptionResult<Vec<PiiEntity>>;
}

/// Substitute each detected span with its category token.
///
/// Entities must be sorted by offset and non-overlapping, as produced by
/// [`PiiEntityDetector::detect`].
pub fn redact(text: &str, entities: &[PiiEntity]) -> String {
    let mut redacted = String::with_capacity(text.len());
    let mut cursor = 0;

    for entity in entities {
        let end = entity.offset + entity.length;
        if entity.offset < cursor || end > text.len() {
            continue;
        }
        // Checked slicing: a span off a character boundary is skipped like
        // an out-of-bounds one, instead of panicking on a bad detector.
        let (Some(gap), Some(_)) = (text.get(cursor..entity.offset), text.get(entity.offset..end))
        else {
            continue;
        };
        redacted.push_str(gap);
        redacted.push_str(entity.entity_type.redaction_token());
        cursor = end;
    }

    redacted.push_str(&text[cursor..]);
    redacted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_single_entity() {
        let text = "reach me at bob@example.com today";
        let entities = vec![PiiEntity {
            entity_type: PiiEntityType::Email,
            offset: 12,
            length: 15,
        }];
        assert_eq!(redact(text, &entities), "reach me at [EMAIL] today");
    }

    #[test]
    fn test_redact_multiple_entities() {
        let text = "a@b.co or 555-123-4567";
        let entities = vec![
            PiiEntity {
                entity_type: PiiEntityType::Email,
                offset: 0,
                length: 6,
            },
            PiiEntity {
                entity_type: PiiEntityType::PhoneNumber,
                offset: 10,
                length: 12,
            },
        ];
        assert_eq!(redact(text, &entities), "[EMAIL] or [PHONE_NUMBER]");
    }

    #[test]
    fn test_redact_no_entities_is_identity() {
        assert_eq!(redact("nothing sensitive here", &[]), "nothing sensitive here");
    }

    #[test]
    fn test_redact_skips_non_boundary_span() {
        // Byte 4 is inside the two-byte "é"; the valid phone span after it
        // must still be redacted
        let text = "café 415-555-2671";
        let entities = vec![
            PiiEntity {
                entity_type: PiiEntityType::Other,
                offset: 4,
                length: 1,
            },
            PiiEntity {
                entity_type: PiiEntityType::PhoneNumber,
                offset: 6,
                length: 12,
            },
        ];
        assert_eq!(redact(text, &entities), "café [PHONE_NUMBER]");
    }

    #[test]
    fn test_redact_skips_out_of_bounds_entity() {
        let entities = vec![PiiEntity {
            entity_type: PiiEntityType::Other,
            offset: 10,
            length: 50,
        }];
        assert_eq!(redact("short", &entities), "short");
    }
}
