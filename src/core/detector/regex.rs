//! Regex-based PII entity detector.
//!
//! A dependency-free detector covering the common cases: email addresses,
//! North American phone numbers, and US social security numbers. Useful as a
//! default and as the reference implementation of the detector contract;
//! cloud NLP detectors plug in through the same trait.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{PiiEntity, PiiEntityDetector, PiiEntityType};
use crate::core::transcription::TranscriptionResult;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid email regex")
});

// The separator is tied to the country code so a bare number cannot pull
// the preceding character into the match.
static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+?1[-. ]?)?\(?\d{3}\)?[-. ]?\d{3}[-. ]?\d{4}\b").expect("valid phone regex")
});

static SSN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("valid ssn regex")
});

/// Built-in detector registered under the `regex` driver name.
#[derive(Debug, Default)]
pub struct RegexPiiDetector;

impl RegexPiiDetector {
    pub fn new() -> Self {
        Self
    }

    fn collect(text: &str) -> Vec<PiiEntity> {
        let mut entities: Vec<PiiEntity> = Vec::new();

        for (regex, entity_type) in [
            (&*EMAIL_RE, PiiEntityType::Email),
            (&*SSN_RE, PiiEntityType::Ssn),
            (&*PHONE_RE, PiiEntityType::PhoneNumber),
        ] {
            for found in regex.find_iter(text) {
                let overlaps = entities.iter().any(|e| {
                    found.start() < e.offset + e.length && e.offset < found.end()
                });
                if !overlaps {
                    entities.push(PiiEntity {
                        entity_type,
                        offset: found.start(),
                        length: found.len(),
                    });
                }
            }
        }

        entities.sort_by_key(|e| e.offset);
        entities
    }
}

#[async_trait]
impl PiiEntityDetector for RegexPiiDetector {
    async fn detect(
        &self,
        text: &str,
        _language_code: &str,
    ) -> TranscriptionResult<Vec<PiiEntity>> {
        Ok(Self::collect(text))
    }
}
