//! Durable storage for transcript records.
//!
//! A [`Transcript`] is the local record of one remote transcription job. It is
//! created exactly once when the job is submitted and mutated only by the
//! confirmation path. Segments are owned exclusively by their record and are
//! replaced, never appended, so repeated parses of the same completed job stay
//! idempotent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::pool::PoolConnection;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Acquire, Row, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::core::transcription::{TranscriptionResult, TranscriptionStatus};

/// A time-stamped span of transcribed text.
///
/// `redacted_text` carries the PII-substituted rendition when a detector
/// flagged the span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start_ms: i64,
    pub end_ms: i64,
    pub text: String,
    pub pii_flagged: bool,
    pub redacted_text: Option<String>,
}

/// The durable record of one transcription job and its outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Opaque identifier, assigned at creation
    pub id: String,
    /// Configured provider name this record was created with, stored verbatim
    /// so confirmation can resolve the same provider without any string
    /// transformation
    pub provider_type: String,
    /// Identifier assigned by the external provider for this job
    pub external_id: String,
    pub status: TranscriptionStatus,
    pub audio_file_url: String,
    pub language_code: String,
    /// Empty until a successful parse
    pub segments: Vec<TranscriptSegment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transcript {
    /// Create a fresh record for a newly submitted job.
    pub fn new(
        provider_type: impl Into<String>,
        external_id: impl Into<String>,
        status: TranscriptionStatus,
        audio_file_url: impl Into<String>,
        language_code: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            provider_type: provider_type.into(),
            external_id: external_id.into(),
            status,
            audio_file_url: audio_file_url.into(),
            language_code: language_code.into(),
            segments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the record has reached a terminal status.
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS transcripts (
    id TEXT PRIMARY KEY,
    provider_type TEXT NOT NULL,
    external_id TEXT NOT NULL,
    status TEXT NOT NULL,
    audio_file_url TEXT NOT NULL,
    language_code TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_transcripts_job
    ON transcripts (provider_type, external_id);

CREATE TABLE IF NOT EXISTS transcript_segments (
    id TEXT PRIMARY KEY,
    transcript_id TEXT NOT NULL REFERENCES transcripts (id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    start_ms INTEGER NOT NULL,
    end_ms INTEGER NOT NULL,
    text TEXT NOT NULL,
    pii_flagged INTEGER NOT NULL DEFAULT 0,
    redacted_text TEXT
);

CREATE INDEX IF NOT EXISTS idx_transcript_segments_transcript
    ON transcript_segments (transcript_id);
";

/// SQLite-backed store for transcript records.
#[derive(Clone)]
pub struct TranscriptStore {
    pool: SqlitePool,
}

impl TranscriptStore {
    /// Connect to the given SQLite database URL and ensure the schema exists.
    pub async fn connect(url: &str) -> TranscriptionResult<Self> {
        let pool = Self::pool_options()
            .max_connections(5)
            .connect(url)
            .await?;
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// In-memory store, mainly for tests.
    ///
    /// A single connection is required: each in-memory SQLite connection is
    /// its own database.
    pub async fn in_memory() -> TranscriptionResult<Self> {
        let pool = Self::pool_options()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    // The pool must not hold background timers (reaper, acquire-time ping)
    // while callers await the SQLite worker thread; scheduling tests run
    // under a paused clock, which auto-advances any pending timer and would
    // fire it before the real wakeup arrives. The acquire timeout only
    // registers a timer when no idle connection is available, so connecting
    // must happen while time is running; after that, acquires resolve on
    // the first poll and never park on it.
    fn pool_options() -> SqlitePoolOptions {
        SqlitePoolOptions::new()
            .idle_timeout(None)
            .max_lifetime(None)
            .test_before_acquire(false)
    }

    // For the same reason, every operation below acquires its connection
    // explicitly and awaits `return_to_pool` before returning: the deferred
    // drop-handler task pings the SQLite worker thread after the caller has
    // already resumed, so a later acquire could find the pool empty and park
    // on the acquire-timeout timer.

    /// Wrap an existing pool. The schema is assumed to be in place.
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn ensure_schema(&self) -> TranscriptionResult<()> {
        let mut conn = self.pool.acquire().await?;
        for statement in SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement).execute(&mut *conn).await?;
        }
        conn.return_to_pool().await;
        Ok(())
    }

    /// Insert a newly created record.
    pub async fn create(&self, transcript: &Transcript) -> TranscriptionResult<()> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query(
            "INSERT INTO transcripts \
             (id, provider_type, external_id, status, audio_file_url, language_code, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&transcript.id)
        .bind(&transcript.provider_type)
        .bind(&transcript.external_id)
        .bind(transcript.status.as_str())
        .bind(&transcript.audio_file_url)
        .bind(&transcript.language_code)
        .bind(transcript.created_at)
        .bind(transcript.updated_at)
        .execute(&mut *conn)
        .await?;
        conn.return_to_pool().await;

        debug!(
            transcript_id = %transcript.id,
            provider_type = %transcript.provider_type,
            external_id = %transcript.external_id,
            "transcript record created"
        );
        Ok(())
    }

    /// Load a record by primary id.
    pub async fn find(&self, id: &str) -> TranscriptionResult<Option<Transcript>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query("SELECT * FROM transcripts WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        let transcript = match row {
            Some(row) => Some(Self::hydrate(&mut conn, row).await?),
            None => None,
        };
        conn.return_to_pool().await;
        Ok(transcript)
    }

    /// Load the record tracking the given remote job.
    pub async fn find_by_job(
        &self,
        provider_type: &str,
        external_id: &str,
    ) -> TranscriptionResult<Option<Transcript>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query("SELECT * FROM transcripts WHERE provider_type = ? AND external_id = ?")
            .bind(provider_type)
            .bind(external_id)
            .fetch_optional(&mut *conn)
            .await?;

        let transcript = match row {
            Some(row) => Some(Self::hydrate(&mut conn, row).await?),
            None => None,
        };
        conn.return_to_pool().await;
        Ok(transcript)
    }

    /// Persist the record's current status and segments.
    ///
    /// Segments are replaced wholesale inside a transaction, so a repeated
    /// save of the same parsed result cannot duplicate rows.
    pub async fn save(&self, transcript: &mut Transcript) -> TranscriptionResult<()> {
        transcript.updated_at = Utc::now();

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        sqlx::query("UPDATE transcripts SET status = ?, updated_at = ? WHERE id = ?")
            .bind(transcript.status.as_str())
            .bind(transcript.updated_at)
            .bind(&transcript.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM transcript_segments WHERE transcript_id = ?")
            .bind(&transcript.id)
            .execute(&mut *tx)
            .await?;

        for (position, segment) in transcript.segments.iter().enumerate() {
            sqlx::query(
                "INSERT INTO transcript_segments \
                 (id, transcript_id, position, start_ms, end_ms, text, pii_flagged, redacted_text) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&transcript.id)
            .bind(position as i64)
            .bind(segment.start_ms)
            .bind(segment.end_ms)
            .bind(&segment.text)
            .bind(segment.pii_flagged)
            .bind(&segment.redacted_text)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        conn.return_to_pool().await;

        debug!(
            transcript_id = %transcript.id,
            status = %transcript.status,
            segments = transcript.segments.len(),
            "transcript record saved"
        );
        Ok(())
    }

    async fn hydrate(
        conn: &mut PoolConnection<Sqlite>,
        row: sqlx::sqlite::SqliteRow,
    ) -> TranscriptionResult<Transcript> {
        let status: String = row.try_get("status")?;
        let id: String = row.try_get("id")?;

        let segment_rows = sqlx::query(
            "SELECT start_ms, end_ms, text, pii_flagged, redacted_text \
             FROM transcript_segments WHERE transcript_id = ? ORDER BY position",
        )
        .bind(&id)
        .fetch_all(&mut **conn)
        .await?;

        let segments = segment_rows
            .into_iter()
            .map(|row| -> Result<TranscriptSegment, sqlx::Error> {
                Ok(TranscriptSegment {
                    start_ms: row.try_get("start_ms")?,
                    end_ms: row.try_get("end_ms")?,
                    text: row.try_get("text")?,
                    pii_flagged: row.try_get("pii_flagged")?,
                    redacted_text: row.try_get("redacted_text")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Transcript {
            id,
            provider_type: row.try_get("provider_type")?,
            external_id: row.try_get("external_id")?,
            status: status.parse()?,
            audio_file_url: row.try_get("audio_file_url")?,
            language_code: row.try_get("language_code")?,
            segments,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_transcript() -> Transcript {
        Transcript::new(
            "assembly_ai",
            "ext-123",
            TranscriptionStatus::Processing,
            "https://www.example.com/audio/test.wav",
            "en-US",
        )
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = TranscriptStore::in_memory().await.unwrap();
        let transcript = sample_transcript();
        store.create(&transcript).await.unwrap();

        let loaded = store.find(&transcript.id).await.unwrap().unwrap();
        assert_eq!(loaded.provider_type, "assembly_ai");
        assert_eq!(loaded.external_id, "ext-123");
        assert_eq!(loaded.status, TranscriptionStatus::Processing);
        assert_eq!(loaded.audio_file_url, "https://www.example.com/audio/test.wav");
        assert_eq!(loaded.language_code, "en-US");
        assert!(loaded.segments.is_empty());
    }

    #[tokio::test]
    async fn test_find_by_job() {
        let store = TranscriptStore::in_memory().await.unwrap();
        let transcript = sample_transcript();
        store.create(&transcript).await.unwrap();

        let loaded = store
            .find_by_job("assembly_ai", "ext-123")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.id, transcript.id);

        assert!(store
            .find_by_job("assembly_ai", "no-such-job")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_save_replaces_segments() {
        let store = TranscriptStore::in_memory().await.unwrap();
        let mut transcript = sample_transcript();
        store.create(&transcript).await.unwrap();

        transcript.status = TranscriptionStatus::Completed;
        transcript.segments = vec![
            TranscriptSegment {
                start_ms: 0,
                end_ms: 1500,
                text: "hello world".into(),
                pii_flagged: false,
                redacted_text: None,
            },
            TranscriptSegment {
                start_ms: 1500,
                end_ms: 3200,
                text: "my email is a@b.com".into(),
                pii_flagged: true,
                redacted_text: Some("my email is [EMAIL]".into()),
            },
        ];

        // Saving twice must not duplicate segments
        store.save(&mut transcript).await.unwrap();
        store.save(&mut transcript).await.unwrap();

        let loaded = store.find(&transcript.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, TranscriptionStatus::Completed);
        assert_eq!(loaded.segments.len(), 2);
        assert_eq!(loaded.segments[0].text, "hello world");
        assert!(loaded.segments[1].pii_flagged);
        assert_eq!(
            loaded.segments[1].redacted_text.as_deref(),
            Some("my email is [EMAIL]")
        );
    }

    #[tokio::test]
    async fn test_connect_creates_file_backed_database() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("transcripts.db").display()
        );

        let store = TranscriptStore::connect(&url).await.unwrap();
        let transcript = sample_transcript();
        store.create(&transcript).await.unwrap();

        // Reopen and read back through a fresh pool
        let reopened = TranscriptStore::connect(&url).await.unwrap();
        let loaded = reopened.find(&transcript.id).await.unwrap().unwrap();
        assert_eq!(loaded.external_id, "ext-123");
    }

    #[tokio::test]
    async fn test_job_key_is_unique() {
        let store = TranscriptStore::in_memory().await.unwrap();
        let transcript = sample_transcript();
        store.create(&transcript).await.unwrap();

        let duplicate = sample_transcript();
        assert!(store.create(&duplicate).await.is_err());
    }
}
