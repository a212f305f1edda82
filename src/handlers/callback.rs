//! Inbound callback surface for push-style providers.
//!
//! Some backends deliver a completion notice over HTTP instead of waiting to
//! be polled. The callback route does nothing provider-specific: its only
//! effect is to run the same confirmation path the scheduler uses, so a
//! pushed notice and a polled one are indistinguishable to the record.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::core::transcription::{TranscriptionError, TranscriptionStatus};
use crate::manager::TranscriptionManager;

/// Response body for a handled callback.
#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    pub id: String,
    pub status: TranscriptionStatus,
    pub segments: usize,
}

/// Build the callback router, nested under the configured path prefix.
///
/// Routes `POST /{prefix}/callback/{provider_type}/{external_id}`. The host
/// application merges this router into its own and applies whatever
/// middleware (authentication, signature verification) the provider's
/// callbacks require.
pub fn callback_router(manager: Arc<TranscriptionManager>) -> Router {
    let prefix = manager.config().callback.prefix.trim_matches('/').to_string();

    let routes = Router::new()
        .route(
            "/callback/{provider_type}/{external_id}",
            post(confirm_callback),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(manager);

    Router::new().nest(&format!("/{prefix}"), routes)
}

async fn confirm_callback(
    State(manager): State<Arc<TranscriptionManager>>,
    Path((provider_type, external_id)): Path<(String, String)>,
) -> Response {
    info!(%provider_type, %external_id, "transcription callback received");

    match manager.confirm(&provider_type, &external_id).await {
        Ok(transcript) => Json(CallbackResponse {
            id: transcript.id,
            status: transcript.status,
            segments: transcript.segments.len(),
        })
        .into_response(),
        Err(error) => {
            warn!(%provider_type, %external_id, %error, "callback confirmation failed");
            (error_status(&error), error.to_string()).into_response()
        }
    }
}

fn error_status(error: &TranscriptionError) -> StatusCode {
    match error {
        TranscriptionError::NotFound { .. } => StatusCode::NOT_FOUND,
        TranscriptionError::Lookup(_) | TranscriptionError::Transport(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
