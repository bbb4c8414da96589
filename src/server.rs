use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{Metadata, Transcript, extract_video_id, oembed, output, youtube};

#[derive(Clone)]
pub struct AppState {
    pub client: reqwest::Client,
    pub langs: Vec<String>,
    pub user_agent: String,
    pub max_keywords: usize,
}

#[derive(Debug, Deserialize)]
pub struct ExtractParams {
    url: Option<String>,
}

/// The one response envelope every request produces.
#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub status: &'static str,
    pub transcript: String,
    #[serde(rename = "hasTranscript")]
    pub has_transcript: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/extract", get(extract).options(preflight))
        .with_state(state)
}

const CORS_HEADERS: [(header::HeaderName, &str); 3] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, OPTIONS"),
    (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
];

async fn index() -> impl IntoResponse {
    (CORS_HEADERS, Json(json!({ "service": "ytex", "status": "ok" })))
}

async fn preflight() -> impl IntoResponse {
    (StatusCode::OK, CORS_HEADERS)
}

fn respond(status: StatusCode, body: ExtractResponse) -> Response {
    (status, CORS_HEADERS, Json(body)).into_response()
}

fn error_response(status: StatusCode, message: String) -> Response {
    respond(
        status,
        ExtractResponse {
            status: "error",
            transcript: String::new(),
            has_transcript: false,
            metadata: None,
            video_id: None,
            message: Some(message),
        },
    )
}

fn success_response(
    video_id: String,
    metadata: Metadata,
    transcript: String,
    message: Option<String>,
) -> Response {
    let has_transcript = !transcript.is_empty();
    respond(
        StatusCode::OK,
        ExtractResponse {
            status: "success",
            transcript,
            has_transcript,
            metadata: Some(metadata),
            video_id: Some(video_id),
            message,
        },
    )
}

/// Explain a missing caption track: either the watch-page scrape failed
/// earlier, or the page listed no tracks at all.
fn no_track_message(page_error: Option<String>) -> String {
    let raw = page_error
        .map(|e| format!("captions unavailable: {e}"))
        .unwrap_or_else(|| "this video has no caption tracks".to_string());
    friendly_message(&raw)
}

fn fallback_thumbnail(video_id: &str) -> String {
    format!("https://i.ytimg.com/vi/{video_id}/maxresdefault.jpg")
}

/// Rewrite a bot-check failure into something a human can act on; other
/// messages pass through unchanged.
fn friendly_message(raw: &str) -> String {
    if raw.contains(youtube::BOT_CHECK_MARKER) {
        "YouTube is blocking automated access from this server (sign-in check). \
         Try again later or from a different network."
            .to_string()
    } else {
        raw.to_string()
    }
}

/// GET /api/extract?url=<YouTube URL or 11-char video ID>
///
/// Metadata sources (oEmbed, then watch-page scrape) fail independently;
/// caption failure is reported in the envelope, never as a request failure.
pub async fn extract(State(state): State<AppState>, Query(params): Query<ExtractParams>) -> Response {
    let Some(url) = params.url else {
        return error_response(StatusCode::BAD_REQUEST, "url parameter required".to_string());
    };

    let Some(video_id) = extract_video_id(&url) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("could not derive a video ID from: {url}"),
        );
    };

    let mut metadata = Metadata::default();
    let mut oembed_ok = false;
    match oembed::fetch_metadata(&state.client, &video_id).await {
        Ok(meta) => {
            metadata.merge_missing(meta);
            oembed_ok = true;
        }
        Err(e) => warn!("oEmbed lookup failed for {video_id}: {e}"),
    }

    let mut page_error = None;
    let page = match youtube::fetch_watch_page(
        &state.client,
        &video_id,
        &state.user_agent,
        state.max_keywords,
    )
    .await
    {
        Ok(page) => Some(page),
        Err(e) => {
            warn!("Watch page scrape failed for {video_id}: {e}");
            page_error = Some(e.to_string());
            None
        }
    };

    if !oembed_ok && page.is_none() {
        let raw = page_error.unwrap_or_else(|| "no metadata source responded".to_string());
        let status = if raw.contains(youtube::BOT_CHECK_MARKER) {
            StatusCode::FORBIDDEN
        } else {
            StatusCode::BAD_GATEWAY
        };
        return error_response(status, friendly_message(&raw));
    }

    let caption_tracks = match page {
        Some(page) => {
            metadata.merge_missing(page.metadata);
            page.caption_tracks
        }
        None => Vec::new(),
    };
    if metadata.thumbnail.is_empty() {
        metadata.thumbnail = fallback_thumbnail(&video_id);
    }

    let (transcript, message) = match youtube::select_track(&caption_tracks, &state.langs) {
        Some(track) => {
            match youtube::fetch_caption_segments(&state.client, track, &state.user_agent).await {
                Ok(segments) => {
                    let transcript = Transcript { segments };
                    (output::render_timestamped(&transcript), None)
                }
                Err(e) => {
                    warn!("Caption download failed for {video_id}: {e}");
                    (String::new(), Some(friendly_message(&e.to_string())))
                }
            }
        }
        None => (String::new(), Some(no_track_message(page_error))),
    };

    info!(
        "Extracted {video_id}: title={:?} transcript={}",
        metadata.title,
        if transcript.is_empty() { "no" } else { "yes" }
    );

    success_response(video_id, metadata, transcript, message)
}
