use std::sync::Arc;

use async_stream::stream;
use axum::{
    body::Body,
    extract::{Multipart, Query, State},
    http::header,
    response::sse::{Event, Sse},
    response::{IntoResponse, Response},
    Json,
};
use futures::{Stream, StreamExt};

use super::{
    ChatQuery, ChatRequest, ChatResponse, HealthResponse, StreamDone, StreamToken, TtsRequest,
    VoiceDesignRequest,
};
use crate::api::routes::AppState;
use crate::error::AppError;
use crate::providers::voice::{AudioUpload, TranscriptionParams};

const MIN_DESCRIPTION_CHARS: usize = 20;
const MAX_DESCRIPTION_CHARS: usize = 1000;

/// In-character line served whenever the language model is unavailable.
fn fallback_line(player_name: &str) -> String {
    format!("*{} nods thoughtfully*", player_name)
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChatQuery>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, AppError> {
    if request.player_name.trim().is_empty() {
        return Err(AppError::validation("playerName is required"));
    }
    if request.player_description.trim().is_empty() {
        return Err(AppError::validation("playerDescription is required"));
    }
    if request.mj_message.trim().is_empty() {
        return Err(AppError::validation("mjMessage is required"));
    }

    state.llm.ensure_configured()?;

    if query.stream {
        return Ok(chat_stream(state, request).into_response());
    }

    // Downstream failures never surface here: the player always gets an
    // in-character reply, flagged so the client can tell.
    let reply = match state
        .llm
        .complete(&request.player_description, &request.mj_message)
        .await
    {
        Ok(text) => ChatResponse {
            response: text,
            error: None,
        },
        Err(e) => {
            tracing::warn!("Chat completion failed, serving fallback: {}", e);
            ChatResponse {
                response: fallback_line(&request.player_name),
                error: Some(true),
            }
        }
    };

    Ok(Json(reply).into_response())
}

/// SSE variant of the chat relay: one event per upstream token, closed by a
/// `{done:true}` sentinel. Failures degrade to a single fallback token.
fn chat_stream(
    state: Arc<AppState>,
    request: ChatRequest,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let events = stream! {
        match state
            .llm
            .complete_stream(&request.player_description, &request.mj_message)
            .await
        {
            Ok(tokens) => {
                futures::pin_mut!(tokens);
                let mut failed = false;
                while let Some(token) = tokens.next().await {
                    match token {
                        Ok(token) => yield Event::default().json_data(StreamToken { token }),
                        Err(e) => {
                            tracing::warn!("Chat stream interrupted, serving fallback: {}", e);
                            failed = true;
                            break;
                        }
                    }
                }
                if failed {
                    yield Event::default().json_data(StreamToken {
                        token: fallback_line(&request.player_name),
                    });
                }
            }
            Err(e) => {
                tracing::warn!("Chat stream failed to start, serving fallback: {}", e);
                yield Event::default().json_data(StreamToken {
                    token: fallback_line(&request.player_name),
                });
            }
        }
        yield Event::default().json_data(StreamDone { done: true });
    };

    Sse::new(events)
}

pub async fn tts(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TtsRequest>,
) -> Result<Response, AppError> {
    if request.voice_id.trim().is_empty() {
        return Err(AppError::validation("voiceId is required"));
    }
    if request.text.trim().is_empty() {
        return Err(AppError::validation("text is required"));
    }

    let settings = request.voice_settings.unwrap_or_default();
    let upstream = state
        .voice
        .synthesize(&request.voice_id, &request.text, settings)
        .await?;

    let body = Body::from_stream(upstream.bytes_stream());
    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], body).into_response())
}

pub async fn voice_design(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VoiceDesignRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let length = request.voice_description.chars().count();
    if length < MIN_DESCRIPTION_CHARS || length > MAX_DESCRIPTION_CHARS {
        return Err(AppError::validation(format!(
            "voice_description must be between {} and {} characters",
            MIN_DESCRIPTION_CHARS, MAX_DESCRIPTION_CHARS
        )));
    }

    let previews = state.voice.design(&request).await?;
    Ok(Json(previews))
}

pub async fn stt(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut audio: Option<AudioUpload> = None;
    let mut params = TranscriptionParams::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "audio" => {
                let filename = field.file_name().unwrap_or("audio").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await?;
                audio = Some(AudioUpload {
                    data,
                    filename,
                    content_type,
                });
            }
            "model_id" => {
                let value = field.text().await?;
                if !value.is_empty() {
                    params.model_id = Some(value);
                }
            }
            "language_code" => {
                let value = field.text().await?;
                if !value.is_empty() {
                    params.language_code = Some(value);
                }
            }
            "num_speakers" => {
                let value = field.text().await?;
                if !value.is_empty() {
                    params.num_speakers = Some(value.parse().map_err(|_| {
                        AppError::validation("num_speakers must be an integer")
                    })?);
                }
            }
            "diarize" => {
                let value = field.text().await?;
                if !value.is_empty() {
                    params.diarize = Some(parse_flag(&value, "diarize")?);
                }
            }
            "tag_audio_events" => {
                let value = field.text().await?;
                if !value.is_empty() {
                    params.tag_audio_events = Some(parse_flag(&value, "tag_audio_events")?);
                }
            }
            _ => {}
        }
    }

    let audio = audio.ok_or_else(|| AppError::validation("audio file is required"))?;

    tracing::debug!(
        "Relaying {} byte upload '{}' for transcription",
        audio.data.len(),
        audio.filename
    );

    let transcript = state.voice.transcribe(audio, params).await?;
    Ok(Json(transcript))
}

/// Explicit `false` is meaningful for the transcription flags, so these are
/// parsed rather than treated as truthy presence.
fn parse_flag(value: &str, field: &str) -> Result<bool, AppError> {
    match value {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(AppError::validation(format!("{} must be a boolean", field))),
    }
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
