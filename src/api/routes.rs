use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use crate::config::Config;
use crate::providers::{LlmClient, VoiceClient};

/// Upload ceiling for the transcription endpoint.
const MAX_UPLOAD_BYTES: usize = 3 * 1024 * 1024 * 1024;

pub struct AppState {
    pub llm: LlmClient,
    pub voice: VoiceClient,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            llm: LlmClient::new(
                config.llm_api_url.clone(),
                config.llm_api_key.clone(),
                config.llm_model.clone(),
            ),
            voice: VoiceClient::new(config.voice_api_url.clone(), config.voice_api_key.clone()),
        }
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let api_routes = Router::new()
        .route("/chat", post(handlers::chat))
        .route("/tts", post(handlers::tts))
        .route("/voice-design", post(handlers::voice_design))
        .route(
            "/stt",
            post(handlers::stt).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
