pub mod handlers;
pub mod routes;

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub player_name: String,
    #[serde(default)]
    pub player_description: String,
    #[serde(default)]
    pub mj_message: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatQuery {
    /// `?stream=true` switches the chat relay to SSE token streaming.
    #[serde(default)]
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    /// Present and `true` only when the response is the fallback line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct StreamToken {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct StreamDone {
    pub done: bool,
}

#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    #[serde(rename = "voiceId", default)]
    pub voice_id: String,
    #[serde(default)]
    pub text: String,
    pub voice_settings: Option<VoiceSettings>,
}

/// Synthesis tuning values forwarded to the voice provider. Missing fields
/// fall back to fixed server-side defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceSettings {
    #[serde(default = "default_stability")]
    pub stability: f64,
    #[serde(default = "default_similarity_boost")]
    pub similarity_boost: f64,
    #[serde(default = "default_style")]
    pub style: f64,
    #[serde(default = "default_use_speaker_boost")]
    pub use_speaker_boost: bool,
}

fn default_stability() -> f64 {
    0.5
}

fn default_similarity_boost() -> f64 {
    0.75
}

fn default_style() -> f64 {
    0.0
}

fn default_use_speaker_boost() -> bool {
    true
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: default_stability(),
            similarity_boost: default_similarity_boost(),
            style: default_style(),
            use_speaker_boost: default_use_speaker_boost(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VoiceDesignRequest {
    #[serde(default)]
    pub voice_description: String,
    pub model_id: Option<String>,
    pub text: Option<String>,
    pub loudness: Option<f64>,
    pub guidance_scale: Option<f64>,
    pub seed: Option<u64>,
    pub stream_previews: Option<bool>,
    pub quality: Option<f64>,
    pub reference_audio_base64: Option<String>,
    pub prompt_strength: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}
