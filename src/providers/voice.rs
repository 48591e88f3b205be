//! Voice provider client (ElevenLabs-compatible): speech synthesis, voice
//! design previews and speech-to-text transcription.

use bytes::Bytes;
use reqwest::{multipart, Client, Response};
use serde::Serialize;

use crate::api::{VoiceDesignRequest, VoiceSettings};
use crate::error::AppError;

const XI_API_KEY: &str = "xi-api-key";

const DEFAULT_DESIGN_MODEL: &str = "eleven_multilingual_ttv_v2";
const DEFAULT_LOUDNESS: f64 = 0.5;
const DEFAULT_GUIDANCE_SCALE: f64 = 5.0;

const DEFAULT_STT_MODEL: &str = "scribe_v1";

pub struct VoiceClient {
    client: Client,
    api_url: String,
    api_key: Option<String>,
}

/// An uploaded audio file, buffered in full before forwarding.
pub struct AudioUpload {
    pub data: Bytes,
    pub filename: String,
    pub content_type: String,
}

/// Transcription options taken from the inbound form. `None` means the field
/// was absent and must not appear in the outgoing request; `Some(false)` for
/// the flags is forwarded.
#[derive(Debug, Default)]
pub struct TranscriptionParams {
    pub model_id: Option<String>,
    pub language_code: Option<String>,
    pub num_speakers: Option<u32>,
    pub diarize: Option<bool>,
    pub tag_audio_events: Option<bool>,
}

impl VoiceClient {
    pub fn new(api_url: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key,
        }
    }

    fn api_key(&self) -> Result<&str, AppError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AppError::Configuration("ELEVENLABS_API_KEY is not set".into()))
    }

    /// Request synthesis and hand back the provider response so the handler
    /// can relay the audio bytes without buffering them.
    ///
    /// Failures are reported generically; synthesis callers get no provider
    /// diagnostics.
    pub async fn synthesize(
        &self,
        voice_id: &str,
        text: &str,
        settings: VoiceSettings,
    ) -> Result<Response, AppError> {
        let key = self.api_key()?;
        let body = SynthesisRequest {
            text,
            voice_settings: settings,
        };

        let response = self
            .client
            .post(format!("{}/v1/text-to-speech/{}", self.api_url, voice_id))
            .header(XI_API_KEY, key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Synthesis(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Synthesis(format!(
                "voice provider returned {}",
                status
            )));
        }

        Ok(response)
    }

    /// Create voice previews from a natural-language description. Provider
    /// failures are relayed with their original status and body.
    pub async fn design(&self, request: &VoiceDesignRequest) -> Result<serde_json::Value, AppError> {
        let key = self.api_key()?;
        let body = DesignRequest {
            voice_description: &request.voice_description,
            model_id: request.model_id.as_deref().unwrap_or(DEFAULT_DESIGN_MODEL),
            auto_generate_text: request.text.is_none(),
            loudness: request.loudness.unwrap_or(DEFAULT_LOUDNESS),
            guidance_scale: request.guidance_scale.unwrap_or(DEFAULT_GUIDANCE_SCALE),
            text: request.text.as_deref(),
            seed: request.seed,
            stream_previews: request.stream_previews,
            quality: request.quality,
            reference_audio_base64: request.reference_audio_base64.as_deref(),
            prompt_strength: request.prompt_strength,
        };

        let response = self
            .client
            .post(format!(
                "{}/v1/text-to-voice/create-previews",
                self.api_url
            ))
            .header(XI_API_KEY, key)
            .json(&body)
            .send()
            .await
            .map_err(AppError::upstream_unreachable)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(AppError::UpstreamPassthrough { status, body });
        }

        response.json().await.map_err(AppError::upstream_unreachable)
    }

    /// Forward an uploaded audio file as multipart form data and return the
    /// provider's transcript JSON verbatim.
    pub async fn transcribe(
        &self,
        audio: AudioUpload,
        params: TranscriptionParams,
    ) -> Result<serde_json::Value, AppError> {
        let key = self.api_key()?;

        let file = multipart::Part::bytes(audio.data.to_vec())
            .file_name(audio.filename)
            .mime_str(&audio.content_type)
            .map_err(|e| AppError::validation(format!("invalid audio content type: {}", e)))?;

        let mut form = multipart::Form::new().part("file", file).text(
            "model_id",
            params
                .model_id
                .unwrap_or_else(|| DEFAULT_STT_MODEL.to_string()),
        );
        if let Some(language_code) = params.language_code {
            form = form.text("language_code", language_code);
        }
        if let Some(num_speakers) = params.num_speakers {
            form = form.text("num_speakers", num_speakers.to_string());
        }
        if let Some(diarize) = params.diarize {
            form = form.text("diarize", diarize.to_string());
        }
        if let Some(tag_audio_events) = params.tag_audio_events {
            form = form.text("tag_audio_events", tag_audio_events.to_string());
        }

        let response = self
            .client
            .post(format!("{}/v1/speech-to-text", self.api_url))
            .header(XI_API_KEY, key)
            .multipart(form)
            .send()
            .await
            .map_err(AppError::upstream_unreachable)?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let details = match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(_) if raw.is_empty() => None,
                Err(_) => Some(serde_json::Value::String(raw)),
            };
            return Err(AppError::Upstream {
                status: Some(status),
                message: "transcription failed".into(),
                details,
            });
        }

        response.json().await.map_err(AppError::upstream_unreachable)
    }
}

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct DesignRequest<'a> {
    voice_description: &'a str,
    model_id: &'a str,
    auto_generate_text: bool,
    loudness: f64,
    guidance_scale: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream_previews: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quality: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference_audio_base64: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt_strength: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn design_request_defaults_required_fields() {
        let body = DesignRequest {
            voice_description: "A deep, warm male voice with a slight accent",
            model_id: DEFAULT_DESIGN_MODEL,
            auto_generate_text: true,
            loudness: DEFAULT_LOUDNESS,
            guidance_scale: DEFAULT_GUIDANCE_SCALE,
            text: None,
            seed: None,
            stream_previews: None,
            quality: None,
            reference_audio_base64: None,
            prompt_strength: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model_id"], "eleven_multilingual_ttv_v2");
        assert_eq!(json["auto_generate_text"], true);
        assert_eq!(json["loudness"], 0.5);
        assert_eq!(json["guidance_scale"], 5.0);
        assert!(json.get("seed").is_none());
        assert!(json.get("stream_previews").is_none());
        assert!(json.get("quality").is_none());
    }

    #[test]
    fn design_request_keeps_explicit_false() {
        let body = DesignRequest {
            voice_description: "A bright, cheerful narrator voice for fairy tales",
            model_id: DEFAULT_DESIGN_MODEL,
            auto_generate_text: false,
            loudness: DEFAULT_LOUDNESS,
            guidance_scale: DEFAULT_GUIDANCE_SCALE,
            text: Some("Once upon a time"),
            seed: Some(42),
            stream_previews: Some(false),
            quality: None,
            reference_audio_base64: None,
            prompt_strength: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["stream_previews"], false);
        assert_eq!(json["seed"], 42);
        assert_eq!(json["text"], "Once upon a time");
        assert_eq!(json["auto_generate_text"], false);
    }
}
