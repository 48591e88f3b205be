use std::env;

const DEFAULT_LLM_API_URL: &str = "https://api.openai.com/v1";
const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
const DEFAULT_VOICE_API_URL: &str = "https://api.elevenlabs.io";

/// Process configuration, read once at startup and shared through `AppState`.
///
/// Provider credentials are optional here; endpoints that need a missing one
/// answer with a configuration error instead of failing at boot, so the
/// server can still serve the endpoints it is configured for.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub llm_api_key: Option<String>,
    pub llm_api_url: String,
    pub llm_model: String,
    pub voice_api_key: Option<String>,
    pub voice_api_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("PORT must be a number"),
            llm_api_key: env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            llm_api_url: env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| DEFAULT_LLM_API_URL.to_string()),
            llm_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_string()),
            voice_api_key: env::var("ELEVENLABS_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            voice_api_url: env::var("ELEVENLABS_API_URL")
                .unwrap_or_else(|_| DEFAULT_VOICE_API_URL.to_string()),
        }
    }
}
