pub mod llm;
pub mod voice;

pub use llm::LlmClient;
pub use voice::VoiceClient;
