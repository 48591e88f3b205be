//! Chat completion client for an OpenAI-compatible API.
//!
//! The chat relay pins the sampling parameters: character replies are short
//! and slightly creative, so temperature and the token cap are fixed here
//! rather than exposed to callers.

use async_stream::stream;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

const TEMPERATURE: f64 = 0.8;
const MAX_TOKENS: u32 = 150;

pub struct LlmClient {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl LlmClient {
    pub fn new(api_url: String, api_key: Option<String>, model: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key,
            model,
        }
    }

    pub fn ensure_configured(&self) -> Result<(), AppError> {
        if self.api_key.is_none() {
            return Err(AppError::Configuration("OPENAI_API_KEY is not set".into()));
        }
        Ok(())
    }

    fn api_key(&self) -> Result<&str, AppError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AppError::Configuration("OPENAI_API_KEY is not set".into()))
    }

    fn build_request<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
        stream: bool,
    ) -> CompletionRequest<'a> {
        CompletionRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: user,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            stream: stream.then_some(true),
        }
    }

    /// One-shot completion: the character description is the system message,
    /// the incoming message is the prompt.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String, AppError> {
        let key = self.api_key()?;
        let request = self.build_request(system, user, false);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(key)
            .json(&request)
            .send()
            .await
            .map_err(AppError::upstream_unreachable)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream {
                status: Some(status),
                message: format!("chat completion returned {}", status),
                details: serde_json::from_str(&body).ok(),
            });
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(AppError::upstream_unreachable)?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AppError::Upstream {
                status: None,
                message: "chat completion had no choices".into(),
                details: None,
            })
    }

    /// Streaming completion. The connection is established before the stream
    /// is returned, so callers can still fall back when the provider rejects
    /// the request outright.
    pub async fn complete_stream(
        &self,
        system: &str,
        user: &str,
    ) -> Result<impl Stream<Item = Result<String, AppError>>, AppError> {
        let key = self.api_key()?;
        let request = self.build_request(system, user, true);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(key)
            .json(&request)
            .send()
            .await
            .map_err(AppError::upstream_unreachable)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream {
                status: Some(status),
                message: format!("chat completion returned {}", status),
                details: serde_json::from_str(&body).ok(),
            });
        }

        let mut bytes = response.bytes_stream();

        Ok(stream! {
            // TCP chunks can split SSE events, so buffer partial lines.
            let mut buf = String::new();
            'chunks: while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(AppError::upstream_unreachable(e));
                        break;
                    }
                };
                buf.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(newline) = buf.find('\n') {
                    let line = buf[..newline].trim().to_string();
                    buf.drain(..=newline);

                    match parse_stream_line(&line) {
                        StreamLine::Token(token) => yield Ok(token),
                        StreamLine::Done => break 'chunks,
                        StreamLine::Skip => {}
                    }
                }
            }
        })
    }
}

enum StreamLine {
    Token(String),
    Done,
    Skip,
}

fn parse_stream_line(line: &str) -> StreamLine {
    let data = match line.strip_prefix("data: ") {
        Some(data) => data,
        None => return StreamLine::Skip,
    };

    if data == "[DONE]" {
        return StreamLine::Done;
    }

    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => {
            let token = chunk
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.delta.content);
            match token {
                Some(token) if !token.is_empty() => StreamLine::Token(token),
                _ => StreamLine::Skip,
            }
        }
        Err(e) => {
            tracing::warn!(
                "Skipping unparseable stream event: {}. Data: {}",
                e,
                data.chars().take(200).collect::<String>()
            );
            StreamLine::Skip
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f64,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: Delta,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}
