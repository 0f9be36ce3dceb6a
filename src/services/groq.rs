//! Groq-backed implementation of the service capability traits.
//!
//! Groq exposes an OpenAI-compatible API: Whisper models behind the audio
//! transcription endpoint, Llama models behind chat completions. One client
//! implements all three capabilities so the host configures a single API
//! key.

use super::{
    enrichment_system_prompt, EnrichOptions, Enrichment, Enricher, LlmError, StyleTransformer,
    SttError, Transcriber,
};
use crate::capture::AudioClip;
use async_trait::async_trait;
use reqwest::multipart;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const TRANSCRIPTION_API_URL: &str = "https://api.groq.com/openai/v1/audio/transcriptions";
const CHAT_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

const DEFAULT_STT_MODEL: &str = "whisper-large-v3-turbo";
const DEFAULT_CHAT_MODEL: &str = "llama-3.3-70b-versatile";

/// Default per-request timeout; the orchestrator applies its own stage
/// timeout on top of this.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Groq API client implementing transcription, enrichment and style
/// transformation.
pub struct GroqClient {
    client: Client,
    api_key: String,
    stt_model: String,
    chat_model: String,
    /// ISO language hint passed to the transcription endpoint.
    language: Option<String>,
}

impl GroqClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key,
            stt_model: DEFAULT_STT_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            language: None,
        }
    }

    /// Override the transcription model.
    pub fn with_stt_model(mut self, model: impl Into<String>) -> Self {
        self.stt_model = model.into();
        self
    }

    /// Override the chat model used for enrichment and style transforms.
    pub fn with_chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = model.into();
        self
    }

    /// Set the transcription language hint (e.g. "de").
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    async fn complete_chat(&self, request: &ChatRequest) -> Result<String, LlmError> {
        if self.api_key.is_empty() {
            return Err(LlmError::NoApiKey("groq".to_string()));
        }

        let response = self
            .client
            .post(CHAT_API_URL)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(DEFAULT_REQUEST_TIMEOUT)
                } else {
                    LlmError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
                return Err(LlmError::Api(format!(
                    "Groq API error ({}): {}",
                    status, error_response.error.message
                )));
            }
            return Err(LlmError::Api(format!(
                "Groq API error ({}): {}",
                status, error_text
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        chat.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("No response choices returned".to_string()))
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Structured enrichment payload the model is instructed to return.
#[derive(Debug, Deserialize)]
struct EnrichmentPayload {
    text: String,
    #[serde(default)]
    corrections_made: u32,
    #[serde(default)]
    self_corrections_applied: u32,
}

#[async_trait]
impl Transcriber for GroqClient {
    async fn transcribe(&self, audio: &AudioClip) -> Result<String, SttError> {
        if self.api_key.is_empty() {
            return Err(SttError::Config("Groq requires an API key".to_string()));
        }

        let file_name = match audio.mime_type.as_str() {
            "audio/webm" => "recording.webm",
            _ => "recording.wav",
        };

        let part = multipart::Part::bytes(audio.bytes.clone())
            .file_name(file_name)
            .mime_str(&audio.mime_type)
            .map_err(|e| SttError::Audio(format!("Failed to create multipart: {}", e)))?;

        let mut form = multipart::Form::new()
            .part("file", part)
            .text("model", self.stt_model.clone())
            .text("response_format", "json");

        if let Some(language) = &self.language {
            form = form.text("language", language.clone());
        }

        log::debug!(
            "Groq: Transcribing {} bytes ({})",
            audio.bytes.len(),
            audio.mime_type
        );

        let response = self
            .client
            .post(TRANSCRIPTION_API_URL)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| if e.is_timeout() { SttError::Timeout } else { SttError::Network(e) })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SttError::Api(format!(
                "Groq API error ({}): {}",
                status, error_text
            )));
        }

        let result: serde_json::Value = response.json().await?;
        let text = result["text"].as_str().unwrap_or("").to_string();

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "groq"
    }
}

#[async_trait]
impl Enricher for GroqClient {
    async fn enrich(&self, text: &str, options: &EnrichOptions) -> Result<Enrichment, LlmError> {
        let request = ChatRequest {
            model: self.chat_model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: enrichment_system_prompt(options.self_correction_enabled),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: text.to_string(),
                },
            ],
            max_tokens: 1024,
            temperature: 0.2,
            response_format: Some(serde_json::json!({ "type": "json_object" })),
        };

        let content = self.complete_chat(&request).await?;

        // Malformed structured output is a stage failure, not a partial
        // success; the orchestrator degrades to the raw transcript.
        let payload: EnrichmentPayload = serde_json::from_str(&content).map_err(|e| {
            let preview: String = content.chars().take(200).collect();
            log::warn!("Groq: Enrichment returned non-conforming JSON ({}): {}", e, preview);
            LlmError::InvalidResponse(format!("Enrichment output not valid JSON: {}", e))
        })?;

        Ok(Enrichment {
            text: payload.text,
            corrections_applied: payload.corrections_made,
            self_corrections_applied: payload.self_corrections_applied,
        })
    }

    fn name(&self) -> &'static str {
        "groq"
    }
}

#[async_trait]
impl StyleTransformer for GroqClient {
    async fn transform(&self, text: &str, style_prompt: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: self.chat_model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: style_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: text.to_string(),
                },
            ],
            // Slightly more creative than enrichment, with room for
            // formatted output.
            max_tokens: 2048,
            temperature: 0.5,
            response_format: None,
        };

        let content = self.complete_chat(&request).await?;
        Ok(content.trim().to_string())
    }

    fn name(&self) -> &'static str {
        "groq"
    }
}
