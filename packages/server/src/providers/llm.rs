use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::config::LlmConfig;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("text cannot be empty")]
    EmptyText,
    #[error("LLM API key not configured")]
    NotConfigured,
    #[error("LLM transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("LLM API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("LLM API error: {0}")]
    Response(String),
}

/// Rewrites review text into a more polished form.
#[async_trait]
pub trait TextEnhancer: Send + Sync {
    async fn enhance(&self, text: &str) -> Result<String, LlmError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

fn enhancement_prompt(text: &str) -> String {
    format!(
        "You are a professional text editor specializing in educational review content.\n\n\
         Enhance the following text while following these guidelines:\n\
         1. Identify and keep the original language throughout the response\n\
         2. Fix typos and grammatical errors\n\
         3. Make the language more professional and polished\n\
         4. Maintain the original meaning and intent\n\
         5. The text is feedback from an expert on a student's video submission; keep the tone constructive\n\
         6. If the text is already well-written, make minimal changes\n\
         7. Return ONLY the enhanced text, without explanations\n\n\
         Original text to enhance:\n{text}"
    )
}

/// OpenRouter chat-completions client.
pub struct OpenRouterEnhancer {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenRouterEnhancer {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        if config.api_key.is_empty() {
            tracing::warn!("LLM API key not configured; text enhancement will fail");
        }
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl TextEnhancer for OpenRouterEnhancer {
    #[instrument(skip(self, text), fields(model = %self.model, text_length = text.len()))]
    async fn enhance(&self, text: &str) -> Result<String, LlmError> {
        if text.trim().is_empty() {
            return Err(LlmError::EmptyText);
        }
        if self.api_key.is_empty() {
            return Err(LlmError::NotConfigured);
        }

        let res = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&ChatRequest {
                model: &self.model,
                messages: vec![ChatMessage {
                    role: "user".into(),
                    content: enhancement_prompt(text),
                }],
            })
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(LlmError::Api {
                status: status.as_u16(),
                body: res.text().await.unwrap_or_default(),
            });
        }

        let response: ChatResponse = res.json().await?;
        if let Some(err) = response.error {
            return Err(LlmError::Response(err.message));
        }
        let enhanced = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::Response("no choices returned".into()))?;

        info!(enhanced_length = enhanced.len(), "Enhanced review text");
        Ok(enhanced)
    }
}
