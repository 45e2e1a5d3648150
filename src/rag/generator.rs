//! Answer generation from retrieved context.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ChatConfig;
use crate::{Error, ErrorContext, Result};

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Answer `query` using only `context` paragraphs.
    async fn generate(&self, query: &str, context: &[String]) -> Result<String>;

    fn name(&self) -> &'static str;
}

/// Prompt asking for an answer grounded in `context`, in the language of the query.
pub fn build_prompt(query: &str, context: &[String]) -> String {
    format!(
        "I will give you text paragraphs and a question. You must answer the question in the light \
         of the paragraphs I provided as context. The paragraphs can be in different languages. \
         Always determine the language of the query and use the same language for your answer.\n\n\
         Here is the context:\n\n{}\n\n\
         Based on the above information, answer the following question:\n{}",
        context.join("\n\n"),
        query
    )
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat completions client.
pub struct OpenAiChatGenerator {
    http_client: reqwest::Client,
    model: String,
    base_url: String,
    api_key: String,
}

impl OpenAiChatGenerator {
    pub fn builder() -> OpenAiChatGeneratorBuilder {
        OpenAiChatGeneratorBuilder::new()
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for OpenAiChatGenerator {
    async fn generate(&self, query: &str, context: &[String]) -> Result<String> {
        let prompt = build_prompt(query, context);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
        };
        let endpoint = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        tracing::debug!(model = %self.model, paragraphs = context.len(), "requesting chat completion");

        let response = self
            .http_client
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                Error::external_service(
                    "Chat completion request failed",
                    ErrorContext::new().with_source("chat"),
                    e,
                )
            })?;
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            Error::external_service(
                "Failed to read chat completion response",
                ErrorContext::new().with_source("chat"),
                e,
            )
        })?;
        if !status.is_success() {
            return Err(Error::external_service_with_context(
                format!("Chat API error ({}): {}", status, body),
                ErrorContext::new().with_source("chat"),
            ));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                Error::external_service_with_context(
                    "Chat completion returned no content",
                    ErrorContext::new().with_source("chat"),
                )
            })
    }

    fn name(&self) -> &'static str {
        "openai-chat"
    }
}

pub struct OpenAiChatGeneratorBuilder {
    model: Option<String>,
    base_url: Option<String>,
    api_key: Option<String>,
    timeout_secs: u64,
}

impl OpenAiChatGeneratorBuilder {
    pub fn new() -> Self {
        Self {
            model: None,
            base_url: None,
            api_key: None,
            timeout_secs: 60,
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        let mut builder = Self::new()
            .model(config.model.clone())
            .base_url(config.base_url.clone())
            .timeout_secs(config.timeout_secs);
        if let Some(ref key) = config.api_key {
            builder = builder.api_key(key.clone());
        }
        builder
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn build(self) -> Result<OpenAiChatGenerator> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| Error::configuration("API key required (OPENAI_API_KEY)"))?;
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {}", e)))?;
        Ok(OpenAiChatGenerator {
            http_client,
            model: self.model.unwrap_or_else(|| "gpt-4o".to_string()),
            base_url: self
                .base_url
                .unwrap_or_else(|| "https://api.openai.com".to_string()),
            api_key,
        })
    }
}

impl Default for OpenAiChatGeneratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_context_and_query() {
        let prompt = build_prompt(
            "Who wrote it?",
            &["Para one.".to_string(), "Para two.".to_string()],
        );
        assert!(prompt.contains("Para one.\n\nPara two."));
        assert!(prompt.ends_with("question:\nWho wrote it?"));
    }

    #[test]
    fn test_response_without_choices() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(parsed.choices.is_empty());
    }
}
