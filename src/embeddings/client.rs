//! OpenAI-compatible embedding client.

use async_trait::async_trait;
use tracing::debug;

use super::provider::{ensure_aligned, EmbeddingProvider};
use super::types::{Embedding, EmbeddingRequest, EmbeddingResponse, EmbeddingUsage};
use crate::config::EmbeddingConfig;
use crate::{Error, ErrorContext, Result};

pub struct OpenAiEmbeddingClient {
    http_client: reqwest::Client,
    model: String,
    base_url: String,
    api_key: String,
    dimensions: Option<usize>,
    max_batch_size: usize,
}

impl OpenAiEmbeddingClient {
    pub fn builder() -> OpenAiEmbeddingClientBuilder {
        OpenAiEmbeddingClientBuilder::new()
    }

    /// Embed `texts`, splitting into provider-sized batches sent one after another.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<(Vec<Embedding>, EmbeddingUsage)> {
        if texts.is_empty() {
            return Ok((Vec::new(), EmbeddingUsage::default()));
        }
        let mut all_embeddings: Vec<Embedding> = Vec::with_capacity(texts.len());
        let mut total_usage = EmbeddingUsage::default();
        for (batch_idx, chunk) in texts.chunks(self.max_batch_size).enumerate() {
            let response = self.execute(chunk).await?;
            let offset = batch_idx * self.max_batch_size;
            for emb in response.embeddings {
                let index = emb.index() + offset;
                let text = emb.text().to_string();
                all_embeddings.push(Embedding::new(index, text, emb.into_vector()));
            }
            total_usage.add(&response.usage);
        }
        debug!(
            inputs = texts.len(),
            prompt_tokens = total_usage.prompt_tokens,
            "embedding batch complete"
        );
        Ok((all_embeddings, total_usage))
    }

    async fn execute(&self, texts: &[String]) -> Result<EmbeddingResponse> {
        let mut request = EmbeddingRequest::batch(&self.model, texts.to_vec());
        if let Some(dims) = self.dimensions {
            request = request.with_dimensions(dims);
        }
        let endpoint = format!("{}/v1/embeddings", self.base_url.trim_end_matches('/'));
        let response = self
            .http_client
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                Error::external_service(
                    "Embedding request failed",
                    ErrorContext::new().with_source("embeddings"),
                    e,
                )
            })?;
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            Error::external_service(
                "Failed to read embedding response",
                ErrorContext::new().with_source("embeddings"),
                e,
            )
        })?;
        if !status.is_success() {
            return Err(Error::external_service_with_context(
                format!("Embedding API error ({}): {}", status, body),
                ErrorContext::new().with_source("embeddings"),
            ));
        }
        EmbeddingResponse::from_openai_format(&body, texts)
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let (embeddings, _) = self.embed_batch(texts).await?;
        ensure_aligned(texts, &embeddings, self.name())?;
        Ok(embeddings)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

pub struct OpenAiEmbeddingClientBuilder {
    model: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    dimensions: Option<usize>,
    max_batch_size: usize,
    timeout_secs: u64,
}

impl OpenAiEmbeddingClientBuilder {
    pub fn new() -> Self {
        Self {
            model: None,
            api_key: None,
            base_url: None,
            dimensions: None,
            max_batch_size: 100,
            timeout_secs: 60,
        }
    }

    /// Seed the builder from the `embedding` section of the configuration.
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        let mut builder = Self::new()
            .model(config.model.clone())
            .base_url(config.base_url.clone())
            .max_batch_size(config.max_batch_size)
            .timeout_secs(config.timeout_secs);
        if let Some(dims) = config.dimensions {
            builder = builder.dimensions(dims);
        }
        if let Some(ref key) = config.api_key {
            builder = builder.api_key(key.clone());
        }
        builder
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }
    pub fn dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
    pub fn max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size;
        self
    }
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn build(self) -> Result<OpenAiEmbeddingClient> {
        let model = self
            .model
            .unwrap_or_else(|| "text-embedding-3-small".to_string());
        let api_key = self
            .api_key
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| Error::configuration("API key required (OPENAI_API_KEY)"))?;
        if self.max_batch_size == 0 {
            return Err(Error::configuration("max_batch_size must be at least 1"));
        }
        let base_url = self
            .base_url
            .unwrap_or_else(|| "https://api.openai.com".to_string());
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {}", e)))?;
        Ok(OpenAiEmbeddingClient {
            http_client,
            model,
            base_url,
            api_key,
            dimensions: self.dimensions,
            max_batch_size: self.max_batch_size,
        })
    }
}

impl Default for OpenAiEmbeddingClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
