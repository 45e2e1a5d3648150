//! Embedding types and data structures.

use serde::{Deserialize, Serialize};

use crate::{Error, ErrorContext, Result};

/// A single embedding vector paired with the text it was generated from.
///
/// Produced by an [`EmbeddingProvider`](super::EmbeddingProvider) in the same order as its input
/// batch; `index` is the position of `text` in that batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    index: usize,
    text: String,
    vector: Vec<f32>,
}

impl Embedding {
    pub fn new(index: usize, text: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            index,
            text: text.into(),
            vector,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn vector(&self) -> &[f32] {
        &self.vector
    }

    pub fn into_vector(self) -> Vec<f32> {
        self.vector
    }

    pub fn dimensions(&self) -> usize {
        self.vector.len()
    }
}

/// Request body for OpenAI-compatible embedding endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    pub input: Vec<String>,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding_format: Option<String>,
}

impl EmbeddingRequest {
    pub fn batch(model: impl Into<String>, texts: Vec<String>) -> Self {
        Self {
            input: texts,
            model: model.into(),
            dimensions: None,
            encoding_format: None,
        }
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingUsage {
    pub prompt_tokens: u32,
    pub total_tokens: u32,
}

impl EmbeddingUsage {
    pub fn add(&mut self, other: &EmbeddingUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.total_tokens += other.total_tokens;
    }
}

#[derive(Debug, Clone, Deserialize)]
struct WireItem {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Clone, Deserialize)]
struct WireResponse {
    data: Vec<WireItem>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: EmbeddingUsage,
}

/// A parsed provider response, already aligned with the texts that were sent.
#[derive(Debug, Clone)]
pub struct EmbeddingResponse {
    pub embeddings: Vec<Embedding>,
    pub model: String,
    pub usage: EmbeddingUsage,
}

impl EmbeddingResponse {
    /// Parse an OpenAI-format body and attach each vector to the text it was generated from.
    ///
    /// Providers may return `data` out of order, so entries are re-sorted by `index`. A body whose
    /// item count or indices do not line up with `texts` is rejected rather than partially used.
    pub fn from_openai_format(body: &str, texts: &[String]) -> Result<Self> {
        let wire: WireResponse = serde_json::from_str(body)?;
        if wire.data.len() != texts.len() {
            return Err(Error::external_service_with_context(
                format!(
                    "Provider returned {} embeddings for {} inputs",
                    wire.data.len(),
                    texts.len()
                ),
                ErrorContext::new().with_source("embeddings"),
            ));
        }
        let mut items = wire.data;
        items.sort_by_key(|item| item.index);
        let mut embeddings = Vec::with_capacity(items.len());
        for (position, item) in items.into_iter().enumerate() {
            if item.index != position {
                return Err(Error::external_service_with_context(
                    format!("Unexpected embedding index {} at position {}", item.index, position),
                    ErrorContext::new().with_source("embeddings"),
                ));
            }
            embeddings.push(Embedding::new(position, texts[position].clone(), item.embedding));
        }
        Ok(Self {
            embeddings,
            model: wire.model.unwrap_or_else(|| "unknown".to_string()),
            usage: wire.usage,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingModel {
    pub id: String,
    pub max_input_tokens: u32,
    pub dimensions: usize,
}

impl EmbeddingModel {
    pub fn text_embedding_3_small() -> Self {
        Self {
            id: "text-embedding-3-small".into(),
            max_input_tokens: 8191,
            dimensions: 1536,
        }
    }

    pub fn text_embedding_3_large() -> Self {
        Self {
            id: "text-embedding-3-large".into(),
            max_input_tokens: 8191,
            dimensions: 3072,
        }
    }
}
