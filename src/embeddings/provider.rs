//! The embedding-provider seam.

use async_trait::async_trait;

use super::types::Embedding;
use crate::{Error, ErrorContext, Result};

/// Turns text into embedding vectors.
///
/// Implementations must return exactly one embedding per input, in input order, with
/// `Embedding::index` equal to the input position. A failed call surfaces as a single
/// `ExternalService` error; partial results are never returned.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>>;

    async fn embed_one(&self, text: &str) -> Result<Embedding> {
        let mut embeddings = self.embed(&[text.to_string()]).await?;
        match embeddings.pop() {
            Some(embedding) if embeddings.is_empty() => Ok(embedding),
            _ => Err(Error::external_service_with_context(
                "Provider did not return exactly one embedding",
                ErrorContext::new().with_source(self.name()),
            )),
        }
    }

    fn name(&self) -> &'static str;
}

/// Check that a provider honoured the ordering contract for `texts`.
pub fn ensure_aligned(texts: &[String], embeddings: &[Embedding], source: &str) -> Result<()> {
    if texts.len() != embeddings.len() {
        return Err(Error::external_service_with_context(
            format!(
                "Expected {} embeddings, provider returned {}",
                texts.len(),
                embeddings.len()
            ),
            ErrorContext::new().with_source(source.to_string()),
        ));
    }
    for (position, embedding) in embeddings.iter().enumerate() {
        if embedding.index() != position {
            return Err(Error::external_service_with_context(
                format!("Embedding at position {} has index {}", position, embedding.index()),
                ErrorContext::new().with_source(source.to_string()),
            ));
        }
    }
    Ok(())
}
