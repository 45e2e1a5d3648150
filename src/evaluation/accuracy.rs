//! Scoring generated answers against reference answers.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::rouge;
use crate::embeddings::{cosine_similarity, EmbeddingProvider};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RagEvaluationResult {
    pub cosine_similarity: f64,
    pub rouge1: f64,
    pub rouge2: f64,
}

/// Combines embedding similarity with ROUGE overlap.
#[derive(Clone)]
pub struct AccuracyEvaluator {
    provider: Arc<dyn EmbeddingProvider>,
}

impl AccuracyEvaluator {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    /// Embed each text separately and compare the vectors.
    pub async fn cosine_similarity(&self, predicted: &str, reference: &str) -> Result<f64> {
        let predicted = self.provider.embed_one(predicted).await?;
        let reference = self.provider.embed_one(reference).await?;
        cosine_similarity(predicted.vector(), reference.vector())
    }

    pub fn rouge_n(&self, reference: &str, generated: &str, n: usize) -> f64 {
        rouge::rouge_n(reference, generated, n)
    }

    pub fn rouge_scores(&self, reference: &str, generated: &str) -> (f64, f64) {
        rouge::rouge_scores(reference, generated)
    }

    pub async fn evaluate(&self, generated: &str, reference: &str) -> Result<RagEvaluationResult> {
        let cosine_similarity = self.cosine_similarity(generated, reference).await?;
        let (rouge1, rouge2) = self.rouge_scores(reference, generated);
        tracing::debug!(cosine_similarity, rouge1, rouge2, "evaluated generated answer");
        Ok(RagEvaluationResult {
            cosine_similarity,
            rouge1,
            rouge2,
        })
    }
}
