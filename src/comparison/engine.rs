//! Similarity table assembly.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::chunking::TextChunker;
use super::corpus::{Document, DocumentSource};
use crate::embeddings::{
    average_vectors, cosine_similarity, ensure_aligned, euclidean_distance, Embedding,
    EmbeddingProvider, Vector,
};
use crate::types::{MultiEmbeddingRecord, SimilarityPlotPoint, VectorData};
use crate::{Error, ErrorContext, Result};

/// Cosine similarity and Euclidean distance between two texts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextComparison {
    pub cosine_similarity: f64,
    pub euclidean_distance: f64,
}

/// Builds similarity tables from words, documents, and dataset records.
///
/// Provider calls are awaited one after another. When a cancellation token is attached it is
/// checked before every provider call.
#[derive(Clone)]
pub struct ComparisonEngine {
    provider: Arc<dyn EmbeddingProvider>,
    chunker: TextChunker,
    cancel: Option<CancellationToken>,
}

impl ComparisonEngine {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            chunker: TextChunker::default(),
            cancel: None,
        }
    }

    pub fn with_chunker(mut self, chunker: TextChunker) -> Self {
        self.chunker = chunker;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    fn check_cancelled(&self, stage: &str) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => {
                Err(Error::cancelled(format!("Comparison cancelled before {}", stage)))
            }
            _ => Ok(()),
        }
    }

    async fn embed_texts(&self, texts: &[String], stage: &str) -> Result<Vec<Embedding>> {
        self.check_cancelled(stage)?;
        let embeddings = self.provider.embed(texts).await?;
        ensure_aligned(texts, &embeddings, self.provider.name())?;
        Ok(embeddings)
    }

    /// Words vs words: one row per item of `a`, one column per item of `b` in `b` order.
    pub async fn compare_words_vs_words(
        &self,
        a: &[String],
        b: &[String],
    ) -> Result<Vec<SimilarityPlotPoint>> {
        let a = non_blank(a, "first word list")?;
        let b = non_blank(b, "second word list")?;
        info!(rows = a.len(), columns = b.len(), "comparing words vs words");

        let a_embeddings = self.embed_texts(&a, "embedding first word list").await?;
        let b_embeddings = self.embed_texts(&b, "embedding second word list").await?;

        let mut points = Vec::with_capacity(a_embeddings.len());
        for row in &a_embeddings {
            let mut point = SimilarityPlotPoint::new(row.text());
            for column in &b_embeddings {
                point.insert(column.text(), cosine_similarity(row.vector(), column.vector())?);
            }
            points.push(point);
        }
        Ok(points)
    }

    /// Chunk, embed, and average one document. `None` when the document has no usable text.
    pub async fn embed_document(&self, document: &Document) -> Result<Option<Vector>> {
        let chunks = self.chunker.chunk(&document.text);
        if chunks.is_empty() {
            warn!(document = %document.name, "no text chunks extracted, skipping document");
            return Ok(None);
        }
        debug!(document = %document.name, chunks = chunks.len(), "embedding document");
        let embeddings = self
            .embed_texts(&chunks, &format!("embedding document '{}'", document.name))
            .await?;
        let vectors: Vec<&[f32]> = embeddings.iter().map(Embedding::vector).collect();
        average_vectors(&vectors).map(Some)
    }

    /// Averaged vectors for every non-empty document of `source`, in source order.
    pub async fn document_vectors(
        &self,
        source: &dyn DocumentSource,
    ) -> Result<Vec<(String, Vector)>> {
        let documents = source.documents().await?;
        let mut out = Vec::with_capacity(documents.len());
        for document in &documents {
            if let Some(vector) = self.embed_document(document).await? {
                out.push((document.name.clone(), vector));
            }
        }
        Ok(out)
    }

    /// Words vs documents: one row per document, one column per word.
    pub async fn compare_documents_vs_words(
        &self,
        words: &[String],
        source: &dyn DocumentSource,
    ) -> Result<Vec<SimilarityPlotPoint>> {
        let words = non_blank(words, "word list")?;
        let word_embeddings = self.embed_texts(&words, "embedding word list").await?;
        let documents = self.document_vectors(source).await?;
        info!(
            documents = documents.len(),
            words = words.len(),
            "comparing documents vs words"
        );

        let mut points = Vec::with_capacity(documents.len());
        for (name, vector) in &documents {
            let mut point = SimilarityPlotPoint::new(name.as_str());
            for word in &word_embeddings {
                point.insert(word.text(), cosine_similarity(vector, word.vector())?);
            }
            points.push(point);
        }
        Ok(points)
    }

    /// All-vs-all within a set of documents.
    ///
    /// Point `i` holds the similarity of document `i` to each of documents `0..i`, so the first
    /// point is empty and every unordered pair is computed exactly once.
    pub fn compare_all_documents<K, V>(&self, documents: &[(K, V)]) -> Result<Vec<SimilarityPlotPoint>>
    where
        K: AsRef<str>,
        V: AsRef<[f32]>,
    {
        if documents.len() < 2 {
            return Err(Error::invalid_argument_with_context(
                format!(
                    "All-vs-all comparison needs at least 2 documents, got {}",
                    documents.len()
                ),
                ErrorContext::new().with_source("compare_all_documents"),
            ));
        }

        let mut points = Vec::with_capacity(documents.len());
        for (i, (name, vector)) in documents.iter().enumerate() {
            let mut point = SimilarityPlotPoint::new(name.as_ref());
            for (other_name, other_vector) in &documents[..i] {
                point.insert(
                    other_name.as_ref(),
                    cosine_similarity(vector.as_ref(), other_vector.as_ref())?,
                );
            }
            points.push(point);
        }
        Ok(points)
    }

    /// Load, embed, and average every document in `source`, then compare them all-vs-all.
    pub async fn compare_corpus(&self, source: &dyn DocumentSource) -> Result<Vec<SimilarityPlotPoint>> {
        let documents = self.document_vectors(source).await?;
        info!(documents = documents.len(), "comparing documents vs documents");
        self.compare_all_documents(&documents)
    }

    /// Dataset records vs words, labelled by `label_attr` and scored with the first vector stored
    /// under `embedding_attr`.
    ///
    /// The first record missing its label or vector aborts the call.
    pub async fn compare_dataset_vs_words(
        &self,
        records: &[MultiEmbeddingRecord],
        label_attr: &str,
        embedding_attr: &str,
        words: &[String],
    ) -> Result<Vec<SimilarityPlotPoint>> {
        let words = non_blank(words, "word list")?;
        let word_embeddings = self.embed_texts(&words, "embedding word list").await?;
        info!(
            records = records.len(),
            words = words.len(),
            label = label_attr,
            field = embedding_attr,
            "comparing dataset vs words"
        );

        let mut points = Vec::with_capacity(records.len());
        for record in records {
            let label = record.attribute(label_attr)?;
            let vector = record.first_vector(embedding_attr)?;
            let mut point = SimilarityPlotPoint::new(label);
            for word in &word_embeddings {
                point.insert(word.text(), cosine_similarity(vector, word.vector())?);
            }
            points.push(point);
        }
        Ok(points)
    }

    /// Embed the listed attributes of each record, storing the result under the attribute name.
    ///
    /// Records are processed one at a time with one provider call each. Blank or absent values
    /// are skipped with a warning. Returns the number of vectors added.
    pub async fn embed_dataset(
        &self,
        records: &mut [MultiEmbeddingRecord],
        fields: &[String],
    ) -> Result<usize> {
        let mut added = 0;
        for record in records.iter_mut() {
            let mut names = Vec::new();
            let mut texts = Vec::new();
            for field in fields {
                let value = record
                    .attributes
                    .get(field)
                    .map(|v| v.trim())
                    .unwrap_or_default();
                if value.is_empty() {
                    warn!(record = %record.id, field = %field, "blank attribute value, skipping");
                    continue;
                }
                names.push(field.clone());
                texts.push(value.to_string());
            }
            if texts.is_empty() {
                continue;
            }

            let embeddings = self
                .embed_texts(&texts, &format!("embedding record '{}'", record.id))
                .await?;
            for (name, embedding) in names.into_iter().zip(embeddings) {
                record.add_embedding(name, VectorData::new(embedding.into_vector()));
                added += 1;
            }
        }
        debug!(records = records.len(), vectors = added, "embedded dataset");
        Ok(added)
    }

    pub async fn compare_texts(&self, a: &str, b: &str) -> Result<TextComparison> {
        let texts = non_blank(&[a.to_string(), b.to_string()], "text pair")?;
        if texts.len() != 2 {
            return Err(Error::invalid_argument("Both texts must be non-blank"));
        }
        let embeddings = self.embed_texts(&texts, "embedding text pair").await?;
        let (first, second) = (embeddings[0].vector(), embeddings[1].vector());
        Ok(TextComparison {
            cosine_similarity: cosine_similarity(first, second)?,
            euclidean_distance: euclidean_distance(first, second)?,
        })
    }
}

/// Trimmed, non-blank items of `items`; blanks are logged and dropped.
fn non_blank(items: &[String], what: &str) -> Result<Vec<String>> {
    let mut kept = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        let trimmed = item.trim();
        if trimmed.is_empty() {
            warn!(list = what, position, "blank entry, skipping");
        } else {
            kept.push(trimmed.to_string());
        }
    }
    if kept.is_empty() {
        return Err(Error::invalid_argument_with_context(
            format!("The {} is empty", what),
            ErrorContext::new().with_source("comparison_engine"),
        ));
    }
    Ok(kept)
}
