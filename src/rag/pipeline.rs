//! Index, retrieve, generate, and score.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::generator::TextGenerator;
use crate::comparison::{DocumentSource, TextChunker};
use crate::embeddings::{ensure_aligned, EmbeddingProvider};
use crate::evaluation::{AccuracyEvaluator, RagEvaluationResult};
use crate::store::{MetadataFilter, StoredVector, VectorStore};
use crate::types::VectorSource;
use crate::{Error, ErrorContext, Result};

/// Metadata key holding the indexed paragraph text.
pub const TEXT_KEY: &str = "Text";
/// Metadata key holding the name of the document a paragraph came from.
pub const SOURCE_KEY: &str = "Source";

/// A question with its expected answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagCase {
    pub query: String,
    pub reference: String,
}

/// The outcome of running one [`RagCase`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagCaseResult {
    pub query: String,
    pub answer: String,
    pub reference: String,
    pub scores: RagEvaluationResult,
}

pub struct RagPipeline {
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    generator: Arc<dyn TextGenerator>,
    evaluator: AccuracyEvaluator,
    namespace: String,
    top_k: usize,
    next_id: AtomicUsize,
    cancel: Option<CancellationToken>,
}

impl RagPipeline {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            evaluator: AccuracyEvaluator::new(provider.clone()),
            provider,
            store,
            generator,
            namespace: "default".to_string(),
            top_k: 4,
            next_id: AtomicUsize::new(0),
            cancel: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn check_cancelled(&self, stage: &str) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => {
                Err(Error::cancelled(format!("RAG pipeline cancelled before {}", stage)))
            }
            _ => Ok(()),
        }
    }

    /// Start numbering indexed paragraphs at `first_id`, for adding to a namespace that already
    /// holds `doc_0..doc_<first_id>`.
    pub fn with_first_id(self, first_id: usize) -> Self {
        self.next_id.store(first_id, Ordering::SeqCst);
        self
    }

    /// Embed `texts` and store them as `doc_<n>` with the text kept in metadata.
    ///
    /// Numbering continues across calls on the same pipeline, so indexing again adds paragraphs
    /// instead of replacing earlier ones.
    pub async fn index(&self, texts: &[String]) -> Result<usize> {
        let entries: Vec<(String, Option<String>)> =
            texts.iter().map(|t| (t.clone(), None)).collect();
        self.index_entries(&entries).await
    }

    /// Chunk every document of `source` and index the chunks, tagging each with its document.
    pub async fn index_corpus(&self, source: &dyn DocumentSource, chunker: &TextChunker) -> Result<usize> {
        let mut entries = Vec::new();
        for document in source.documents().await? {
            for chunk in chunker.chunk(&document.text) {
                entries.push((chunk, Some(document.name.clone())));
            }
        }
        self.index_entries(&entries).await
    }

    async fn index_entries(&self, entries: &[(String, Option<String>)]) -> Result<usize> {
        if entries.is_empty() {
            return Err(Error::invalid_argument_with_context(
                "Nothing to index",
                ErrorContext::new().with_source("rag_pipeline"),
            ));
        }
        self.check_cancelled("embedding index entries")?;
        let texts: Vec<String> = entries.iter().map(|(t, _)| t.clone()).collect();
        let embeddings = self.provider.embed(&texts).await?;
        ensure_aligned(&texts, &embeddings, self.provider.name())?;

        let first_id = self.next_id.fetch_add(entries.len(), Ordering::SeqCst);
        let vectors: Vec<StoredVector> = embeddings
            .into_iter()
            .zip(entries)
            .map(|(embedding, (text, source))| {
                let id = format!("doc_{}", first_id + embedding.index());
                let mut vector = StoredVector::new(id, embedding.into_vector())
                    .with_metadata(TEXT_KEY, text.clone());
                if let Some(source) = source {
                    vector = vector.with_metadata(SOURCE_KEY, source.clone());
                }
                vector
            })
            .collect();

        self.check_cancelled("upserting vectors")?;
        let written = self.store.upsert(&vectors, &self.namespace).await?;
        info!(
            store = self.store.name(),
            namespace = %self.namespace,
            count = written,
            "indexed paragraphs"
        );
        Ok(written)
    }

    /// Store sources that already carry vectors, such as dataset records loaded from JSON,
    /// without calling the provider.
    ///
    /// The value of `text_attribute` becomes the retrievable paragraph text. Sources lacking it
    /// or holding no vectors are skipped.
    pub async fn index_sources<S: VectorSource + Sync>(
        &self,
        sources: &[S],
        text_attribute: &str,
    ) -> Result<usize> {
        let mut vectors = Vec::new();
        for source in sources {
            let Some(text) = source.attribute(text_attribute) else {
                warn!(id = %source.id(), attribute = text_attribute, "source has no text, skipping");
                continue;
            };
            for stored in StoredVector::from_source(source) {
                vectors.push(stored.with_metadata(TEXT_KEY, text));
            }
        }
        if vectors.is_empty() {
            return Err(Error::invalid_argument_with_context(
                "No sources with vectors and text to index",
                ErrorContext::new()
                    .with_field_path(text_attribute.to_string())
                    .with_source("rag_pipeline"),
            ));
        }

        self.check_cancelled("upserting vectors")?;
        let written = self.store.upsert(&vectors, &self.namespace).await?;
        info!(
            store = self.store.name(),
            namespace = %self.namespace,
            count = written,
            "indexed pre-embedded sources"
        );
        Ok(written)
    }

    /// The stored paragraphs closest to `query`, best first.
    pub async fn retrieve(&self, query: &str, filter: Option<&MetadataFilter>) -> Result<Vec<String>> {
        self.check_cancelled("embedding query")?;
        let embedding = self.provider.embed_one(query).await?;
        self.check_cancelled("querying store")?;
        let matches = self
            .store
            .query(embedding.vector(), self.top_k, &self.namespace, filter)
            .await?;
        debug!(query, matches = matches.len(), "retrieved context");
        Ok(matches
            .into_iter()
            .filter_map(|m| m.metadata.get(TEXT_KEY).cloned())
            .collect())
    }

    pub async fn answer(&self, query: &str) -> Result<String> {
        let context = self.retrieve(query, None).await?;
        self.check_cancelled("generating answer")?;
        self.generator.generate(query, &context).await
    }

    /// Answer each query in turn.
    pub async fn answer_all(&self, queries: &[String]) -> Result<Vec<String>> {
        let mut answers = Vec::with_capacity(queries.len());
        for query in queries {
            answers.push(self.answer(query).await?);
        }
        Ok(answers)
    }

    pub async fn evaluate(&self, generated: &str, reference: &str) -> Result<RagEvaluationResult> {
        self.check_cancelled("evaluating answer")?;
        self.evaluator.evaluate(generated, reference).await
    }

    /// Answer and score every case.
    pub async fn run_cases(&self, cases: &[RagCase]) -> Result<Vec<RagCaseResult>> {
        let mut results = Vec::with_capacity(cases.len());
        for case in cases {
            let answer = self.answer(&case.query).await?;
            let scores = self.evaluate(&answer, &case.reference).await?;
            info!(
                query = %case.query,
                cosine = scores.cosine_similarity,
                rouge1 = scores.rouge1,
                rouge2 = scores.rouge2,
                "scored case"
            );
            results.push(RagCaseResult {
                query: case.query.clone(),
                answer,
                reference: case.reference.clone(),
                scores,
            });
        }
        Ok(results)
    }
}
