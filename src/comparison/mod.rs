//! # Comparison Module
//!
//! Builds similarity tables ([`SimilarityPlotPoint`](crate::types::SimilarityPlotPoint) rows) by
//! embedding words, documents, or dataset fields through an injected
//! [`EmbeddingProvider`](crate::embeddings::EmbeddingProvider).
//!
//! | Mode | Method |
//! |------|--------|
//! | Words vs words | [`ComparisonEngine::compare_words_vs_words`] |
//! | Words vs documents | [`ComparisonEngine::compare_documents_vs_words`] |
//! | Documents vs documents | [`ComparisonEngine::compare_corpus`] |
//! | Dataset vs words | [`ComparisonEngine::compare_dataset_vs_words`] |

pub mod chunking;
pub mod corpus;
pub mod engine;

pub use chunking::{clean_text, ChunkType, TextChunker};
pub use corpus::{DirectoryCorpus, Document, DocumentSource, InMemoryCorpus};
pub use engine::{ComparisonEngine, TextComparison};
